//! Log setup shared by the binary and the integration tests.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,iot_query=info,tower_http=info";

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global `fmt` subscriber once; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}
