use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    net::{SocketAddr, ToSocketAddrs},
    path::PathBuf,
    time::Duration,
};

/// Where hierarchy documents and telemetry readings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres {
        database_url: String,
        max_pool_size: u32,
        pg_ssl_root_cert: Option<String>,
        pg_ssl_cert: Option<String>,
        pg_ssl_key: Option<String>,
    },
    /// In-memory store seeded from a JSON fixture file.
    Fixture(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub http_addr: Option<SocketAddr>,
    pub store: StoreConfig,
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    iotq_listen_addr: Option<String>,
    #[serde(default)]
    iotq_listen_host: Option<String>,
    #[serde(default)]
    iotq_listen_port: Option<u16>,
    #[serde(default)]
    iotq_http_addr: Option<String>,
    #[serde(default)]
    iotq_database_url: Option<String>,
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    iotq_fixture_path: Option<String>,
    #[serde(default = "default_pool_size")]
    iotq_max_pool_size: u32,
    #[serde(default = "default_timeout_secs")]
    iotq_request_timeout_secs: u64,
    #[serde(default)]
    pgsslrootcert: Option<String>,
    #[serde(default)]
    pgsslcert: Option<String>,
    #[serde(default)]
    pgsslkey: Option<String>,
}

const fn default_pool_size() -> u32 {
    10
}

const fn default_timeout_secs() -> u64 {
    30
}

const DEFAULT_LISTEN_PORT: u16 = 5050;

impl AppConfig {
    /// Reads `IOTQ_*` variables, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }

        let raw: RawConfig =
            envy::from_env().context("failed to parse IOTQ_* environment variables")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let listen_addr = resolve_addr(
            raw.iotq_listen_addr,
            raw.iotq_listen_host,
            raw.iotq_listen_port,
        )?;

        let http_addr = raw
            .iotq_http_addr
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                value
                    .to_socket_addrs()
                    .context("invalid IOTQ_HTTP_ADDR value")?
                    .next()
                    .context("IOTQ_HTTP_ADDR resolved to no addresses")
            })
            .transpose()?;

        let fixture = raw
            .iotq_fixture_path
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let store = match fixture {
            Some(path) => StoreConfig::Fixture(path),
            None => {
                let database_url = raw
                    .iotq_database_url
                    .or(raw.database_url)
                    .context("IOTQ_DATABASE_URL, DATABASE_URL or IOTQ_FIXTURE_PATH must be set")?;
                StoreConfig::Postgres {
                    database_url,
                    max_pool_size: raw.iotq_max_pool_size.max(1),
                    pg_ssl_root_cert: raw.pgsslrootcert,
                    pg_ssl_cert: raw.pgsslcert,
                    pg_ssl_key: raw.pgsslkey,
                }
            }
        };

        Ok(Self {
            listen_addr,
            http_addr,
            store,
            request_timeout: Duration::from_secs(raw.iotq_request_timeout_secs.max(1)),
        })
    }
}

fn resolve_addr(
    addr: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<SocketAddr> {
    if let Some(addr) = addr {
        return addr
            .to_socket_addrs()
            .context("invalid IOTQ_LISTEN_ADDR value")?
            .next()
            .context("IOTQ_LISTEN_ADDR resolved to no addresses");
    }

    let host = host.unwrap_or_else(|| "0.0.0.0".to_string());
    let port = port.unwrap_or(DEFAULT_LISTEN_PORT);
    format!("{host}:{port}")
        .to_socket_addrs()
        .context("invalid IOTQ listen host/port combination")?
        .next()
        .context("listen address resolved to no targets")
}
