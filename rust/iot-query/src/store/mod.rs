//! Read-only access to the asset hierarchy and the telemetry readings.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
    config::StoreConfig,
    error::Result,
    models::{AssetNode, TelemetryReading},
    time::TimeRange,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{collections::BTreeSet, sync::Arc};

/// Source of root hierarchy documents.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Root documents whose type is `DEVICE`; callers must still check the
    /// kind, since a source may return a superset.
    async fn device_documents(&self) -> Result<Vec<AssetNode>>;
}

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<TelemetryReading>>;
}

/// Readings whose parent uid is in `parent_uids`, limited to `range` when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingFilter {
    pub parent_uids: BTreeSet<String>,
    pub range: Option<TimeRange>,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &TelemetryReading) -> bool {
        self.parent_uids.contains(&reading.parent_asset_uid)
            && self
                .range
                .map_or(true, |range| range.contains(reading.timestamp))
    }
}

/// Both halves of a backend, shared by every in-flight query.
#[derive(Clone)]
pub struct Stores {
    pub assets: Arc<dyn AssetSource>,
    pub telemetry: Arc<dyn TelemetryStore>,
}

impl Stores {
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: AssetSource + TelemetryStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            assets: backend.clone(),
            telemetry: backend,
        }
    }

    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        match config {
            StoreConfig::Fixture(path) => {
                let store = MemoryStore::load(path)
                    .with_context(|| format!("failed to load fixture '{}'", path.display()))?;
                Ok(Self::from_backend(store))
            }
            StoreConfig::Postgres { .. } => {
                let store = PgStore::connect(config).await?;
                store.ensure_schema().await?;
                Ok(Self::from_backend(store))
            }
        }
    }
}
