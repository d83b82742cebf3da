use super::{AssetSource, ReadingFilter, TelemetryStore};
use crate::{
    error::Result,
    models::{AssetKind, AssetNode, TelemetryReading},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::{fs, path::Path};
use tracing::{info, warn};

/// Store held entirely in memory; used for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    assets: Vec<AssetNode>,
    readings: Vec<TelemetryReading>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    assets: Vec<AssetNode>,
    #[serde(default)]
    readings: Vec<FixtureReading>,
}

#[derive(Debug, Deserialize)]
struct FixtureReading {
    time: DateTime<Utc>,
    payload: Value,
}

impl MemoryStore {
    pub fn new(assets: Vec<AssetNode>, readings: Vec<TelemetryReading>) -> Self {
        Self { assets, readings }
    }

    /// Parses a `{"assets": [...], "readings": [...]}` fixture document.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let fixture: Fixture = serde_json::from_str(raw)?;
        let total = fixture.readings.len();
        let readings: Vec<_> = fixture
            .readings
            .into_iter()
            .filter_map(|reading| TelemetryReading::from_payload(reading.time, reading.payload))
            .collect();

        if readings.len() < total {
            warn!(
                skipped = total - readings.len(),
                "fixture readings without a parent_asset_uid were skipped"
            );
        }

        Ok(Self::new(fixture.assets, readings))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let store = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            assets = store.assets.len(),
            readings = store.readings.len(),
            "loaded telemetry fixture"
        );
        Ok(store)
    }
}

#[async_trait]
impl AssetSource for MemoryStore {
    async fn device_documents(&self) -> Result<Vec<AssetNode>> {
        Ok(self
            .assets
            .iter()
            .filter(|node| node.kind == AssetKind::Device)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<TelemetryReading>> {
        Ok(self
            .readings
            .iter()
            .filter(|reading| filter.matches(reading))
            .cloned()
            .collect())
    }
}
