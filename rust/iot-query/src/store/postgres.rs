use super::{AssetSource, ReadingFilter, TelemetryStore};
use crate::{
    config::StoreConfig,
    db::{self, PgPool},
    error::{Result, ServiceError},
    models::{AssetNode, TelemetryReading},
    schema::{self, asset_metadata, telemetry_readings},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use serde_json::{Map, Value};
use tracing::{debug, error};

const DEVICE_ROOTS: &str = "upper(document->'customAttributes'->>'type') = 'DEVICE'";

/// PostgreSQL-backed hierarchy source and telemetry store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        Ok(Self::new(db::connect_pool(config).await?))
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.batch_execute(schema::CREATE_TABLES)
            .await
            .map_err(|err| ServiceError::Internal(err.into()))
    }

    async fn conn(&self) -> Result<bb8::PooledConnection<'_, db::PgConnectionManager>> {
        self.pool.get().await.map_err(|err| {
            error!(error = ?err, "failed to acquire database connection");
            ServiceError::Internal(anyhow::anyhow!("{err:?}"))
        })
    }
}

#[async_trait]
impl AssetSource for PgStore {
    async fn device_documents(&self) -> Result<Vec<AssetNode>> {
        let mut conn = self.conn().await?;
        let documents: Vec<Value> = asset_metadata::table
            .select(asset_metadata::document)
            .filter(sql::<Bool>(DEVICE_ROOTS))
            .order(asset_metadata::id.asc())
            .load(&mut *conn)
            .await
            .map_err(|err| ServiceError::Internal(err.into()))?;

        debug!(count = documents.len(), "loaded device documents");
        Ok(documents.iter().map(AssetNode::from).collect())
    }
}

#[async_trait]
impl TelemetryStore for PgStore {
    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<TelemetryReading>> {
        if filter.parent_uids.is_empty() {
            return Ok(Vec::new());
        }

        let uids: Vec<String> = filter.parent_uids.iter().cloned().collect();
        let mut query = telemetry_readings::table
            .select((
                telemetry_readings::parent_asset_uid,
                telemetry_readings::time,
                telemetry_readings::payload,
            ))
            .filter(telemetry_readings::parent_asset_uid.eq_any(uids))
            .order((telemetry_readings::time.asc(), telemetry_readings::id.asc()))
            .into_boxed::<Pg>();

        if let Some(range) = filter.range {
            query = query.filter(
                telemetry_readings::time
                    .ge(range.start)
                    .and(telemetry_readings::time.le(range.end)),
            );
        }

        let mut conn = self.conn().await?;
        let rows: Vec<(String, DateTime<Utc>, Value)> = query
            .load(&mut *conn)
            .await
            .map_err(|err| ServiceError::Internal(err.into()))?;

        Ok(rows.into_iter().map(into_reading).collect())
    }
}

/// The indexed column is authoritative for the parent uid; a payload that is
/// not an object carries no fields.
fn into_reading((parent_asset_uid, timestamp, payload): (String, DateTime<Utc>, Value)) -> TelemetryReading {
    let fields = match payload {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    TelemetryReading {
        parent_asset_uid,
        timestamp,
        fields,
    }
}
