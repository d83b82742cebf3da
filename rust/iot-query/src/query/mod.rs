//! The three fixed telemetry questions and their text replies.

mod average;
mod peak;

use crate::{catalog::build_catalog, error::Result, store::Stores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const INVALID_QUERY: &str = "Invalid query.";
/// Reply sent over the text transport when a query could not be answered.
pub const QUERY_FAILED: &str = "Error: query failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryId {
    /// `1`: average fridge moisture over the last three hours.
    FridgeMoisture,
    /// `2`: average water consumption per dishwasher cycle.
    DishwasherWaterFlow,
    /// `3`: device with the highest total electricity use.
    PeakElectricity,
}

impl QueryId {
    /// Parses a command token; surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "1" => Some(QueryId::FridgeMoisture),
            "2" => Some(QueryId::DishwasherWaterFlow),
            "3" => Some(QueryId::PeakElectricity),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            QueryId::FridgeMoisture => "1",
            QueryId::DishwasherWaterFlow => "2",
            QueryId::PeakElectricity => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    NoSensors,
    NoData,
    InvalidQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReply {
    pub query: String,
    pub outcome: Outcome,
    pub message: String,
}

impl QueryReply {
    fn new(query: &str, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            outcome,
            message: message.into(),
        }
    }
}

/// Answers queries against the configured stores. Each call builds its own
/// catalog; nothing is shared between in-flight queries except the store handles.
#[derive(Clone)]
pub struct QueryEngine {
    stores: Stores,
}

impl QueryEngine {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn execute(&self, token: &str) -> Result<QueryReply> {
        self.execute_at(token, Utc::now()).await
    }

    /// Runs `token` with relative time windows ending at `now`.
    pub async fn execute_at(&self, token: &str, now: DateTime<Utc>) -> Result<QueryReply> {
        let token = token.trim();
        let Some(id) = QueryId::parse(token) else {
            info!(token, "rejected unknown query");
            return Ok(QueryReply::new(token, Outcome::InvalidQuery, INVALID_QUERY));
        };

        let roots = self.stores.assets.device_documents().await?;
        let catalog = build_catalog(&roots);

        let (outcome, message) = match id {
            QueryId::FridgeMoisture => {
                average::execute(&average::FRIDGE_MOISTURE, &self.stores, &catalog, now).await?
            }
            QueryId::DishwasherWaterFlow => {
                average::execute(&average::DISHWASHER_WATER_FLOW, &self.stores, &catalog, now)
                    .await?
            }
            QueryId::PeakElectricity => peak::execute(&self.stores, &catalog).await?,
        };

        info!(query = id.token(), ?outcome, "query answered");
        Ok(QueryReply::new(id.token(), outcome, message))
    }
}
