use crate::{config::AppConfig, query::QueryEngine};
use std::sync::Arc;

/// Handles shared by every connection and request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub query: QueryEngine,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, query: QueryEngine) -> Self {
        Self { config, query }
    }
}
