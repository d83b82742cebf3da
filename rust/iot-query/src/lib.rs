pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod time;
pub mod transport;

use crate::{config::AppConfig, server::Server};

/// Bootstraps the query service from environment configuration.
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    Server::new(config).await?.run().await
}
