use crate::{
    config::AppConfig,
    error::{Result, ServiceError},
    query::{QueryEngine, QueryReply, QueryRequest},
    state::AppState,
    store::Stores,
    transport,
};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::{net::TcpListener, signal, time::timeout};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct Server {
    config: Arc<AppConfig>,
    state: AppState,
}

impl Server {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let stores = Stores::connect(&config.store).await?;
        Ok(Self::with_stores(config, stores))
    }

    /// Builds a server over already-connected stores.
    pub fn with_stores(config: AppConfig, stores: Stores) -> Self {
        let config = Arc::new(config);
        let query = QueryEngine::new(stores);
        let state = AppState::new(Arc::clone(&config), query);
        Self { config, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthz", get(Self::health))
            .route("/api/query", post(Self::query))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serves the command transport, and the HTTP API when configured, until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr;
        let commands = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind command listener on {addr}"))?;
        info!(%addr, "command listener ready");

        let http = match self.config.http_addr {
            Some(http_addr) => {
                let listener = TcpListener::bind(http_addr)
                    .await
                    .with_context(|| format!("failed to bind HTTP listener on {http_addr}"))?;
                info!(addr = %http_addr, "HTTP API listening");
                Some(listener)
            }
            None => None,
        };

        let router = self.router();
        let http_api = async move {
            match http {
                Some(listener) => axum::serve(listener, router)
                    .await
                    .context("HTTP API stopped"),
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            res = transport::serve_commands(commands, self.state.clone()) => res,
            res = http_api => res,
            _ = signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
                Ok(())
            }
        }
    }

    async fn health() -> Json<serde_json::Value> {
        Json(json!({ "status": "ok" }))
    }

    async fn query(
        State(state): State<AppState>,
        request: std::result::Result<Json<QueryRequest>, JsonRejection>,
    ) -> Result<Json<QueryReply>> {
        let Json(request) =
            request.map_err(|rejection| ServiceError::InvalidRequest(rejection.body_text()))?;
        let reply = timeout(state.config.request_timeout, state.query.execute(&request.query))
            .await
            .map_err(|_| ServiceError::Internal(anyhow::anyhow!("query timed out")))??;
        Ok(Json(reply))
    }
}
