//! Plain-text command transport.
//!
//! Each read from a connection is one command token; exactly one text reply
//! is written back per token. A zero-byte read ends the connection.

use crate::{
    query::{QueryReply, QUERY_FAILED},
    state::AppState,
};
use std::{io, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    time::{sleep, timeout},
};
use tracing::{debug, error, info, warn};

/// Largest command read in one go; longer input is split across reads.
const COMMAND_BUFFER: usize = 1024;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections forever, serving each on its own task.
pub async fn serve_commands(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "failed to accept command connection");
                sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            info!(%peer, "command connection opened");
            match handle_connection(socket, &state).await {
                Ok(()) => info!(%peer, "command connection closed"),
                Err(err) => warn!(%peer, error = %err, "command connection failed"),
            }
        });
    }
}

pub async fn handle_connection<S>(mut stream: S, state: &AppState) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; COMMAND_BUFFER];
    loop {
        let read = stream.read(&mut buf).await?;
        if read == 0 {
            return Ok(());
        }

        let token = String::from_utf8_lossy(&buf[..read]);
        let reply = answer(state, token.trim()).await;
        stream.write_all(reply.as_bytes()).await?;
        stream.flush().await?;
    }
}

/// Text reply for one token; failures collapse into [`QUERY_FAILED`].
pub async fn answer(state: &AppState, token: &str) -> String {
    match run_query(state, token).await {
        Some(reply) => {
            debug!(query = %reply.query, outcome = ?reply.outcome, "replying");
            reply.message
        }
        None => QUERY_FAILED.to_string(),
    }
}

async fn run_query(state: &AppState, token: &str) -> Option<QueryReply> {
    match timeout(state.config.request_timeout, state.query.execute(token)).await {
        Ok(Ok(reply)) => Some(reply),
        Ok(Err(err)) => {
            error!(error = ?err, token, "query failed");
            None
        }
        Err(_) => {
            error!(
                token,
                timeout_secs = state.config.request_timeout.as_secs(),
                "query timed out"
            );
            None
        }
    }
}
