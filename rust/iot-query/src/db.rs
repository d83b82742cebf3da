//! PostgreSQL connection pooling for the telemetry store.

use crate::config::StoreConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bb8::{ManageConnection, Pool};
use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use std::{fs::File, io::BufReader, path::Path};
use tokio_postgres::{Config as PgConfig, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{error, info};

pub type PgPool = Pool<PgConnectionManager>;

/// Certificate paths taken from `PGSSLROOTCERT`, `PGSSLCERT` and `PGSSLKEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsFiles<'a> {
    pub root_cert: Option<&'a str>,
    pub client_cert: Option<&'a str>,
    pub client_key: Option<&'a str>,
}

pub async fn connect_pool(config: &StoreConfig) -> Result<PgPool> {
    let StoreConfig::Postgres {
        database_url,
        max_pool_size,
        pg_ssl_root_cert,
        pg_ssl_cert,
        pg_ssl_key,
    } = config
    else {
        anyhow::bail!("store is not configured for PostgreSQL");
    };

    let tls = TlsFiles {
        root_cert: pg_ssl_root_cert.as_deref(),
        client_cert: pg_ssl_cert.as_deref(),
        client_key: pg_ssl_key.as_deref(),
    };
    let manager = PgConnectionManager::new(database_url, tls)?;
    let pool = Pool::builder()
        .max_size(*max_pool_size)
        .build(manager)
        .await
        .context("failed to build PostgreSQL connection pool")?;

    // Startup continues either way; a dead database shows up as per-query failures.
    match pool.get().await {
        Ok(_) => info!(max_pool_size = *max_pool_size, "telemetry database reachable"),
        Err(err) => error!(error = ?err, "initial telemetry database check failed"),
    }

    Ok(pool)
}

#[derive(Clone)]
pub struct PgConnectionManager {
    config: PgConfig,
    tls: Option<MakeRustlsConnect>,
}

impl PgConnectionManager {
    pub fn new(database_url: &str, tls: TlsFiles<'_>) -> Result<Self> {
        let config = database_url
            .parse::<PgConfig>()
            .context("invalid database URL")?;
        let tls = tls
            .root_cert
            .map(|root| rustls_connector(root, tls.client_cert, tls.client_key))
            .transpose()?;
        Ok(Self { config, tls })
    }
}

#[async_trait]
impl ManageConnection for PgConnectionManager {
    type Connection = AsyncPgConnection;
    type Error = anyhow::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let conn = match &self.tls {
            None => {
                let (client, connection) = self.config.connect(NoTls).await?;
                AsyncPgConnection::try_from_client_and_connection(client, connection).await
            }
            Some(connector) => {
                let (client, connection) = self.config.connect(connector.clone()).await?;
                AsyncPgConnection::try_from_client_and_connection(client, connection).await
            }
        };
        conn.map_err(|err| anyhow::anyhow!(err))
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.batch_execute("SELECT 1").await?;
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

fn rustls_connector(
    root_cert: &str,
    client_cert: Option<&str>,
    client_key: Option<&str>,
) -> Result<MakeRustlsConnect> {
    let mut roots = RootCertStore::empty();
    for cert in read_certs(root_cert).context("failed to read PGSSLROOTCERT")? {
        roots
            .add(cert)
            .map_err(|_| anyhow::anyhow!("invalid certificate in PGSSLROOTCERT"))?;
    }

    let builder = ClientConfig::builder().with_root_certificates(roots);
    let config = match (client_cert, client_key) {
        (None, None) => builder.with_no_client_auth(),
        (Some(cert), Some(key)) => {
            let chain = read_certs(cert).context("failed to read PGSSLCERT")?;
            if chain.is_empty() {
                anyhow::bail!("PGSSLCERT contained no certificates");
            }
            builder
                .with_client_auth_cert(chain, read_key(key)?)
                .context("failed to build client TLS config")?
        }
        _ => anyhow::bail!("PGSSLCERT and PGSSLKEY must both be set (or neither)"),
    };

    Ok(MakeRustlsConnect::new(config))
}

fn open(path: &str) -> Result<BufReader<File>> {
    let file = File::open(Path::new(path)).with_context(|| format!("failed to open '{path}'"))?;
    Ok(BufReader::new(file))
}

fn read_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open(path)?;
    rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse certificates in '{path}'"))
}

fn read_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .context("failed to parse PGSSLKEY")?
        .context("PGSSLKEY contained no private keys")
}
