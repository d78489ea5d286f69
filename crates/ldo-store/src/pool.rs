//! Connection pooling

use crate::{StoreConfig, StoreError};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A connection borrowed from a [`ConnectionPool`], returned on drop
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// At most `max_connections` open SQLite connections
///
/// Every connection gets the configured busy timeout when it is opened.
/// [`get`](Self::get) waits up to the acquire timeout for a free connection.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    path: PathBuf,
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Open the database, failing if the first connection cannot be made
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let busy_timeout = config.busy_timeout();
        let manager = SqliteConnectionManager::file(&config.path)
            .with_init(move |conn| conn.busy_timeout(busy_timeout));

        let max_size = u32::try_from(config.max_connections.max(1))
            .map_err(|_| StoreError::InvalidData("max_connections is too large".to_string()))?;

        let inner = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(1))
            .connection_timeout(config.acquire_timeout())
            .build(manager)?;

        debug!(path = %config.path.display(), max_size, "Database opened");
        Ok(Self {
            path: config.path.clone(),
            inner,
        })
    }

    /// Database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Connections currently open, idle or borrowed
    pub fn open_connections(&self) -> u32 {
        self.inner.state().connections
    }

    /// Take a connection, waiting for one to come back when all are in use
    pub fn get(&self) -> Result<PooledConnection, StoreError> {
        Ok(self.inner.get()?)
    }
}
