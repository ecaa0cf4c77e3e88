//! SQLite-backed share store
//!
//! The connection pool is opened lazily on first use. Initialization is
//! single-flight: callers arriving while an attempt is in flight await that
//! same attempt, so the schema is created once no matter how many requests
//! race at startup. A failed attempt is delivered to every waiter and the
//! store returns to the uninitialized state, so the next call retries.
//!
//! ```text
//! Uninitialized ──handle()──▶ Initializing ──ok──▶ Ready
//!       ▲                          │                 │
//!       └────────── err ───────────┘                 │
//!       └─────────────────── close() ────────────────┘
//! ```

use super::ShareRepository;
use crate::config::StoreConfig;
use crate::error::require_non_empty;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Table holding one envelope per identifier
pub const TABLE_NAME: &str = "key_shares";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS key_shares (
    identifier TEXT PRIMARY KEY NOT NULL,
    envelope TEXT NOT NULL
)";

const SELECT_SHARE_SQL: &str = "SELECT envelope FROM key_shares WHERE identifier = ?";

const UPSERT_SHARE_SQL: &str = "INSERT INTO key_shares (identifier, envelope) VALUES (?, ?)
    ON CONFLICT(identifier) DO UPDATE SET envelope = excluded.envelope";

type InitOutcome = std::result::Result<SqlitePool, Arc<sqlx::Error>>;
type InitAttempt = Shared<BoxFuture<'static, InitOutcome>>;

enum HandleState {
    Uninitialized,
    Initializing { number: usize, attempt: InitAttempt },
    Ready(SqlitePool),
}

impl HandleState {
    fn name(&self) -> &'static str {
        match self {
            HandleState::Uninitialized => "uninitialized",
            HandleState::Initializing { .. } => "initializing",
            HandleState::Ready(_) => "ready",
        }
    }
}

struct Inner {
    config: StoreConfig,
    state: Mutex<HandleState>,
    init_attempts: AtomicUsize,
}

/// Durable key share store. Cheap to clone (Arc internally).
///
/// Construct once at startup and hand clones to every workflow that reads or
/// writes shares.
#[derive(Clone)]
pub struct ShareStore {
    inner: Arc<Inner>,
}

impl ShareStore {
    /// Create a store for the configured database. Nothing is opened until
    /// the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(HandleState::Uninitialized),
                init_attempts: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Number of initialization attempts started over the store's lifetime
    pub fn init_attempts(&self) -> usize {
        self.inner.init_attempts.load(Ordering::SeqCst)
    }

    /// Whether the pool is currently open
    pub async fn is_ready(&self) -> bool {
        matches!(*self.inner.state.lock().await, HandleState::Ready(_))
    }

    /// Get the shared connection pool, opening it on first use
    pub async fn handle(&self) -> Result<SqlitePool> {
        let (number, attempt) = {
            let mut state = self.inner.state.lock().await;
            match &*state {
                HandleState::Ready(pool) => return Ok(pool.clone()),
                HandleState::Initializing { number, attempt } => (*number, attempt.clone()),
                HandleState::Uninitialized => {
                    let number = self.inner.init_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::debug!(
                        path = %self.inner.config.database_path.display(),
                        attempt = number,
                        "Initializing share store"
                    );
                    let attempt = open_pool(self.inner.config.clone()).boxed().shared();
                    *state = HandleState::Initializing {
                        number,
                        attempt: attempt.clone(),
                    };
                    (number, attempt)
                }
            }
        };

        let outcome = attempt.await;

        // Only the attempt that is still current may change state. A close()
        // during initialization abandons the attempt.
        let mut state = self.inner.state.lock().await;
        let is_current = matches!(
            &*state,
            HandleState::Initializing { number: current, .. } if *current == number
        );
        if is_current {
            *state = match &outcome {
                Ok(pool) => {
                    tracing::info!(
                        path = %self.inner.config.database_path.display(),
                        "Share store ready"
                    );
                    HandleState::Ready(pool.clone())
                }
                Err(e) => {
                    tracing::error!(
                        path = %self.inner.config.database_path.display(),
                        error = %e,
                        "Share store initialization failed"
                    );
                    HandleState::Uninitialized
                }
            };
        }
        drop(state);

        outcome.map_err(Error::Initialization)
    }

    /// Fetch the envelope stored for `identifier`
    ///
    /// Returns `Ok(None)` when no share has been stored for the identifier.
    pub async fn get_share(&self, identifier: &str) -> Result<Option<String>> {
        require_non_empty("identifier", identifier)?;
        let pool = self.handle().await?;

        let envelope = sqlx::query_scalar::<_, String>(SELECT_SHARE_SQL)
            .bind(identifier)
            .fetch_optional(&pool)
            .await
            .map_err(|e| {
                tracing::error!(identifier = %identifier, error = %e, "Failed to get key share");
                Error::Storage(e)
            })?;

        tracing::debug!(
            identifier = %identifier,
            found = envelope.is_some(),
            "Looked up key share"
        );
        Ok(envelope)
    }

    /// Insert or replace the envelope stored for `identifier`
    pub async fn set_share(&self, identifier: &str, envelope: &str) -> Result<()> {
        require_non_empty("identifier", identifier)?;
        require_non_empty("envelope", envelope)?;
        let pool = self.handle().await?;

        sqlx::query(UPSERT_SHARE_SQL)
            .bind(identifier)
            .bind(envelope)
            .execute(&pool)
            .await
            .map_err(|e| {
                tracing::error!(identifier = %identifier, error = %e, "Failed to set key share");
                Error::Storage(e)
            })?;

        tracing::info!(identifier = %identifier, "Stored key share");
        Ok(())
    }

    /// Close the pool. The next operation re-initializes from scratch.
    ///
    /// Closing a store that is not open is a no-op. An attempt still in
    /// flight is awaited and the pool it produces is closed as well, so its
    /// waiters receive a closed pool.
    pub async fn close(&self) {
        let previous = {
            let mut state = self.inner.state.lock().await;
            std::mem::replace(&mut *state, HandleState::Uninitialized)
        };

        match previous {
            HandleState::Ready(pool) => {
                pool.close().await;
                tracing::info!(
                    path = %self.inner.config.database_path.display(),
                    "Share store closed"
                );
            }
            HandleState::Initializing { attempt, .. } => {
                if let Ok(pool) = attempt.await {
                    pool.close().await;
                }
                tracing::info!(
                    path = %self.inner.config.database_path.display(),
                    "Share store closed during initialization"
                );
            }
            HandleState::Uninitialized => {}
        }
    }
}

async fn open_pool(config: StoreConfig) -> InitOutcome {
    let options = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(Arc::new)?;

    if let Err(e) = sqlx::query(CREATE_TABLE_SQL).execute(&pool).await {
        pool.close().await;
        return Err(Arc::new(e));
    }

    Ok(pool)
}

impl std::fmt::Debug for ShareStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner.state.try_lock() {
            Ok(state) => state.name(),
            Err(_) => "locked",
        };
        f.debug_struct("ShareStore")
            .field("database_path", &self.inner.config.database_path)
            .field("state", &state)
            .field("init_attempts", &self.init_attempts())
            .finish()
    }
}

#[async_trait]
impl ShareRepository for ShareStore {
    async fn get_share(&self, identifier: &str) -> Result<Option<String>> {
        ShareStore::get_share(self, identifier).await
    }

    async fn set_share(&self, identifier: &str, envelope: &str) -> Result<()> {
        ShareStore::set_share(self, identifier, envelope).await
    }
}
