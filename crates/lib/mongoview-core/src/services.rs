use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mongoview_store::schema::{DEFAULT_DATABASE, DEFAULT_MONGODB_URL};
use tracing::{info, warn};

use crate::control::BrowseControlPlane;
use crate::store::{DocumentStore, MongoDocStore, StoreError, StoreResult};

/// Connection settings applied once at startup.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub url: String,
    pub database: String,
    pub connect_timeout: Duration,
    pub ping_timeout: Duration,
    pub attempts: u32,
    pub retry_backoff: Duration,
}

impl StoreSettings {
    #[must_use]
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            connect_timeout: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(10),
            attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub const fn with_ping_timeout(mut self, ping_timeout: Duration) -> Self {
        self.ping_timeout = ping_timeout;
        self
    }

    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MONGODB_URL, DEFAULT_DATABASE)
    }
}

/// Startup failure. The process must not serve requests after one of these.
#[derive(Debug)]
pub enum ConnectError {
    InvalidSetting(&'static str),
    Connect(StoreError),
    ConnectTimeout(Duration),
    Ping(StoreError),
    PingTimeout(Duration),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting(name) => write!(f, "invalid store setting: {name} is required"),
            Self::Connect(err) => write!(f, "failed to connect to database: {err}"),
            Self::ConnectTimeout(limit) => {
                write!(f, "connecting to database timed out after {limit:?}")
            }
            Self::Ping(err) => write!(f, "failed to ping database: {err}"),
            Self::PingTimeout(limit) => write!(f, "pinging database timed out after {limit:?}"),
        }
    }
}

impl Error for ConnectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) | Self::Ping(err) => Some(err),
            _ => None,
        }
    }
}

/// Process-wide handle to the bound database, shared by every request.
pub struct StoreHandle<S: DocumentStore> {
    control: BrowseControlPlane<S>,
}

impl<S: DocumentStore> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
        }
    }
}

impl<S: DocumentStore> StoreHandle<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    #[must_use]
    pub const fn from_arc(store: Arc<S>) -> Self {
        Self {
            control: BrowseControlPlane::from_arc(store),
        }
    }

    #[must_use]
    pub fn store(&self) -> Arc<S> {
        self.control.store().clone()
    }

    #[must_use]
    pub fn control(&self) -> BrowseControlPlane<S> {
        self.control.clone()
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        self.control.database_name()
    }

    /// Builds a store with `connect` and proves it is alive with a ping.
    ///
    /// Each attempt bounds the connect phase by `connect_timeout` and the ping
    /// phase by `ping_timeout`. Failed attempts are retried after
    /// `retry_backoff` until `attempts` is exhausted; the last error is
    /// returned.
    ///
    /// # Errors
    /// Returns `ConnectError` if the settings are incomplete or every attempt fails.
    pub async fn initialize<F, Fut>(settings: &StoreSettings, connect: F) -> Result<Self, ConnectError>
    where
        F: Fn(StoreSettings) -> Fut + Sync,
        Fut: Future<Output = StoreResult<S>> + Send,
    {
        if settings.url.trim().is_empty() {
            return Err(ConnectError::InvalidSetting("connection URL"));
        }
        if settings.database.trim().is_empty() {
            return Err(ConnectError::InvalidSetting("database name"));
        }

        info!(database = %settings.database, "using database");
        let attempts = settings.attempts.max(1);
        let mut attempt = 1;
        loop {
            match Self::try_initialize(settings, &connect).await {
                Ok(handle) => return Ok(handle),
                Err(err) if attempt < attempts => {
                    warn!(attempt, attempts, error = %err, "database not ready, retrying");
                    tokio::time::sleep(settings.retry_backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_initialize<F, Fut>(settings: &StoreSettings, connect: &F) -> Result<Self, ConnectError>
    where
        F: Fn(StoreSettings) -> Fut + Sync,
        Fut: Future<Output = StoreResult<S>> + Send,
    {
        info!("connecting to database");
        let store = tokio::time::timeout(settings.connect_timeout, connect(settings.clone()))
            .await
            .map_err(|_| ConnectError::ConnectTimeout(settings.connect_timeout))?
            .map_err(ConnectError::Connect)?;

        info!("pinging database");
        tokio::time::timeout(settings.ping_timeout, store.ping())
            .await
            .map_err(|_| ConnectError::PingTimeout(settings.ping_timeout))?
            .map_err(ConnectError::Ping)?;

        Ok(Self::new(store))
    }
}

impl StoreHandle<MongoDocStore> {
    /// Connects to `MongoDB` using `settings`.
    ///
    /// # Errors
    /// Returns `ConnectError` if the server cannot be reached within the configured bounds.
    pub async fn connect_mongo(settings: &StoreSettings) -> Result<Self, ConnectError> {
        Self::initialize(settings, |settings| async move {
            MongoDocStore::connect(&settings.url, &settings.database, settings.connect_timeout)
                .await
        })
        .await
    }
}
