use std::{error::Error, fmt, sync::Arc, time::Duration};

use crate::store::{DocumentStore, StoreError};

pub mod browse;
pub mod deadline;

pub use deadline::Deadline;

/// Default time budget for a single browse query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store step that failed, used to phrase the caller-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    ListCollections,
    CountDocuments,
    QueryDocuments,
    DecodeDocument,
    EncodeDocument,
}

impl StoreAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListCollections => "list collections",
            Self::CountDocuments => "count documents",
            Self::QueryDocuments => "query documents",
            Self::DecodeDocument => "decode document",
            Self::EncodeDocument => "encode document",
        }
    }
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum ControlError {
    Validation(String),
    Store {
        action: StoreAction,
        source: StoreError,
    },
    Timeout,
}

impl ControlError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) const fn store(action: StoreAction, source: StoreError) -> Self {
        Self::Store { action, source }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::Store { action, source } => write!(f, "failed to {action}: {source}"),
            Self::Timeout => write!(f, "query deadline elapsed"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Browse operations bound to one store handle.
pub struct BrowseControlPlane<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> Clone for BrowseControlPlane<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: DocumentStore> BrowseControlPlane<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    #[must_use]
    pub const fn from_arc(store: Arc<S>) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        self.store.database_name()
    }
}
