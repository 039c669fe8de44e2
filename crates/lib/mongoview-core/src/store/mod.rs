//! Store interfaces and `MongoDB` implementation.
//!
//! The store layer exposes the handful of read-only queries the browse pipeline
//! needs. Result sequences are returned as owned streams so the caller decides
//! how far to consume them; dropping a stream releases its cursor.

use std::{error::Error, fmt};

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use mongoview_store::DocumentId;

pub mod memory;
pub mod mongo;

pub use memory::MemoryDocStore;
pub use mongo::MongoDocStore;

#[derive(Debug)]
pub enum StoreError {
    Mongo(Box<mongodb::error::Error>),
    Backend(String),
    NotFound { collection: String, id: DocumentId },
    UnsupportedIdType(String),
    Encode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mongo(err) => write!(f, "MongoDB error: {err}"),
            Self::Backend(message) => write!(f, "store error: {message}"),
            Self::NotFound { collection, id } => {
                write!(f, "no document {id} in collection {collection}")
            }
            Self::UnsupportedIdType(kind) => write!(f, "unsupported ID type {kind}"),
            Self::Encode(message) => write!(f, "failed to encode document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mongo(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Mongo(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lazy result sequence owned by the caller.
pub type StoreStream<T> = BoxStream<'static, StoreResult<T>>;

/// Read-only access to one database of a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store is bound to.
    fn database_name(&self) -> &str;

    /// Round-trips a liveness check to the server.
    async fn ping(&self) -> StoreResult<()>;

    /// Enumerates collection names in store order.
    async fn list_collection_names(&self) -> StoreResult<StoreStream<String>>;

    /// Counts every document in `collection`.
    async fn count_documents(&self, collection: &str) -> StoreResult<u64>;

    /// Streams the raw `_id` of every document from `skip` onward, unsorted.
    ///
    /// A document with no `_id` yields `Bson::Null`.
    async fn find_ids(&self, collection: &str, skip: u64) -> StoreResult<StoreStream<Bson>>;

    /// Fetches the document whose `_id` equals `id`.
    async fn find_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>>;
}
