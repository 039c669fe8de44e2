use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::StreamExt;
use futures::stream;
use mongoview_store::DocumentId;
use mongoview_store::schema::ID_FIELD;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, StoreResult, StoreStream};

/// In-process store used in place of a live server.
///
/// Collections keep insertion order, which stands in for the server's natural
/// order. Latency and failures can be injected to exercise deadlines and error
/// paths.
#[derive(Clone)]
pub struct MemoryDocStore {
    shared: Arc<Shared>,
    latency: Option<Duration>,
    failure: Option<String>,
    stream_failure_after: Option<usize>,
}

struct Shared {
    database: String,
    collections: RwLock<Vec<(String, Vec<Document>)>>,
    queries: AtomicUsize,
}

impl MemoryDocStore {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                database: database.into(),
                collections: RwLock::new(Vec::new()),
                queries: AtomicUsize::new(0),
            }),
            latency: None,
            failure: None,
            stream_failure_after: None,
        }
    }

    /// Delays every query by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fails every query with `message`.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Makes every returned stream error after yielding `items` entries.
    #[must_use]
    pub const fn with_stream_failure_after(mut self, items: usize) -> Self {
        self.stream_failure_after = Some(items);
        self
    }

    /// Creates an empty collection if it does not exist yet.
    pub async fn create_collection(&self, name: &str) {
        let mut collections = self.shared.collections.write().await;
        if !collections.iter().any(|(existing, _)| existing == name) {
            collections.push((name.to_string(), Vec::new()));
        }
    }

    /// Appends a document to `collection`, creating the collection if needed.
    pub async fn insert_document(&self, collection: &str, document: Document) {
        let mut collections = self.shared.collections.write().await;
        if !collections.iter().any(|(name, _)| name == collection) {
            collections.push((collection.to_string(), Vec::new()));
        }
        if let Some((_, documents)) = collections.iter_mut().find(|(name, _)| name == collection) {
            documents.push(document);
        }
    }

    /// Number of store queries issued so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.shared.queries.load(Ordering::SeqCst)
    }

    async fn begin(&self) -> StoreResult<()> {
        self.shared.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = self.failure.as_ref() {
            return Err(StoreError::Backend(message.clone()));
        }
        Ok(())
    }

    async fn documents(&self, collection: &str) -> Vec<Document> {
        let collections = self.shared.collections.read().await;
        collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, documents)| documents.clone())
            .unwrap_or_default()
    }

    fn stream_of<T: Send + 'static>(&self, items: Vec<T>) -> StoreStream<T> {
        let limit = self.stream_failure_after.unwrap_or(usize::MAX);
        let interrupted = limit < items.len();
        let mut results: Vec<StoreResult<T>> = items.into_iter().take(limit).map(Ok).collect();
        if interrupted {
            results.push(Err(StoreError::Backend("cursor interrupted".to_string())));
        }
        stream::iter(results).boxed()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocStore {
    fn database_name(&self) -> &str {
        &self.shared.database
    }

    async fn ping(&self) -> StoreResult<()> {
        self.begin().await
    }

    async fn list_collection_names(&self) -> StoreResult<StoreStream<String>> {
        self.begin().await?;
        let names = {
            let collections = self.shared.collections.read().await;
            collections.iter().map(|(name, _)| name.clone()).collect()
        };
        Ok(self.stream_of(names))
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<u64> {
        self.begin().await?;
        let count = self.documents(collection).await.len();
        u64::try_from(count).map_err(|_| StoreError::Backend("count overflow".to_string()))
    }

    async fn find_ids(&self, collection: &str, skip: u64) -> StoreResult<StoreStream<Bson>> {
        self.begin().await?;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let ids = self
            .documents(collection)
            .await
            .into_iter()
            .skip(skip)
            .map(|document| document.get(ID_FIELD).cloned().unwrap_or(Bson::Null))
            .collect();
        Ok(self.stream_of(ids))
    }

    async fn find_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        self.begin().await?;
        let target = Bson::ObjectId(id.oid());
        Ok(self
            .documents(collection)
            .await
            .into_iter()
            .find(|document| document.get(ID_FIELD) == Some(&target)))
    }
}
