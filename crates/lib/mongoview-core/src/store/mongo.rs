use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use mongoview_store::DocumentId;
use mongoview_store::schema::ID_FIELD;

use super::{DocumentStore, StoreError, StoreResult, StoreStream};

const APP_NAME: &str = "mongoview";

/// `MongoDB`-backed store bound to a single database.
#[derive(Clone)]
pub struct MongoDocStore {
    db: Database,
}

impl MongoDocStore {
    /// Builds a client for `url` and binds it to `database`.
    ///
    /// The driver connects lazily, so this only validates the URL and applies
    /// `connect_timeout` to socket setup and server selection. Pair it with
    /// [`DocumentStore::ping`] to prove the server is reachable.
    ///
    /// # Errors
    /// Returns `StoreError` if the URL cannot be parsed or the client cannot be built.
    pub async fn connect(
        url: &str,
        database: &str,
        connect_timeout: Duration,
    ) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(connect_timeout);
        options.server_selection_timeout = Some(connect_timeout);
        let client = Client::with_options(options)?;
        Ok(Self::from_client(&client, database))
    }

    /// Binds an existing client to `database`.
    #[must_use]
    pub fn from_client(client: &Client, database: &str) -> Self {
        Self {
            db: client.database(database),
        }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoDocStore {
    fn database_name(&self) -> &str {
        self.db.name()
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn list_collection_names(&self) -> StoreResult<StoreStream<String>> {
        let cursor = self.db.list_collections().await?;
        Ok(cursor
            .map_ok(|spec| spec.name)
            .map_err(StoreError::from)
            .boxed())
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<u64> {
        let count = self.collection(collection).count_documents(doc! {}).await?;
        Ok(count)
    }

    async fn find_ids(&self, collection: &str, skip: u64) -> StoreResult<StoreStream<Bson>> {
        let cursor = self
            .collection(collection)
            .find(doc! {})
            .skip(skip)
            .projection(doc! { ID_FIELD: 1 })
            .await?;
        Ok(cursor
            .map_ok(|mut document| document.remove(ID_FIELD).unwrap_or(Bson::Null))
            .map_err(StoreError::from)
            .boxed())
    }

    async fn find_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        let record = self
            .collection(collection)
            .find_one(doc! { ID_FIELD: id.oid() })
            .await?;
        Ok(record)
    }
}
