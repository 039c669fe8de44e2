//! HTTP browse server for mongoview.
//!
//! Exposes read-only routes for listing collections, paging document ids, and
//! fetching a single document. Each request runs its query under a fresh
//! deadline; failures come back as plain-text bodies.

mod error;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use mongoview_core::control::{BrowseControlPlane, DEFAULT_QUERY_TIMEOUT, Deadline};
use mongoview_core::services::StoreHandle;
use mongoview_core::store::DocumentStore;
use mongoview_store::{CollectionListing, DocumentIdListing, DocumentView};
use serde::Deserialize;
use tracing::info;

pub use error::{ApiError, Route};

/// Configuration for the browse HTTP server.
#[derive(Debug, Clone)]
pub struct BrowseServerConfig {
    pub addr: SocketAddr,
    pub request_timeout: Duration,
}

impl BrowseServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            request_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// HTTP browse server wrapper.
pub struct BrowseServer<S: DocumentStore> {
    config: BrowseServerConfig,
    state: AppState<S>,
}

impl<S: DocumentStore> BrowseServer<S> {
    #[must_use]
    pub fn new(handle: &StoreHandle<S>, config: BrowseServerConfig) -> Self {
        let state = AppState {
            control: handle.control(),
            request_timeout: config.request_timeout,
        };
        Self { config, state }
    }
}

impl<S> BrowseServer<S>
where
    S: DocumentStore + 'static,
{
    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let database = self.state.control.database_name().to_string();
        let app = router(self.state);

        info!(%database, "mongoview listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

struct AppState<S: DocumentStore> {
    control: BrowseControlPlane<S>,
    request_timeout: Duration,
}

impl<S: DocumentStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CollectionQuery {
    name: Option<String>,
    skip: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentQuery {
    collection: Option<String>,
    id: Option<String>,
}

/// Builds the browse router over `handle`, bounding every query by `request_timeout`.
#[must_use]
pub fn build_router<S>(handle: &StoreHandle<S>, request_timeout: Duration) -> Router
where
    S: DocumentStore + 'static,
{
    router(AppState {
        control: handle.control(),
        request_timeout,
    })
}

fn router<S>(state: AppState<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/", get(list_collections::<S>))
        .route("/collection", get(list_document_ids::<S>))
        .route("/document", get(get_document::<S>))
        .with_state(state)
}

async fn list_collections<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<CollectionListing>, ApiError>
where
    S: DocumentStore + 'static,
{
    let listing = state
        .control
        .list_collections(state.deadline())
        .await
        .map_err(|err| ApiError::from_control(Route::Index, err))?;
    Ok(Json(listing))
}

async fn list_document_ids<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<DocumentIdListing>, ApiError>
where
    S: DocumentStore + 'static,
{
    let name = query.name.unwrap_or_default();
    let listing = state
        .control
        .list_document_ids(&name, query.skip.as_deref(), state.deadline())
        .await
        .map_err(|err| ApiError::from_control(Route::Collection, err))?;
    Ok(Json(listing))
}

async fn get_document<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<DocumentView>, ApiError>
where
    S: DocumentStore + 'static,
{
    let collection = query.collection.unwrap_or_default();
    let id = query.id.unwrap_or_default();
    let view = state
        .control
        .get_document(&collection, &id, state.deadline())
        .await
        .map_err(|err| ApiError::from_control(Route::Document, err))?;
    Ok(Json(view))
}
