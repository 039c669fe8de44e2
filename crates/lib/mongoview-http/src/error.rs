use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mongoview_core::control::ControlError;
use mongoview_core::store::StoreError;
use tracing::{error, warn};

/// Browse route a failure came from. Store failures map to different statuses per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Collection,
    Document,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Index => "/",
            Self::Collection => "/collection",
            Self::Document => "/document",
        }
    }

    // Listing failures are client errors; the other routes report server errors.
    const fn store_failure_status(self) -> StatusCode {
        match self {
            Self::Collection => StatusCode::BAD_REQUEST,
            Self::Index | Self::Document => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Status code plus the short message returned to the caller.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn timeout() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "request timed out".to_string(),
        }
    }

    /// Maps a query failure to a response, logging the detail that is withheld from the caller.
    #[must_use]
    pub fn from_control(route: Route, err: ControlError) -> Self {
        match err {
            ControlError::Validation(message) => Self::bad_request(message),
            ControlError::Timeout => {
                warn!(%route, "query deadline elapsed");
                Self::timeout()
            }
            ControlError::Store { action, source } => {
                let message = if matches!(source, StoreError::UnsupportedIdType(_)) {
                    source.to_string()
                } else {
                    format!("failed to {action}")
                };
                if matches!(source, StoreError::NotFound { .. }) {
                    warn!(%route, %action, error = %source, "document not found");
                } else {
                    error!(%route, %action, error = %source, "store query failed");
                }
                Self {
                    status: route.store_failure_status(),
                    message,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
