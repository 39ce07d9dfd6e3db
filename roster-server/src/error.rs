//! API error type with IntoResponse
//!
//! Every failure renders as `{"error": <summary>, "details": <cause>}`.
//! Only "document does not exist" maps to 404; store faults are 500 with the
//! raw store error text in `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use roster_store::StoreError;

/// Summary used for every 404
pub const NOT_FOUND_MESSAGE: &str = "Student not found";

/// Summary used for rejected request bodies
pub const BAD_REQUEST_MESSAGE: &str = "Invalid request body";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No document with this id (404)
    NotFound { id: String },

    /// Body was not a JSON object (400)
    BadRequest { details: String },

    /// Refused before any handler ran: unknown route, wrong method,
    /// unreadable or oversized body
    Rejected {
        status: StatusCode,
        error: &'static str,
        details: String,
    },

    /// Any other store failure (500, logged)
    Store {
        context: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    /// Error mapper for a handler's store call.
    ///
    /// `context` is the summary shown in the `error` field on a 500.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::NotFound { id } => Self::NotFound { id },
            source => Self::Store { context, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::NotFound { id } => json!({
                "error": NOT_FOUND_MESSAGE,
                "details": format!("no student with id '{}'", id)
            }),
            Self::BadRequest { details } => json!({
                "error": BAD_REQUEST_MESSAGE,
                "details": details
            }),
            Self::Rejected { error, details, .. } => json!({
                "error": error,
                "details": details
            }),
            Self::Store { context, source } => {
                tracing::error!(error = %source, "{}", context);
                json!({
                    "error": context,
                    "details": source.to_string()
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
