//! Route modules, one router per resource

use axum::http::{Method, StatusCode, Uri};

use crate::error::ApiError;

pub mod health;
pub mod probe;
pub mod students;

/// Any path no router claims
pub async fn no_route(method: Method, uri: Uri) -> ApiError {
    ApiError::Rejected {
        status: StatusCode::NOT_FOUND,
        error: "Route not found",
        details: format!("no route for {method} {}", uri.path()),
    }
}

/// Known path, unsupported method
pub async fn wrong_method(method: Method, uri: Uri) -> ApiError {
    ApiError::Rejected {
        status: StatusCode::METHOD_NOT_ALLOWED,
        error: "Method not allowed",
        details: format!("{method} is not supported on {}", uri.path()),
    }
}
