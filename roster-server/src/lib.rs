//! roster-server: HTTP API over the student record store
//!
//! Routes:
//! - `POST   /students`       create, 201 `{id, message}`
//! - `GET    /students`       list every record
//! - `GET    /students/{id}`  fetch one, 404 when missing
//! - `PUT    /students/{id}`  merge submitted fields
//! - `DELETE /students/{id}`  delete (idempotent)
//! - `GET    /test`           store connectivity probe
//! - `GET    /health`         liveness

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, CorsPolicy, ServerConfig, ServerError};
