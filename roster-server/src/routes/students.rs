//! Student endpoints
//!
//! Each handler makes exactly one store call and maps its outcome straight
//! to a response.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use roster_store::Record;

use crate::error::ApiError;
use crate::extractors::JsonObject;
use crate::server::AppState;

pub const CREATED_MESSAGE: &str = "Student created successfully";
pub const UPDATED_MESSAGE: &str = "Student updated successfully";
pub const DELETED_MESSAGE: &str = "Student deleted successfully";

/// Create response
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
    pub message: &'static str,
}

/// POST /students - store the body verbatim under a new id
async fn create_student(
    State(state): State<Arc<AppState>>,
    JsonObject(fields): JsonObject,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .students
        .add(fields)
        .await
        .map_err(ApiError::store("Error creating student"))?;

    tracing::info!(%id, "student created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: CREATED_MESSAGE,
        }),
    ))
}

/// GET /students - every record, unfiltered and unpaginated
async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let records = state
        .students
        .list()
        .await
        .map_err(ApiError::store("Error fetching students"))?;

    Ok(Json(records))
}

/// GET /students/{id}
async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let record = state
        .students
        .get(&id)
        .await
        .map_err(ApiError::store("Error fetching student"))?;

    Ok(Json(record))
}

/// PUT /students/{id} - overwrite the submitted fields only
async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonObject(fields): JsonObject,
) -> Result<&'static str, ApiError> {
    state
        .students
        .update(&id, fields)
        .await
        .map_err(ApiError::store("Error updating student"))?;

    Ok(UPDATED_MESSAGE)
}

/// DELETE /students/{id} - succeeds whether or not the id existed
async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<&'static str, ApiError> {
    state
        .students
        .delete(&id)
        .await
        .map_err(ApiError::store("Error deleting student"))?;

    Ok(DELETED_MESSAGE)
}

/// Student routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}
