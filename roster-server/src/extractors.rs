//! Custom Axum extractors

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;

use roster_store::Fields;

use crate::error::{ApiError, BAD_REQUEST_MESSAGE};

/// Request body that must be a JSON object.
///
/// Wrong content type, malformed JSON and non-object values are all
/// rejected with a 400 in the API's error shape. A body that could not be
/// read at all (over the size limit, aborted upload) keeps axum's status.
pub struct JsonObject(pub Fields);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(fields) = Json::<Fields>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::BytesRejection(_) => ApiError::Rejected {
                    status: rejection.status(),
                    error: BAD_REQUEST_MESSAGE,
                    details: rejection.body_text(),
                },
                _ => ApiError::BadRequest {
                    details: rejection.body_text(),
                },
            })?;

        Ok(Self(fields))
    }
}
