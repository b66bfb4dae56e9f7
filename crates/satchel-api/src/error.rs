//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// Map the domain taxonomy onto HTTP status classes: missing rows are 404,
/// duplicate/in-use writes are 409, backend failures are 500.
impl From<satchel_core::Error> for ApiError {
  fn from(e: satchel_core::Error) -> Self {
    use satchel_core::Error as E;
    match &e {
      E::PupilNotFound(_)
      | E::NoPupilMatch(_)
      | E::FormNotFound(_)
      | E::NeedNotFound(_)
      | E::CategoryNotFound(_)
      | E::DeviceNotFound(_)
      | E::OverrideNotFound(_)
      | E::CategoryNotAssigned { .. }
      | E::NeedNotInCategory { .. }
      | E::DeviceNotAssigned { .. } => Self::NotFound(e.to_string()),

      E::CategoryAlreadyAssigned { .. }
      | E::NeedAlreadyInCategory { .. }
      | E::NeedAlreadyOverridden { .. }
      | E::DeviceAlreadyAssigned { .. }
      | E::NeedInUse(_)
      | E::CategoryInUse(_)
      | E::DeviceInUse(_) => Self::Conflict(e.to_string()),

      E::Storage(_) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
