//! Handlers for `/needs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/needs` | All needs, ordered by name |
//! | `POST`   | `/needs` | 201 + stored need |
//! | `GET`    | `/needs/:id` | 404 if not found |
//! | `PUT`    | `/needs/:id` | Replace descriptive fields |
//! | `DELETE` | `/needs/:id` | 409 while still referenced |
//! | `GET`    | `/needs/:id/categories` | Categories containing the need |
//! | `GET`    | `/needs/:id/devices` | Devices assigned to the need |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  category::Category,
  device::AssignedDevice,
  need::{Need, NewNeed},
  store::SchoolStore,
};
use uuid::Uuid;

use crate::error::ApiError;

fn validate(input: &NewNeed) -> Result<(), ApiError> {
  if input.name.trim().is_empty() {
    return Err(ApiError::BadRequest("need name must not be blank".into()));
  }
  Ok(())
}

/// `GET /needs`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Need>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_needs().await?))
}

/// `POST /needs` — body is a [`NewNeed`]; returns 201 + the stored need.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewNeed>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  let need = store.add_need(body).await?;
  Ok((StatusCode::CREATED, Json(need)))
}

/// `GET /needs/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Need>, ApiError>
where
  S: SchoolStore,
{
  let need = store
    .get_need(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("need {id} not found")))?;
  Ok(Json(need))
}

/// `PUT /needs/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewNeed>,
) -> Result<Json<Need>, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  Ok(Json(store.update_need(id, body).await?))
}

/// `DELETE /needs/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.delete_need(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /needs/:id/categories`
pub async fn categories<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.need_categories(id).await?))
}

/// `GET /needs/:id/devices`
pub async fn devices<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AssignedDevice>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.need_devices(id).await?))
}
