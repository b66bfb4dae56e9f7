//! Handlers for `/devices` and `/need-devices` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/devices` | All devices, ordered by name |
//! | `GET`    | `/devices/unassigned` | Devices not assigned to any need |
//! | `POST`   | `/devices` | 201 + stored device |
//! | `GET`    | `/devices/:id` | 404 if not found |
//! | `PUT`    | `/devices/:id` | Replace all fields |
//! | `DELETE` | `/devices/:id` | 409 while assigned to a need |
//! | `POST`   | `/need-devices` | Assign device to need; 409 on duplicates |
//! | `DELETE` | `/need-devices/:needId/:deviceId` | 404 if the pair is absent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  device::{Device, NeedDeviceAssignment, NewDevice},
  store::SchoolStore,
};
use uuid::Uuid;

use crate::error::ApiError;

fn validate(input: &NewDevice) -> Result<(), ApiError> {
  if input.name.trim().is_empty() {
    return Err(ApiError::BadRequest("device name must not be blank".into()));
  }
  Ok(())
}

/// `GET /devices`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_devices().await?))
}

/// `GET /devices/unassigned`
pub async fn unassigned<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.unassigned_devices().await?))
}

/// `POST /devices` — body is a [`NewDevice`]; returns 201.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDevice>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  let device = store.add_device(body).await?;
  Ok((StatusCode::CREATED, Json(device)))
}

/// `GET /devices/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Device>, ApiError>
where
  S: SchoolStore,
{
  let device = store
    .get_device(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("device {id} not found")))?;
  Ok(Json(device))
}

/// `PUT /devices/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewDevice>,
) -> Result<Json<Device>, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  Ok(Json(store.update_device(id, body).await?))
}

/// `DELETE /devices/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.delete_device(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /need-devices` — body is a [`NeedDeviceAssignment`]; returns 201
/// + the stored assignment.
pub async fn assign_to_need<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NeedDeviceAssignment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  let assignment = store.assign_device_to_need(body).await?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

/// `DELETE /need-devices/:needId/:deviceId`
pub async fn remove_from_need<S>(
  State(store): State<Arc<S>>,
  Path((need_id, device_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.remove_device_from_need(need_id, device_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
