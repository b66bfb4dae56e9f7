//! Handlers for `/pupil-categories` — category assignment, need overrides,
//! and the effective-needs resolution endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/pupil-categories/:pupilId/effective-needs` | Resolver output |
//! | `GET`    | `/pupil-categories/:pupilId/categories` | Assigned categories |
//! | `POST`   | `/pupil-categories/assign-category` | 409 on duplicates |
//! | `DELETE` | `/pupil-categories/:pupilId/categories/:categoryId` | |
//! | `GET`    | `/pupil-categories/:pupilId/need-overrides` | Newest first |
//! | `POST`   | `/pupil-categories/need-override` | 409 if the pair is already overridden |
//! | `PUT`    | `/pupil-categories/need-override/:overrideId` | Edit type/notes |
//! | `DELETE` | `/pupil-categories/need-override/:overrideId` | 404 if absent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  category::Category,
  overrides::{NewOverride, PupilNeedOverride},
  resolve::EffectiveNeed,
  store::SchoolStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Effective needs ─────────────────────────────────────────────────────────

/// `GET /pupil-categories/:pupilId/effective-needs`
///
/// Recomputed from current data on every call. An unknown pupil yields an
/// empty array rather than a 404 — existence checks belong to the profile
/// and by-id endpoints.
pub async fn effective_needs<S>(
  State(store): State<Arc<S>>,
  Path(pupil_id): Path<Uuid>,
) -> Result<Json<Vec<EffectiveNeed>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.effective_needs(pupil_id).await?))
}

// ─── Category assignment ─────────────────────────────────────────────────────

/// `GET /pupil-categories/:pupilId/categories`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(pupil_id): Path<Uuid>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.pupil_categories(pupil_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub pupil_id:    Uuid,
  pub category_id: Uuid,
}

/// `POST /pupil-categories/assign-category`
pub async fn assign<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<AssignBody>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store
    .assign_category(body.pupil_id, body.category_id)
    .await?;
  Ok(StatusCode::CREATED)
}

/// `DELETE /pupil-categories/:pupilId/categories/:categoryId`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path((pupil_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.remove_category(pupil_id, category_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Need overrides ──────────────────────────────────────────────────────────

/// `GET /pupil-categories/:pupilId/need-overrides`
pub async fn list_overrides<S>(
  State(store): State<Arc<S>>,
  Path(pupil_id): Path<Uuid>,
) -> Result<Json<Vec<PupilNeedOverride>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_overrides(pupil_id).await?))
}

/// `POST /pupil-categories/need-override` — body is a [`NewOverride`];
/// returns 201 + the stored row.
pub async fn add_override<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewOverride>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  let record = store.add_override(body).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOverrideBody {
  pub is_added: bool,
  pub notes:    Option<String>,
}

/// `PUT /pupil-categories/need-override/:overrideId`
pub async fn update_override<S>(
  State(store): State<Arc<S>>,
  Path(override_id): Path<Uuid>,
  Json(body): Json<UpdateOverrideBody>,
) -> Result<Json<PupilNeedOverride>, ApiError>
where
  S: SchoolStore,
{
  let record = store
    .update_override(override_id, body.is_added, body.notes)
    .await?;
  Ok(Json(record))
}

/// `DELETE /pupil-categories/need-override/:overrideId`
pub async fn remove_override<S>(
  State(store): State<Arc<S>>,
  Path(override_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.remove_override(override_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
