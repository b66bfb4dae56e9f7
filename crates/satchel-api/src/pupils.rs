//! Handlers for `/pupils` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/pupils` | All pupils with form names, (last, first) order |
//! | `POST`   | `/pupils` | Body: [`CreatePupilBody`]; 201 + stored pupil |
//! | `GET`    | `/pupils/search` | `?term=` substring search, max 20 rows |
//! | `GET`    | `/pupils/:id` | 404 if not found |
//! | `PUT`    | `/pupils/:id` | Full update; names required |
//! | `PATCH`  | `/pupils/:id` | Partial update; `form_id: null` unassigns |
//! | `DELETE` | `/pupils/:id` | Cascades assignments and overrides |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  pupil::{NewPupil, Pupil, PupilSummary, PupilUpdate},
  store::SchoolStore,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::ApiError;

/// Distinguish an absent JSON field (`None`) from an explicit `null`
/// (`Some(None)`). Used with `#[serde(default)]`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

fn require_name(value: &str, field: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be blank")));
  }
  Ok(())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /pupils`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<PupilSummary>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_pupils().await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePupilBody {
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<Uuid>,
  pub notes:      Option<String>,
}

/// `POST /pupils` — returns 201 + the stored [`Pupil`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreatePupilBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  require_name(&body.first_name, "first_name")?;
  require_name(&body.last_name, "last_name")?;

  let pupil = store
    .add_pupil(NewPupil {
      first_name: body.first_name,
      last_name:  body.last_name,
      form_id:    body.form_id,
      notes:      body.notes,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(pupil)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /pupils/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Pupil>, ApiError>
where
  S: SchoolStore,
{
  let pupil = store
    .get_pupil(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("pupil {id} not found")))?;
  Ok(Json(pupil))
}

// ─── Full update ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdatePupilBody {
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<Uuid>,
  pub notes:      Option<String>,
}

/// `PUT /pupils/:id` — replaces every editable field.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdatePupilBody>,
) -> Result<Json<Pupil>, ApiError>
where
  S: SchoolStore,
{
  require_name(&body.first_name, "first_name")?;
  require_name(&body.last_name, "last_name")?;

  let pupil = store
    .update_pupil(id, PupilUpdate {
      first_name: Some(body.first_name),
      last_name:  Some(body.last_name),
      form_id:    Some(body.form_id),
      notes:      Some(body.notes),
    })
    .await?;
  Ok(Json(pupil))
}

// ─── Partial update ───────────────────────────────────────────────────────────

/// Body for `PATCH /pupils/:id`. Omitted fields keep their stored values;
/// `form_id` accepts an explicit `null` meaning "unassign form".
#[derive(Debug, Default, Deserialize)]
pub struct PatchPupilBody {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub form_id:    Option<Option<Uuid>>,
  pub notes:      Option<String>,
}

/// `PATCH /pupils/:id`
pub async fn update_partial<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PatchPupilBody>,
) -> Result<Json<Pupil>, ApiError>
where
  S: SchoolStore,
{
  if let Some(first_name) = &body.first_name {
    require_name(first_name, "first_name")?;
  }
  if let Some(last_name) = &body.last_name {
    require_name(last_name, "last_name")?;
  }

  let pupil = store
    .update_pupil(id, PupilUpdate {
      first_name: body.first_name,
      last_name:  body.last_name,
      form_id:    body.form_id,
      notes:      body.notes.map(Some),
    })
    .await?;
  Ok(Json(pupil))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /pupils/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.delete_pupil(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub term: Option<String>,
}

/// `GET /pupils/search?term=<substring>`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Pupil>>, ApiError>
where
  S: SchoolStore,
{
  let term = params
    .term
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| ApiError::BadRequest("search term is required".into()))?;

  Ok(Json(store.search_pupils(term).await?))
}
