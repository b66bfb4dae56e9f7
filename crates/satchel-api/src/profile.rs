//! Handler for `GET /pupils/profile` — the aggregated profile view.
//!
//! The pupil is selected either by exact `pupil_id` or by a fuzzy `name`
//! match (first hit wins). The composition itself lives in
//! [`satchel_core::profile::build_profile`].

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use satchel_core::{
  profile::{PupilProfile, PupilSelector, build_profile},
  store::SchoolStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ProfileParams {
  pub pupil_id: Option<Uuid>,
  pub name:     Option<String>,
}

/// `GET /pupils/profile?pupil_id=<id>` or `?name=<substring>`
pub async fn get_profile<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ProfileParams>,
) -> Result<Json<PupilProfile>, ApiError>
where
  S: SchoolStore,
{
  let selector = match (params.pupil_id, params.name) {
    (Some(id), _) => PupilSelector::ById(id),
    (None, Some(name)) if !name.trim().is_empty() => {
      PupilSelector::ByName(name)
    }
    _ => {
      return Err(ApiError::BadRequest("pupil_id or name is required".into()));
    }
  };

  let profile = build_profile(store.as_ref(), selector).await?;
  Ok(Json(profile))
}
