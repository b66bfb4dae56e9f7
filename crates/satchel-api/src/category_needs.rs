//! Handlers for the category↔need membership edges.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/category-needs` | Body: `{category_id, need_id}`; 409 on duplicates |
//! | `DELETE` | `/category-needs/:categoryId/:needId` | 404 if the pair is absent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use satchel_core::store::SchoolStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MembershipBody {
  pub category_id: Uuid,
  pub need_id:     Uuid,
}

/// `POST /category-needs`
pub async fn add<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<MembershipBody>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store
    .add_need_to_category(body.category_id, body.need_id)
    .await?;
  Ok(StatusCode::CREATED)
}

/// `DELETE /category-needs/:categoryId/:needId`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path((category_id, need_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store
    .remove_need_from_category(category_id, need_id)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
