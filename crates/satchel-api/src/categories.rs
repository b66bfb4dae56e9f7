//! Handlers for `/categories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/categories` | All categories, ordered by name |
//! | `POST`   | `/categories` | 201 + stored category |
//! | `GET`    | `/categories/:id` | 404 if not found |
//! | `PUT`    | `/categories/:id` | Replace descriptive fields |
//! | `DELETE` | `/categories/:id` | 409 while still referenced |
//! | `GET`    | `/categories/:id/needs` | Needs belonging to the category |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  category::{Category, NewCategory},
  need::Need,
  store::SchoolStore,
};
use uuid::Uuid;

use crate::error::ApiError;

fn validate(input: &NewCategory) -> Result<(), ApiError> {
  if input.category_name.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "category name must not be blank".into(),
    ));
  }
  Ok(())
}

/// `GET /categories`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_categories().await?))
}

/// `POST /categories` — body is a [`NewCategory`]; returns 201.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  let category = store.add_category(body).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /categories/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError>
where
  S: SchoolStore,
{
  let category = store
    .get_category(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))?;
  Ok(Json(category))
}

/// `PUT /categories/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewCategory>,
) -> Result<Json<Category>, ApiError>
where
  S: SchoolStore,
{
  validate(&body)?;
  Ok(Json(store.update_category(id, body).await?))
}

/// `DELETE /categories/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SchoolStore,
{
  store.delete_category(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /categories/:id/needs`
pub async fn needs<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Need>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.category_needs(id).await?))
}
