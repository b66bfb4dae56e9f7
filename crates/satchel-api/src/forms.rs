//! Handlers for `/forms` endpoints. Forms are read-mostly; creation exists
//! for administration and seeding.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use satchel_core::{
  form::{Form, NewForm},
  store::SchoolStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /forms`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Form>>, ApiError>
where
  S: SchoolStore,
{
  Ok(Json(store.list_forms().await?))
}

/// `POST /forms` — body is a [`NewForm`]; returns 201.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore,
{
  if body.form_name.trim().is_empty() {
    return Err(ApiError::BadRequest("form name must not be blank".into()));
  }
  let form = store.add_form(body).await?;
  Ok((StatusCode::CREATED, Json(form)))
}

/// `GET /forms/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Form>, ApiError>
where
  S: SchoolStore,
{
  let form = store
    .get_form(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("form {id} not found")))?;
  Ok(Json(form))
}
