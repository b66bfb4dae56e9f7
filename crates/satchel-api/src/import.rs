//! CSV bulk import of pupils.
//!
//! `POST /pupils/upload` accepts a multipart form with a `csvfile` field
//! containing columns `first_name,last_name,form_id,notes` (empty `form_id`
//! and `notes` cells become null).
//!
//! Rows are inserted sequentially and non-transactionally: a failure
//! partway through leaves previously-processed rows committed, and the
//! error reported carries the failing row number.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Multipart, State},
  http::StatusCode,
};
use satchel_core::{pupil::NewPupil, store::SchoolStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct CsvPupilRow {
  first_name: String,
  last_name:  String,
  form_id:    Option<Uuid>,
  notes:      Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub message: String,
  pub count:   usize,
}

/// `POST /pupils/upload` — multipart field `csvfile`.
pub async fn upload_csv<S>(
  State(store): State<Arc<S>>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError>
where
  S: SchoolStore,
{
  let mut csv_bytes = None;
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
  {
    if field.name() == Some("csvfile") {
      let bytes = field.bytes().await.map_err(|e| {
        ApiError::BadRequest(format!("failed to read upload: {e}"))
      })?;
      csv_bytes = Some(bytes);
      break;
    }
  }

  let csv_bytes = csv_bytes
    .ok_or_else(|| ApiError::BadRequest("no file uploaded".into()))?;

  let mut reader = csv::Reader::from_reader(csv_bytes.as_ref());
  let mut count = 0usize;

  for (index, row) in reader.deserialize::<CsvPupilRow>().enumerate() {
    // Data rows are 1-based, after the header line.
    let row_number = index + 1;
    let row = row.map_err(|e| {
      ApiError::BadRequest(format!("row {row_number}: malformed CSV: {e}"))
    })?;

    if row.first_name.trim().is_empty() || row.last_name.trim().is_empty() {
      return Err(ApiError::BadRequest(format!(
        "row {row_number}: first_name and last_name are required"
      )));
    }

    store
      .add_pupil(NewPupil {
        first_name: row.first_name,
        last_name:  row.last_name,
        form_id:    row.form_id,
        notes:      row.notes,
      })
      .await?;
    count += 1;
  }

  tracing::info!(count, "CSV pupil import complete");

  Ok((StatusCode::OK, Json(UploadResponse {
    message: "CSV upload successful".into(),
    count,
  })))
}
