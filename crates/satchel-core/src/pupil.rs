//! Pupil records and their update semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pupil on the register. `form_id` is null until the pupil is assigned
/// to a homeroom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pupil {
  pub pupil_id:   Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<Uuid>,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A pupil row as it appears in listings, with the form name joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PupilSummary {
  pub pupil_id:   Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<Uuid>,
  pub form_name:  Option<String>,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::SchoolStore::add_pupil`].
/// `pupil_id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPupil {
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<Uuid>,
  pub notes:      Option<String>,
}

/// Partial update for a pupil. `None` means "keep the stored value";
/// the nested options carry an explicit null (`Some(None)`) to clear
/// `form_id` or `notes`.
#[derive(Debug, Clone, Default)]
pub struct PupilUpdate {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub form_id:    Option<Option<Uuid>>,
  pub notes:      Option<Option<String>>,
}
