//! Per-pupil need overrides — explicit exceptions to category inheritance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An explicit exception for one (pupil, need) pair.
///
/// `is_added = true` grants the need regardless of category membership;
/// `is_added = false` blocks it even when a category would grant it.
/// At most one override exists per (pupil, need) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PupilNeedOverride {
  pub override_id: Uuid,
  pub pupil_id:    Uuid,
  pub need_id:     Uuid,
  pub is_added:    bool,
  /// Free-text justification, e.g. "no longer needed after assessment".
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::SchoolStore::add_override`].
/// `override_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOverride {
  pub pupil_id: Uuid,
  pub need_id:  Uuid,
  pub is_added: bool,
  pub notes:    Option<String>,
}

/// An override joined with the need's display name, ordered by that name
/// on the profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideView {
  pub override_id: Uuid,
  pub pupil_id:    Uuid,
  pub need_id:     Uuid,
  pub need_name:   String,
  pub is_added:    bool,
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
}
