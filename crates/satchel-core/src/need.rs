//! Need — a support requirement a pupil may have.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A support requirement, e.g. "requires large-print materials".
/// Identity is immutable; the descriptive fields are administrator-editable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Need {
  pub need_id:           Uuid,
  pub name:              String,
  pub short_description: Option<String>,
  pub description:       Option<String>,
}

/// Input to [`crate::store::SchoolStore::add_need`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewNeed {
  pub name:              String,
  pub short_description: Option<String>,
  pub description:       Option<String>,
}
