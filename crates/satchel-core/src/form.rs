//! Form — a homeroom/class grouping for pupils.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A homeroom group. Pupils reference a form through their nullable
/// `form_id`; the form does not own its pupils.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
  pub form_id:      Uuid,
  pub form_name:    String,
  pub form_year:    i32,
  pub teacher_name: String,
}

/// Input to [`crate::store::SchoolStore::add_form`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewForm {
  pub form_name:    String,
  pub form_year:    i32,
  pub teacher_name: String,
}
