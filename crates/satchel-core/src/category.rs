//! Category — a grouping of needs, assignable to a pupil as a shorthand
//! for "grant all needs in this group".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub category_id:   Uuid,
  pub category_name: String,
  pub description:   Option<String>,
}

/// Input to [`crate::store::SchoolStore::add_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub category_name: String,
  pub description:   Option<String>,
}
