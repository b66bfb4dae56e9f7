//! Error types for `satchel-core`.
//!
//! One vocabulary for the whole domain: stores raise these, the HTTP layer
//! translates them to status codes. Backend-specific failures are folded
//! into [`Error::Storage`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  // ── Missing rows ──────────────────────────────────────────────────────

  #[error("pupil not found: {0}")]
  PupilNotFound(Uuid),

  #[error("no pupil matching name {0:?}")]
  NoPupilMatch(String),

  #[error("form not found: {0}")]
  FormNotFound(Uuid),

  #[error("need not found: {0}")]
  NeedNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("device not found: {0}")]
  DeviceNotFound(Uuid),

  #[error("need override not found: {0}")]
  OverrideNotFound(Uuid),

  #[error("category {category_id} is not assigned to pupil {pupil_id}")]
  CategoryNotAssigned { pupil_id: Uuid, category_id: Uuid },

  #[error("need {need_id} is not a member of category {category_id}")]
  NeedNotInCategory { category_id: Uuid, need_id: Uuid },

  #[error("device {device_id} is not assigned to need {need_id}")]
  DeviceNotAssigned { need_id: Uuid, device_id: Uuid },

  // ── Conflicts ─────────────────────────────────────────────────────────

  #[error("category {category_id} is already assigned to pupil {pupil_id}")]
  CategoryAlreadyAssigned { pupil_id: Uuid, category_id: Uuid },

  #[error("need {need_id} is already a member of category {category_id}")]
  NeedAlreadyInCategory { category_id: Uuid, need_id: Uuid },

  /// At most one override may exist per (pupil, need) pair.
  #[error("pupil {pupil_id} already has an override for need {need_id}")]
  NeedAlreadyOverridden { pupil_id: Uuid, need_id: Uuid },

  #[error("device {device_id} is already assigned to need {need_id}")]
  DeviceAlreadyAssigned { need_id: Uuid, device_id: Uuid },

  #[error("need {0} is still referenced and cannot be deleted")]
  NeedInUse(Uuid),

  #[error("category {0} is still referenced and cannot be deleted")]
  CategoryInUse(Uuid),

  #[error("device {0} is still assigned to a need and cannot be deleted")]
  DeviceInUse(Uuid),

  // ── Backend ───────────────────────────────────────────────────────────

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
