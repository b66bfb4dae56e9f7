//! The `SchoolStore` trait — the persistence abstraction every other layer
//! builds on.
//!
//! Implemented by storage backends (e.g. `satchel-store-sqlite`). Higher
//! layers (`satchel-api`, the profile aggregator) depend on this
//! abstraction, not on any concrete backend.
//!
//! Unlike reads, every mutation validates the rows it references and fails
//! with the matching [`Error`](crate::Error) variant; list-style reads for
//! an unknown parent id return an empty sequence, mirroring the resolver's
//! contract. All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  category::{Category, NewCategory},
  device::{AssignedDevice, Device, NeedDeviceAssignment, NewDevice},
  form::{Form, NewForm},
  need::{Need, NewNeed},
  overrides::{NewOverride, OverrideView, PupilNeedOverride},
  pupil::{NewPupil, Pupil, PupilSummary, PupilUpdate},
  resolve::EffectiveNeed,
};

/// Abstraction over a Satchel storage backend.
pub trait SchoolStore: Send + Sync {
  // ── Forms ─────────────────────────────────────────────────────────────

  /// List all forms, ordered by form name.
  fn list_forms(&self) -> impl Future<Output = Result<Vec<Form>>> + Send + '_;

  /// Retrieve a form by id. Returns `None` if not found.
  fn get_form(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Form>>> + Send + '_;

  /// Create and persist a new form.
  fn add_form(
    &self,
    input: NewForm,
  ) -> impl Future<Output = Result<Form>> + Send + '_;

  // ── Pupils ────────────────────────────────────────────────────────────

  /// List all pupils with their form names, ordered by last then first
  /// name.
  fn list_pupils(
    &self,
  ) -> impl Future<Output = Result<Vec<PupilSummary>>> + Send + '_;

  /// Retrieve a pupil by id. Returns `None` if not found.
  fn get_pupil(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Pupil>>> + Send + '_;

  /// Create and persist a new pupil. Fails with `FormNotFound` if a form
  /// id is given but does not exist.
  fn add_pupil(
    &self,
    input: NewPupil,
  ) -> impl Future<Output = Result<Pupil>> + Send + '_;

  /// Apply a partial update; absent fields keep their stored values.
  /// `form_id: Some(None)` unassigns the form.
  fn update_pupil(
    &self,
    id: Uuid,
    update: PupilUpdate,
  ) -> impl Future<Output = Result<Pupil>> + Send + '_;

  /// Delete a pupil, cascading their category assignments and need
  /// overrides.
  fn delete_pupil(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Case-insensitive substring search over first, last, and "first last"
  /// names, capped at 20 rows in (last, first) order.
  fn search_pupils<'a>(
    &'a self,
    term: &'a str,
  ) -> impl Future<Output = Result<Vec<Pupil>>> + Send + 'a;

  /// First pupil whose "first last" name contains `name`
  /// (case-insensitive), in (last, first) order. Returns `None` on zero
  /// matches.
  fn find_pupil_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Pupil>>> + Send + 'a;

  // ── Needs ─────────────────────────────────────────────────────────────

  /// List all needs, ordered by name.
  fn list_needs(&self) -> impl Future<Output = Result<Vec<Need>>> + Send + '_;

  /// Retrieve a need by id. Returns `None` if not found.
  fn get_need(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Need>>> + Send + '_;

  fn add_need(
    &self,
    input: NewNeed,
  ) -> impl Future<Output = Result<Need>> + Send + '_;

  /// Replace the descriptive fields of a need.
  fn update_need(
    &self,
    id: Uuid,
    input: NewNeed,
  ) -> impl Future<Output = Result<Need>> + Send + '_;

  /// Delete a need. Fails with `NeedInUse` while any membership, override,
  /// or device assignment still references it.
  fn delete_need(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  /// List all categories, ordered by category name.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>>> + Send + '_;

  /// Retrieve a category by id. Returns `None` if not found.
  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Category>>> + Send + '_;

  fn add_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category>> + Send + '_;

  fn update_category(
    &self,
    id: Uuid,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category>> + Send + '_;

  /// Delete a category. Fails with `CategoryInUse` while any membership,
  /// pupil assignment, or device still references it.
  fn delete_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Category-need membership ──────────────────────────────────────────

  /// Needs belonging to a category, ordered by need name.
  fn category_needs(
    &self,
    category_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Need>>> + Send + '_;

  /// Categories containing a need, ordered by category name.
  fn need_categories(
    &self,
    need_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Category>>> + Send + '_;

  /// Add a need to a category. Validates both endpoints; rejects a
  /// duplicate pair with `NeedAlreadyInCategory`.
  fn add_need_to_category(
    &self,
    category_id: Uuid,
    need_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Remove a membership edge; `NeedNotInCategory` if the pair is absent.
  fn remove_need_from_category(
    &self,
    category_id: Uuid,
    need_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Pupil-category assignment ─────────────────────────────────────────

  /// Categories assigned to a pupil, ordered by category name.
  fn pupil_categories(
    &self,
    pupil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Category>>> + Send + '_;

  /// Assign a category to a pupil. Validates both endpoints; rejects a
  /// duplicate assignment with `CategoryAlreadyAssigned`.
  fn assign_category(
    &self,
    pupil_id: Uuid,
    category_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Unassign a category; `CategoryNotAssigned` if the pair is absent.
  fn remove_category(
    &self,
    pupil_id: Uuid,
    category_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Need overrides ────────────────────────────────────────────────────

  /// All override rows for a pupil, most recently created first.
  fn list_overrides(
    &self,
    pupil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PupilNeedOverride>>> + Send + '_;

  /// Override rows joined with need names, ordered by need name.
  fn pupil_override_views(
    &self,
    pupil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<OverrideView>>> + Send + '_;

  /// Record an override. Validates pupil and need; rejects a second
  /// override for the same (pupil, need) pair with `NeedAlreadyOverridden`.
  fn add_override(
    &self,
    input: NewOverride,
  ) -> impl Future<Output = Result<PupilNeedOverride>> + Send + '_;

  /// Mutate the type and notes of an existing override.
  fn update_override(
    &self,
    override_id: Uuid,
    is_added: bool,
    notes: Option<String>,
  ) -> impl Future<Output = Result<PupilNeedOverride>> + Send + '_;

  /// Delete an override; `OverrideNotFound` if the id does not exist.
  fn remove_override(
    &self,
    override_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Devices ───────────────────────────────────────────────────────────

  /// List all devices, ordered by name.
  fn list_devices(
    &self,
  ) -> impl Future<Output = Result<Vec<Device>>> + Send + '_;

  /// Devices not currently assigned to any need, ordered by name.
  fn unassigned_devices(
    &self,
  ) -> impl Future<Output = Result<Vec<Device>>> + Send + '_;

  /// Retrieve a device by id. Returns `None` if not found.
  fn get_device(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Device>>> + Send + '_;

  fn add_device(
    &self,
    input: NewDevice,
  ) -> impl Future<Output = Result<Device>> + Send + '_;

  fn update_device(
    &self,
    id: Uuid,
    input: NewDevice,
  ) -> impl Future<Output = Result<Device>> + Send + '_;

  /// Delete a device. Fails with `DeviceInUse` while still assigned to a
  /// need.
  fn delete_device(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Devices assigned to a need, ordered by device name.
  fn need_devices(
    &self,
    need_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AssignedDevice>>> + Send + '_;

  /// Assign a device to a need. Validates both endpoints; rejects a
  /// duplicate pair with `DeviceAlreadyAssigned`.
  fn assign_device_to_need(
    &self,
    assignment: NeedDeviceAssignment,
  ) -> impl Future<Output = Result<NeedDeviceAssignment>> + Send + '_;

  /// Remove a device assignment; `DeviceNotAssigned` if the pair is
  /// absent.
  fn remove_device_from_need(
    &self,
    need_id: Uuid,
    device_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Devices assigned to any need in the pupil's current effective set,
  /// ordered by device name.
  fn devices_for_pupil(
    &self,
    pupil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AssignedDevice>>> + Send + '_;

  // ── Resolution ────────────────────────────────────────────────────────

  /// Resolve the pupil's effective needs — see
  /// [`resolve_effective_needs`](crate::resolve::resolve_effective_needs).
  /// Recomputed from current data on every call; an unknown pupil id
  /// resolves to an empty sequence.
  fn effective_needs(
    &self,
    pupil_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EffectiveNeed>>> + Send + '_;
}
