//! Devices — assistive equipment loaned against needs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical device in the loan pool. Only `name` is required; the rest
/// is inventory bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
  pub device_id:     Uuid,
  pub name:          String,
  pub model:         Option<String>,
  pub serial_number: Option<String>,
  pub purchase_date: Option<NaiveDate>,
  pub warranty_info: Option<String>,
  pub status:        Option<String>,
  pub notes:         Option<String>,
  /// Optional default category the device is inventoried under.
  pub category_id:   Option<Uuid>,
}

/// Input to [`crate::store::SchoolStore::add_device`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
  pub name:          String,
  pub model:         Option<String>,
  pub serial_number: Option<String>,
  pub purchase_date: Option<NaiveDate>,
  pub warranty_info: Option<String>,
  pub status:        Option<String>,
  pub notes:         Option<String>,
  pub category_id:   Option<Uuid>,
}

/// The many-to-many edge between a need and a device, with loan metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedDeviceAssignment {
  pub need_id:         Uuid,
  pub device_id:       Uuid,
  pub assignment_date: Option<NaiveDate>,
  pub notes:           Option<String>,
}

/// A device as it appears on a pupil profile or a need's device list:
/// the device joined through the need that grants it. `notes` carries the
/// assignment notes, falling back to the device's own notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedDevice {
  pub device_id:       Uuid,
  pub device_name:     String,
  pub model:           Option<String>,
  pub serial_number:   Option<String>,
  pub status:          Option<String>,
  pub need_id:         Uuid,
  pub need_name:       String,
  pub assignment_date: Option<NaiveDate>,
  pub notes:           Option<String>,
}
