//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings, booleans as 0/1
//! integers. A value that fails to decode is treated as storage
//! corruption.

use chrono::{DateTime, NaiveDate, Utc};
use satchel_core::{
  Error, Result,
  category::Category,
  device::{AssignedDevice, Device},
  form::Form,
  need::Need,
  overrides::{OverrideView, PupilNeedOverride},
  pupil::{Pupil, PupilSummary},
  resolve::CategoryGrant,
};
use uuid::Uuid;

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse()
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `forms` row.
pub struct RawForm {
  pub form_id:      String,
  pub form_name:    String,
  pub form_year:    i32,
  pub teacher_name: String,
}

impl RawForm {
  pub fn into_form(self) -> Result<Form> {
    Ok(Form {
      form_id:      decode_uuid(&self.form_id)?,
      form_name:    self.form_name,
      form_year:    self.form_year,
      teacher_name: self.teacher_name,
    })
  }
}

/// Raw strings read directly from a `pupils` row.
pub struct RawPupil {
  pub pupil_id:   String,
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<String>,
  pub notes:      Option<String>,
  pub created_at: String,
}

impl RawPupil {
  pub fn into_pupil(self) -> Result<Pupil> {
    Ok(Pupil {
      pupil_id:   decode_uuid(&self.pupil_id)?,
      first_name: self.first_name,
      last_name:  self.last_name,
      form_id:    decode_opt_uuid(self.form_id.as_deref())?,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `pupils` row left-joined with its form name.
pub struct RawPupilSummary {
  pub pupil_id:   String,
  pub first_name: String,
  pub last_name:  String,
  pub form_id:    Option<String>,
  pub form_name:  Option<String>,
  pub notes:      Option<String>,
  pub created_at: String,
}

impl RawPupilSummary {
  pub fn into_summary(self) -> Result<PupilSummary> {
    Ok(PupilSummary {
      pupil_id:   decode_uuid(&self.pupil_id)?,
      first_name: self.first_name,
      last_name:  self.last_name,
      form_id:    decode_opt_uuid(self.form_id.as_deref())?,
      form_name:  self.form_name,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `needs` row.
pub struct RawNeed {
  pub need_id:           String,
  pub name:              String,
  pub short_description: Option<String>,
  pub description:       Option<String>,
}

impl RawNeed {
  pub fn into_need(self) -> Result<Need> {
    Ok(Need {
      need_id:           decode_uuid(&self.need_id)?,
      name:              self.name,
      short_description: self.short_description,
      description:       self.description,
    })
  }
}

/// A `needs` row joined with the name of one granting category.
pub struct RawGrant {
  pub need:          RawNeed,
  pub category_name: String,
}

impl RawGrant {
  pub fn into_grant(self) -> Result<CategoryGrant> {
    Ok(CategoryGrant {
      need:          self.need.into_need()?,
      category_name: self.category_name,
    })
  }
}

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub category_id:   String,
  pub category_name: String,
  pub description:   Option<String>,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id:   decode_uuid(&self.category_id)?,
      category_name: self.category_name,
      description:   self.description,
    })
  }
}

/// Raw strings read directly from a `pupil_need_overrides` row.
pub struct RawOverride {
  pub override_id: String,
  pub pupil_id:    String,
  pub need_id:     String,
  pub is_added:    bool,
  pub notes:       Option<String>,
  pub created_at:  String,
}

impl RawOverride {
  pub fn into_override(self) -> Result<PupilNeedOverride> {
    Ok(PupilNeedOverride {
      override_id: decode_uuid(&self.override_id)?,
      pupil_id:    decode_uuid(&self.pupil_id)?,
      need_id:     decode_uuid(&self.need_id)?,
      is_added:    self.is_added,
      notes:       self.notes,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// An override row joined with the need's display name.
pub struct RawOverrideView {
  pub override_id: String,
  pub pupil_id:    String,
  pub need_id:     String,
  pub need_name:   String,
  pub is_added:    bool,
  pub notes:       Option<String>,
  pub created_at:  String,
}

impl RawOverrideView {
  pub fn into_view(self) -> Result<OverrideView> {
    Ok(OverrideView {
      override_id: decode_uuid(&self.override_id)?,
      pupil_id:    decode_uuid(&self.pupil_id)?,
      need_id:     decode_uuid(&self.need_id)?,
      need_name:   self.need_name,
      is_added:    self.is_added,
      notes:       self.notes,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `devices` row.
pub struct RawDevice {
  pub device_id:     String,
  pub name:          String,
  pub model:         Option<String>,
  pub serial_number: Option<String>,
  pub purchase_date: Option<String>,
  pub warranty_info: Option<String>,
  pub status:        Option<String>,
  pub notes:         Option<String>,
  pub category_id:   Option<String>,
}

impl RawDevice {
  pub fn into_device(self) -> Result<Device> {
    Ok(Device {
      device_id:     decode_uuid(&self.device_id)?,
      name:          self.name,
      model:         self.model,
      serial_number: self.serial_number,
      purchase_date: decode_opt_date(self.purchase_date.as_deref())?,
      warranty_info: self.warranty_info,
      status:        self.status,
      notes:         self.notes,
      category_id:   decode_opt_uuid(self.category_id.as_deref())?,
    })
  }
}

/// A `need_devices` row joined with the device and the granting need.
pub struct RawAssignedDevice {
  pub device_id:       String,
  pub device_name:     String,
  pub model:           Option<String>,
  pub serial_number:   Option<String>,
  pub status:          Option<String>,
  pub need_id:         String,
  pub need_name:       String,
  pub assignment_date: Option<String>,
  pub notes:           Option<String>,
}

impl RawAssignedDevice {
  pub fn into_assigned(self) -> Result<AssignedDevice> {
    Ok(AssignedDevice {
      device_id:       decode_uuid(&self.device_id)?,
      device_name:     self.device_name,
      model:           self.model,
      serial_number:   self.serial_number,
      status:          self.status,
      need_id:         decode_uuid(&self.need_id)?,
      need_name:       self.need_name,
      assignment_date: decode_opt_date(self.assignment_date.as_deref())?,
      notes:           self.notes,
    })
  }
}
