//! [`SqliteStore`] — the SQLite implementation of
//! [`SchoolStore`](satchel_core::store::SchoolStore).

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use satchel_core::{
  Error, Result,
  category::{Category, NewCategory},
  device::{AssignedDevice, Device, NeedDeviceAssignment, NewDevice},
  form::{Form, NewForm},
  need::{Need, NewNeed},
  overrides::{NewOverride, OverrideView, PupilNeedOverride},
  pupil::{NewPupil, Pupil, PupilSummary, PupilUpdate},
  resolve::{EffectiveNeed, resolve_effective_needs},
  store::SchoolStore,
};

use crate::{
  encode::{
    RawAssignedDevice, RawCategory, RawDevice, RawForm, RawGrant, RawNeed,
    RawOverride, RawOverrideView, RawPupil, RawPupilSummary, decode_uuid,
    encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Existence probes ────────────────────────────────────────────────────────

const FORM_EXISTS: &str = "SELECT 1 FROM forms WHERE form_id = ?1";
const PUPIL_EXISTS: &str = "SELECT 1 FROM pupils WHERE pupil_id = ?1";
const NEED_EXISTS: &str = "SELECT 1 FROM needs WHERE need_id = ?1";
const CATEGORY_EXISTS: &str =
  "SELECT 1 FROM categories WHERE category_id = ?1";
const DEVICE_EXISTS: &str = "SELECT 1 FROM devices WHERE device_id = ?1";

const MEMBERSHIP_EXISTS: &str =
  "SELECT 1 FROM category_needs WHERE category_id = ?1 AND need_id = ?2";
const ASSIGNMENT_EXISTS: &str =
  "SELECT 1 FROM pupil_categories WHERE pupil_id = ?1 AND category_id = ?2";
const OVERRIDE_PAIR_EXISTS: &str =
  "SELECT 1 FROM pupil_need_overrides WHERE pupil_id = ?1 AND need_id = ?2";
const DEVICE_ASSIGNMENT_EXISTS: &str =
  "SELECT 1 FROM need_devices WHERE need_id = ?1 AND device_id = ?2";

fn db_err(e: tokio_rusqlite::Error) -> Error { Error::Storage(e.to_string()) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Satchel store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and all
/// statements execute serially on its dedicated thread (single-row writes
/// are therefore last-write-wins, with no further coordination).
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  // ── Internal helpers ──────────────────────────────────────────────────

  async fn row_exists(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id_str], |_| Ok(true))
            .optional()?
            .unwrap_or(false),
        )
      })
      .await
      .map_err(db_err)
  }

  async fn pair_exists(
    &self,
    sql: &'static str,
    first: Uuid,
    second: Uuid,
  ) -> Result<bool> {
    let first_str = encode_uuid(first);
    let second_str = encode_uuid(second);
    self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![first_str, second_str], |_| {
              Ok(true)
            })
            .optional()?
            .unwrap_or(false),
        )
      })
      .await
      .map_err(db_err)
  }

  async fn require_form(&self, id: Uuid) -> Result<()> {
    if self.row_exists(FORM_EXISTS, id).await? {
      Ok(())
    } else {
      Err(Error::FormNotFound(id))
    }
  }

  async fn require_pupil(&self, id: Uuid) -> Result<()> {
    if self.row_exists(PUPIL_EXISTS, id).await? {
      Ok(())
    } else {
      Err(Error::PupilNotFound(id))
    }
  }

  async fn require_need(&self, id: Uuid) -> Result<()> {
    if self.row_exists(NEED_EXISTS, id).await? {
      Ok(())
    } else {
      Err(Error::NeedNotFound(id))
    }
  }

  async fn require_category(&self, id: Uuid) -> Result<()> {
    if self.row_exists(CATEGORY_EXISTS, id).await? {
      Ok(())
    } else {
      Err(Error::CategoryNotFound(id))
    }
  }

  async fn require_device(&self, id: Uuid) -> Result<()> {
    if self.row_exists(DEVICE_EXISTS, id).await? {
      Ok(())
    } else {
      Err(Error::DeviceNotFound(id))
    }
  }

  async fn get_override(
    &self,
    override_id: Uuid,
  ) -> Result<Option<PupilNeedOverride>> {
    let id_str = encode_uuid(override_id);
    let raw: Option<RawOverride> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT override_id, pupil_id, need_id, is_added, notes, created_at
               FROM pupil_need_overrides WHERE override_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawOverride {
                  override_id: row.get(0)?,
                  pupil_id:    row.get(1)?,
                  need_id:     row.get(2)?,
                  is_added:    row.get(3)?,
                  notes:       row.get(4)?,
                  created_at:  row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawOverride::into_override).transpose()
  }
}

// ─── SchoolStore impl ────────────────────────────────────────────────────────

impl SchoolStore for SqliteStore {
  // ── Forms ─────────────────────────────────────────────────────────────

  async fn list_forms(&self) -> Result<Vec<Form>> {
    let raws: Vec<RawForm> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT form_id, form_name, form_year, teacher_name
           FROM forms ORDER BY form_name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawForm {
              form_id:      row.get(0)?,
              form_name:    row.get(1)?,
              form_year:    row.get(2)?,
              teacher_name: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawForm::into_form).collect()
  }

  async fn get_form(&self, id: Uuid) -> Result<Option<Form>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawForm> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT form_id, form_name, form_year, teacher_name
               FROM forms WHERE form_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawForm {
                  form_id:      row.get(0)?,
                  form_name:    row.get(1)?,
                  form_year:    row.get(2)?,
                  teacher_name: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawForm::into_form).transpose()
  }

  async fn add_form(&self, input: NewForm) -> Result<Form> {
    let form = Form {
      form_id:      Uuid::new_v4(),
      form_name:    input.form_name,
      form_year:    input.form_year,
      teacher_name: input.teacher_name,
    };

    let id_str = encode_uuid(form.form_id);
    let form_name = form.form_name.clone();
    let form_year = form.form_year;
    let teacher_name = form.teacher_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO forms (form_id, form_name, form_year, teacher_name)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, form_name, form_year, teacher_name],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(form)
  }

  // ── Pupils ────────────────────────────────────────────────────────────

  async fn list_pupils(&self) -> Result<Vec<PupilSummary>> {
    let raws: Vec<RawPupilSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT p.pupil_id, p.first_name, p.last_name, p.form_id,
                  f.form_name, p.notes, p.created_at
           FROM pupils p
           LEFT JOIN forms f ON f.form_id = p.form_id
           ORDER BY p.last_name, p.first_name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPupilSummary {
              pupil_id:   row.get(0)?,
              first_name: row.get(1)?,
              last_name:  row.get(2)?,
              form_id:    row.get(3)?,
              form_name:  row.get(4)?,
              notes:      row.get(5)?,
              created_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawPupilSummary::into_summary).collect()
  }

  async fn get_pupil(&self, id: Uuid) -> Result<Option<Pupil>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawPupil> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT pupil_id, first_name, last_name, form_id, notes, created_at
               FROM pupils WHERE pupil_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPupil {
                  pupil_id:   row.get(0)?,
                  first_name: row.get(1)?,
                  last_name:  row.get(2)?,
                  form_id:    row.get(3)?,
                  notes:      row.get(4)?,
                  created_at: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawPupil::into_pupil).transpose()
  }

  async fn add_pupil(&self, input: NewPupil) -> Result<Pupil> {
    if let Some(form_id) = input.form_id {
      self.require_form(form_id).await?;
    }

    let pupil = Pupil {
      pupil_id:   Uuid::new_v4(),
      first_name: input.first_name,
      last_name:  input.last_name,
      form_id:    input.form_id,
      notes:      input.notes,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(pupil.pupil_id);
    let first_name = pupil.first_name.clone();
    let last_name = pupil.last_name.clone();
    let form_id_str = pupil.form_id.map(encode_uuid);
    let notes = pupil.notes.clone();
    let created_at_str = encode_dt(pupil.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pupils (pupil_id, first_name, last_name, form_id, notes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            first_name,
            last_name,
            form_id_str,
            notes,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(pupil)
  }

  async fn update_pupil(&self, id: Uuid, update: PupilUpdate) -> Result<Pupil> {
    let current =
      self.get_pupil(id).await?.ok_or(Error::PupilNotFound(id))?;

    let merged = Pupil {
      pupil_id:   current.pupil_id,
      first_name: update.first_name.unwrap_or(current.first_name),
      last_name:  update.last_name.unwrap_or(current.last_name),
      form_id:    update.form_id.unwrap_or(current.form_id),
      notes:      update.notes.unwrap_or(current.notes),
      created_at: current.created_at,
    };

    if let Some(form_id) = merged.form_id {
      self.require_form(form_id).await?;
    }

    let id_str = encode_uuid(id);
    let first_name = merged.first_name.clone();
    let last_name = merged.last_name.clone();
    let form_id_str = merged.form_id.map(encode_uuid);
    let notes = merged.notes.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE pupils
           SET first_name = ?2, last_name = ?3, form_id = ?4, notes = ?5
           WHERE pupil_id = ?1",
          rusqlite::params![id_str, first_name, last_name, form_id_str, notes],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(merged)
  }

  async fn delete_pupil(&self, id: Uuid) -> Result<()> {
    self.require_pupil(id).await?;

    // Assignment and override rows describe only this pupil; they go too.
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM pupil_need_overrides WHERE pupil_id = ?1",
          rusqlite::params![id_str],
        )?;
        conn.execute(
          "DELETE FROM pupil_categories WHERE pupil_id = ?1",
          rusqlite::params![id_str],
        )?;
        conn.execute(
          "DELETE FROM pupils WHERE pupil_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn search_pupils(&self, term: &str) -> Result<Vec<Pupil>> {
    let pattern = format!("%{term}%");
    let raws: Vec<RawPupil> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT pupil_id, first_name, last_name, form_id, notes, created_at
           FROM pupils
           WHERE first_name LIKE ?1
              OR last_name LIKE ?1
              OR (first_name || ' ' || last_name) LIKE ?1
           ORDER BY last_name, first_name
           LIMIT 20",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], |row| {
            Ok(RawPupil {
              pupil_id:   row.get(0)?,
              first_name: row.get(1)?,
              last_name:  row.get(2)?,
              form_id:    row.get(3)?,
              notes:      row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawPupil::into_pupil).collect()
  }

  async fn find_pupil_by_name(&self, name: &str) -> Result<Option<Pupil>> {
    let pattern = format!("%{name}%");
    let raw: Option<RawPupil> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT pupil_id, first_name, last_name, form_id, notes, created_at
               FROM pupils
               WHERE (first_name || ' ' || last_name) LIKE ?1
               ORDER BY last_name, first_name
               LIMIT 1",
              rusqlite::params![pattern],
              |row| {
                Ok(RawPupil {
                  pupil_id:   row.get(0)?,
                  first_name: row.get(1)?,
                  last_name:  row.get(2)?,
                  form_id:    row.get(3)?,
                  notes:      row.get(4)?,
                  created_at: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawPupil::into_pupil).transpose()
  }

  // ── Needs ─────────────────────────────────────────────────────────────

  async fn list_needs(&self) -> Result<Vec<Need>> {
    let raws: Vec<RawNeed> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT need_id, name, short_description, description
           FROM needs ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawNeed {
              need_id:           row.get(0)?,
              name:              row.get(1)?,
              short_description: row.get(2)?,
              description:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawNeed::into_need).collect()
  }

  async fn get_need(&self, id: Uuid) -> Result<Option<Need>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawNeed> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT need_id, name, short_description, description
               FROM needs WHERE need_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawNeed {
                  need_id:           row.get(0)?,
                  name:              row.get(1)?,
                  short_description: row.get(2)?,
                  description:       row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawNeed::into_need).transpose()
  }

  async fn add_need(&self, input: NewNeed) -> Result<Need> {
    let need = Need {
      need_id:           Uuid::new_v4(),
      name:              input.name,
      short_description: input.short_description,
      description:       input.description,
    };

    let id_str = encode_uuid(need.need_id);
    let name = need.name.clone();
    let short_description = need.short_description.clone();
    let description = need.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO needs (need_id, name, short_description, description)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, short_description, description],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(need)
  }

  async fn update_need(&self, id: Uuid, input: NewNeed) -> Result<Need> {
    let id_str = encode_uuid(id);
    let name = input.name.clone();
    let short_description = input.short_description.clone();
    let description = input.description.clone();

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE needs
           SET name = ?2, short_description = ?3, description = ?4
           WHERE need_id = ?1",
          rusqlite::params![id_str, name, short_description, description],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::NeedNotFound(id));
    }

    Ok(Need {
      need_id:           id,
      name:              input.name,
      short_description: input.short_description,
      description:       input.description,
    })
  }

  async fn delete_need(&self, id: Uuid) -> Result<()> {
    self.require_need(id).await?;

    let id_str = encode_uuid(id);
    let references: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM category_needs       WHERE need_id = ?1)
                + (SELECT COUNT(*) FROM pupil_need_overrides WHERE need_id = ?1)
                + (SELECT COUNT(*) FROM need_devices         WHERE need_id = ?1)",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await
      .map_err(db_err)?;

    if references > 0 {
      return Err(Error::NeedInUse(id));
    }

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM needs WHERE need_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  // ── Categories ────────────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, category_name, description
           FROM categories ORDER BY category_name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCategory {
              category_id:   row.get(0)?,
              category_name: row.get(1)?,
              description:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT category_id, category_name, description
               FROM categories WHERE category_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawCategory {
                  category_id:   row.get(0)?,
                  category_name: row.get(1)?,
                  description:   row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn add_category(&self, input: NewCategory) -> Result<Category> {
    let category = Category {
      category_id:   Uuid::new_v4(),
      category_name: input.category_name,
      description:   input.description,
    };

    let id_str = encode_uuid(category.category_id);
    let category_name = category.category_name.clone();
    let description = category.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, category_name, description)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, category_name, description],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(category)
  }

  async fn update_category(
    &self,
    id: Uuid,
    input: NewCategory,
  ) -> Result<Category> {
    let id_str = encode_uuid(id);
    let category_name = input.category_name.clone();
    let description = input.description.clone();

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE categories SET category_name = ?2, description = ?3
           WHERE category_id = ?1",
          rusqlite::params![id_str, category_name, description],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::CategoryNotFound(id));
    }

    Ok(Category {
      category_id:   id,
      category_name: input.category_name,
      description:   input.description,
    })
  }

  async fn delete_category(&self, id: Uuid) -> Result<()> {
    self.require_category(id).await?;

    let id_str = encode_uuid(id);
    let references: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM category_needs   WHERE category_id = ?1)
                + (SELECT COUNT(*) FROM pupil_categories WHERE category_id = ?1)
                + (SELECT COUNT(*) FROM devices          WHERE category_id = ?1)",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await
      .map_err(db_err)?;

    if references > 0 {
      return Err(Error::CategoryInUse(id));
    }

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM categories WHERE category_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  // ── Category-need membership ──────────────────────────────────────────

  async fn category_needs(&self, category_id: Uuid) -> Result<Vec<Need>> {
    let id_str = encode_uuid(category_id);
    let raws: Vec<RawNeed> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT n.need_id, n.name, n.short_description, n.description
           FROM needs n
           JOIN category_needs cn ON cn.need_id = n.need_id
           WHERE cn.category_id = ?1
           ORDER BY n.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawNeed {
              need_id:           row.get(0)?,
              name:              row.get(1)?,
              short_description: row.get(2)?,
              description:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawNeed::into_need).collect()
  }

  async fn need_categories(&self, need_id: Uuid) -> Result<Vec<Category>> {
    let id_str = encode_uuid(need_id);
    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.category_id, c.category_name, c.description
           FROM categories c
           JOIN category_needs cn ON cn.category_id = c.category_id
           WHERE cn.need_id = ?1
           ORDER BY c.category_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawCategory {
              category_id:   row.get(0)?,
              category_name: row.get(1)?,
              description:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn add_need_to_category(
    &self,
    category_id: Uuid,
    need_id: Uuid,
  ) -> Result<()> {
    self.require_category(category_id).await?;
    self.require_need(need_id).await?;

    if self
      .pair_exists(MEMBERSHIP_EXISTS, category_id, need_id)
      .await?
    {
      return Err(Error::NeedAlreadyInCategory { category_id, need_id });
    }

    let category_id_str = encode_uuid(category_id);
    let need_id_str = encode_uuid(need_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO category_needs (category_id, need_id) VALUES (?1, ?2)",
          rusqlite::params![category_id_str, need_id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn remove_need_from_category(
    &self,
    category_id: Uuid,
    need_id: Uuid,
  ) -> Result<()> {
    let category_id_str = encode_uuid(category_id);
    let need_id_str = encode_uuid(need_id);
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM category_needs WHERE category_id = ?1 AND need_id = ?2",
          rusqlite::params![category_id_str, need_id_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::NeedNotInCategory { category_id, need_id });
    }
    Ok(())
  }

  // ── Pupil-category assignment ─────────────────────────────────────────

  async fn pupil_categories(&self, pupil_id: Uuid) -> Result<Vec<Category>> {
    let id_str = encode_uuid(pupil_id);
    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.category_id, c.category_name, c.description
           FROM categories c
           JOIN pupil_categories pc ON pc.category_id = c.category_id
           WHERE pc.pupil_id = ?1
           ORDER BY c.category_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawCategory {
              category_id:   row.get(0)?,
              category_name: row.get(1)?,
              description:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn assign_category(
    &self,
    pupil_id: Uuid,
    category_id: Uuid,
  ) -> Result<()> {
    self.require_pupil(pupil_id).await?;
    self.require_category(category_id).await?;

    // A second identical row would be harmless to the set union, but it
    // indicates a caller bug; reject it outright.
    if self
      .pair_exists(ASSIGNMENT_EXISTS, pupil_id, category_id)
      .await?
    {
      return Err(Error::CategoryAlreadyAssigned { pupil_id, category_id });
    }

    let pupil_id_str = encode_uuid(pupil_id);
    let category_id_str = encode_uuid(category_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pupil_categories (pupil_id, category_id) VALUES (?1, ?2)",
          rusqlite::params![pupil_id_str, category_id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn remove_category(
    &self,
    pupil_id: Uuid,
    category_id: Uuid,
  ) -> Result<()> {
    let pupil_id_str = encode_uuid(pupil_id);
    let category_id_str = encode_uuid(category_id);
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM pupil_categories
           WHERE pupil_id = ?1 AND category_id = ?2",
          rusqlite::params![pupil_id_str, category_id_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::CategoryNotAssigned { pupil_id, category_id });
    }
    Ok(())
  }

  // ── Need overrides ────────────────────────────────────────────────────

  async fn list_overrides(
    &self,
    pupil_id: Uuid,
  ) -> Result<Vec<PupilNeedOverride>> {
    let id_str = encode_uuid(pupil_id);
    let raws: Vec<RawOverride> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT override_id, pupil_id, need_id, is_added, notes, created_at
           FROM pupil_need_overrides
           WHERE pupil_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawOverride {
              override_id: row.get(0)?,
              pupil_id:    row.get(1)?,
              need_id:     row.get(2)?,
              is_added:    row.get(3)?,
              notes:       row.get(4)?,
              created_at:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawOverride::into_override).collect()
  }

  async fn pupil_override_views(
    &self,
    pupil_id: Uuid,
  ) -> Result<Vec<OverrideView>> {
    let id_str = encode_uuid(pupil_id);
    let raws: Vec<RawOverrideView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT o.override_id, o.pupil_id, o.need_id, n.name,
                  o.is_added, o.notes, o.created_at
           FROM pupil_need_overrides o
           JOIN needs n ON n.need_id = o.need_id
           WHERE o.pupil_id = ?1
           ORDER BY n.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawOverrideView {
              override_id: row.get(0)?,
              pupil_id:    row.get(1)?,
              need_id:     row.get(2)?,
              need_name:   row.get(3)?,
              is_added:    row.get(4)?,
              notes:       row.get(5)?,
              created_at:  row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawOverrideView::into_view).collect()
  }

  async fn add_override(
    &self,
    input: NewOverride,
  ) -> Result<PupilNeedOverride> {
    self.require_pupil(input.pupil_id).await?;
    self.require_need(input.need_id).await?;

    // One override per (pupil, need): edits go through update_override or
    // delete-then-create, never a second row.
    if self
      .pair_exists(OVERRIDE_PAIR_EXISTS, input.pupil_id, input.need_id)
      .await?
    {
      return Err(Error::NeedAlreadyOverridden {
        pupil_id: input.pupil_id,
        need_id:  input.need_id,
      });
    }

    let record = PupilNeedOverride {
      override_id: Uuid::new_v4(),
      pupil_id:    input.pupil_id,
      need_id:     input.need_id,
      is_added:    input.is_added,
      notes:       input.notes,
      created_at:  Utc::now(),
    };

    let id_str = encode_uuid(record.override_id);
    let pupil_id_str = encode_uuid(record.pupil_id);
    let need_id_str = encode_uuid(record.need_id);
    let is_added = record.is_added;
    let notes = record.notes.clone();
    let created_at_str = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pupil_need_overrides
             (override_id, pupil_id, need_id, is_added, notes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            pupil_id_str,
            need_id_str,
            is_added,
            notes,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(record)
  }

  async fn update_override(
    &self,
    override_id: Uuid,
    is_added: bool,
    notes: Option<String>,
  ) -> Result<PupilNeedOverride> {
    let current = self
      .get_override(override_id)
      .await?
      .ok_or(Error::OverrideNotFound(override_id))?;

    let id_str = encode_uuid(override_id);
    let notes_param = notes.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE pupil_need_overrides SET is_added = ?2, notes = ?3
           WHERE override_id = ?1",
          rusqlite::params![id_str, is_added, notes_param],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(PupilNeedOverride { is_added, notes, ..current })
  }

  async fn remove_override(&self, override_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(override_id);
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM pupil_need_overrides WHERE override_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::OverrideNotFound(override_id));
    }
    Ok(())
  }

  // ── Devices ───────────────────────────────────────────────────────────

  async fn list_devices(&self) -> Result<Vec<Device>> {
    let raws: Vec<RawDevice> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT device_id, name, model, serial_number, purchase_date,
                  warranty_info, status, notes, category_id
           FROM devices ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDevice {
              device_id:     row.get(0)?,
              name:          row.get(1)?,
              model:         row.get(2)?,
              serial_number: row.get(3)?,
              purchase_date: row.get(4)?,
              warranty_info: row.get(5)?,
              status:        row.get(6)?,
              notes:         row.get(7)?,
              category_id:   row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawDevice::into_device).collect()
  }

  async fn unassigned_devices(&self) -> Result<Vec<Device>> {
    let raws: Vec<RawDevice> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT device_id, name, model, serial_number, purchase_date,
                  warranty_info, status, notes, category_id
           FROM devices
           WHERE device_id NOT IN (SELECT DISTINCT device_id FROM need_devices)
           ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDevice {
              device_id:     row.get(0)?,
              name:          row.get(1)?,
              model:         row.get(2)?,
              serial_number: row.get(3)?,
              purchase_date: row.get(4)?,
              warranty_info: row.get(5)?,
              status:        row.get(6)?,
              notes:         row.get(7)?,
              category_id:   row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawDevice::into_device).collect()
  }

  async fn get_device(&self, id: Uuid) -> Result<Option<Device>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawDevice> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT device_id, name, model, serial_number, purchase_date,
                      warranty_info, status, notes, category_id
               FROM devices WHERE device_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawDevice {
                  device_id:     row.get(0)?,
                  name:          row.get(1)?,
                  model:         row.get(2)?,
                  serial_number: row.get(3)?,
                  purchase_date: row.get(4)?,
                  warranty_info: row.get(5)?,
                  status:        row.get(6)?,
                  notes:         row.get(7)?,
                  category_id:   row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawDevice::into_device).transpose()
  }

  async fn add_device(&self, input: NewDevice) -> Result<Device> {
    if let Some(category_id) = input.category_id {
      self.require_category(category_id).await?;
    }

    let device = Device {
      device_id:     Uuid::new_v4(),
      name:          input.name,
      model:         input.model,
      serial_number: input.serial_number,
      purchase_date: input.purchase_date,
      warranty_info: input.warranty_info,
      status:        input.status,
      notes:         input.notes,
      category_id:   input.category_id,
    };

    let id_str = encode_uuid(device.device_id);
    let name = device.name.clone();
    let model = device.model.clone();
    let serial_number = device.serial_number.clone();
    let purchase_date_str = device.purchase_date.map(encode_date);
    let warranty_info = device.warranty_info.clone();
    let status = device.status.clone();
    let notes = device.notes.clone();
    let category_id_str = device.category_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO devices (device_id, name, model, serial_number,
             purchase_date, warranty_info, status, notes, category_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            name,
            model,
            serial_number,
            purchase_date_str,
            warranty_info,
            status,
            notes,
            category_id_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(device)
  }

  async fn update_device(&self, id: Uuid, input: NewDevice) -> Result<Device> {
    if let Some(category_id) = input.category_id {
      self.require_category(category_id).await?;
    }

    let id_str = encode_uuid(id);
    let name = input.name.clone();
    let model = input.model.clone();
    let serial_number = input.serial_number.clone();
    let purchase_date_str = input.purchase_date.map(encode_date);
    let warranty_info = input.warranty_info.clone();
    let status = input.status.clone();
    let notes = input.notes.clone();
    let category_id_str = input.category_id.map(encode_uuid);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE devices
           SET name = ?2, model = ?3, serial_number = ?4, purchase_date = ?5,
               warranty_info = ?6, status = ?7, notes = ?8, category_id = ?9
           WHERE device_id = ?1",
          rusqlite::params![
            id_str,
            name,
            model,
            serial_number,
            purchase_date_str,
            warranty_info,
            status,
            notes,
            category_id_str,
          ],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::DeviceNotFound(id));
    }

    Ok(Device {
      device_id:     id,
      name:          input.name,
      model:         input.model,
      serial_number: input.serial_number,
      purchase_date: input.purchase_date,
      warranty_info: input.warranty_info,
      status:        input.status,
      notes:         input.notes,
      category_id:   input.category_id,
    })
  }

  async fn delete_device(&self, id: Uuid) -> Result<()> {
    self.require_device(id).await?;

    let id_str = encode_uuid(id);
    let references: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM need_devices WHERE device_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await
      .map_err(db_err)?;

    if references > 0 {
      return Err(Error::DeviceInUse(id));
    }

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM devices WHERE device_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn need_devices(&self, need_id: Uuid) -> Result<Vec<AssignedDevice>> {
    let id_str = encode_uuid(need_id);
    let raws: Vec<RawAssignedDevice> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.device_id, d.name, d.model, d.serial_number, d.status,
                  nd.need_id, n.name, nd.assignment_date,
                  COALESCE(nd.notes, d.notes)
           FROM need_devices nd
           JOIN devices d ON d.device_id = nd.device_id
           JOIN needs n ON n.need_id = nd.need_id
           WHERE nd.need_id = ?1
           ORDER BY d.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAssignedDevice {
              device_id:       row.get(0)?,
              device_name:     row.get(1)?,
              model:           row.get(2)?,
              serial_number:   row.get(3)?,
              status:          row.get(4)?,
              need_id:         row.get(5)?,
              need_name:       row.get(6)?,
              assignment_date: row.get(7)?,
              notes:           row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws
      .into_iter()
      .map(RawAssignedDevice::into_assigned)
      .collect()
  }

  async fn assign_device_to_need(
    &self,
    assignment: NeedDeviceAssignment,
  ) -> Result<NeedDeviceAssignment> {
    self.require_need(assignment.need_id).await?;
    self.require_device(assignment.device_id).await?;

    if self
      .pair_exists(
        DEVICE_ASSIGNMENT_EXISTS,
        assignment.need_id,
        assignment.device_id,
      )
      .await?
    {
      return Err(Error::DeviceAlreadyAssigned {
        need_id:   assignment.need_id,
        device_id: assignment.device_id,
      });
    }

    let need_id_str = encode_uuid(assignment.need_id);
    let device_id_str = encode_uuid(assignment.device_id);
    let assignment_date_str = assignment.assignment_date.map(encode_date);
    let notes = assignment.notes.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO need_devices (need_id, device_id, assignment_date, notes)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            need_id_str,
            device_id_str,
            assignment_date_str,
            notes,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(assignment)
  }

  async fn remove_device_from_need(
    &self,
    need_id: Uuid,
    device_id: Uuid,
  ) -> Result<()> {
    let need_id_str = encode_uuid(need_id);
    let device_id_str = encode_uuid(device_id);
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM need_devices WHERE need_id = ?1 AND device_id = ?2",
          rusqlite::params![need_id_str, device_id_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::DeviceNotAssigned { need_id, device_id });
    }
    Ok(())
  }

  async fn devices_for_pupil(
    &self,
    pupil_id: Uuid,
  ) -> Result<Vec<AssignedDevice>> {
    let needs = self.effective_needs(pupil_id).await?;
    if needs.is_empty() {
      return Ok(Vec::new());
    }

    let ids: Vec<String> =
      needs.iter().map(|n| encode_uuid(n.need_id)).collect();

    let raws: Vec<RawAssignedDevice> = self
      .conn
      .call(move |conn| {
        let placeholders =
          ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
          "SELECT d.device_id, d.name, d.model, d.serial_number, d.status,
                  nd.need_id, n.name, nd.assignment_date,
                  COALESCE(nd.notes, d.notes)
           FROM need_devices nd
           JOIN devices d ON d.device_id = nd.device_id
           JOIN needs n ON n.need_id = nd.need_id
           WHERE nd.need_id IN ({placeholders})
           ORDER BY d.name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok(RawAssignedDevice {
              device_id:       row.get(0)?,
              device_name:     row.get(1)?,
              model:           row.get(2)?,
              serial_number:   row.get(3)?,
              status:          row.get(4)?,
              need_id:         row.get(5)?,
              need_name:       row.get(6)?,
              assignment_date: row.get(7)?,
              notes:           row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws
      .into_iter()
      .map(RawAssignedDevice::into_assigned)
      .collect()
  }

  // ── Resolution ────────────────────────────────────────────────────────

  async fn effective_needs(&self, pupil_id: Uuid) -> Result<Vec<EffectiveNeed>> {
    let id_str = encode_uuid(pupil_id);

    // Fetch all three working sets in one round trip so the resolution
    // sees a single consistent snapshot.
    let (raw_grants, raw_added, raw_removed) = self
      .conn
      .call(move |conn| {
        let mut grant_stmt = conn.prepare(
          "SELECT n.need_id, n.name, n.short_description, n.description,
                  c.category_name
           FROM needs n
           JOIN category_needs cn ON cn.need_id = n.need_id
           JOIN categories c ON c.category_id = cn.category_id
           JOIN pupil_categories pc ON pc.category_id = c.category_id
           WHERE pc.pupil_id = ?1",
        )?;
        let grants = grant_stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawGrant {
              need:          RawNeed {
                need_id:           row.get(0)?,
                name:              row.get(1)?,
                short_description: row.get(2)?,
                description:       row.get(3)?,
              },
              category_name: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut added_stmt = conn.prepare(
          "SELECT n.need_id, n.name, n.short_description, n.description
           FROM pupil_need_overrides o
           JOIN needs n ON n.need_id = o.need_id
           WHERE o.pupil_id = ?1 AND o.is_added = 1",
        )?;
        let added = added_stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawNeed {
              need_id:           row.get(0)?,
              name:              row.get(1)?,
              short_description: row.get(2)?,
              description:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut removed_stmt = conn.prepare(
          "SELECT need_id FROM pupil_need_overrides
           WHERE pupil_id = ?1 AND is_added = 0",
        )?;
        let removed = removed_stmt
          .query_map(rusqlite::params![id_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((grants, added, removed))
      })
      .await
      .map_err(db_err)?;

    let grants = raw_grants
      .into_iter()
      .map(RawGrant::into_grant)
      .collect::<Result<Vec<_>>>()?;
    let added = raw_added
      .into_iter()
      .map(RawNeed::into_need)
      .collect::<Result<Vec<_>>>()?;
    let removed = raw_removed
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<_>>>()?;

    Ok(resolve_effective_needs(grants, added, &removed))
  }
}
