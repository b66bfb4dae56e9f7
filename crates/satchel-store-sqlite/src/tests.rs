//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use satchel_core::{
  Error,
  category::{Category, NewCategory},
  device::{NeedDeviceAssignment, NewDevice},
  form::NewForm,
  need::{Need, NewNeed},
  overrides::NewOverride,
  profile::{PupilSelector, build_profile},
  pupil::{NewPupil, Pupil, PupilUpdate},
  resolve::INDIVIDUAL_ASSIGNMENT,
  store::SchoolStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_pupil(first: &str, last: &str) -> NewPupil {
  NewPupil {
    first_name: first.into(),
    last_name:  last.into(),
    form_id:    None,
    notes:      None,
  }
}

fn new_need(name: &str) -> NewNeed {
  NewNeed {
    name:              name.into(),
    short_description: Some(format!("{name} (short)")),
    description:       None,
  }
}

fn new_category(name: &str) -> NewCategory {
  NewCategory {
    category_name: name.into(),
    description:   None,
  }
}

async fn add_pupil(s: &SqliteStore, first: &str, last: &str) -> Pupil {
  s.add_pupil(new_pupil(first, last)).await.unwrap()
}

async fn add_need(s: &SqliteStore, name: &str) -> Need {
  s.add_need(new_need(name)).await.unwrap()
}

async fn add_category(s: &SqliteStore, name: &str) -> Category {
  s.add_category(new_category(name)).await.unwrap()
}

/// Category with the given needs already in it, assigned to nobody.
async fn category_of(
  s: &SqliteStore,
  name: &str,
  needs: &[&Need],
) -> Category {
  let category = add_category(s, name).await;
  for need in needs {
    s.add_need_to_category(category.category_id, need.need_id)
      .await
      .unwrap();
  }
  category
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_form() {
  let s = store().await;
  let form = s
    .add_form(NewForm {
      form_name:    "7B".into(),
      form_year:    7,
      teacher_name: "Ms Okafor".into(),
    })
    .await
    .unwrap();

  let fetched = s.get_form(form.form_id).await.unwrap().unwrap();
  assert_eq!(fetched.form_name, "7B");
  assert_eq!(fetched.form_year, 7);
  assert_eq!(fetched.teacher_name, "Ms Okafor");
}

#[tokio::test]
async fn get_form_missing_returns_none() {
  let s = store().await;
  assert!(s.get_form(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Pupils ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_pupil_rejects_unknown_form() {
  let s = store().await;
  let mut input = new_pupil("Asha", "Begum");
  input.form_id = Some(Uuid::new_v4());

  let err = s.add_pupil(input).await.unwrap_err();
  assert!(matches!(err, Error::FormNotFound(_)));
}

#[tokio::test]
async fn list_pupils_joins_form_name_and_sorts() {
  let s = store().await;
  let form = s
    .add_form(NewForm {
      form_name:    "7B".into(),
      form_year:    7,
      teacher_name: "Ms Okafor".into(),
    })
    .await
    .unwrap();

  let mut input = new_pupil("Asha", "Begum");
  input.form_id = Some(form.form_id);
  s.add_pupil(input).await.unwrap();
  add_pupil(&s, "Tom", "Adler").await;

  let pupils = s.list_pupils().await.unwrap();
  assert_eq!(pupils.len(), 2);
  // Sorted by last name: Adler before Begum.
  assert_eq!(pupils[0].last_name, "Adler");
  assert_eq!(pupils[0].form_name, None);
  assert_eq!(pupils[1].form_name.as_deref(), Some("7B"));
}

#[tokio::test]
async fn update_pupil_partial_keeps_omitted_fields() {
  let s = store().await;
  let mut input = new_pupil("Asha", "Begum");
  input.notes = Some("left-handed".into());
  let pupil = s.add_pupil(input).await.unwrap();

  let updated = s
    .update_pupil(pupil.pupil_id, PupilUpdate {
      first_name: Some("Aisha".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.first_name, "Aisha");
  assert_eq!(updated.last_name, "Begum");
  assert_eq!(updated.notes.as_deref(), Some("left-handed"));
}

#[tokio::test]
async fn update_pupil_explicit_null_unassigns_form() {
  let s = store().await;
  let form = s
    .add_form(NewForm {
      form_name:    "9C".into(),
      form_year:    9,
      teacher_name: "Mr Hale".into(),
    })
    .await
    .unwrap();

  let mut input = new_pupil("Noah", "Price");
  input.form_id = Some(form.form_id);
  let pupil = s.add_pupil(input).await.unwrap();

  let updated = s
    .update_pupil(pupil.pupil_id, PupilUpdate {
      form_id: Some(None),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.form_id, None);

  let fetched = s.get_pupil(pupil.pupil_id).await.unwrap().unwrap();
  assert_eq!(fetched.form_id, None);
}

#[tokio::test]
async fn update_missing_pupil_errors() {
  let s = store().await;
  let err = s
    .update_pupil(Uuid::new_v4(), PupilUpdate::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PupilNotFound(_)));
}

#[tokio::test]
async fn delete_pupil_cascades_assignments_and_overrides() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;

  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();
  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  need.need_id,
    is_added: false,
    notes:    None,
  })
  .await
  .unwrap();

  s.delete_pupil(pupil.pupil_id).await.unwrap();

  assert!(s.get_pupil(pupil.pupil_id).await.unwrap().is_none());
  assert!(s.list_overrides(pupil.pupil_id).await.unwrap().is_empty());
  assert!(s.pupil_categories(pupil.pupil_id).await.unwrap().is_empty());
  // The category and need themselves survive.
  assert!(s.get_need(need.need_id).await.unwrap().is_some());
  assert!(s.get_category(category.category_id).await.unwrap().is_some());
}

#[tokio::test]
async fn search_pupils_matches_full_name_case_insensitively() {
  let s = store().await;
  add_pupil(&s, "Asha", "Begum").await;
  add_pupil(&s, "Tom", "Adler").await;

  let hits = s.search_pupils("asha beg").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].first_name, "Asha");

  let hits = s.search_pupils("adl").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].last_name, "Adler");
}

#[tokio::test]
async fn find_pupil_by_name_takes_first_in_name_order() {
  let s = store().await;
  add_pupil(&s, "Sam", "Young").await;
  add_pupil(&s, "Sam", "Abbott").await;

  let found = s.find_pupil_by_name("sam").await.unwrap().unwrap();
  assert_eq!(found.last_name, "Abbott");

  assert!(s.find_pupil_by_name("nobody").await.unwrap().is_none());
}

// ─── Needs and categories ────────────────────────────────────────────────────

#[tokio::test]
async fn need_crud_roundtrip() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;

  let updated = s
    .update_need(need.need_id, NewNeed {
      name:              "Hearing support".into(),
      short_description: Some("FM system".into()),
      description:       Some("Radio aid in all lessons".into()),
    })
    .await
    .unwrap();
  assert_eq!(updated.short_description.as_deref(), Some("FM system"));

  s.delete_need(need.need_id).await.unwrap();
  assert!(s.get_need(need.need_id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_referenced_need_is_rejected() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  category_of(&s, "SEN", &[&need]).await;

  let err = s.delete_need(need.need_id).await.unwrap_err();
  assert!(matches!(err, Error::NeedInUse(_)));
}

#[tokio::test]
async fn delete_referenced_category_is_rejected() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;

  let err = s.delete_category(category.category_id).await.unwrap_err();
  assert!(matches!(err, Error::CategoryInUse(_)));

  s.remove_need_from_category(category.category_id, need.need_id)
    .await
    .unwrap();
  s.delete_category(category.category_id).await.unwrap();
}

#[tokio::test]
async fn membership_rejects_duplicates_and_unknown_endpoints() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;

  let err = s
    .add_need_to_category(category.category_id, need.need_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NeedAlreadyInCategory { .. }));

  let err = s
    .add_need_to_category(category.category_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NeedNotFound(_)));

  let err = s
    .remove_need_from_category(category.category_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NeedNotInCategory { .. }));
}

#[tokio::test]
async fn need_categories_reverse_lookup() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  category_of(&s, "SEN", &[&need]).await;
  category_of(&s, "Audiology", &[&need]).await;

  let categories = s.need_categories(need.need_id).await.unwrap();
  let names: Vec<&str> =
    categories.iter().map(|c| c.category_name.as_str()).collect();
  assert_eq!(names, ["Audiology", "SEN"]);
}

// ─── Pupil-category assignment ───────────────────────────────────────────────

#[tokio::test]
async fn duplicate_assignment_is_rejected() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let category = add_category(&s, "SEN").await;

  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();
  let err = s
    .assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CategoryAlreadyAssigned { .. }));
}

#[tokio::test]
async fn remove_unassigned_category_errors() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let category = add_category(&s, "SEN").await;

  let err = s
    .remove_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CategoryNotAssigned { .. }));
}

// ─── Overrides ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn overrides_listed_most_recent_first() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let n1 = add_need(&s, "Hearing support").await;
  let n2 = add_need(&s, "Large print").await;

  let first = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  n1.need_id,
      is_added: true,
      notes:    None,
    })
    .await
    .unwrap();
  let second = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  n2.need_id,
      is_added: false,
      notes:    Some("reassessed".into()),
    })
    .await
    .unwrap();

  let listed = s.list_overrides(pupil.pupil_id).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].override_id, second.override_id);
  assert_eq!(listed[1].override_id, first.override_id);
}

#[tokio::test]
async fn second_override_for_same_pair_is_rejected() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;

  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  need.need_id,
    is_added: true,
    notes:    None,
  })
  .await
  .unwrap();

  // Even an opposite-typed row is refused; edits go through update.
  let err = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  need.need_id,
      is_added: false,
      notes:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NeedAlreadyOverridden { .. }));
}

#[tokio::test]
async fn update_override_flips_type_and_notes() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;

  let record = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  need.need_id,
      is_added: true,
      notes:    None,
    })
    .await
    .unwrap();

  let updated = s
    .update_override(record.override_id, false, Some("reassessed".into()))
    .await
    .unwrap();
  assert!(!updated.is_added);
  assert_eq!(updated.notes.as_deref(), Some("reassessed"));

  let listed = s.list_overrides(pupil.pupil_id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert!(!listed[0].is_added);
}

#[tokio::test]
async fn update_or_remove_missing_override_errors() {
  let s = store().await;
  let err = s
    .update_override(Uuid::new_v4(), true, None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OverrideNotFound(_)));

  let err = s.remove_override(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::OverrideNotFound(_)));
}

#[tokio::test]
async fn add_override_validates_endpoints() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;

  let err = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  Uuid::new_v4(),
      is_added: true,
      notes:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NeedNotFound(_)));

  let err = s
    .add_override(NewOverride {
      pupil_id: Uuid::new_v4(),
      need_id:  Uuid::new_v4(),
      is_added: true,
      notes:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PupilNotFound(_)));
}

// ─── Effective needs ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pupil_with_nothing_assigned_resolves_to_empty() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert!(needs.is_empty());

  // Unknown pupils also resolve to empty; existence is the caller's job.
  assert!(s.effective_needs(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn category_union_retains_every_contributing_category() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let n1 = add_need(&s, "Hearing support").await;
  let n2 = add_need(&s, "Large print").await;
  let n3 = add_need(&s, "Movement breaks").await;

  let c1 = category_of(&s, "SEN", &[&n1, &n2]).await;
  let c2 = category_of(&s, "Visual impairment", &[&n2, &n3]).await;
  s.assign_category(pupil.pupil_id, c1.category_id).await.unwrap();
  s.assign_category(pupil.pupil_id, c2.category_id).await.unwrap();

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert_eq!(needs.len(), 3);

  let shared = needs.iter().find(|n| n.need_id == n2.need_id).unwrap();
  assert_eq!(shared.sources, "SEN, Visual impairment");
  let single = needs.iter().find(|n| n.need_id == n1.need_id).unwrap();
  assert_eq!(single.sources, "SEN");
}

#[tokio::test]
async fn removal_override_excludes_category_derived_need() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  need.need_id,
    is_added: false,
    notes:    Some("no longer needed".into()),
  })
  .await
  .unwrap();

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert!(needs.is_empty());
}

#[tokio::test]
async fn addition_override_applies_with_no_categories() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Quiet room access").await;

  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  need.need_id,
    is_added: true,
    notes:    None,
  })
  .await
  .unwrap();

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0].need_id, need.need_id);
  assert_eq!(needs[0].sources, INDIVIDUAL_ASSIGNMENT);
}

#[tokio::test]
async fn redundant_addition_reports_category_provenance() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  need.need_id,
    is_added: true,
    notes:    None,
  })
  .await
  .unwrap();

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0].sources, "SEN");
}

#[tokio::test]
async fn recomputation_without_mutation_is_stable() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let n1 = add_need(&s, "Hearing support").await;
  let n2 = add_need(&s, "Large print").await;
  let category = category_of(&s, "SEN", &[&n1, &n2]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  let first = s.effective_needs(pupil.pupil_id).await.unwrap();
  let second = s.effective_needs(pupil.pupil_id).await.unwrap();

  let shape = |needs: &[satchel_core::resolve::EffectiveNeed]| {
    needs
      .iter()
      .map(|n| (n.need_id, n.name.clone(), n.sources.clone()))
      .collect::<Vec<_>>()
  };
  assert_eq!(shape(&first), shape(&second));
}

#[tokio::test]
async fn deleting_removal_override_restores_the_need() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  let record = s
    .add_override(NewOverride {
      pupil_id: pupil.pupil_id,
      need_id:  need.need_id,
      is_added: false,
      notes:    None,
    })
    .await
    .unwrap();
  assert!(s.effective_needs(pupil.pupil_id).await.unwrap().is_empty());

  s.remove_override(record.override_id).await.unwrap();

  let needs = s.effective_needs(pupil.pupil_id).await.unwrap();
  assert_eq!(needs.len(), 1);
  assert_eq!(needs[0].need_id, need.need_id);
  assert_eq!(needs[0].sources, "SEN");
}

// ─── Devices ─────────────────────────────────────────────────────────────────

fn new_device(name: &str) -> NewDevice {
  NewDevice {
    name:          name.into(),
    model:         Some("Mk II".into()),
    serial_number: None,
    purchase_date: NaiveDate::from_ymd_opt(2024, 9, 1),
    warranty_info: None,
    status:        Some("available".into()),
    notes:         Some("shared stock".into()),
    category_id:   None,
  }
}

#[tokio::test]
async fn assign_device_and_list_by_need() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  let device = s.add_device(new_device("FM transmitter")).await.unwrap();

  s.assign_device_to_need(NeedDeviceAssignment {
    need_id:         need.need_id,
    device_id:       device.device_id,
    assignment_date: NaiveDate::from_ymd_opt(2025, 1, 6),
    notes:           None,
  })
  .await
  .unwrap();

  let assigned = s.need_devices(need.need_id).await.unwrap();
  assert_eq!(assigned.len(), 1);
  assert_eq!(assigned[0].device_name, "FM transmitter");
  assert_eq!(assigned[0].need_name, "Hearing support");
  // Assignment carried no notes, so the device's own notes show through.
  assert_eq!(assigned[0].notes.as_deref(), Some("shared stock"));

  let err = s
    .assign_device_to_need(NeedDeviceAssignment {
      need_id:         need.need_id,
      device_id:       device.device_id,
      assignment_date: None,
      notes:           None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DeviceAlreadyAssigned { .. }));
}

#[tokio::test]
async fn unassigned_devices_excludes_assigned_ones() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  let assigned = s.add_device(new_device("FM transmitter")).await.unwrap();
  let spare = s.add_device(new_device("Spare receiver")).await.unwrap();

  s.assign_device_to_need(NeedDeviceAssignment {
    need_id:         need.need_id,
    device_id:       assigned.device_id,
    assignment_date: None,
    notes:           None,
  })
  .await
  .unwrap();

  let unassigned = s.unassigned_devices().await.unwrap();
  assert_eq!(unassigned.len(), 1);
  assert_eq!(unassigned[0].device_id, spare.device_id);
}

#[tokio::test]
async fn delete_assigned_device_is_rejected() {
  let s = store().await;
  let need = add_need(&s, "Hearing support").await;
  let device = s.add_device(new_device("FM transmitter")).await.unwrap();
  s.assign_device_to_need(NeedDeviceAssignment {
    need_id:         need.need_id,
    device_id:       device.device_id,
    assignment_date: None,
    notes:           None,
  })
  .await
  .unwrap();

  let err = s.delete_device(device.device_id).await.unwrap_err();
  assert!(matches!(err, Error::DeviceInUse(_)));

  s.remove_device_from_need(need.need_id, device.device_id)
    .await
    .unwrap();
  s.delete_device(device.device_id).await.unwrap();
}

#[tokio::test]
async fn devices_for_pupil_follows_the_effective_set() {
  let s = store().await;
  let pupil = add_pupil(&s, "Asha", "Begum").await;
  let granted = add_need(&s, "Hearing support").await;
  let blocked = add_need(&s, "Large print").await;
  let category = category_of(&s, "SEN", &[&granted, &blocked]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  let fm = s.add_device(new_device("FM transmitter")).await.unwrap();
  let magnifier = s.add_device(new_device("Video magnifier")).await.unwrap();
  s.assign_device_to_need(NeedDeviceAssignment {
    need_id:         granted.need_id,
    device_id:       fm.device_id,
    assignment_date: None,
    notes:           Some("on loan".into()),
  })
  .await
  .unwrap();
  s.assign_device_to_need(NeedDeviceAssignment {
    need_id:         blocked.need_id,
    device_id:       magnifier.device_id,
    assignment_date: None,
    notes:           None,
  })
  .await
  .unwrap();

  // Block one need; its device must drop out of the pupil view.
  s.add_override(NewOverride {
    pupil_id: pupil.pupil_id,
    need_id:  blocked.need_id,
    is_added: false,
    notes:    None,
  })
  .await
  .unwrap();

  let devices = s.devices_for_pupil(pupil.pupil_id).await.unwrap();
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].device_id, fm.device_id);
  assert_eq!(devices[0].notes.as_deref(), Some("on loan"));
}

// ─── Profile aggregation ─────────────────────────────────────────────────────

#[tokio::test]
async fn profile_composes_all_sections() {
  let s = store().await;
  let form = s
    .add_form(NewForm {
      form_name:    "7B".into(),
      form_year:    7,
      teacher_name: "Ms Okafor".into(),
    })
    .await
    .unwrap();

  let mut input = new_pupil("Asha", "Begum");
  input.form_id = Some(form.form_id);
  let pupil = s.add_pupil(input).await.unwrap();

  let need = add_need(&s, "Hearing support").await;
  let category = category_of(&s, "SEN", &[&need]).await;
  s.assign_category(pupil.pupil_id, category.category_id)
    .await
    .unwrap();

  let profile = build_profile(&s, PupilSelector::ById(pupil.pupil_id))
    .await
    .unwrap();

  assert_eq!(profile.first_name, "Asha");
  assert_eq!(profile.form.as_ref().unwrap().form_name, "7B");
  assert_eq!(profile.categories.len(), 1);
  assert_eq!(profile.effective_needs.len(), 1);
  assert_eq!(profile.effective_needs[0].sources, "SEN");
  assert!(profile.need_overrides.is_empty());
  assert!(profile.devices.is_empty());
}

#[tokio::test]
async fn profile_by_name_and_missing_pupil() {
  let s = store().await;
  add_pupil(&s, "Asha", "Begum").await;

  let profile = build_profile(&s, PupilSelector::ByName("asha".into()))
    .await
    .unwrap();
  assert_eq!(profile.last_name, "Begum");

  let err = build_profile(&s, PupilSelector::ByName("nobody".into()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoPupilMatch(_)));

  let err = build_profile(&s, PupilSelector::ById(Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PupilNotFound(_)));
}
