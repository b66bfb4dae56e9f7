//! Pupil profile aggregation — the composite read model behind the
//! profile page.
//!
//! The profile is assembled on read from the stores; nothing here is
//! persisted. Mutations go directly to the relevant store and the page
//! re-fetches the aggregate to see the recomputed effective set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  category::Category,
  device::AssignedDevice,
  form::Form,
  overrides::OverrideView,
  pupil::Pupil,
  resolve::EffectiveNeed,
  store::SchoolStore,
};

/// How the caller identifies the pupil to aggregate.
#[derive(Debug, Clone)]
pub enum PupilSelector {
  /// Exact id lookup.
  ById(Uuid),
  /// Case-insensitive substring match over "first last"; the first match
  /// in (last, first) order wins.
  ByName(String),
}

/// Everything the profile page shows for one pupil.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PupilProfile {
  pub pupil_id:        Uuid,
  pub first_name:      String,
  pub last_name:       String,
  pub notes:           Option<String>,
  pub form:            Option<Form>,
  pub categories:      Vec<Category>,
  pub effective_needs: Vec<EffectiveNeed>,
  pub need_overrides:  Vec<OverrideView>,
  /// Devices assigned to any need in the effective set.
  pub devices:         Vec<AssignedDevice>,
}

/// Build the composite profile view for one pupil.
///
/// Fails with `PupilNotFound` / `NoPupilMatch` when the selector resolves
/// to nothing; everything past that point is plain read composition.
pub async fn build_profile<S: SchoolStore>(
  store: &S,
  selector: PupilSelector,
) -> Result<PupilProfile> {
  let pupil: Pupil = match selector {
    PupilSelector::ById(id) => {
      store.get_pupil(id).await?.ok_or(Error::PupilNotFound(id))?
    }
    PupilSelector::ByName(name) => store
      .find_pupil_by_name(&name)
      .await?
      .ok_or(Error::NoPupilMatch(name))?,
  };

  let form = match pupil.form_id {
    Some(form_id) => store.get_form(form_id).await?,
    None => None,
  };

  let categories = store.pupil_categories(pupil.pupil_id).await?;
  let effective_needs = store.effective_needs(pupil.pupil_id).await?;
  let need_overrides = store.pupil_override_views(pupil.pupil_id).await?;
  let devices = store.devices_for_pupil(pupil.pupil_id).await?;

  Ok(PupilProfile {
    pupil_id: pupil.pupil_id,
    first_name: pupil.first_name,
    last_name: pupil.last_name,
    notes: pupil.notes,
    form,
    categories,
    effective_needs,
    need_overrides,
    devices,
  })
}
