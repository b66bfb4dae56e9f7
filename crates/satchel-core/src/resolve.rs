//! Effective-needs resolution — the set algebra that decides which needs
//! apply to a pupil.
//!
//! Three working sets feed the computation: needs derived from the pupil's
//! assigned categories, needs granted by addition overrides, and need ids
//! blocked by removal overrides. The result is
//! `(derived ∪ added) − removed`, deduplicated by need id. Removal wins
//! unconditionally, so the outcome stays deterministic even if a
//! hand-edited database holds conflicting override rows for one pair.
//!
//! The resolution is computed fresh on every call; nothing here is cached
//! or stored.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::need::Need;

/// Provenance marker for a need granted only by an addition override.
pub const INDIVIDUAL_ASSIGNMENT: &str = "Individual assignment";

/// One edge of the category-derived working set: a need together with the
/// name of one assigned category that grants it. A need reachable through
/// several categories appears once per category.
#[derive(Debug, Clone)]
pub struct CategoryGrant {
  pub need:          Need,
  pub category_name: String,
}

/// A need in a pupil's resolved set, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveNeed {
  pub need_id:           Uuid,
  pub name:              String,
  pub description:       Option<String>,
  pub short_description: Option<String>,
  /// Comma-joined names of the granting categories, or
  /// [`INDIVIDUAL_ASSIGNMENT`] when only an addition override applies.
  pub sources:           String,
}

/// Resolve the effective needs for one pupil.
///
/// * `grants` — (need, category name) edges through assigned categories.
/// * `added` — needs with an `is_added = true` override.
/// * `removed` — need ids with an `is_added = false` override.
///
/// Category provenance masks a redundant addition override: a need that is
/// both derived and added reports its categories, not the manual marker.
/// Output is ordered by need name, ascending, case-insensitively.
pub fn resolve_effective_needs(
  grants: Vec<CategoryGrant>,
  added: Vec<Need>,
  removed: &[Uuid],
) -> Vec<EffectiveNeed> {
  let removed: HashSet<Uuid> = removed.iter().copied().collect();

  // Category-derived set, retaining every contributing category name.
  // BTreeSet dedupes repeat grants and fixes the join order.
  let mut derived: HashMap<Uuid, (Need, BTreeSet<String>)> = HashMap::new();
  for CategoryGrant { need, category_name } in grants {
    derived
      .entry(need.need_id)
      .or_insert_with(|| (need, BTreeSet::new()))
      .1
      .insert(category_name);
  }

  // Union in the added set; needs already derived keep category provenance.
  for need in added {
    derived
      .entry(need.need_id)
      .or_insert_with(|| (need, BTreeSet::new()));
  }

  let mut needs: Vec<EffectiveNeed> = derived
    .into_values()
    .filter(|(need, _)| !removed.contains(&need.need_id))
    .map(|(need, categories)| EffectiveNeed {
      need_id:           need.need_id,
      name:              need.name,
      description:       need.description,
      short_description: need.short_description,
      sources:           if categories.is_empty() {
        INDIVIDUAL_ASSIGNMENT.to_string()
      } else {
        categories.into_iter().collect::<Vec<_>>().join(", ")
      },
    })
    .collect();

  needs.sort_by_cached_key(|n| n.name.to_lowercase());
  needs
}
