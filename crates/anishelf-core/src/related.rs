//! Related-anime edges and the inverse-edge planner.
//!
//! Every anime carries an ordered list of `(anime_id, type)` edges. Saving an
//! anime must keep the reciprocal edge on the *other* side of every relation:
//! if A lists B as a sequel, B lists A as a prequel. [`SyncPlan`] computes
//! which inverse edges appear and disappear when a list changes, and applies
//! them to the other records' lists. Storage backends run the plan; nothing in
//! here touches a database.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::anime::AnimeId;

// ─── Relation vocabulary ─────────────────────────────────────────────────────

/// The prequel label. Entries of this type always sort first.
pub const PREQUEL: &str = "Предыстория";
pub const SEQUEL: &str = "Продолжение";
pub const ALTERNATE: &str = "Альтернативная история";

pub fn is_prequel(relation_type: &str) -> bool { relation_type == PREQUEL }

/// The reciprocal label for `relation_type`.
///
/// Prequel and sequel swap; every other label (alternate version included) is
/// its own inverse. Surrounding whitespace is dropped.
pub fn inverse_relation_type(relation_type: &str) -> String {
  let trimmed = relation_type.trim();
  match trimmed {
    PREQUEL => SEQUEL.to_owned(),
    SEQUEL => PREQUEL.to_owned(),
    other => other.to_owned(),
  }
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// One edge of the related-anime graph, as stored on its owning anime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedItem {
  pub anime_id:      AnimeId,
  #[serde(rename = "type")]
  pub relation_type: String,
}

impl RelatedItem {
  pub fn new(anime_id: AnimeId, relation_type: impl Into<String>) -> Self {
    Self { anime_id, relation_type: relation_type.into() }
  }

  fn matches(&self, anime_id: AnimeId, relation_type: &str) -> bool {
    self.anime_id == anime_id && self.relation_type == relation_type
  }
}

/// An edge as submitted by a client; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelatedItem {
  pub anime_id:      Option<AnimeId>,
  #[serde(rename = "type")]
  pub relation_type: Option<String>,
}

impl From<RelatedItem> for RawRelatedItem {
  fn from(item: RelatedItem) -> Self {
    Self { anime_id: Some(item.anime_id), relation_type: Some(item.relation_type) }
  }
}

/// Drop incomplete entries and move prequels to the front.
///
/// Types are trimmed. Entries without an id (or with id `0`) or whose type is
/// blank are discarded. Duplicates are kept.
pub fn normalize<I>(raw: I) -> Vec<RelatedItem>
where
  I: IntoIterator<Item = RawRelatedItem>,
{
  let mut items: Vec<RelatedItem> = raw
    .into_iter()
    .filter_map(|r| match (r.anime_id, r.relation_type) {
      (Some(id), Some(t)) if id != 0 && !t.trim().is_empty() => {
        Some(RelatedItem::new(id, t.trim()))
      }
      _ => None,
    })
    .collect();
  sort_prequels_first(&mut items);
  items
}

/// Stable sort: prequel entries first, everything else keeps input order.
pub fn sort_prequels_first(items: &mut [RelatedItem]) {
  items.sort_by_key(|item| !is_prequel(&item.relation_type));
}

// ─── Planner ─────────────────────────────────────────────────────────────────

/// Inverse-edge changes implied by one anime's list going from `previous` to
/// `current`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
  anime_id:  AnimeId,
  /// Other anime → inverse types to drop from its list.
  removals:  BTreeMap<AnimeId, Vec<String>>,
  /// Other anime → inverse types to append to its list.
  additions: BTreeMap<AnimeId, Vec<String>>,
}

impl SyncPlan {
  /// Plan the synchronisation for `anime_id`.
  ///
  /// Both lists are expected to be normalised; additions are queued in the
  /// order of `current`. Edges pointing at `anime_id` itself are never
  /// propagated.
  pub fn new(
    anime_id: AnimeId,
    current: &[RelatedItem],
    previous: &[RelatedItem],
  ) -> Self {
    let current_keys: BTreeSet<(AnimeId, &str)> = current
      .iter()
      .map(|i| (i.anime_id, i.relation_type.as_str()))
      .collect();

    let mut removals: BTreeMap<AnimeId, Vec<String>> = BTreeMap::new();
    let mut seen_removed = BTreeSet::new();
    for item in previous {
      let key = (item.anime_id, item.relation_type.as_str());
      if item.anime_id == anime_id || current_keys.contains(&key) {
        continue;
      }
      if seen_removed.insert(key) {
        removals
          .entry(item.anime_id)
          .or_default()
          .push(inverse_relation_type(&item.relation_type));
      }
    }

    let mut additions: BTreeMap<AnimeId, Vec<String>> = BTreeMap::new();
    for item in current {
      if item.anime_id == anime_id {
        continue;
      }
      additions
        .entry(item.anime_id)
        .or_default()
        .push(inverse_relation_type(&item.relation_type));
    }

    Self { anime_id, removals, additions }
  }

  pub fn anime_id(&self) -> AnimeId { self.anime_id }

  pub fn is_empty(&self) -> bool { self.removals.is_empty() && self.additions.is_empty() }

  /// Every other anime whose list may change, ascending and deduplicated.
  pub fn affected_ids(&self) -> Vec<AnimeId> {
    self
      .additions
      .keys()
      .chain(self.removals.keys())
      .copied()
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect()
  }

  /// Apply the plan to `other_id`'s current list and return the new list.
  ///
  /// Removals only touch edges that point back at the planned anime with one
  /// of the scheduled types; other edges between the two records survive.
  /// Additions are skipped when the edge is already present.
  pub fn apply(&self, other_id: AnimeId, items: Vec<RelatedItem>) -> Vec<RelatedItem> {
    let mut items = items;
    sort_prequels_first(&mut items);

    if let Some(remove_types) = self.removals.get(&other_id) {
      items.retain(|item| {
        !(item.anime_id == self.anime_id && remove_types.contains(&item.relation_type))
      });
    }

    if let Some(add_types) = self.additions.get(&other_id) {
      for t in add_types {
        if !items.iter().any(|item| item.matches(self.anime_id, t)) {
          items.push(RelatedItem::new(self.anime_id, t.clone()));
        }
      }
    }

    sort_prequels_first(&mut items);
    items
  }
}
