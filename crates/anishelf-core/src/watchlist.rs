//! Personal watch lists: one status per `(user, anime)`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, anime::{Anime, AnimeId}, user::UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
  Watching,
  Completed,
  OnHold,
  Dropped,
  Planned,
}

impl ListStatus {
  pub const ALL: [ListStatus; 5] = [
    ListStatus::Watching,
    ListStatus::Completed,
    ListStatus::OnHold,
    ListStatus::Dropped,
    ListStatus::Planned,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ListStatus::Watching => "watching",
      ListStatus::Completed => "completed",
      ListStatus::OnHold => "on_hold",
      ListStatus::Dropped => "dropped",
      ListStatus::Planned => "planned",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ListStatus::Watching => "Смотрю",
      ListStatus::Completed => "Просмотрено",
      ListStatus::OnHold => "Отложено",
      ListStatus::Dropped => "Брошено",
      ListStatus::Planned => "Запланировано",
    }
  }
}

impl std::str::FromStr for ListStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    ListStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::UnknownListStatus(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
  pub entry_id:   i64,
  pub user_id:    UserId,
  pub anime_id:   AnimeId,
  pub status:     ListStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A watch-list entry joined with its anime.
#[derive(Debug, Clone)]
pub struct WatchListItem {
  pub entry: WatchEntry,
  pub anime: Anime,
}

/// Entry count per status; every status is present, possibly with zero.
pub fn status_counts<'a, I>(statuses: I) -> BTreeMap<&'static str, usize>
where
  I: IntoIterator<Item = &'a ListStatus>,
{
  let mut counts: BTreeMap<&'static str, usize> =
    ListStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
  for status in statuses {
    *counts.entry(status.as_str()).or_default() += 1;
  }
  counts
}
