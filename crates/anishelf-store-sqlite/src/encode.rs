//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision so that lexical and chronological order agree. Calendar dates
//! are `YYYY-MM-DD`. Genre, studio and main-character lists and notification
//! payloads are compact JSON.

use anishelf_core::{
  anime::{Anime, MainCharacter, StudioId},
  comment::Comment,
  friend::FriendRequest,
  notification::{Notification, NotificationData},
  related::{self, RelatedItem},
  user::User,
  watchlist::WatchEntry,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_genres(genres: &[String]) -> Result<String> { Ok(serde_json::to_string(genres)?) }

pub fn decode_genres(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_studios(ids: &[StudioId]) -> Result<String> { Ok(serde_json::to_string(ids)?) }

pub fn decode_studios(s: &str) -> Result<Vec<StudioId>> { Ok(serde_json::from_str(s)?) }

pub fn encode_characters(characters: &[MainCharacter]) -> Result<String> {
  Ok(serde_json::to_string(characters)?)
}

pub fn decode_characters(s: &str) -> Result<Vec<MainCharacter>> { Ok(serde_json::from_str(s)?) }

fn decode_episodes(v: Option<i64>) -> Result<Option<u32>> {
  v.map(|n| u32::try_from(n).map_err(|_| Error::NegativeEpisodes(n))).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `users` row.
pub struct RawUser {
  pub user_id:     i64,
  pub username:    String,
  pub avatar_path: Option<String>,
  pub role:        String,
  pub created_at:  String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, username, avatar_path, role, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:     row.get(0)?,
      username:    row.get(1)?,
      avatar_path: row.get(2)?,
      role:        row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:     self.user_id,
      username:    self.username,
      avatar_path: self.avatar_path,
      role:        self.role.parse()?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from an `anime` row plus its ordered relation rows.
pub struct RawAnime {
  pub anime_id:        i64,
  pub title:           String,
  pub alt_title:       Option<String>,
  pub kind:            String,
  pub year:            i32,
  pub genres:          String,
  pub episodes:        Option<i64>,
  pub status:          String,
  pub source:          Option<String>,
  pub season_date:     String,
  pub description:     Option<String>,
  pub trailer_url:     Option<String>,
  pub cover_path:      Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub studios:         String,
  pub main_characters: String,
  pub mpaa_rating:     Option<String>,
  pub age_rating:      Option<String>,
  pub duration:        Option<String>,
  pub related:         Vec<RelatedItem>,
}

impl RawAnime {
  pub const COLUMNS: &'static str = "a.anime_id, a.title, a.alt_title, a.kind, a.year, a.genres, \
                                     a.episodes, a.status, a.source, a.season_date, \
                                     a.description, a.trailer_url, a.cover_path, \
                                     a.created_at, a.updated_at, a.studios, \
                                     a.main_characters, a.mpaa_rating, a.age_rating, \
                                     a.duration";

  /// Reads the anime columns; `related` is filled in separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      anime_id:        row.get(0)?,
      title:           row.get(1)?,
      alt_title:       row.get(2)?,
      kind:            row.get(3)?,
      year:            row.get(4)?,
      genres:          row.get(5)?,
      episodes:        row.get(6)?,
      status:          row.get(7)?,
      source:          row.get(8)?,
      season_date:     row.get(9)?,
      description:     row.get(10)?,
      trailer_url:     row.get(11)?,
      cover_path:      row.get(12)?,
      created_at:      row.get(13)?,
      updated_at:      row.get(14)?,
      studios:         row.get(15)?,
      main_characters: row.get(16)?,
      mpaa_rating:     row.get(17)?,
      age_rating:      row.get(18)?,
      duration:        row.get(19)?,
      related:         Vec::new(),
    })
  }

  pub fn into_anime(self) -> Result<Anime> {
    let mut related_items = self.related;
    related::sort_prequels_first(&mut related_items);

    Ok(Anime {
      anime_id: self.anime_id,
      title: self.title,
      alt_title: self.alt_title,
      kind: self.kind,
      year: self.year,
      genres: decode_genres(&self.genres)?,
      episodes: decode_episodes(self.episodes)?,
      status: self.status,
      source: self.source,
      season_date: decode_date(&self.season_date)?,
      description: self.description,
      trailer_url: self.trailer_url,
      cover_path: self.cover_path,
      studios: decode_studios(&self.studios)?,
      mpaa_rating: self.mpaa_rating,
      age_rating: self.age_rating,
      duration: self.duration,
      main_characters: decode_characters(&self.main_characters)?,
      related_items,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `comments` row.
pub struct RawComment {
  pub comment_id: i64,
  pub anime_id:   i64,
  pub user_id:    i64,
  pub parent_id:  Option<i64>,
  pub body:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  pub const COLUMNS: &'static str =
    "c.comment_id, c.anime_id, c.user_id, c.parent_id, c.body, c.created_at, c.updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      anime_id:   row.get(1)?,
      user_id:    row.get(2)?,
      parent_id:  row.get(3)?,
      body:       row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: self.comment_id,
      anime_id:   self.anime_id,
      user_id:    self.user_id,
      parent_id:  self.parent_id,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from an `anime_lists` row.
pub struct RawWatchEntry {
  pub entry_id:   i64,
  pub user_id:    i64,
  pub anime_id:   i64,
  pub status:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawWatchEntry {
  pub const COLUMNS: &'static str = "entry_id, user_id, anime_id, status, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:   row.get(0)?,
      user_id:    row.get(1)?,
      anime_id:   row.get(2)?,
      status:     row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<WatchEntry> {
    Ok(WatchEntry {
      entry_id:   self.entry_id,
      user_id:    self.user_id,
      anime_id:   self.anime_id,
      status:     self.status.parse()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `friend_requests` row.
pub struct RawFriendRequest {
  pub request_id:   i64,
  pub requester_id: i64,
  pub addressee_id: i64,
  pub status:       String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawFriendRequest {
  pub const COLUMNS: &'static str =
    "request_id, requester_id, addressee_id, status, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:   row.get(0)?,
      requester_id: row.get(1)?,
      addressee_id: row.get(2)?,
      status:       row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_request(self) -> Result<FriendRequest> {
    Ok(FriendRequest {
      request_id:   self.request_id,
      requester_id: self.requester_id,
      addressee_id: self.addressee_id,
      status:       self.status.parse()?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         i64,
  pub data:            String,
  pub read_at:         Option<String>,
  pub created_at:      String,
}

impl RawNotification {
  pub const COLUMNS: &'static str = "notification_id, user_id, data, read_at, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      user_id:         row.get(1)?,
      data:            row.get(2)?,
      read_at:         row.get(3)?,
      created_at:      row.get(4)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    let data: NotificationData = serde_json::from_str(&self.data)?;
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id: self.user_id,
      data,
      read_at: self.read_at.as_deref().map(decode_dt).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_have_fixed_width() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&ea).unwrap(), a);
  }

  #[test]
  fn dates_use_iso_format() {
    let d = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    assert_eq!(encode_date(d), "2024-04-01");
    assert_eq!(decode_date("2024-04-01").unwrap(), d);
    assert!(decode_date("01.04.2024").is_err());
  }

  #[test]
  fn negative_episode_counts_are_rejected() {
    assert_eq!(decode_episodes(Some(12)).unwrap(), Some(12));
    assert!(matches!(decode_episodes(Some(-1)), Err(Error::NegativeEpisodes(-1))));
  }
}
