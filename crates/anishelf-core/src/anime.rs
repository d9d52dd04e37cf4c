//! Anime records and catalog queries.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{media, related::RelatedItem};

pub type AnimeId = i64;
pub type StudioId = i64;
pub type CharacterId = i64;

/// Studios kept per anime.
pub const MAX_STUDIOS: usize = 5;

// ─── Record ──────────────────────────────────────────────────────────────────

/// A catalog entry together with its related-anime edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anime {
  pub anime_id:        AnimeId,
  pub title:           String,
  pub alt_title:       Option<String>,
  /// Free-form format label, e.g. "TV" or "Фильм".
  #[serde(rename = "type")]
  pub kind:            String,
  /// Always the year of `season_date`.
  pub year:            i32,
  pub genres:          Vec<String>,
  pub episodes:        Option<u32>,
  pub status:          String,
  pub source:          Option<String>,
  pub season_date:     NaiveDate,
  pub description:     Option<String>,
  pub trailer_url:     Option<String>,
  pub cover_path:      Option<String>,
  /// Studio ids, lead studio first.
  pub studios:         Vec<StudioId>,
  pub mpaa_rating:     Option<String>,
  pub age_rating:      Option<String>,
  pub duration:        Option<String>,
  pub main_characters: Vec<MainCharacter>,
  /// Normalised: prequels first, then everything else in stored order.
  pub related_items:   Vec<RelatedItem>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Anime {
  pub fn season_label(&self) -> String { season_label(self.season_date) }

  pub fn cover_url(&self) -> Option<String> {
    self.cover_path.as_deref().map(media::public_url)
  }

  /// The first related edge, kept for clients that only show one relation.
  pub fn primary_related(&self) -> Option<&RelatedItem> { self.related_items.first() }

  pub fn related_anime_id(&self) -> Option<AnimeId> {
    self.primary_related().map(|r| r.anime_id)
  }

  pub fn related_type(&self) -> Option<&str> {
    self.primary_related().map(|r| r.relation_type.as_str())
  }

  /// The lead studio.
  pub fn studio_id(&self) -> Option<StudioId> { self.studios.first().copied() }

  pub fn main_character_id(&self) -> Option<CharacterId> {
    self.main_characters.first().and_then(|c| c.id)
  }

  /// Every main character's voice actor joined with `" | "`.
  pub fn main_voice_actor(&self) -> Option<String> { join_voice_actors(&self.main_characters) }
}

/// Everything needed to create or overwrite an anime record.
#[derive(Debug, Clone)]
pub struct NewAnime {
  pub title:           String,
  pub alt_title:       Option<String>,
  pub kind:            String,
  pub genres:          Vec<String>,
  pub episodes:        Option<u32>,
  pub status:          String,
  pub source:          Option<String>,
  pub season_date:     NaiveDate,
  pub description:     Option<String>,
  pub trailer_url:     Option<String>,
  pub cover_path:      Option<String>,
  /// Deduplicated, at most [`MAX_STUDIOS`] (see [`normalize_studios`]).
  pub studios:         Vec<StudioId>,
  pub mpaa_rating:     Option<String>,
  pub age_rating:      Option<String>,
  pub duration:        Option<String>,
  /// See [`normalize_main_characters`].
  pub main_characters: Vec<MainCharacter>,
  /// Must already be normalised (see [`crate::related::normalize`]).
  pub related_items:   Vec<RelatedItem>,
}

impl NewAnime {
  pub fn year(&self) -> i32 { self.season_date.year() }
}

// ─── Studios and characters ──────────────────────────────────────────────────

/// A lead character listed on an anime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCharacter {
  pub id:          Option<CharacterId>,
  pub name:        String,
  pub voice_actor: Option<String>,
}

/// A main-character entry as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawMainCharacter {
  pub id:          Option<CharacterId>,
  pub name:        Option<String>,
  pub voice_actor: Option<String>,
}

/// Positive ids only, first occurrence wins, capped at [`MAX_STUDIOS`].
///
/// An empty list falls back to the single `legacy` studio id.
pub fn normalize_studios(ids: &[StudioId], legacy: Option<StudioId>) -> Vec<StudioId> {
  let mut out: Vec<StudioId> = Vec::new();
  for &id in ids {
    if id > 0 && !out.contains(&id) {
      out.push(id);
    }
    if out.len() == MAX_STUDIOS {
      break;
    }
  }
  if out.is_empty()
    && let Some(id) = legacy.filter(|&id| id > 0)
  {
    out.push(id);
  }
  out
}

fn trimmed(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Trim names and voice actors and drop entries without a name.
pub fn normalize_main_characters<I>(raw: I) -> Vec<MainCharacter>
where
  I: IntoIterator<Item = RawMainCharacter>,
{
  raw
    .into_iter()
    .filter_map(|r| {
      Some(MainCharacter {
        id:          r.id.filter(|&id| id > 0),
        name:        trimmed(r.name)?,
        voice_actor: trimmed(r.voice_actor),
      })
    })
    .collect()
}

/// `None` for an empty list; a character without a voice actor contributes
/// an empty segment.
pub fn join_voice_actors(characters: &[MainCharacter]) -> Option<String> {
  if characters.is_empty() {
    return None;
  }
  Some(
    characters
      .iter()
      .map(|c| c.voice_actor.as_deref().unwrap_or(""))
      .collect::<Vec<_>>()
      .join(" | "),
  )
}

/// Display label for the broadcast season of `date`, e.g. "Весна 2024".
pub fn season_label(date: NaiveDate) -> String {
  let season = match date.month() {
    12 | 1 | 2 => "Зима",
    3..=5 => "Весна",
    6..=8 => "Лето",
    _ => "Осень",
  };
  format!("{season} {}", date.year())
}

// ─── Catalog query ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  Title,
  #[default]
  Created,
  /// Season date, then creation time.
  Season,
}

impl SortField {
  /// `title` and `created` are recognised; anything else sorts by season.
  pub fn parse(s: &str) -> Self {
    match s {
      "title" => SortField::Title,
      "created" => SortField::Created,
      _ => SortField::Season,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
  Asc,
  #[default]
  Desc,
}

impl SortDir {
  /// Only `asc` is ascending.
  pub fn parse(s: &str) -> Self {
    if s == "asc" { SortDir::Asc } else { SortDir::Desc }
  }

  pub fn as_sql(self) -> &'static str {
    match self {
      SortDir::Asc => "ASC",
      SortDir::Desc => "DESC",
    }
  }
}

/// Parameters for [`crate::store::CatalogStore::list_anime`].
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
  /// Substring matched against title and alternative title.
  pub text:      Option<String>,
  /// Every listed genre must be present.
  pub genres:    Vec<String>,
  pub kind:      Option<String>,
  pub status:    Option<String>,
  pub year_from: Option<i32>,
  pub year_to:   Option<i32>,
  pub sort:      SortField,
  pub dir:       SortDir,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, 1).unwrap() }

  #[test]
  fn season_boundaries() {
    assert_eq!(season_label(date(2024, 12)), "Зима 2024");
    assert_eq!(season_label(date(2024, 1)), "Зима 2024");
    assert_eq!(season_label(date(2024, 2)), "Зима 2024");
    assert_eq!(season_label(date(2024, 3)), "Весна 2024");
    assert_eq!(season_label(date(2024, 5)), "Весна 2024");
    assert_eq!(season_label(date(2024, 6)), "Лето 2024");
    assert_eq!(season_label(date(2024, 8)), "Лето 2024");
    assert_eq!(season_label(date(2024, 9)), "Осень 2024");
    assert_eq!(season_label(date(2024, 11)), "Осень 2024");
  }

  #[test]
  fn studios_are_deduplicated_and_capped() {
    assert_eq!(normalize_studios(&[3, 0, 3, -1, 7], None), vec![3, 7]);
    assert_eq!(normalize_studios(&[1, 2, 3, 4, 5, 6, 7], Some(9)), vec![1, 2, 3, 4, 5]);
    assert_eq!(normalize_studios(&[], Some(9)), vec![9]);
    assert_eq!(normalize_studios(&[0], Some(0)), Vec::<StudioId>::new());
  }

  #[test]
  fn main_characters_need_a_name() {
    let raw = vec![
      RawMainCharacter {
        id:          Some(4),
        name:        Some("  Okabe Rintarou ".into()),
        voice_actor: Some(" Miyano Mamoru".into()),
      },
      RawMainCharacter { id: Some(5), name: Some("   ".into()), voice_actor: None },
      RawMainCharacter { id: None, name: Some("Makise Kurisu".into()), voice_actor: Some("".into()) },
    ];
    let chars = normalize_main_characters(raw);
    assert_eq!(chars, vec![
      MainCharacter {
        id:          Some(4),
        name:        "Okabe Rintarou".into(),
        voice_actor: Some("Miyano Mamoru".into()),
      },
      MainCharacter { id: None, name: "Makise Kurisu".into(), voice_actor: None },
    ]);
    assert_eq!(join_voice_actors(&chars).as_deref(), Some("Miyano Mamoru | "));
    assert_eq!(join_voice_actors(&[]), None);
  }

  #[test]
  fn sort_parsing_falls_back() {
    assert_eq!(SortField::parse("title"), SortField::Title);
    assert_eq!(SortField::parse("created"), SortField::Created);
    assert_eq!(SortField::parse("season"), SortField::Season);
    assert_eq!(SortField::parse("whatever"), SortField::Season);
    assert_eq!(SortDir::parse("asc"), SortDir::Asc);
    assert_eq!(SortDir::parse("ASC"), SortDir::Desc);
    assert_eq!(SortDir::parse(""), SortDir::Desc);
  }
}
