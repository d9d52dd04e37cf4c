//! Related-anime edge rows and inverse-edge synchronisation.
//!
//! These helpers run on the connection thread, inside whatever transaction
//! the caller has opened, so a save and its inverse updates commit together.

use anishelf_core::{
  anime::AnimeId,
  related::{RelatedItem, SyncPlan},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::encode::RawAnime;

/// Stored edges of `anime_id` in list order.
pub fn read_relations(conn: &Connection, anime_id: AnimeId) -> rusqlite::Result<Vec<RelatedItem>> {
  let mut stmt = conn.prepare_cached(
    "SELECT related_anime_id, relation_type FROM anime_relations
     WHERE anime_id = ?1 ORDER BY position",
  )?;
  stmt
    .query_map(params![anime_id], |row| Ok(RelatedItem::new(row.get(0)?, row.get::<_, String>(1)?)))?
    .collect()
}

/// Replace the whole edge list of `anime_id`.
///
/// Repeated `(related_anime_id, relation_type)` pairs collapse onto the first
/// occurrence.
pub fn write_relations(
  conn: &Connection,
  anime_id: AnimeId,
  items: &[RelatedItem],
) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM anime_relations WHERE anime_id = ?1", params![anime_id])?;
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO anime_relations (anime_id, related_anime_id, relation_type, position)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (position, item) in items.iter().enumerate() {
    stmt.execute(params![anime_id, item.anime_id, item.relation_type, position as i64])?;
  }
  Ok(())
}

pub fn anime_exists(conn: &Connection, anime_id: AnimeId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM anime WHERE anime_id = ?1", params![anime_id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// Apply `plan` to every anime it touches. Anime that no longer exist are
/// skipped. Returns how many lists were rewritten.
pub fn sync_inverse_edges(conn: &Connection, plan: &SyncPlan) -> rusqlite::Result<usize> {
  let mut rewritten = 0;
  for other_id in plan.affected_ids() {
    if !anime_exists(conn, other_id)? {
      tracing::debug!(anime_id = plan.anime_id(), other_id, "skipping missing related anime");
      continue;
    }
    let before = read_relations(conn, other_id)?;
    let after = plan.apply(other_id, before.clone());
    if after != before {
      write_relations(conn, other_id, &after)?;
      rewritten += 1;
    }
  }
  Ok(rewritten)
}

/// Load one anime row together with its edges.
pub fn load_anime(conn: &Connection, anime_id: AnimeId) -> rusqlite::Result<Option<RawAnime>> {
  let sql = format!("SELECT {} FROM anime a WHERE a.anime_id = ?1", RawAnime::COLUMNS);
  let raw = conn.query_row(&sql, params![anime_id], RawAnime::from_row).optional()?;
  raw
    .map(|mut raw| {
      raw.related = read_relations(conn, raw.anime_id)?;
      Ok(raw)
    })
    .transpose()
}

/// Attach edge lists to rows read by a catalog query.
pub fn with_relations(conn: &Connection, raws: Vec<RawAnime>) -> rusqlite::Result<Vec<RawAnime>> {
  raws
    .into_iter()
    .map(|mut raw| {
      raw.related = read_relations(conn, raw.anime_id)?;
      Ok(raw)
    })
    .collect()
}
