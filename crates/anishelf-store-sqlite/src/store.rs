//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::{collections::HashMap, path::Path};

use anishelf_core::{
  anime::{Anime, AnimeId, CatalogQuery, NewAnime, SortField},
  comment::{Comment, CommentId, NewComment, Reaction, ReactionChange, ReactionValue},
  friend::{FriendRequest, FriendRequestId, FriendStatus},
  notification::{NewNotification, Notification},
  related::{self, RelatedItem, SyncPlan},
  store::CatalogStore,
  thread::CommentRecord,
  user::{NewUser, Role, User, UserId},
  watchlist::{ListStatus, WatchEntry, WatchListItem},
};
use rusqlite::{OptionalExtension as _, params, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawAnime, RawComment, RawFriendRequest, RawNotification, RawUser, RawWatchEntry, encode_date,
    encode_characters, encode_dt, encode_genres, encode_studios, encode_uuid, now,
  },
  relations,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An anishelf store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Column values for an `anime` insert or update, encoded up front.
struct AnimeColumns {
  title:           String,
  alt_title:       Option<String>,
  kind:            String,
  year:            i32,
  genres:          String,
  episodes:        Option<i64>,
  status:          String,
  source:          Option<String>,
  season_date:     String,
  description:     Option<String>,
  trailer_url:     Option<String>,
  cover_path:      Option<String>,
  studios:         String,
  main_characters: String,
  mpaa_rating:     Option<String>,
  age_rating:      Option<String>,
  duration:        Option<String>,
  now:             String,
}

impl AnimeColumns {
  fn encode(input: &NewAnime) -> Result<Self> {
    Ok(Self {
      title:           input.title.clone(),
      alt_title:       input.alt_title.clone(),
      kind:            input.kind.clone(),
      year:            input.year(),
      genres:          encode_genres(&input.genres)?,
      episodes:        input.episodes.map(i64::from),
      status:          input.status.clone(),
      source:          input.source.clone(),
      season_date:     encode_date(input.season_date),
      description:     input.description.clone(),
      trailer_url:     input.trailer_url.clone(),
      cover_path:      input.cover_path.clone(),
      studios:         encode_studios(&input.studios)?,
      main_characters: encode_characters(&input.main_characters)?,
      mpaa_rating:     input.mpaa_rating.clone(),
      age_rating:      input.age_rating.clone(),
      duration:        input.duration.clone(),
      now:             encode_dt(now()),
    })
  }
}

/// Result of an anime save run on the connection thread.
enum Saved {
  NotFound,
  UnknownRelated(AnimeId),
  Done { raw: RawAnime, rewritten: usize },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
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
      .await?;
    Ok(())
  }

  /// Write an anime row and its edges, then bring every affected anime's
  /// inverse edges in line, all in one transaction.
  ///
  /// `id == None` inserts a new record.
  async fn save_anime(&self, id: Option<AnimeId>, input: NewAnime) -> Result<Option<Anime>> {
    let cols = AnimeColumns::encode(&input)?;
    let mut items: Vec<RelatedItem> = input.related_items;
    related::sort_prequels_first(&mut items);

    let saved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(id) = id
          && !relations::anime_exists(&tx, id)?
        {
          return Ok(Saved::NotFound);
        }
        for other in items.iter().map(|i| i.anime_id).filter(|&other| Some(other) != id) {
          if !relations::anime_exists(&tx, other)? {
            return Ok(Saved::UnknownRelated(other));
          }
        }

        let (anime_id, previous) = match id {
          None => {
            tx.execute(
              "INSERT INTO anime (
                 title, alt_title, kind, year, genres, episodes, status, source,
                 season_date, description, trailer_url, cover_path, created_at, updated_at,
                 studios, main_characters, mpaa_rating, age_rating, duration
               ) VALUES (
                 ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13,
                 ?14, ?15, ?16, ?17, ?18
               )",
              params![
                cols.title,
                cols.alt_title,
                cols.kind,
                cols.year,
                cols.genres,
                cols.episodes,
                cols.status,
                cols.source,
                cols.season_date,
                cols.description,
                cols.trailer_url,
                cols.cover_path,
                cols.now,
                cols.studios,
                cols.main_characters,
                cols.mpaa_rating,
                cols.age_rating,
                cols.duration,
              ],
            )?;
            (tx.last_insert_rowid(), Vec::new())
          }
          Some(id) => {
            let mut previous = relations::read_relations(&tx, id)?;
            related::sort_prequels_first(&mut previous);
            tx.execute(
              "UPDATE anime SET
                 title = ?1, alt_title = ?2, kind = ?3, year = ?4, genres = ?5,
                 episodes = ?6, status = ?7, source = ?8, season_date = ?9,
                 description = ?10, trailer_url = ?11, cover_path = ?12, updated_at = ?13,
                 studios = ?14, main_characters = ?15, mpaa_rating = ?16, age_rating = ?17,
                 duration = ?18
               WHERE anime_id = ?19",
              params![
                cols.title,
                cols.alt_title,
                cols.kind,
                cols.year,
                cols.genres,
                cols.episodes,
                cols.status,
                cols.source,
                cols.season_date,
                cols.description,
                cols.trailer_url,
                cols.cover_path,
                cols.now,
                cols.studios,
                cols.main_characters,
                cols.mpaa_rating,
                cols.age_rating,
                cols.duration,
                id,
              ],
            )?;
            (id, previous)
          }
        };

        relations::write_relations(&tx, anime_id, &items)?;
        let plan = SyncPlan::new(anime_id, &items, &previous);
        let rewritten = relations::sync_inverse_edges(&tx, &plan)?;

        let raw = relations::load_anime(&tx, anime_id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Saved::Done { raw, rewritten })
      })
      .await?;

    match saved {
      Saved::NotFound => Ok(None),
      Saved::UnknownRelated(other) => Err(Error::UnknownRelatedAnime(other)),
      Saved::Done { raw, rewritten } => {
        let anime = raw.into_anime()?;
        tracing::debug!(
          anime_id = anime.anime_id,
          edges = anime.related_items.len(),
          rewritten,
          "saved anime"
        );
        Ok(Some(anime))
      }
    }
  }
}

fn ids_json(ids: &[i64]) -> Result<String> { Ok(serde_json::to_string(ids)?) }

fn count(n: i64) -> usize { usize::try_from(n).unwrap_or(0) }

fn catalog_sql(query: &CatalogQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = Vec::new();
  let mut args: Vec<Value> = Vec::new();

  if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    args.push(Value::Text(format!("%{text}%")));
    let n = args.len();
    conds.push(format!("(a.title LIKE ?{n} OR a.alt_title LIKE ?{n})"));
  }
  for genre in &query.genres {
    args.push(Value::Text(genre.clone()));
    conds.push(format!(
      "EXISTS (SELECT 1 FROM json_each(a.genres) g WHERE g.value = ?{})",
      args.len()
    ));
  }
  if let Some(kind) = &query.kind {
    args.push(Value::Text(kind.clone()));
    conds.push(format!("a.kind = ?{}", args.len()));
  }
  if let Some(status) = &query.status {
    args.push(Value::Text(status.clone()));
    conds.push(format!("a.status = ?{}", args.len()));
  }
  if let Some(from) = query.year_from {
    args.push(Value::Integer(i64::from(from)));
    conds.push(format!("a.year >= ?{}", args.len()));
  }
  if let Some(to) = query.year_to {
    args.push(Value::Integer(i64::from(to)));
    conds.push(format!("a.year <= ?{}", args.len()));
  }

  let dir = query.dir.as_sql();
  let order = match query.sort {
    SortField::Title => format!("a.title {dir}, a.anime_id {dir}"),
    SortField::Created => format!("a.created_at {dir}, a.anime_id {dir}"),
    SortField::Season => format!("a.season_date {dir}, a.created_at {dir}, a.anime_id {dir}"),
  };

  let filter = if conds.is_empty() { String::new() } else { format!("WHERE {}", conds.join(" AND ")) };

  args.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
  let limit = args.len();
  args.push(Value::Integer(query.offset.unwrap_or(0) as i64));
  let offset = args.len();

  let sql = format!(
    "SELECT {} FROM anime a {filter} ORDER BY {order} LIMIT ?{limit} OFFSET ?{offset}",
    RawAnime::COLUMNS
  );
  (sql, args)
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let created_at = now();
    let at_str = encode_dt(created_at);
    let role_str = input.role.as_str();
    let username = input.username.clone();
    let avatar = input.avatar_path.clone();

    let user_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (username, avatar_path, role, created_at) VALUES (?1, ?2, ?3, ?4)",
          params![username, avatar, role_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(User {
      user_id,
      username: input.username,
      avatar_path: input.avatar_path,
      role: input.role,
      created_at,
    })
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS);
        Ok(conn.query_row(&sql, params![id], RawUser::from_row).optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.trim().to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS);
        Ok(conn.query_row(&sql, params![username], RawUser::from_row).optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_users(&self, ids: Vec<UserId>) -> Result<Vec<User>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids_str = ids_json(&ids)?;

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM users WHERE user_id IN (SELECT value FROM json_each(?1))
           ORDER BY username COLLATE NOCASE",
          RawUser::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![ids_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, id: UserId, username: String, role: Role) -> Result<Option<User>> {
    let role_str = role.as_str();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET username = ?1, role = ?2 WHERE user_id = ?3",
          params![username, role_str, id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn delete_user(&self, id: UserId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", params![id])?))
      .await?;
    Ok(n > 0)
  }

  // ── Anime ─────────────────────────────────────────────────────────────────

  async fn create_anime(&self, input: NewAnime) -> Result<Anime> {
    self
      .save_anime(None, input)
      .await?
      .ok_or_else(|| Error::Database(rusqlite::Error::QueryReturnedNoRows.into()))
  }

  async fn update_anime(&self, id: AnimeId, input: NewAnime) -> Result<Option<Anime>> {
    self.save_anime(Some(id), input).await
  }

  async fn get_anime(&self, id: AnimeId) -> Result<Option<Anime>> {
    let raw = self
      .conn
      .call(move |conn| Ok(relations::load_anime(conn, id)?))
      .await?;
    raw.map(RawAnime::into_anime).transpose()
  }

  async fn get_anime_many(&self, ids: Vec<AnimeId>) -> Result<Vec<Anime>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids_str = ids_json(&ids)?;

    let raws: Vec<RawAnime> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM anime a WHERE a.anime_id IN (SELECT value FROM json_each(?1))",
          RawAnime::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![ids_str], RawAnime::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(relations::with_relations(conn, rows)?)
      })
      .await?;

    let mut by_id: HashMap<AnimeId, Anime> = raws
      .into_iter()
      .map(|raw| raw.into_anime().map(|a| (a.anime_id, a)))
      .collect::<Result<_>>()?;

    // Input order, first occurrence wins.
    Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
  }

  async fn list_anime(&self, query: &CatalogQuery) -> Result<Vec<Anime>> {
    let (sql, args) = catalog_sql(query);

    let raws: Vec<RawAnime> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args), RawAnime::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(relations::with_relations(conn, rows)?)
      })
      .await?;

    raws.into_iter().map(RawAnime::into_anime).collect()
  }

  async fn search_titles(&self, text: &str, limit: usize) -> Result<Vec<Anime>> {
    let text = text.trim();
    if text.is_empty() || limit == 0 {
      return Ok(Vec::new());
    }
    let pattern = format!("%{text}%");
    let limit = limit as i64;

    let raws: Vec<RawAnime> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM anime a
           WHERE a.title LIKE ?1 OR a.alt_title LIKE ?1
           ORDER BY a.title, a.anime_id LIMIT ?2",
          RawAnime::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![pattern, limit], RawAnime::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(relations::with_relations(conn, rows)?)
      })
      .await?;

    raws.into_iter().map(RawAnime::into_anime).collect()
  }

  async fn delete_anime(&self, ids: Vec<AnimeId>) -> Result<usize> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for id in ids {
          deleted += tx.execute("DELETE FROM anime WHERE anime_id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    tracing::debug!(deleted, "deleted anime");
    Ok(deleted)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let at = now();
    let at_str = encode_dt(at);
    let body = input.body.clone();

    let comment_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (anime_id, user_id, parent_id, body, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![input.anime_id, input.user_id, input.parent_id, body, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comment {
      comment_id,
      anime_id: input.anime_id,
      user_id: input.user_id,
      parent_id: input.parent_id,
      body: input.body,
      created_at: at,
      updated_at: at,
    })
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM comments c WHERE c.comment_id = ?1", RawComment::COLUMNS);
        Ok(conn.query_row(&sql, params![id], RawComment::from_row).optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn update_comment_body(&self, id: CommentId, body: String) -> Result<Option<Comment>> {
    let at_str = encode_dt(now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments SET body = ?1, updated_at = ?2 WHERE comment_id = ?3",
          params![body, at_str, id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_comment(id).await
  }

  async fn delete_comment(&self, id: CommentId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM comments WHERE comment_id = ?1", params![id])?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn comment_records(&self, anime_id: AnimeId) -> Result<Vec<CommentRecord>> {
    type Loaded = (Vec<RawComment>, Vec<RawUser>, Vec<(i64, i64, i64)>);

    let (comments, authors, reactions): Loaded = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM comments c WHERE c.anime_id = ?1 ORDER BY c.created_at, c.comment_id",
          RawComment::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let comments = stmt
          .query_map(params![anime_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let sql = format!(
          "SELECT {} FROM users WHERE user_id IN
             (SELECT DISTINCT user_id FROM comments WHERE anime_id = ?1)",
          RawUser::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let authors = stmt
          .query_map(params![anime_id], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT r.comment_id, r.user_id, r.value FROM comment_reactions r
           JOIN comments c ON c.comment_id = r.comment_id
           WHERE c.anime_id = ?1",
        )?;
        let reactions = stmt
          .query_map(params![anime_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((comments, authors, reactions))
      })
      .await?;

    let authors: HashMap<UserId, User> = authors
      .into_iter()
      .map(|raw| raw.into_user().map(|u| (u.user_id, u)))
      .collect::<Result<_>>()?;

    let mut by_comment: HashMap<CommentId, Vec<Reaction>> = HashMap::new();
    for (comment_id, user_id, value) in reactions {
      by_comment.entry(comment_id).or_default().push(Reaction {
        comment_id,
        user_id,
        value: ReactionValue::try_from(value)?,
      });
    }

    comments
      .into_iter()
      .map(|raw| {
        let comment = raw.into_comment()?;
        Ok(CommentRecord {
          author: authors.get(&comment.user_id).cloned(),
          reactions: by_comment.remove(&comment.comment_id).unwrap_or_default(),
          comment,
        })
      })
      .collect()
  }

  async fn react(
    &self,
    comment_id: CommentId,
    user_id: UserId,
    value: ReactionValue,
  ) -> Result<ReactionChange> {
    let change = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
          .query_row(
            "SELECT value FROM comment_reactions WHERE comment_id = ?1 AND user_id = ?2",
            params![comment_id, user_id],
            |row| row.get(0),
          )
          .optional()?;

        // The CHECK constraint keeps stored values to 1 / -1.
        let change =
          ReactionChange::resolve(existing.and_then(|v| ReactionValue::try_from(v).ok()), value);

        match change {
          ReactionChange::Created(v) => {
            tx.execute(
              "INSERT INTO comment_reactions (comment_id, user_id, value) VALUES (?1, ?2, ?3)",
              params![comment_id, user_id, v.as_i64()],
            )?;
          }
          ReactionChange::Updated(v) => {
            tx.execute(
              "UPDATE comment_reactions SET value = ?3 WHERE comment_id = ?1 AND user_id = ?2",
              params![comment_id, user_id, v.as_i64()],
            )?;
          }
          ReactionChange::Removed => {
            tx.execute(
              "DELETE FROM comment_reactions WHERE comment_id = ?1 AND user_id = ?2",
              params![comment_id, user_id],
            )?;
          }
        }
        tx.commit()?;
        Ok(change)
      })
      .await?;

    Ok(change)
  }

  // ── Watch lists ───────────────────────────────────────────────────────────

  async fn set_list_status(
    &self,
    user_id: UserId,
    anime_id: AnimeId,
    status: ListStatus,
  ) -> Result<WatchEntry> {
    let status_str = status.as_str();
    let at_str = encode_dt(now());

    let raw: RawWatchEntry = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO anime_lists (user_id, anime_id, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT (user_id, anime_id)
           DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at",
          params![user_id, anime_id, status_str, at_str],
        )?;
        let sql = format!(
          "SELECT {} FROM anime_lists WHERE user_id = ?1 AND anime_id = ?2",
          RawWatchEntry::COLUMNS
        );
        Ok(conn.query_row(&sql, params![user_id, anime_id], RawWatchEntry::from_row)?)
      })
      .await?;

    raw.into_entry()
  }

  async fn remove_list_entry(&self, user_id: UserId, anime_id: AnimeId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM anime_lists WHERE user_id = ?1 AND anime_id = ?2",
          params![user_id, anime_id],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn list_status(&self, user_id: UserId, anime_id: AnimeId) -> Result<Option<ListStatus>> {
    let status: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT status FROM anime_lists WHERE user_id = ?1 AND anime_id = ?2",
              params![user_id, anime_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(status.map(|s| s.parse()).transpose()?)
  }

  async fn watch_list(&self, user_id: UserId) -> Result<Vec<WatchListItem>> {
    let rows: Vec<(RawWatchEntry, RawAnime)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM anime_lists WHERE user_id = ?1 ORDER BY updated_at DESC, entry_id DESC",
          RawWatchEntry::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
          .query_map(params![user_id], RawWatchEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
          if let Some(anime) = relations::load_anime(conn, entry.anime_id)? {
            rows.push((entry, anime));
          }
        }
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(entry, anime)| {
        Ok(WatchListItem { entry: entry.into_entry()?, anime: anime.into_anime()? })
      })
      .collect()
  }

  // ── Friendships ───────────────────────────────────────────────────────────

  async fn find_friend_request_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<FriendRequest>> {
    let raw: Option<RawFriendRequest> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM friend_requests
           WHERE (requester_id = ?1 AND addressee_id = ?2)
              OR (requester_id = ?2 AND addressee_id = ?1)
           ORDER BY created_at DESC, request_id DESC LIMIT 1",
          RawFriendRequest::COLUMNS
        );
        Ok(conn.query_row(&sql, params![a, b], RawFriendRequest::from_row).optional()?)
      })
      .await?;

    raw.map(RawFriendRequest::into_request).transpose()
  }

  async fn get_friend_request(&self, id: FriendRequestId) -> Result<Option<FriendRequest>> {
    let raw: Option<RawFriendRequest> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM friend_requests WHERE request_id = ?1", RawFriendRequest::COLUMNS);
        Ok(conn.query_row(&sql, params![id], RawFriendRequest::from_row).optional()?)
      })
      .await?;

    raw.map(RawFriendRequest::into_request).transpose()
  }

  async fn add_friend_request(
    &self,
    requester: UserId,
    addressee: UserId,
  ) -> Result<FriendRequest> {
    let at = now();
    let at_str = encode_dt(at);
    let status = FriendStatus::Pending;
    let status_str = status.as_str();

    let request_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO friend_requests (requester_id, addressee_id, status, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          params![requester, addressee, status_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(FriendRequest {
      request_id,
      requester_id: requester,
      addressee_id: addressee,
      status,
      created_at: at,
      updated_at: at,
    })
  }

  async fn set_friend_request_status(
    &self,
    id: FriendRequestId,
    status: FriendStatus,
  ) -> Result<Option<FriendRequest>> {
    let status_str = status.as_str();
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE friend_requests SET status = ?1, updated_at = ?2 WHERE request_id = ?3",
          params![status_str, at_str, id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_friend_request(id).await
  }

  async fn delete_friend_request(&self, id: FriendRequestId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM friend_requests WHERE request_id = ?1", params![id])?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn friend_requests_for(
    &self,
    user_id: UserId,
    status: Option<FriendStatus>,
  ) -> Result<Vec<FriendRequest>> {
    let status_str = status.map(FriendStatus::as_str);

    let raws: Vec<RawFriendRequest> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM friend_requests
           WHERE (requester_id = ?1 OR addressee_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY created_at DESC, request_id DESC",
          RawFriendRequest::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![user_id, status_str], RawFriendRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFriendRequest::into_request).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      user_id:         input.user_id,
      data:            input.data,
      read_at:         None,
      created_at:      now(),
    };

    let id_str = encode_uuid(notification.notification_id);
    let kind_str = notification.data.kind.as_str();
    let data_str = serde_json::to_string(&notification.data)?;
    let at_str = encode_dt(notification.created_at);
    let user_id = notification.user_id;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (notification_id, user_id, kind, data, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id_str, user_id, kind_str, data_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(user_id, kind = kind_str, "recorded notification");
    Ok(notification)
  }

  async fn list_notifications(
    &self,
    user_id: UserId,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<Notification>> {
    let (limit, offset) = (limit as i64, offset as i64);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM notifications WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
          RawNotification::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![user_id, limit, offset], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn unread_count(&self, user_id: UserId) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read_at IS NULL",
          params![user_id],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count(n))
  }

  async fn mark_all_read(&self, user_id: UserId) -> Result<usize> {
    let at_str = encode_dt(now());
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET read_at = ?2 WHERE user_id = ?1 AND read_at IS NULL",
          params![user_id, at_str],
        )?)
      })
      .await?;
    Ok(n)
  }

  async fn delete_notification(&self, user_id: UserId, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notifications WHERE notification_id = ?1 AND user_id = ?2",
          params![id_str, user_id],
        )?)
      })
      .await?;
    Ok(n > 0)
  }
}
