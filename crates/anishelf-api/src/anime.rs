//! Handlers for the catalog and the anime admin endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/anime` | Filters `q`, `genres`, `type`, `status`, `year_from`, `year_to`; `sort`, `dir`, `limit`, `offset` |
//! | `GET`    | `/anime/search?q=` | Up to 6 title matches |
//! | `GET`    | `/anime/:id` | Detail with related anime and comment thread |
//! | `POST`   | `/admin/anime` | Staff only |
//! | `PUT`    | `/admin/anime/:id` | Staff only |
//! | `DELETE` | `/admin/anime/:id` | Staff only |
//! | `POST`   | `/admin/anime/bulk-delete` | Staff only; body `{"ids":[..]}` |

use std::{collections::HashMap, sync::Arc};

use anishelf_core::{
  anime::{
    self, Anime, AnimeId, CatalogQuery, CharacterId, MAX_STUDIOS, NewAnime, RawMainCharacter,
    SortDir, SortField, StudioId,
  },
  related::{self, RawRelatedItem, RelatedItem},
  store::CatalogStore,
  thread::{ThreadComment, build_thread},
  user::UserSummary,
  watchlist::ListStatus,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{error::ApiError, viewer::Viewer};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const SEARCH_LIMIT: usize = 6;

const MAX_TITLE_CHARS: usize = 255;
const MAX_LABEL_CHARS: usize = 60;
const MAX_RELATION_TYPE_CHARS: usize = 40;
const MAX_URL_CHARS: usize = 255;
const MAX_NAME_CHARS: usize = 255;
const MAX_RATING_CHARS: usize = 30;
const MAX_DURATION_CHARS: usize = 60;

// ─── Views ───────────────────────────────────────────────────────────────────

/// Catalog card.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnimeSummary {
  pub id:        AnimeId,
  pub title:     String,
  pub alt_title: Option<String>,
  #[serde(rename = "type")]
  pub kind:      String,
  pub year:      i32,
  pub season:    String,
  pub genres:    Vec<String>,
  pub episodes:  Option<u32>,
  pub status:    String,
  pub cover_url: Option<String>,
}

impl From<&Anime> for AnimeSummary {
  fn from(a: &Anime) -> Self {
    Self {
      id:        a.anime_id,
      title:     a.title.clone(),
      alt_title: a.alt_title.clone(),
      kind:      a.kind.clone(),
      year:      a.year,
      season:    a.season_label(),
      genres:    a.genres.clone(),
      episodes:  a.episodes,
      status:    a.status.clone(),
      cover_url: a.cover_url(),
    }
  }
}

/// One related edge resolved against its target anime.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedView {
  pub id:            AnimeId,
  pub title:         String,
  #[serde(rename = "type")]
  pub kind:          String,
  pub year:          i32,
  pub relation_type: String,
  pub cover_url:     Option<String>,
}

/// A full record plus its derived fields, as returned by the admin endpoints.
#[derive(Debug, Serialize)]
pub struct AnimeView {
  #[serde(flatten)]
  pub anime:             Anime,
  pub season:            String,
  pub cover_url:         Option<String>,
  pub related_anime_id:  Option<AnimeId>,
  pub related_type:      Option<String>,
  pub studio_id:         Option<StudioId>,
  pub main_character_id: Option<CharacterId>,
  pub main_voice_actor:  Option<String>,
}

impl From<Anime> for AnimeView {
  fn from(anime: Anime) -> Self {
    Self {
      season: anime.season_label(),
      cover_url: anime.cover_url(),
      related_anime_id: anime.related_anime_id(),
      related_type: anime.related_type().map(str::to_owned),
      studio_id: anime.studio_id(),
      main_character_id: anime.main_character_id(),
      main_voice_actor: anime.main_voice_actor(),
      anime,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct AnimeDetail {
  #[serde(flatten)]
  pub anime:             AnimeView,
  pub related:           Vec<RelatedView>,
  pub list_status:       Option<ListStatus>,
  pub list_status_label: Option<&'static str>,
  pub comments:          Vec<ThreadComment>,
  pub viewer:            Option<UserSummary>,
}

/// Resolve `items` against `targets`, dropping edges whose target is gone.
fn related_views(items: &[RelatedItem], targets: &[Anime]) -> Vec<RelatedView> {
  let by_id: HashMap<AnimeId, &Anime> = targets.iter().map(|a| (a.anime_id, a)).collect();
  items
    .iter()
    .filter_map(|item| {
      let target = by_id.get(&item.anime_id)?;
      Some(RelatedView {
        id:            target.anime_id,
        title:         target.title.clone(),
        kind:          target.kind.clone(),
        year:          target.year,
        relation_type: item.relation_type.clone(),
        cover_url:     target.cover_url(),
      })
    })
    .collect()
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct CatalogParams {
  pub q:         Option<String>,
  /// Comma-separated; all must be present.
  pub genres:    Option<String>,
  #[serde(rename = "type")]
  pub kind:      Option<String>,
  pub status:    Option<String>,
  pub year_from: Option<String>,
  pub year_to:   Option<String>,
  pub sort:      Option<String>,
  pub dir:       Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Blank or malformed years are ignored rather than rejected.
fn lenient_year(s: Option<&str>) -> Option<i32> { s.and_then(|s| s.trim().parse().ok()) }

impl CatalogParams {
  pub fn into_query(self) -> CatalogQuery {
    CatalogQuery {
      text:      non_empty(self.q),
      genres:    self
        .genres
        .map(|s| {
          s.split(',').map(str::trim).filter(|g| !g.is_empty()).map(str::to_owned).collect()
        })
        .unwrap_or_default(),
      kind:      non_empty(self.kind),
      status:    non_empty(self.status),
      year_from: lenient_year(self.year_from.as_deref()),
      year_to:   lenient_year(self.year_to.as_deref()),
      sort:      self.sort.as_deref().map_or(SortField::default(), SortField::parse),
      dir:       self.dir.as_deref().map_or(SortDir::default(), SortDir::parse),
      limit:     Some(self.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
      offset:    self.offset,
    }
  }
}

/// `GET /anime`
pub async fn index<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<CatalogParams>,
) -> Result<Json<Vec<AnimeSummary>>, ApiError>
where
  S: CatalogStore,
{
  let query = params.into_query();
  let anime = store.list_anime(&query).await.map_err(ApiError::store)?;
  Ok(Json(anime.iter().map(AnimeSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q: Option<String>,
}

/// `GET /anime/search?q=...`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<AnimeSummary>>, ApiError>
where
  S: CatalogStore,
{
  let Some(text) = non_empty(params.q) else {
    return Ok(Json(Vec::new()));
  };
  let anime = store.search_titles(&text, SEARCH_LIMIT).await.map_err(ApiError::store)?;
  Ok(Json(anime.iter().map(AnimeSummary::from).collect()))
}

/// `GET /anime/:id`
pub async fn show<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<AnimeId>,
) -> Result<Json<AnimeDetail>, ApiError>
where
  S: CatalogStore,
{
  let anime = store
    .get_anime(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("anime {id} not found")))?;

  let target_ids: Vec<AnimeId> = anime.related_items.iter().map(|i| i.anime_id).collect();
  let targets = store.get_anime_many(target_ids).await.map_err(ApiError::store)?;
  let related = related_views(&anime.related_items, &targets);

  let list_status = match viewer.user() {
    Some(user) => store.list_status(user.user_id, id).await.map_err(ApiError::store)?,
    None => None,
  };

  let records = store.comment_records(id).await.map_err(ApiError::store)?;
  let comments = build_thread(&records, viewer.user());

  Ok(Json(AnimeDetail {
    anime: AnimeView::from(anime),
    related,
    list_status,
    list_status_label: list_status.map(ListStatus::label),
    comments,
    viewer: viewer.user().map(|u| u.summary()),
  }))
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// Create/update body.
#[derive(Debug, Default, Deserialize)]
pub struct AnimePayload {
  #[serde(default)]
  pub title:            String,
  pub alt_title:        Option<String>,
  #[serde(rename = "type", default)]
  pub kind:             String,
  #[serde(default)]
  pub genres:           Vec<String>,
  pub episodes:         Option<i64>,
  #[serde(default)]
  pub status:           String,
  pub source:           Option<String>,
  pub season_date:      Option<NaiveDate>,
  pub description:      Option<String>,
  pub trailer_url:      Option<String>,
  pub cover_path:       Option<String>,
  #[serde(default)]
  pub studios:          Vec<StudioId>,
  /// Single-studio form accepted when `studios` is empty.
  pub studio_id:        Option<StudioId>,
  pub mpaa_rating:      Option<String>,
  pub age_rating:       Option<String>,
  pub duration:         Option<String>,
  #[serde(default)]
  pub main_characters:  Vec<RawMainCharacter>,
  #[serde(default)]
  pub related_items:    Vec<RawRelatedItem>,
  /// Single-relation form accepted when `related_items` is empty.
  pub related_anime_id: Option<AnimeId>,
  pub related_type:     Option<String>,
}

fn required(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
  let value = value.trim();
  if value.is_empty() {
    return Err(ApiError::Validation(format!("{field} is required")));
  }
  if value.chars().count() > max {
    return Err(ApiError::Validation(format!("{field} must be at most {max} characters")));
  }
  Ok(value.to_owned())
}

fn optional(field: &str, value: Option<String>, max: usize) -> Result<Option<String>, ApiError> {
  match non_empty(value) {
    Some(v) if v.chars().count() > max => {
      Err(ApiError::Validation(format!("{field} must be at most {max} characters")))
    }
    other => Ok(other),
  }
}

impl AnimePayload {
  /// Validate the body and normalise its related items.
  pub fn validate(self) -> Result<NewAnime, ApiError> {
    let title = required("title", &self.title, MAX_TITLE_CHARS)?;
    let alt_title = optional("alt_title", self.alt_title, MAX_TITLE_CHARS)?;
    let kind = required("type", &self.kind, MAX_LABEL_CHARS)?;
    let status = required("status", &self.status, MAX_LABEL_CHARS)?;
    let source = optional("source", self.source, MAX_LABEL_CHARS)?;
    let trailer_url = optional("trailer_url", self.trailer_url, MAX_URL_CHARS)?;
    let mpaa_rating = optional("mpaa_rating", self.mpaa_rating, MAX_RATING_CHARS)?;
    let age_rating = optional("age_rating", self.age_rating, MAX_RATING_CHARS)?;
    let duration = optional("duration", self.duration, MAX_DURATION_CHARS)?;

    if self.studios.len() > MAX_STUDIOS {
      return Err(ApiError::Validation(format!("at most {MAX_STUDIOS} studios are allowed")));
    }
    let studios = anime::normalize_studios(&self.studios, self.studio_id);

    for c in &self.main_characters {
      optional("main character name", c.name.clone(), MAX_NAME_CHARS)?;
      optional("voice actor", c.voice_actor.clone(), MAX_NAME_CHARS)?;
    }
    let main_characters = anime::normalize_main_characters(self.main_characters);

    let genres = self
      .genres
      .iter()
      .map(|g| g.trim())
      .filter(|g| !g.is_empty())
      .map(|g| required("genre", g, MAX_LABEL_CHARS))
      .collect::<Result<Vec<_>, _>>()?;
    if genres.is_empty() {
      return Err(ApiError::Validation("at least one genre is required".into()));
    }

    let episodes = self
      .episodes
      .map(|n| {
        u32::try_from(n).map_err(|_| ApiError::Validation("episodes must be a non-negative count".into()))
      })
      .transpose()?;

    let season_date = self
      .season_date
      .ok_or_else(|| ApiError::Validation("season_date is required".into()))?;

    let mut raw = self.related_items;
    if raw.is_empty()
      && let (Some(id), Some(t)) = (self.related_anime_id, self.related_type)
    {
      raw.push(RawRelatedItem { anime_id: Some(id), relation_type: Some(t.trim().to_owned()) });
    }
    for item in &raw {
      if let Some(t) = &item.relation_type
        && t.chars().count() > MAX_RELATION_TYPE_CHARS
      {
        return Err(ApiError::Validation(format!(
          "related type must be at most {MAX_RELATION_TYPE_CHARS} characters"
        )));
      }
    }

    Ok(NewAnime {
      title,
      alt_title,
      kind,
      genres,
      episodes,
      status,
      source,
      season_date,
      description: non_empty(self.description),
      trailer_url,
      cover_path: non_empty(self.cover_path),
      studios,
      mpaa_rating,
      age_rating,
      duration,
      main_characters,
      related_items: related::normalize(raw),
    })
  }
}

/// Every related target other than `own_id` must exist.
async fn check_related_targets<S>(
  store: &S,
  own_id: Option<AnimeId>,
  items: &[RelatedItem],
) -> Result<(), ApiError>
where
  S: CatalogStore,
{
  let mut wanted: Vec<AnimeId> =
    items.iter().map(|i| i.anime_id).filter(|&id| Some(id) != own_id).collect();
  wanted.sort_unstable();
  wanted.dedup();
  if wanted.is_empty() {
    return Ok(());
  }

  let found = store.get_anime_many(wanted.clone()).await.map_err(ApiError::store)?;
  match wanted.iter().find(|id| !found.iter().any(|a| a.anime_id == **id)) {
    Some(missing) => Err(ApiError::Validation(format!("related anime {missing} does not exist"))),
    None => Ok(()),
  }
}

/// `POST /admin/anime`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Json(body): Json<AnimePayload>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore,
{
  let admin = viewer.require_staff()?;
  let input = body.validate()?;
  check_related_targets(store.as_ref(), None, &input.related_items).await?;

  let anime = store.create_anime(input).await.map_err(ApiError::store)?;
  tracing::info!(anime_id = anime.anime_id, by = admin.user_id, "anime created");
  Ok((StatusCode::CREATED, Json(AnimeView::from(anime))))
}

/// `PUT /admin/anime/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<AnimeId>,
  Json(body): Json<AnimePayload>,
) -> Result<Json<AnimeView>, ApiError>
where
  S: CatalogStore,
{
  let admin = viewer.require_staff()?;
  let input = body.validate()?;
  check_related_targets(store.as_ref(), Some(id), &input.related_items).await?;

  let anime = store
    .update_anime(id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("anime {id} not found")))?;
  tracing::info!(anime_id = id, by = admin.user_id, "anime updated");
  Ok(Json(AnimeView::from(anime)))
}

/// `DELETE /admin/anime/:id`
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<AnimeId>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
{
  viewer.require_staff()?;
  match store.delete_anime(vec![id]).await.map_err(ApiError::store)? {
    0 => Err(ApiError::NotFound(format!("anime {id} not found"))),
    _ => Ok(StatusCode::NO_CONTENT),
  }
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
  #[serde(default)]
  pub ids: Vec<AnimeId>,
}

/// `POST /admin/anime/bulk-delete`
pub async fn bulk_destroy<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Json(body): Json<BulkDeleteBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: CatalogStore,
{
  viewer.require_staff()?;
  if body.ids.is_empty() {
    return Err(ApiError::Validation("ids must not be empty".into()));
  }
  let deleted = store.delete_anime(body.ids).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "deleted": deleted })))
}
