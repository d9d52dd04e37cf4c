//! Watch-list endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/anime/:id/list` | Body `{"status":"watching"}`; redirect |
//! | `DELETE` | `/anime/:id/list` | Redirect |
//! | `GET`    | `/users/:username/anime-list` | Entries, per-status counts, friends preview |

use std::{collections::BTreeMap, sync::Arc};

use anishelf_core::{
  anime::AnimeId,
  friend::FriendStatus,
  store::CatalogStore,
  user::{User, UserId, UserSummary},
  watchlist::{ListStatus, status_counts},
};
use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
  response::Redirect,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{anime::AnimeSummary, error::ApiError, redirect_back, viewer::Viewer};

/// How many friends the profile list page previews.
pub const FRIENDS_PREVIEW: usize = 4;

#[derive(Debug, Deserialize)]
pub struct SetBody {
  #[serde(default)]
  pub status: String,
}

/// `POST /anime/:id/list`
pub async fn set<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(anime_id): Path<AnimeId>,
  Json(body): Json<SetBody>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let status: ListStatus = body
    .status
    .parse()
    .map_err(|_| ApiError::Validation(format!("unknown list status {:?}", body.status)))?;

  if store.get_anime(anime_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("anime {anime_id} not found")));
  }

  store.set_list_status(user.user_id, anime_id, status).await.map_err(ApiError::store)?;
  Ok(redirect_back(&headers, &format!("/anime/{anime_id}")))
}

/// `DELETE /anime/:id/list`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(anime_id): Path<AnimeId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  store.remove_list_entry(user.user_id, anime_id).await.map_err(ApiError::store)?;
  Ok(redirect_back(&headers, &format!("/anime/{anime_id}")))
}

// ─── Profile list ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ListEntryView {
  pub anime:        AnimeSummary,
  pub status:       ListStatus,
  pub status_label: String,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileList {
  pub user:            UserSummary,
  pub entries:         Vec<ListEntryView>,
  pub counts:          BTreeMap<String, usize>,
  pub friends_preview: Vec<UserSummary>,
  pub friends_count:   usize,
}

pub(crate) async fn user_by_name<S: CatalogStore>(store: &S, username: &str) -> Result<User, ApiError> {
  store
    .get_user_by_username(username)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {username} not found")))
}

/// Accepted friends of `user_id`, most recent friendship first.
pub(crate) async fn friends_of<S: CatalogStore>(store: &S, user_id: UserId) -> Result<Vec<User>, ApiError> {
  let accepted = store
    .friend_requests_for(user_id, Some(FriendStatus::Accepted))
    .await
    .map_err(ApiError::store)?;
  let ids: Vec<UserId> = accepted.iter().map(|r| r.counterpart(user_id)).collect();
  let mut users = store.get_users(ids.clone()).await.map_err(ApiError::store)?;
  users.sort_by_key(|u| ids.iter().position(|id| *id == u.user_id));
  Ok(users)
}

/// `GET /users/:username/anime-list`
pub async fn show<S>(
  State(store): State<Arc<S>>,
  Path(username): Path<String>,
) -> Result<Json<ProfileList>, ApiError>
where
  S: CatalogStore,
{
  let owner = user_by_name(store.as_ref(), &username).await?;
  let items = store.watch_list(owner.user_id).await.map_err(ApiError::store)?;

  let counts = status_counts(items.iter().map(|i| &i.entry.status))
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect();

  let entries = items
    .iter()
    .map(|item| ListEntryView {
      anime:        AnimeSummary::from(&item.anime),
      status:       item.entry.status,
      status_label: item.entry.status.label().to_owned(),
      updated_at:   item.entry.updated_at,
    })
    .collect();

  let friends = friends_of(store.as_ref(), owner.user_id).await?;

  Ok(Json(ProfileList {
    user: owner.summary(),
    entries,
    counts,
    friends_preview: friends.iter().take(FRIENDS_PREVIEW).map(User::summary).collect(),
    friends_count: friends.len(),
  }))
}
