//! Handlers for comments and reactions on an anime page.
//!
//! Every endpoint requires a signed-in viewer and answers with a redirect
//! back to the referring page (falling back to `/anime/:id`).

use std::sync::Arc;

use anishelf_core::{
  anime::AnimeId,
  comment::{Comment, CommentId, MAX_BODY_CHARS, NewComment, ReactionValue},
  notification::{NewNotification, NotificationData},
  store::CatalogStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
  response::Redirect,
};
use serde::Deserialize;

use crate::{error::ApiError, redirect_back, viewer::Viewer};

fn anime_page(id: AnimeId) -> String { format!("/anime/{id}") }

fn validate_body(body: &str) -> Result<String, ApiError> {
  let body = body.trim();
  if body.is_empty() {
    return Err(ApiError::Validation("comment body is required".into()));
  }
  if body.chars().count() > MAX_BODY_CHARS {
    return Err(ApiError::Validation(format!(
      "comment body must be at most {MAX_BODY_CHARS} characters"
    )));
  }
  Ok(body.to_owned())
}

async fn ensure_anime<S: CatalogStore>(store: &S, id: AnimeId) -> Result<(), ApiError> {
  store
    .get_anime(id)
    .await
    .map_err(ApiError::store)?
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("anime {id} not found")))
}

/// The comment `comment_id`, provided it belongs to anime `anime_id`.
async fn comment_on<S: CatalogStore>(
  store: &S,
  anime_id: AnimeId,
  comment_id: CommentId,
) -> Result<Comment, ApiError> {
  store
    .get_comment(comment_id)
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.anime_id == anime_id)
    .ok_or_else(|| ApiError::NotFound(format!("comment {comment_id} not found")))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub body:      String,
  pub parent_id: Option<CommentId>,
}

/// `POST /anime/:id/comments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(anime_id): Path<AnimeId>,
  Json(input): Json<CreateBody>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  ensure_anime(store.as_ref(), anime_id).await?;
  let body = validate_body(&input.body)?;

  let parent = match input.parent_id {
    Some(pid) => Some(comment_on(store.as_ref(), anime_id, pid).await?),
    None => None,
  };

  let comment = store
    .add_comment(NewComment {
      anime_id,
      user_id: user.user_id,
      parent_id: parent.as_ref().map(|p| p.comment_id),
      body,
    })
    .await
    .map_err(ApiError::store)?;

  if let Some(parent) = parent
    && parent.user_id != user.user_id
  {
    store
      .add_notification(NewNotification {
        user_id: parent.user_id,
        data:    NotificationData::comment_reply(user, anime_id, &comment),
      })
      .await
      .map_err(ApiError::store)?;
  }

  tracing::debug!(anime_id, comment_id = comment.comment_id, "comment added");
  Ok(redirect_back(&headers, &anime_page(anime_id)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default)]
  pub body: String,
}

/// `PUT /anime/:id/comments/:comment_id`. Author only.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path((anime_id, comment_id)): Path<(AnimeId, CommentId)>,
  Json(input): Json<UpdateBody>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let comment = comment_on(store.as_ref(), anime_id, comment_id).await?;
  if comment.user_id != user.user_id {
    return Err(ApiError::Forbidden("only the author can edit a comment".into()));
  }
  let body = validate_body(&input.body)?;

  store.update_comment_body(comment_id, body).await.map_err(ApiError::store)?;
  Ok(redirect_back(&headers, &anime_page(anime_id)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /anime/:id/comments/:comment_id`. Author, moderator or admin.
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path((anime_id, comment_id)): Path<(AnimeId, CommentId)>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let comment = comment_on(store.as_ref(), anime_id, comment_id).await?;
  if comment.user_id != user.user_id && !user.role.can_moderate() {
    return Err(ApiError::Forbidden("not allowed to delete this comment".into()));
  }

  store.delete_comment(comment_id).await.map_err(ApiError::store)?;
  tracing::debug!(anime_id, comment_id, by = user.user_id, "comment deleted");
  Ok(redirect_back(&headers, &anime_page(anime_id)))
}

// ─── React ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactBody {
  pub value: i64,
}

/// `POST /anime/:id/comments/:comment_id/react` with `{"value": 1|-1}`.
pub async fn react<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path((anime_id, comment_id)): Path<(AnimeId, CommentId)>,
  Json(input): Json<ReactBody>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let value = ReactionValue::try_from(input.value)
    .map_err(|_| ApiError::Validation("value must be 1 or -1".into()))?;
  let comment = comment_on(store.as_ref(), anime_id, comment_id).await?;

  let change = store.react(comment_id, user.user_id, value).await.map_err(ApiError::store)?;

  if change.notifies_owner() && comment.user_id != user.user_id {
    store
      .add_notification(NewNotification {
        user_id: comment.user_id,
        data:    NotificationData::comment_like(user, anime_id, &comment),
      })
      .await
      .map_err(ApiError::store)?;
  }

  Ok(redirect_back(&headers, &anime_page(anime_id)))
}
