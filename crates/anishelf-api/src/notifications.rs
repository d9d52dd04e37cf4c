//! The viewer's notification inbox.

use std::sync::Arc;

use anishelf_core::{notification::Notification, store::CatalogStore};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

pub const DEFAULT_LIMIT: usize = 30;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Inbox {
  pub items:        Vec<Notification>,
  pub unread_count: usize,
}

/// `GET /notifications[?limit=..][&offset=..]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Query(params): Query<ListParams>,
) -> Result<Json<Inbox>, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
  let offset = params.offset.unwrap_or(0);

  let items = store
    .list_notifications(user.user_id, limit, offset)
    .await
    .map_err(ApiError::store)?;
  let unread_count = store.unread_count(user.user_id).await.map_err(ApiError::store)?;
  Ok(Json(Inbox { items, unread_count }))
}

/// `POST /notifications/read`
pub async fn mark_read<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let marked = store.mark_all_read(user.user_id).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "marked": marked })))
}

/// `DELETE /notifications/:id`
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  if store.delete_notification(user.user_id, id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("notification {id} not found")))
  }
}
