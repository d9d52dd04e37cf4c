//! Friend requests and friend lists.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/friends/request/:user_id` | Send, or accept the target's pending request |
//! | `POST`   | `/friends/request/:id/accept` | Addressee only |
//! | `POST`   | `/friends/request/:id/decline` | Addressee only |
//! | `DELETE` | `/friends/request/:id` | Requester only (cancel) |
//! | `DELETE` | `/friends/:user_id` | Unfriend |
//! | `GET`    | `/users/:username/friends` | Pending lists only for the owner |

use std::{collections::HashMap, sync::Arc};

use anishelf_core::{
  friend::{FriendRequest, FriendRequestId, FriendStatus, RequestAction, resolve_request},
  notification::{NewNotification, NotificationData},
  store::CatalogStore,
  user::{User, UserId, UserSummary},
};
use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
  response::Redirect,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  redirect_back,
  viewer::Viewer,
  watchlist::{friends_of, user_by_name},
};

const FRIENDS_PAGE: &str = "/friends";

async fn request_by_id<S: CatalogStore>(
  store: &S,
  id: FriendRequestId,
) -> Result<FriendRequest, ApiError> {
  store
    .get_friend_request(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("friend request {id} not found")))
}

// ─── Mutations ───────────────────────────────────────────────────────────────

/// `POST /friends/request/:user_id`
pub async fn request<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(target_id): Path<UserId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let actor = viewer.require()?;
  let target = store
    .get_user(target_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {target_id} not found")))?;

  let existing = store
    .find_friend_request_between(actor.user_id, target.user_id)
    .await
    .map_err(ApiError::store)?;

  match resolve_request(actor.user_id, target.user_id, existing.as_ref()) {
    RequestAction::Ignore => {}
    RequestAction::Accept(id) => {
      store
        .set_friend_request_status(id, FriendStatus::Accepted)
        .await
        .map_err(ApiError::store)?;
      tracing::debug!(request_id = id, "reciprocal friend request accepted");
    }
    RequestAction::Create => {
      store.add_friend_request(actor.user_id, target.user_id).await.map_err(ApiError::store)?;
      store
        .add_notification(NewNotification {
          user_id: target.user_id,
          data:    NotificationData::friend_request(actor),
        })
        .await
        .map_err(ApiError::store)?;
    }
  }

  Ok(redirect_back(&headers, FRIENDS_PAGE))
}

async fn answer<S>(
  store: &S,
  viewer: &Viewer,
  id: FriendRequestId,
  status: FriendStatus,
) -> Result<(), ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let request = request_by_id(store, id).await?;
  if request.addressee_id != user.user_id {
    return Err(ApiError::Forbidden("only the addressee can answer a friend request".into()));
  }
  store.set_friend_request_status(id, status).await.map_err(ApiError::store)?;
  Ok(())
}

/// `POST /friends/request/:id/accept`
pub async fn accept<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(id): Path<FriendRequestId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  answer(store.as_ref(), &viewer, id, FriendStatus::Accepted).await?;
  Ok(redirect_back(&headers, FRIENDS_PAGE))
}

/// `POST /friends/request/:id/decline`
pub async fn decline<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(id): Path<FriendRequestId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  answer(store.as_ref(), &viewer, id, FriendStatus::Declined).await?;
  Ok(redirect_back(&headers, FRIENDS_PAGE))
}

/// `DELETE /friends/request/:id`
pub async fn cancel<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(id): Path<FriendRequestId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let request = request_by_id(store.as_ref(), id).await?;
  if request.requester_id != user.user_id {
    return Err(ApiError::Forbidden("only the requester can cancel a friend request".into()));
  }
  store.delete_friend_request(id).await.map_err(ApiError::store)?;
  Ok(redirect_back(&headers, FRIENDS_PAGE))
}

/// `DELETE /friends/:user_id`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  headers: HeaderMap,
  Path(other_id): Path<UserId>,
) -> Result<Redirect, ApiError>
where
  S: CatalogStore,
{
  let user = viewer.require()?;
  let existing = store
    .find_friend_request_between(user.user_id, other_id)
    .await
    .map_err(ApiError::store)?;

  if let Some(friendship) = existing.filter(|r| r.status == FriendStatus::Accepted) {
    store.delete_friend_request(friendship.request_id).await.map_err(ApiError::store)?;
  }
  Ok(redirect_back(&headers, FRIENDS_PAGE))
}

// ─── Friend list ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingView {
  pub id:         FriendRequestId,
  pub user:       UserSummary,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendsPage {
  pub username: String,
  pub is_owner: bool,
  pub friends:  Vec<UserSummary>,
  pub incoming: Vec<PendingView>,
  pub outgoing: Vec<PendingView>,
}

/// `GET /users/:username/friends`
pub async fn show<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(username): Path<String>,
) -> Result<Json<FriendsPage>, ApiError>
where
  S: CatalogStore,
{
  let owner = user_by_name(store.as_ref(), &username).await?;
  let friends = friends_of(store.as_ref(), owner.user_id).await?;
  let is_owner = viewer.user().is_some_and(|v| v.user_id == owner.user_id);

  let (mut incoming, mut outgoing) = (Vec::new(), Vec::new());
  if is_owner {
    let pending = store
      .friend_requests_for(owner.user_id, Some(FriendStatus::Pending))
      .await
      .map_err(ApiError::store)?;
    let ids: Vec<UserId> = pending.iter().map(|r| r.counterpart(owner.user_id)).collect();
    let users: HashMap<UserId, User> = store
      .get_users(ids)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .map(|u| (u.user_id, u))
      .collect();

    for request in pending {
      let Some(other) = users.get(&request.counterpart(owner.user_id)) else {
        continue;
      };
      let view = PendingView {
        id:         request.request_id,
        user:       other.summary(),
        created_at: request.created_at,
      };
      if request.addressee_id == owner.user_id {
        incoming.push(view);
      } else {
        outgoing.push(view);
      }
    }
  }

  Ok(Json(FriendsPage {
    username: owner.username.clone(),
    is_owner,
    friends: friends.iter().map(User::summary).collect(),
    incoming,
    outgoing,
  }))
}
