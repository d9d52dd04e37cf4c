//! User administration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`    | `/admin/users/:id` | Staff edit anyone; a user may only resubmit their own record |
//! | `DELETE` | `/admin/users/:id` | Admin only |

use std::sync::Arc;

use anishelf_core::{
  store::CatalogStore,
  user::{Role, User, UserId},
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;

use crate::{error::ApiError, viewer::Viewer};

pub const MAX_USERNAME_CHARS: usize = 24;

/// ASCII letters, digits, `-` and `_`; 1 to 24 characters.
pub fn valid_username(name: &str) -> bool {
  !name.is_empty()
    && name.len() <= MAX_USERNAME_CHARS
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default)]
  pub username: String,
  pub role:     Role,
}

/// `PUT /admin/users/:id`
///
/// Without moderation rights the username and role of the record are kept.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<UserId>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<User>, ApiError>
where
  S: CatalogStore,
{
  let actor = viewer.require()?;
  let target = store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

  let username = body.username.trim().to_owned();
  if !valid_username(&username) {
    return Err(ApiError::Validation(format!(
      "username must be 1-{MAX_USERNAME_CHARS} letters, digits, '-' or '_'"
    )));
  }

  let (username, role) = if actor.role.can_moderate() {
    if let Some(other) = store.get_user_by_username(&username).await.map_err(ApiError::store)?
      && other.user_id != id
    {
      return Err(ApiError::Validation(format!("username {username} is taken")));
    }
    (username, body.role)
  } else if actor.user_id == id {
    (target.username, target.role)
  } else {
    return Err(ApiError::Forbidden("cannot edit another user".into()));
  };

  let user = store
    .update_user(id, username, role)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  tracing::info!(user_id = id, by = actor.user_id, role = user.role.as_str(), "user updated");
  Ok(Json(user))
}

/// `DELETE /admin/users/:id`
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError>
where
  S: CatalogStore,
{
  let actor = viewer.require()?;
  if actor.role != Role::Admin {
    return Err(ApiError::Forbidden("admin role required".into()));
  }
  if store.delete_user(id).await.map_err(ApiError::store)? {
    tracing::info!(user_id = id, by = actor.user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("user {id} not found")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn usernames() {
    assert!(valid_username("kyon_42"));
    assert!(valid_username("a-b"));
    assert!(!valid_username(""));
    assert!(!valid_username("with space"));
    assert!(!valid_username("кирилл"));
    assert!(!valid_username(&"x".repeat(25)));
  }
}
