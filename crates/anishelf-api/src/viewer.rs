//! The requesting user, as established by the session layer in front of us.
//!
//! The session layer forwards the authenticated user's id in the
//! `x-user-id` header. A missing or unparsable header, or an id that names no
//! user, yields an anonymous viewer.

use std::sync::Arc;

use anishelf_core::{
  store::CatalogStore,
  user::{User, UserId},
};
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// `None` for anonymous visitors.
pub struct Viewer(pub Option<User>);

impl Viewer {
  pub fn user(&self) -> Option<&User> { self.0.as_ref() }

  pub fn require(&self) -> Result<&User, ApiError> { self.0.as_ref().ok_or(ApiError::Unauthorized) }

  /// A signed-in moderator or admin.
  pub fn require_staff(&self) -> Result<&User, ApiError> {
    let user = self.require()?;
    if user.role.can_moderate() {
      Ok(user)
    } else {
      Err(ApiError::Forbidden("moderator or admin role required".into()))
    }
  }
}

impl<S> FromRequestParts<Arc<S>> for Viewer
where
  S: CatalogStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    let Some(id) = parts
      .headers
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.trim().parse::<UserId>().ok())
    else {
      return Ok(Viewer(None));
    };

    let user = store.get_user(id).await.map_err(ApiError::store)?;
    if user.is_none() {
      tracing::debug!(user_id = id, "unknown viewer id, treating as anonymous");
    }
    Ok(Viewer(user))
  }
}
