//! HTTP API for anishelf.
//!
//! Exposes an axum [`Router`] backed by any [`anishelf_core::store::CatalogStore`].
//! Sessions, TLS and static assets are the caller's responsibility; the
//! signed-in user arrives as the `x-user-id` header (see [`viewer`]).
//!
//! Reads answer with JSON. Page-level mutations (comments, reactions, watch
//! lists, friendships) answer with a `303 See Other` back to the referring
//! page; admin endpoints answer with JSON.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = Router::new().merge(anishelf_api::api_router(store.clone()));
//! ```

pub mod anime;
pub mod comments;
pub mod error;
pub mod friends;
pub mod notifications;
pub mod users;
pub mod viewer;
pub mod watchlist;

use std::sync::Arc;

use anishelf_core::store::CatalogStore;
use axum::{
  Router,
  http::{HeaderMap, header::REFERER},
  response::Redirect,
  routing::{delete, get, post, put},
};

pub use error::ApiError;
pub use viewer::Viewer;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    // Catalog
    .route("/anime", get(anime::index::<S>))
    .route("/anime/search", get(anime::search::<S>))
    .route("/anime/{id}", get(anime::show::<S>))
    // Comments
    .route("/anime/{id}/comments", post(comments::create::<S>))
    .route(
      "/anime/{id}/comments/{comment_id}",
      put(comments::update::<S>).delete(comments::destroy::<S>),
    )
    .route("/anime/{id}/comments/{comment_id}/react", post(comments::react::<S>))
    // Watch lists
    .route("/anime/{id}/list", post(watchlist::set::<S>).delete(watchlist::remove::<S>))
    .route("/users/{username}/anime-list", get(watchlist::show::<S>))
    // Friends
    .route("/users/{username}/friends", get(friends::show::<S>))
    // POST takes the target user's id, DELETE the request id.
    .route("/friends/request/{id}", post(friends::request::<S>).delete(friends::cancel::<S>))
    .route("/friends/request/{id}/accept", post(friends::accept::<S>))
    .route("/friends/request/{id}/decline", post(friends::decline::<S>))
    .route("/friends/{user_id}", delete(friends::remove::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/read", post(notifications::mark_read::<S>))
    .route("/notifications/{id}", delete(notifications::destroy::<S>))
    // Admin
    .route("/admin/anime", post(anime::create::<S>))
    .route("/admin/anime/bulk-delete", post(anime::bulk_destroy::<S>))
    .route("/admin/anime/{id}", put(anime::update::<S>).delete(anime::destroy::<S>))
    .route("/admin/users/{id}", put(users::update::<S>).delete(users::destroy::<S>))
    .with_state(store)
}

/// `303 See Other` to the `Referer`, or to `fallback` when there is none.
pub fn redirect_back(headers: &HeaderMap, fallback: &str) -> Redirect {
  let target = headers
    .get(REFERER)
    .and_then(|v| v.to_str().ok())
    .filter(|s| !s.is_empty())
    .unwrap_or(fallback);
  Redirect::to(target)
}

#[cfg(test)]
mod tests;
