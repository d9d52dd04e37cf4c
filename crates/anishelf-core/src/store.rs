//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `anishelf-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  anime::{Anime, AnimeId, CatalogQuery, NewAnime},
  comment::{Comment, CommentId, NewComment, ReactionChange, ReactionValue},
  friend::{FriendRequest, FriendRequestId, FriendStatus},
  notification::{NewNotification, Notification},
  thread::CommentRecord,
  user::{NewUser, Role, User, UserId},
  watchlist::{ListStatus, WatchEntry, WatchListItem},
};

/// Abstraction over an anishelf store backend.
///
/// Saving an anime also keeps the inverse related-anime edges on every other
/// anime it touches (see [`crate::related::SyncPlan`]); callers never write
/// those edges themselves.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup.
  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_users(
    &self,
    ids: Vec<UserId>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Returns `None` if the user does not exist.
  fn update_user(
    &self,
    id: UserId,
    username: String,
    role: Role,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Returns `false` if the user did not exist.
  fn delete_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Anime ─────────────────────────────────────────────────────────────

  /// Insert an anime and add the inverse of each of its related edges.
  fn create_anime(
    &self,
    input: NewAnime,
  ) -> impl Future<Output = Result<Anime, Self::Error>> + Send + '_;

  /// Overwrite an anime and synchronise inverse edges against its previous
  /// related list. Returns `None` if the anime does not exist.
  fn update_anime(
    &self,
    id: AnimeId,
    input: NewAnime,
  ) -> impl Future<Output = Result<Option<Anime>, Self::Error>> + Send + '_;

  fn get_anime(
    &self,
    id: AnimeId,
  ) -> impl Future<Output = Result<Option<Anime>, Self::Error>> + Send + '_;

  /// Fetch several anime; missing ids are skipped.
  fn get_anime_many(
    &self,
    ids: Vec<AnimeId>,
  ) -> impl Future<Output = Result<Vec<Anime>, Self::Error>> + Send + '_;

  fn list_anime<'a>(
    &'a self,
    query: &'a CatalogQuery,
  ) -> impl Future<Output = Result<Vec<Anime>, Self::Error>> + Send + 'a;

  /// Title / alternative-title substring search ordered by title.
  fn search_titles<'a>(
    &'a self,
    text: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Anime>, Self::Error>> + Send + 'a;

  /// Delete anime by id; returns how many existed.
  fn delete_anime(
    &self,
    ids: Vec<AnimeId>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn update_comment_body(
    &self,
    id: CommentId,
    body: String,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Delete a comment together with every reply beneath it.
  fn delete_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every comment of an anime with its author and reactions, ready for
  /// [`crate::thread::build_thread`].
  fn comment_records(
    &self,
    anime_id: AnimeId,
  ) -> impl Future<Output = Result<Vec<CommentRecord>, Self::Error>> + Send + '_;

  /// Apply a like/dislike request with toggle semantics.
  fn react(
    &self,
    comment_id: CommentId,
    user_id: UserId,
    value: ReactionValue,
  ) -> impl Future<Output = Result<ReactionChange, Self::Error>> + Send + '_;

  // ── Watch lists ───────────────────────────────────────────────────────

  /// Insert or update the user's entry for an anime.
  fn set_list_status(
    &self,
    user_id: UserId,
    anime_id: AnimeId,
    status: ListStatus,
  ) -> impl Future<Output = Result<WatchEntry, Self::Error>> + Send + '_;

  fn remove_list_entry(
    &self,
    user_id: UserId,
    anime_id: AnimeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_status(
    &self,
    user_id: UserId,
    anime_id: AnimeId,
  ) -> impl Future<Output = Result<Option<ListStatus>, Self::Error>> + Send + '_;

  /// Newest entries first.
  fn watch_list(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<WatchListItem>, Self::Error>> + Send + '_;

  // ── Friendships ───────────────────────────────────────────────────────

  /// Any request between `a` and `b`, in either direction.
  fn find_friend_request_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> impl Future<Output = Result<Option<FriendRequest>, Self::Error>> + Send + '_;

  fn get_friend_request(
    &self,
    id: FriendRequestId,
  ) -> impl Future<Output = Result<Option<FriendRequest>, Self::Error>> + Send + '_;

  fn add_friend_request(
    &self,
    requester: UserId,
    addressee: UserId,
  ) -> impl Future<Output = Result<FriendRequest, Self::Error>> + Send + '_;

  fn set_friend_request_status(
    &self,
    id: FriendRequestId,
    status: FriendStatus,
  ) -> impl Future<Output = Result<Option<FriendRequest>, Self::Error>> + Send + '_;

  fn delete_friend_request(
    &self,
    id: FriendRequestId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every request the user sent or received, newest first, optionally
  /// restricted to one status.
  fn friend_requests_for(
    &self,
    user_id: UserId,
    status: Option<FriendStatus>,
  ) -> impl Future<Output = Result<Vec<FriendRequest>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_notifications(
    &self,
    user_id: UserId,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Returns how many notifications were newly marked read.
  fn mark_all_read(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Only deletes a notification addressed to `user_id`.
  fn delete_notification(
    &self,
    user_id: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
