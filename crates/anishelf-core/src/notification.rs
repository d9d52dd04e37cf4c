//! In-app notification records.
//!
//! Notifications are only recorded here; pushing them anywhere else is the
//! job of whatever reads the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  anime::AnimeId,
  comment::{Comment, CommentId},
  user::{User, UserId, UserSummary},
};

/// Comment snippets in notification messages are cut to this many characters.
pub const SNIPPET_CHARS: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  CommentReply,
  CommentLike,
  FriendRequest,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      NotificationKind::CommentReply => "comment_reply",
      NotificationKind::CommentLike => "comment_like",
      NotificationKind::FriendRequest => "friend_request",
    }
  }
}

impl std::str::FromStr for NotificationKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "comment_reply" => Ok(NotificationKind::CommentReply),
      "comment_like" => Ok(NotificationKind::CommentLike),
      "friend_request" => Ok(NotificationKind::FriendRequest),
      other => Err(Error::UnknownNotificationKind(other.to_owned())),
    }
  }
}

/// The payload shown to the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
  #[serde(rename = "type")]
  pub kind:         NotificationKind,
  pub title:        String,
  pub message:      String,
  pub url:          String,
  pub actor:        Option<UserSummary>,
  pub comment_id:   Option<CommentId>,
  pub parent_id:    Option<CommentId>,
  pub comment_body: Option<String>,
}

impl NotificationData {
  /// `actor` replied with `reply` on anime `anime_id`.
  pub fn comment_reply(actor: &User, anime_id: AnimeId, reply: &Comment) -> Self {
    let body = squish(&reply.body);
    Self {
      kind:         NotificationKind::CommentReply,
      title:        "Ответ на комментарий".to_owned(),
      message:      format!(
        "{} ответил(а) на ваш комментарий:\n\"{}\".",
        actor.username,
        snippet(&body, SNIPPET_CHARS)
      ),
      url:          comment_url(anime_id, reply.comment_id),
      actor:        Some(actor.summary()),
      comment_id:   Some(reply.comment_id),
      parent_id:    reply.parent_id,
      comment_body: Some(body),
    }
  }

  /// `actor` liked `comment` on anime `anime_id`.
  pub fn comment_like(actor: &User, anime_id: AnimeId, comment: &Comment) -> Self {
    let body = squish(&comment.body);
    Self {
      kind:         NotificationKind::CommentLike,
      title:        "Новый лайк".to_owned(),
      message:      format!(
        "{} оценил(а) ваш комментарий:\n\"{}\".",
        actor.username,
        snippet(&body, SNIPPET_CHARS)
      ),
      url:          comment_url(anime_id, comment.comment_id),
      actor:        Some(actor.summary()),
      comment_id:   Some(comment.comment_id),
      parent_id:    comment.parent_id,
      comment_body: Some(body),
    }
  }

  pub fn friend_request(actor: &User) -> Self {
    Self {
      kind:         NotificationKind::FriendRequest,
      title:        "Новая заявка в друзья".to_owned(),
      message:      format!("{} отправил(а) заявку в друзья.", actor.username),
      url:          "/friends".to_owned(),
      actor:        Some(actor.summary()),
      comment_id:   None,
      parent_id:    None,
      comment_body: None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub user_id:         UserId,
  pub data:            NotificationData,
  pub read_at:         Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

impl Notification {
  pub fn is_read(&self) -> bool { self.read_at.is_some() }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
  pub user_id: UserId,
  pub data:    NotificationData,
}

fn comment_url(anime_id: AnimeId, comment_id: CommentId) -> String {
  format!("/anime/{anime_id}?comment={comment_id}")
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn squish(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }

/// Cut `s` to `limit` characters, marking the cut with `...`.
pub fn snippet(s: &str, limit: usize) -> String {
  if s.chars().count() <= limit {
    return s.to_owned();
  }
  let cut: String = s.chars().take(limit).collect();
  format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::user::Role;

  fn actor() -> User {
    User {
      user_id:     7,
      username:    "haruhi".into(),
      avatar_path: None,
      role:        Role::User,
      created_at:  Utc::now(),
    }
  }

  fn comment(body: &str) -> Comment {
    let now = Utc::now();
    Comment {
      comment_id: 99,
      anime_id:   3,
      user_id:    7,
      parent_id:  Some(12),
      body:       body.into(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn squish_collapses_whitespace() {
    assert_eq!(squish("  a \n\n b\t c  "), "a b c");
  }

  #[test]
  fn snippet_cuts_long_text_only() {
    assert_eq!(snippet("short", 35), "short");
    let long = "я".repeat(40);
    let cut = snippet(&long, 35);
    assert_eq!(cut.chars().count(), 38);
    assert!(cut.ends_with("..."));
  }

  #[test]
  fn reply_payload_points_at_the_comment() {
    let data = NotificationData::comment_reply(&actor(), 3, &comment("nice   take\non this"));
    assert_eq!(data.kind, NotificationKind::CommentReply);
    assert_eq!(data.url, "/anime/3?comment=99");
    assert_eq!(data.comment_id, Some(99));
    assert_eq!(data.parent_id, Some(12));
    assert_eq!(data.comment_body.as_deref(), Some("nice take on this"));
    assert!(data.message.starts_with("haruhi "));
    assert!(data.message.contains("\"nice take on this\""));
  }

  #[test]
  fn friend_request_payload_links_to_friends() {
    let data = NotificationData::friend_request(&actor());
    assert_eq!(data.kind, NotificationKind::FriendRequest);
    assert_eq!(data.url, "/friends");
    assert!(data.comment_id.is_none());
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["type"], "friend_request");
  }
}
