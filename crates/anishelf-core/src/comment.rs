//! Comments and like/dislike reactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, anime::AnimeId, user::UserId};

pub type CommentId = i64;

/// Maximum comment body length, in characters.
pub const MAX_BODY_CHARS: usize = 2000;

/// A comment on an anime. `parent_id == None` marks a root comment.
///
/// A parent always belongs to the same anime and always exists before its
/// replies, so parent chains cannot form cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: CommentId,
  pub anime_id:   AnimeId,
  pub user_id:    UserId,
  pub parent_id:  Option<CommentId>,
  pub body:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Comment {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub anime_id:  AnimeId,
  pub user_id:   UserId,
  pub parent_id: Option<CommentId>,
  pub body:      String,
}

// ─── Reactions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ReactionValue {
  Like,
  Dislike,
}

impl ReactionValue {
  pub fn as_i64(self) -> i64 {
    match self {
      ReactionValue::Like => 1,
      ReactionValue::Dislike => -1,
    }
  }
}

impl TryFrom<i64> for ReactionValue {
  type Error = Error;

  fn try_from(v: i64) -> Result<Self> {
    match v {
      1 => Ok(ReactionValue::Like),
      -1 => Ok(ReactionValue::Dislike),
      other => Err(Error::InvalidReaction(other)),
    }
  }
}

impl From<ReactionValue> for i64 {
  fn from(v: ReactionValue) -> Self { v.as_i64() }
}

/// At most one per `(comment_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
  pub comment_id: CommentId,
  pub user_id:    UserId,
  pub value:      ReactionValue,
}

/// What a reaction request does to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
  Created(ReactionValue),
  Updated(ReactionValue),
  /// The same value was requested again: toggle off.
  Removed,
}

impl ReactionChange {
  /// Decide the transition from the user's `existing` reaction.
  pub fn resolve(existing: Option<ReactionValue>, requested: ReactionValue) -> Self {
    match existing {
      None => ReactionChange::Created(requested),
      Some(v) if v == requested => ReactionChange::Removed,
      Some(_) => ReactionChange::Updated(requested),
    }
  }

  /// Only a transition into a like tells the comment owner.
  pub fn notifies_owner(self) -> bool {
    matches!(
      self,
      ReactionChange::Created(ReactionValue::Like) | ReactionChange::Updated(ReactionValue::Like)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ReactionValue::{Dislike, Like};

  #[test]
  fn first_reaction_is_created() {
    assert_eq!(ReactionChange::resolve(None, Like), ReactionChange::Created(Like));
    assert_eq!(ReactionChange::resolve(None, Dislike), ReactionChange::Created(Dislike));
  }

  #[test]
  fn same_value_toggles_off() {
    assert_eq!(ReactionChange::resolve(Some(Like), Like), ReactionChange::Removed);
    assert_eq!(ReactionChange::resolve(Some(Dislike), Dislike), ReactionChange::Removed);
  }

  #[test]
  fn different_value_updates_in_place() {
    assert_eq!(ReactionChange::resolve(Some(Like), Dislike), ReactionChange::Updated(Dislike));
    assert_eq!(ReactionChange::resolve(Some(Dislike), Like), ReactionChange::Updated(Like));
  }

  #[test]
  fn only_likes_notify() {
    assert!(ReactionChange::Created(Like).notifies_owner());
    assert!(ReactionChange::Updated(Like).notifies_owner());
    assert!(!ReactionChange::Created(Dislike).notifies_owner());
    assert!(!ReactionChange::Updated(Dislike).notifies_owner());
    assert!(!ReactionChange::Removed.notifies_owner());
  }

  #[test]
  fn reaction_value_serde_is_numeric() {
    assert_eq!(serde_json::to_string(&Like).unwrap(), "1");
    assert_eq!(serde_json::from_str::<ReactionValue>("-1").unwrap(), Dislike);
    assert!(serde_json::from_str::<ReactionValue>("0").is_err());
  }
}
