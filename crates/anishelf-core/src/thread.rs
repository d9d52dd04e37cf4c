//! Comment thread builder.
//!
//! Comments are stored as a parent/child tree of arbitrary depth but shown two
//! levels deep: each root comment followed by every one of its descendants as
//! a flat, chronologically ordered reply list. Each reply remembers whom it
//! answered (the author of its immediate parent).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  comment::{Comment, CommentId, Reaction, ReactionValue},
  media,
  user::{Role, User, UserId},
};

/// Shown in place of a username when the author no longer exists.
pub const UNKNOWN_USER: &str = "user";

/// A comment as loaded for display: the row, its author and its reactions.
#[derive(Debug, Clone)]
pub struct CommentRecord {
  pub comment:   Comment,
  pub author:    Option<User>,
  pub reactions: Vec<Reaction>,
}

impl CommentRecord {
  fn author_name(&self) -> &str {
    self.author.as_ref().map_or(UNKNOWN_USER, |u| u.username.as_str())
  }
}

/// Display fields shared by roots and replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
  pub id:            CommentId,
  pub user_id:       UserId,
  pub user:          String,
  pub role:          Role,
  pub avatar_url:    String,
  pub created_at:    DateTime<Utc>,
  pub text:          String,
  pub likes:         usize,
  pub dislikes:      usize,
  /// The viewer's own reaction: `1`, `-1`, or `0` for none.
  pub user_reaction: i64,
  pub can_edit:      bool,
  pub can_delete:    bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadReply {
  #[serde(flatten)]
  pub comment:  CommentView,
  /// Username of the immediate parent's author.
  pub reply_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadComment {
  #[serde(flatten)]
  pub comment: CommentView,
  pub replies: Vec<ThreadReply>,
}

/// Build the display thread for one anime.
///
/// Roots come newest first; each root's descendants, however deep, come
/// oldest first. Replies whose ancestry does not reach a root in `records`
/// are left out. `viewer` is `None` for anonymous visitors, who get no
/// reaction or permission data.
pub fn build_thread(records: &[CommentRecord], viewer: Option<&User>) -> Vec<ThreadComment> {
  let by_id: HashMap<CommentId, &CommentRecord> =
    records.iter().map(|r| (r.comment.comment_id, r)).collect();

  let mut children: HashMap<CommentId, Vec<&CommentRecord>> = HashMap::new();
  let mut roots: Vec<&CommentRecord> = Vec::new();
  for record in records {
    match record.comment.parent_id {
      None => roots.push(record),
      Some(parent) => children.entry(parent).or_default().push(record),
    }
  }

  roots.sort_by(|a, b| {
    (b.comment.created_at, b.comment.comment_id).cmp(&(a.comment.created_at, a.comment.comment_id))
  });

  roots
    .into_iter()
    .map(|root| {
      let mut replies = descendants(root, &children);
      replies.sort_by_key(|r| (r.comment.created_at, r.comment.comment_id));

      ThreadComment {
        comment: view(root, viewer),
        replies: replies
          .into_iter()
          .map(|reply| ThreadReply {
            comment:  view(reply, viewer),
            reply_to: reply
              .comment
              .parent_id
              .and_then(|pid| by_id.get(&pid))
              .map_or(UNKNOWN_USER, |parent| parent.author_name())
              .to_owned(),
          })
          .collect(),
      }
    })
    .collect()
}

/// Iterative depth-first walk collecting every descendant of `root`.
fn descendants<'a>(
  root: &'a CommentRecord,
  children: &HashMap<CommentId, Vec<&'a CommentRecord>>,
) -> Vec<&'a CommentRecord> {
  let mut out = Vec::new();
  let mut visited: HashSet<CommentId> = HashSet::from([root.comment.comment_id]);
  let mut stack = vec![root.comment.comment_id];

  while let Some(id) = stack.pop() {
    for child in children.get(&id).into_iter().flatten() {
      if visited.insert(child.comment.comment_id) {
        out.push(*child);
        stack.push(child.comment.comment_id);
      }
    }
  }
  out
}

fn view(record: &CommentRecord, viewer: Option<&User>) -> CommentView {
  let c = &record.comment;
  let count = |value: ReactionValue| record.reactions.iter().filter(|r| r.value == value).count();

  let is_author = viewer.is_some_and(|v| v.user_id == c.user_id);
  let can_moderate = viewer.is_some_and(|v| v.role.can_moderate());
  let user_reaction = viewer
    .and_then(|v| record.reactions.iter().find(|r| r.user_id == v.user_id))
    .map_or(0, |r| r.value.as_i64());

  CommentView {
    id: c.comment_id,
    user_id: c.user_id,
    user: record.author_name().to_owned(),
    role: record.author.as_ref().map_or(Role::User, |u| u.role),
    avatar_url: media::avatar_url(record.author.as_ref().and_then(|u| u.avatar_path.as_deref())),
    created_at: c.created_at,
    text: c.body.clone(),
    likes: count(ReactionValue::Like),
    dislikes: count(ReactionValue::Dislike),
    user_reaction,
    can_edit: is_author,
    can_delete: is_author || can_moderate,
  }
}
