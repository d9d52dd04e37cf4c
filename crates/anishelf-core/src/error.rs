//! Error types for `anishelf-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown list status: {0:?}")]
  UnknownListStatus(String),

  #[error("unknown friend request status: {0:?}")]
  UnknownFriendStatus(String),

  #[error("unknown notification kind: {0:?}")]
  UnknownNotificationKind(String),

  #[error("reaction value must be 1 or -1, got {0}")]
  InvalidReaction(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
