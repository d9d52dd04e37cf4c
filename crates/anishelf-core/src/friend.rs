//! Friend requests and friendships.
//!
//! A friendship is an accepted request; at most one request exists per
//! ordered pair of users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, user::UserId};

pub type FriendRequestId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
  Pending,
  Accepted,
  Declined,
}

impl FriendStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      FriendStatus::Pending => "pending",
      FriendStatus::Accepted => "accepted",
      FriendStatus::Declined => "declined",
    }
  }
}

impl std::str::FromStr for FriendStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(FriendStatus::Pending),
      "accepted" => Ok(FriendStatus::Accepted),
      "declined" => Ok(FriendStatus::Declined),
      other => Err(Error::UnknownFriendStatus(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
  pub request_id:   FriendRequestId,
  pub requester_id: UserId,
  pub addressee_id: UserId,
  pub status:       FriendStatus,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl FriendRequest {
  /// The user on the other side of the request from `user_id`.
  pub fn counterpart(&self, user_id: UserId) -> UserId {
    if self.requester_id == user_id { self.addressee_id } else { self.requester_id }
  }

  pub fn involves(&self, user_id: UserId) -> bool {
    self.requester_id == user_id || self.addressee_id == user_id
  }
}

/// What sending a friend request from `actor` to `target` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
  /// Self-request, or a request already exists that this cannot change.
  Ignore,
  /// The target had already asked the actor: accept that request.
  Accept(FriendRequestId),
  /// Record a new pending request.
  Create,
}

/// `existing` is any request between the two users, in either direction.
pub fn resolve_request(
  actor: UserId,
  target: UserId,
  existing: Option<&FriendRequest>,
) -> RequestAction {
  if actor == target {
    return RequestAction::Ignore;
  }
  match existing {
    None => RequestAction::Create,
    Some(req) if req.status == FriendStatus::Pending && req.requester_id == target => {
      RequestAction::Accept(req.request_id)
    }
    Some(_) => RequestAction::Ignore,
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn request(requester: UserId, addressee: UserId, status: FriendStatus) -> FriendRequest {
    let now = Utc::now();
    FriendRequest {
      request_id:   42,
      requester_id: requester,
      addressee_id: addressee,
      status,
      created_at:   now,
      updated_at:   now,
    }
  }

  #[test]
  fn self_request_is_ignored() {
    assert_eq!(resolve_request(1, 1, None), RequestAction::Ignore);
  }

  #[test]
  fn fresh_pair_creates_request() {
    assert_eq!(resolve_request(1, 2, None), RequestAction::Create);
  }

  #[test]
  fn reciprocal_pending_request_is_accepted() {
    let incoming = request(2, 1, FriendStatus::Pending);
    assert_eq!(resolve_request(1, 2, Some(&incoming)), RequestAction::Accept(42));
  }

  #[test]
  fn other_existing_requests_are_left_alone() {
    let outgoing = request(1, 2, FriendStatus::Pending);
    assert_eq!(resolve_request(1, 2, Some(&outgoing)), RequestAction::Ignore);

    let declined = request(2, 1, FriendStatus::Declined);
    assert_eq!(resolve_request(1, 2, Some(&declined)), RequestAction::Ignore);

    let accepted = request(1, 2, FriendStatus::Accepted);
    assert_eq!(resolve_request(1, 2, Some(&accepted)), RequestAction::Ignore);
  }

  #[test]
  fn counterpart_is_the_other_side() {
    let req = request(1, 2, FriendStatus::Accepted);
    assert_eq!(req.counterpart(1), 2);
    assert_eq!(req.counterpart(2), 1);
    assert!(req.involves(2));
    assert!(!req.involves(3));
  }
}
