//! Users and roles.
//!
//! Account creation and sessions belong to the external auth layer; this
//! crate only needs enough of a user to attribute content and decide
//! permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, media};

pub type UserId = i64;

/// Site-wide role. Moderators and admins share moderation powers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Moderator,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Moderator => "moderator",
      Role::Admin => "admin",
    }
  }

  pub fn can_moderate(self) -> bool { matches!(self, Role::Moderator | Role::Admin) }
}

impl std::str::FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "user" => Ok(Role::User),
      "moderator" => Ok(Role::Moderator),
      "admin" => Ok(Role::Admin),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:     UserId,
  pub username:    String,
  /// Path relative to the public storage disk.
  pub avatar_path: Option<String>,
  pub role:        Role,
  pub created_at:  DateTime<Utc>,
}

impl User {
  pub fn avatar_url(&self) -> String { media::avatar_url(self.avatar_path.as_deref()) }

  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id:         self.user_id,
      username:   self.username.clone(),
      role:       self.role,
      avatar_url: self.avatar_url(),
    }
  }
}

/// Input for [`crate::store::CatalogStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:    String,
  pub avatar_path: Option<String>,
  pub role:        Role,
}

impl NewUser {
  pub fn new(username: impl Into<String>, role: Role) -> Self {
    Self { username: username.into(), avatar_path: None, role }
  }
}

/// The public face of a user as embedded in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub id:         UserId,
  pub username:   String,
  pub role:       Role,
  pub avatar_url: String,
}
