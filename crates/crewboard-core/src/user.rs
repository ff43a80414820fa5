//! User records as seen by the authorization core.
//!
//! Users are owned by the user store; the core only reads them, except for
//! the pass-through account operations exposed by the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::role::Role;

/// Database-assigned user identifier; the join key for every authorization
/// decision.
pub type UserId = i64;

/// A persisted user. `role` is `None` only for legacy rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "id")]
  pub user_id:       UserId,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub phone_number:  String,
  pub kra_pin:       String,
  pub address:       String,
  /// argon2 PHC string. Never serialised.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Option<Role>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`UserStore::create_user`](crate::store::UserStore::create_user).
/// The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub phone_number:  String,
  pub kra_pin:       String,
  pub address:       String,
  pub password_hash: String,
  pub role:          Role,
}

/// Partial update of a user's mutable fields. `None` leaves a field as is.
///
/// The role is not part of this type: roles are fixed at registration.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub email:         Option<String>,
  pub phone_number:  Option<String>,
  pub kra_pin:       Option<String>,
  pub address:       Option<String>,
  pub password_hash: Option<String>,
}

impl UserUpdate {
  pub fn is_empty(&self) -> bool {
    self.first_name.is_none()
      && self.last_name.is_none()
      && self.email.is_none()
      && self.phone_number.is_none()
      && self.kra_pin.is_none()
      && self.address.is_none()
      && self.password_hash.is_none()
  }
}

/// A uniquely constrained user field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
  Email,
  KraPin,
}

impl UniqueField {
  /// Message shown to a caller whose write collided on this field.
  pub fn conflict_message(self) -> &'static str {
    match self {
      UniqueField::Email => "User with this email already exists",
      UniqueField::KraPin => "KRA PIN must be unique",
    }
  }
}

/// The denormalised view of a user attached to an assignment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  #[serde(rename = "id")]
  pub user_id:    UserId,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
}

impl From<&User> for UserSummary {
  fn from(u: &User) -> Self {
    UserSummary {
      user_id:    u.user_id,
      first_name: u.first_name.clone(),
      last_name:  u.last_name.clone(),
      email:      u.email.clone(),
    }
  }
}
