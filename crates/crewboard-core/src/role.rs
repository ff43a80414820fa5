//! Roles and assignment slots.
//!
//! Both are closed enumerations. Role sets are checked by membership only;
//! there is no ordering of trust between roles.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The role a user holds. A user has at most one role at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Admin,
  ProjectManager,
  Engineer,
}

impl Role {
  /// Upper-snake wire name, as used in tokens and in the database.
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Admin => "ADMIN",
      Role::ProjectManager => "PROJECT_MANAGER",
      Role::Engineer => "ENGINEER",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ADMIN" => Ok(Role::Admin),
      "PROJECT_MANAGER" => Ok(Role::ProjectManager),
      "ENGINEER" => Ok(Role::Engineer),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

// ─── Slot ────────────────────────────────────────────────────────────────────

/// One of the two assignment fields on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotKind {
  Engineer,
  ProjectManager,
}

impl SlotKind {
  /// The only role allowed to occupy this slot.
  pub fn required_role(&self) -> Role {
    match self {
      SlotKind::Engineer => Role::Engineer,
      SlotKind::ProjectManager => Role::ProjectManager,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SlotKind::Engineer => "ENGINEER",
      SlotKind::ProjectManager => "PROJECT_MANAGER",
    }
  }
}

impl fmt::Display for SlotKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Accepts `ENGINEER` / `PROJECT_MANAGER` in any case, with `-` in place of
/// `_` (so `project-manager` works in a URL path).
impl FromStr for SlotKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalised = s.trim().to_ascii_uppercase().replace('-', "_");
    match normalised.as_str() {
      "ENGINEER" => Ok(SlotKind::Engineer),
      "PROJECT_MANAGER" => Ok(SlotKind::ProjectManager),
      _ => Err(Error::InvalidSlotKind(s.to_owned())),
    }
  }
}
