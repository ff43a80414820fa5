//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, and enums as their upper-snake wire names.

use chrono::{DateTime, NaiveDate, Utc};
use crewboard_core::{
  project::{Project, ProjectStatus},
  role::{Role, SlotKind},
  user::{UniqueField, User},
};

use crate::{Error, Result};

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::BadEnum { column: "role", value: s.to_owned() })
}

// ─── ProjectStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: ProjectStatus) -> &'static str {
  match s {
    ProjectStatus::Pending => "PENDING",
    ProjectStatus::InProgress => "IN_PROGRESS",
    ProjectStatus::Completed => "COMPLETED",
  }
}

pub fn decode_status(s: &str) -> Result<ProjectStatus> {
  match s {
    "PENDING" => Ok(ProjectStatus::Pending),
    "IN_PROGRESS" => Ok(ProjectStatus::InProgress),
    "COMPLETED" => Ok(ProjectStatus::Completed),
    other => Err(Error::BadEnum { column: "status", value: other.to_owned() }),
  }
}

// ─── SlotKind ────────────────────────────────────────────────────────────────

/// Column holding `slot` in the `projects` table.
pub fn slot_column(slot: SlotKind) -> &'static str {
  match slot {
    SlotKind::Engineer => "engineer_id",
    SlotKind::ProjectManager => "project_manager_id",
  }
}

// ─── Constraint violations ───────────────────────────────────────────────────

/// Which unique `users` column a failed write collided with, if any.
pub fn unique_violation(e: &rusqlite::Error) -> Option<UniqueField> {
  let rusqlite::Error::SqliteFailure(err, Some(msg)) = e else {
    return None;
  };
  if err.extended_code != rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
    return None;
  }
  if msg.contains("users.email") {
    Some(UniqueField::Email)
  } else if msg.contains("users.kra_pin") {
    Some(UniqueField::KraPin)
  } else {
    None
  }
}

// ─── Raw row types ───────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, first_name, last_name, email, phone_number, \
   kra_pin, address, password_hash, role, created_at";

/// Intermediate type for reading a user row out of SQLite before decoding.
pub struct RawUser {
  pub user_id:       i64,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub phone_number:  String,
  pub kra_pin:       String,
  pub address:       String,
  pub password_hash: String,
  pub role:          Option<String>,
  pub created_at:    String,
}

impl RawUser {
  /// Read a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:       row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      email:         row.get(3)?,
      phone_number:  row.get(4)?,
      kra_pin:       row.get(5)?,
      address:       row.get(6)?,
      password_hash: row.get(7)?,
      role:          row.get(8)?,
      created_at:    row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       self.user_id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      email:         self.email,
      phone_number:  self.phone_number,
      kra_pin:       self.kra_pin,
      address:       self.address,
      password_hash: self.password_hash,
      role:          self.role.as_deref().map(decode_role).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const PROJECT_COLUMNS: &str = "project_id, name, description, start_date, end_date, \
   status, engineer_id, project_manager_id, created_at";

/// Intermediate type for reading a project row out of SQLite before decoding.
pub struct RawProject {
  pub project_id:         i64,
  pub name:               String,
  pub description:        String,
  pub start_date:         String,
  pub end_date:           String,
  pub status:             String,
  pub engineer_id:        Option<i64>,
  pub project_manager_id: Option<i64>,
  pub created_at:         String,
}

impl RawProject {
  /// Read a row selected with [`PROJECT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawProject {
      project_id:         row.get(0)?,
      name:               row.get(1)?,
      description:        row.get(2)?,
      start_date:         row.get(3)?,
      end_date:           row.get(4)?,
      status:             row.get(5)?,
      engineer_id:        row.get(6)?,
      project_manager_id: row.get(7)?,
      created_at:         row.get(8)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:         self.project_id,
      name:               self.name,
      description:        self.description,
      start_date:         decode_date(&self.start_date)?,
      end_date:           decode_date(&self.end_date)?,
      status:             decode_status(&self.status)?,
      engineer_id:        self.engineer_id,
      project_manager_id: self.project_manager_id,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_use_iso_calendar_form() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    assert_eq!(encode_date(d), "2025-03-09");
    assert_eq!(decode_date("2025-03-09").unwrap(), d);
    assert!(decode_date("09/03/2025").is_err());
  }

  #[test]
  fn unknown_role_is_rejected() {
    assert!(matches!(
      decode_role("SUPERUSER"),
      Err(Error::BadEnum { column: "role", .. })
    ));
  }

  #[test]
  fn status_names_are_stable() {
    for s in [ProjectStatus::Pending, ProjectStatus::InProgress, ProjectStatus::Completed] {
      assert_eq!(decode_status(encode_status(s)).unwrap(), s);
    }
  }
}
