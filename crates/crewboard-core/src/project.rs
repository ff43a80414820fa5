//! Projects and their two assignment slots.
//!
//! A project carries at most one engineer and at most one project manager.
//! Each slot moves from unset to set exactly once, and only through
//! [`assign`](crate::assign::assign). [`ProjectUpdate`] has no slot fields,
//! so the generic update path cannot clear or overwrite them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  role::SlotKind,
  user::{UserId, UserSummary},
};

pub type ProjectId = i64;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  #[serde(rename = "id")]
  pub project_id:         ProjectId,
  pub name:               String,
  pub description:        String,
  pub start_date:         NaiveDate,
  pub end_date:           NaiveDate,
  pub status:             ProjectStatus,
  pub engineer_id:        Option<UserId>,
  pub project_manager_id: Option<UserId>,
  pub created_at:         DateTime<Utc>,
}

impl Project {
  /// Current occupant of `slot`, if any.
  pub fn slot(&self, slot: SlotKind) -> Option<UserId> {
    match slot {
      SlotKind::Engineer => self.engineer_id,
      SlotKind::ProjectManager => self.project_manager_id,
    }
  }

  /// Whether `user_id` occupies either slot.
  pub fn is_assigned_to(&self, user_id: UserId) -> bool {
    self.engineer_id == Some(user_id) || self.project_manager_id == Some(user_id)
  }
}

/// Input to [`ProjectStore::create_project`](crate::store::ProjectStore::create_project).
/// New projects start `Pending` with both slots empty.
#[derive(Debug, Clone)]
pub struct NewProject {
  pub name:        String,
  pub description: String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
}

/// Partial update of a project's non-slot fields.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  pub status:      Option<ProjectStatus>,
}

/// The result of a successful slot binding.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub slot:     SlotKind,
  pub project:  Project,
  pub assignee: UserSummary,
}
