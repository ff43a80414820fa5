//! Error types for `crewboard-core`.

use thiserror::Error;

use crate::{
  policy::Denial,
  project::ProjectId,
  role::{Role, SlotKind},
  user::{UniqueField, UserId},
};

#[derive(Debug, Error)]
pub enum Error {
  /// The caller could not be authorized; see [`Denial`] for why.
  #[error("access denied: {0}")]
  Denied(#[from] Denial),

  #[error("invalid slot kind: {0:?}")]
  InvalidSlotKind(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("project {project_id} already has an assigned {slot}")]
  SlotAlreadyAssigned { project_id: ProjectId, slot: SlotKind },

  #[error(
    "user {user_id} cannot fill the {expected} slot (role is {})",
    .actual.map_or("none", |r| r.as_str())
  )]
  RoleMismatch {
    user_id:  UserId,
    expected: Role,
    actual:   Option<Role>,
  },

  /// Another user already holds this email or KRA PIN.
  #[error("{}", .0.conflict_message())]
  Duplicate(UniqueField),

  #[error("project not found: {0}")]
  ProjectNotFound(ProjectId),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("user {user_id} is not assigned to project {project_id}")]
  NotAssigned { user_id: UserId, project_id: ProjectId },

  /// Opaque backend failure. The message is for logs only.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
