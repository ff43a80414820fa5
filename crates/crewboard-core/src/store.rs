//! The `UserStore` and `ProjectStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `crewboard-store-sqlite`). The authorization core and the API depend on
//! these abstractions, not on any concrete backend.
//!
//! "Not found" is always `Ok(None)` (or a dedicated outcome), never an
//! error, so callers can tell a missing record from a failed lookup.

use std::future::Future;

use crate::{
  project::{NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate},
  role::{Role, SlotKind},
  user::{NewUser, UniqueField, User, UserId, UserUpdate},
};

// ─── Query / outcome types ───────────────────────────────────────────────────

/// Parameters for [`ProjectStore::list_projects`].
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
  /// Only projects where this user occupies either slot.
  pub assigned_to: Option<UserId>,
  pub status:      Option<ProjectStatus>,
}

impl ProjectQuery {
  pub fn assigned_to(user_id: UserId) -> Self {
    ProjectQuery { assigned_to: Some(user_id), ..Default::default() }
  }
}

/// Outcome of [`UserStore::delete_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeletion {
  Deleted,
  NotFound,
  /// The user still occupies a project slot; nothing was deleted.
  StillAssigned,
}

/// Outcome of [`UserStore::update_user`].
#[derive(Debug, Clone)]
pub enum UserEdit {
  Edited(User),
  NotFound,
  /// The new email or KRA PIN belongs to another user; nothing was written.
  Duplicate(UniqueField),
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Abstraction over the user store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new user and return it with its assigned id.
  ///
  /// Uniqueness of email and KRA PIN is enforced by the write itself; a
  /// collision is the inner `Err` and nothing is stored.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Result<User, UniqueField>, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by email address (exact match).
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Retrieve a user by KRA PIN (exact match).
  fn find_user_by_kra_pin<'a>(
    &'a self,
    kra_pin: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// List all users, optionally filtered by role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Apply `update` to the user's mutable fields.
  fn update_user(
    &self,
    id: UserId,
    update: UserUpdate,
  ) -> impl Future<Output = Result<UserEdit, Self::Error>> + Send + '_;

  /// Delete a user, unless they still occupy a project slot.
  fn delete_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<UserDeletion, Self::Error>> + Send + '_;
}

// ─── Projects ────────────────────────────────────────────────────────────────

/// Abstraction over the project store.
pub trait ProjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new project with both slots empty.
  fn create_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Retrieve a project by id. Returns `None` if not found.
  fn get_project(
    &self,
    id: ProjectId,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// List projects matching `query`, ordered by id.
  fn list_projects<'a>(
    &'a self,
    query: &'a ProjectQuery,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + 'a;

  /// Apply `update` to the project's non-slot fields. Returns `None` if the
  /// project does not exist.
  fn update_project(
    &self,
    id: ProjectId,
    update: ProjectUpdate,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Set `slot` to `user_id` **only if the slot is currently unset**, as a
  /// single conditional write.
  ///
  /// The user must still exist at the moment of the write. Returns the
  /// updated project, or `None` if nothing was written: the project or the
  /// user does not exist, or the slot was already occupied.
  fn fill_slot(
    &self,
    id: ProjectId,
    slot: SlotKind,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Delete a project. Returns `false` if it did not exist.
  fn delete_project(
    &self,
    id: ProjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
