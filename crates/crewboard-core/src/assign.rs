//! The assignment engine.
//!
//! Binds a user into one of a project's two slots. The checks below run in
//! a fixed order and all of them happen before any write; the write itself
//! is the store's conditional [`fill_slot`](ProjectStore::fill_slot), so a
//! concurrent assignment that slips in after the checks still cannot
//! overwrite an occupied slot.

use crate::{
  Error, Result,
  project::{Assignment, Project, ProjectId},
  role::SlotKind,
  store::{ProjectQuery, ProjectStore, UserStore},
  user::{UserId, UserSummary},
};

/// Bind `user_id` into `slot` on `project_id`.
///
/// Slot kinds arriving as text are validated by parsing into [`SlotKind`]
/// (`InvalidSlotKind`) before this is called. Then:
///
/// 1. the project must exist (`ProjectNotFound`);
/// 2. the slot must be empty (`SlotAlreadyAssigned`);
/// 3. the user must exist (`UserNotFound`);
/// 4. the user's role must match the slot (`RoleMismatch`);
/// 5. the slot is written only if still empty.
pub async fn assign<S>(
  store: &S,
  project_id: ProjectId,
  user_id: UserId,
  slot: SlotKind,
) -> Result<Assignment>
where
  S: UserStore + ProjectStore,
{
  let project = store.get_project(project_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProjectNotFound(project_id))?;

  if let Some(current) = project.slot(slot) {
    tracing::debug!(project_id, %slot, current, "slot already occupied");
    return Err(Error::SlotAlreadyAssigned { project_id, slot });
  }

  let user = store.get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound(user_id))?;

  let expected = slot.required_role();
  if user.role != Some(expected) {
    return Err(Error::RoleMismatch { user_id, expected, actual: user.role });
  }

  let Some(project) = store
    .fill_slot(project_id, slot, user_id)
    .await
    .map_err(Error::store)?
  else {
    // Lost a race with a concurrent assignment or deletion. Re-read to
    // classify in the same order as the checks above.
    return Err(classify_unwritten(store, project_id, user_id, slot).await?);
  };

  tracing::info!(project_id, user_id, %slot, "assigned user to project");

  Ok(Assignment {
    slot,
    project,
    assignee: UserSummary::from(&user),
  })
}

/// Every project where `user_id` holds either slot.
///
/// An existing user with no assignments gets an empty list; only a missing
/// user is an error.
pub async fn assigned_projects<S>(store: &S, user_id: UserId) -> Result<Vec<Project>>
where
  S: UserStore + ProjectStore,
{
  ensure_user(store, user_id).await?;

  store
    .list_projects(&ProjectQuery::assigned_to(user_id))
    .await
    .map_err(Error::store)
}

/// A single project, provided `user_id` holds one of its slots.
pub async fn assigned_project<S>(
  store: &S,
  user_id: UserId,
  project_id: ProjectId,
) -> Result<Project>
where
  S: UserStore + ProjectStore,
{
  ensure_user(store, user_id).await?;

  let project = store.get_project(project_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProjectNotFound(project_id))?;

  if !project.is_assigned_to(user_id) {
    return Err(Error::NotAssigned { user_id, project_id });
  }
  Ok(project)
}

/// Remove a project record. Only requires that the project exist.
pub async fn delete_project<P>(store: &P, project_id: ProjectId) -> Result<()>
where
  P: ProjectStore,
{
  if !store.delete_project(project_id).await.map_err(Error::store)? {
    return Err(Error::ProjectNotFound(project_id));
  }
  tracing::info!(project_id, "deleted project");
  Ok(())
}

/// Explain why a conditional slot write that passed every check still wrote
/// nothing.
async fn classify_unwritten<S>(
  store: &S,
  project_id: ProjectId,
  user_id: UserId,
  slot: SlotKind,
) -> Result<Error>
where
  S: UserStore + ProjectStore,
{
  let Some(project) = store.get_project(project_id).await.map_err(Error::store)? else {
    return Ok(Error::ProjectNotFound(project_id));
  };
  if project.slot(slot).is_some() {
    return Ok(Error::SlotAlreadyAssigned { project_id, slot });
  }
  if store.get_user(user_id).await.map_err(Error::store)?.is_none() {
    tracing::debug!(project_id, user_id, "assignee deleted before slot write");
    return Ok(Error::UserNotFound(user_id));
  }
  Ok(Error::SlotAlreadyAssigned { project_id, slot })
}

async fn ensure_user<U>(store: &U, user_id: UserId) -> Result<()>
where
  U: UserStore,
{
  store.get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound(user_id))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::{
    identity::tests::user,
    project::{NewProject, ProjectStatus, ProjectUpdate},
    role::Role,
    store::{UserDeletion, UserEdit},
    user::{NewUser, UniqueField, User, UserUpdate},
  };

  // One project and one engineer. Every conditional write loses; what the
  // follow-up reads see depends on which concurrent change is simulated.
  struct LosingWrite {
    user:        User,
    user_reads:  Mutex<usize>,
    proj_reads:  Mutex<usize>,
    vanish_user: bool,
    steal_slot:  bool,
  }

  impl LosingWrite {
    fn new(vanish_user: bool, steal_slot: bool) -> Self {
      LosingWrite {
        user: user(3, Some(Role::Engineer)),
        user_reads: Mutex::new(0),
        proj_reads: Mutex::new(0),
        vanish_user,
        steal_slot,
      }
    }
  }

  fn project(engineer_id: Option<UserId>) -> Project {
    Project {
      project_id: 7,
      name: "Bypass".into(),
      description: "Ring road".into(),
      start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
      end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
      status: ProjectStatus::Pending,
      engineer_id,
      project_manager_id: None,
      created_at: Utc::now(),
    }
  }

  impl UserStore for LosingWrite {
    type Error = std::convert::Infallible;
    async fn create_user(&self, _: NewUser) -> Result<Result<User, UniqueField>, Self::Error> { unimplemented!() }
    async fn get_user(&self, _: UserId) -> Result<Option<User>, Self::Error> {
      let mut reads = self.user_reads.lock().unwrap();
      *reads += 1;
      Ok((*reads == 1 || !self.vanish_user).then(|| self.user.clone()))
    }
    async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn find_user_by_kra_pin(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn list_users(&self, _: Option<Role>) -> Result<Vec<User>, Self::Error> { unimplemented!() }
    async fn update_user(&self, _: UserId, _: UserUpdate) -> Result<UserEdit, Self::Error> { unimplemented!() }
    async fn delete_user(&self, _: UserId) -> Result<UserDeletion, Self::Error> { unimplemented!() }
  }

  impl ProjectStore for LosingWrite {
    type Error = std::convert::Infallible;
    async fn create_project(&self, _: NewProject) -> Result<Project, Self::Error> { unimplemented!() }
    async fn get_project(&self, _: ProjectId) -> Result<Option<Project>, Self::Error> {
      let mut reads = self.proj_reads.lock().unwrap();
      *reads += 1;
      let taken = *reads > 1 && self.steal_slot;
      Ok(Some(project(taken.then_some(99))))
    }
    async fn list_projects(&self, _: &ProjectQuery) -> Result<Vec<Project>, Self::Error> { unimplemented!() }
    async fn update_project(&self, _: ProjectId, _: ProjectUpdate) -> Result<Option<Project>, Self::Error> { unimplemented!() }
    async fn fill_slot(&self, _: ProjectId, _: SlotKind, _: UserId) -> Result<Option<Project>, Self::Error> {
      Ok(None)
    }
    async fn delete_project(&self, _: ProjectId) -> Result<bool, Self::Error> { unimplemented!() }
  }

  #[tokio::test]
  async fn assignee_deleted_before_write_is_user_not_found() {
    let store = LosingWrite::new(true, false);
    let err   = assign(&store, 7, 3, SlotKind::Engineer).await.unwrap_err();
    assert!(matches!(err, Error::UserNotFound(3)), "{err:?}");
  }

  #[tokio::test]
  async fn slot_taken_before_write_is_already_assigned() {
    let store = LosingWrite::new(false, true);
    let err   = assign(&store, 7, 3, SlotKind::Engineer).await.unwrap_err();
    assert!(matches!(err, Error::SlotAlreadyAssigned { project_id: 7, slot: SlotKind::Engineer }));
  }

  #[tokio::test]
  async fn occupied_slot_wins_over_vanished_user() {
    let store = LosingWrite::new(true, true);
    let err   = assign(&store, 7, 3, SlotKind::Engineer).await.unwrap_err();
    assert!(matches!(err, Error::SlotAlreadyAssigned { .. }));
  }
}
