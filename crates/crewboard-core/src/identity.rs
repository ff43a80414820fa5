//! Identity claims and the resolver that turns them into a [`Principal`].
//!
//! A claim is whatever the credential said at issuance time. It can be
//! stale: the user may have been deleted, or their role changed, since the
//! token was signed. The resolver re-reads the user on every request and
//! trusts only the stored role.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  policy::Denial,
  role::Role,
  store::UserStore,
  user::{User, UserId},
};

/// The identity asserted by a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
  pub subject_id: UserId,
  pub email:      String,
  /// Advisory only; see [`resolve`].
  pub role:       Option<Role>,
}

impl From<&User> for IdentityClaim {
  fn from(u: &User) -> Self {
    IdentityClaim {
      subject_id: u.user_id,
      email:      u.email.clone(),
      role:       u.role,
    }
  }
}

/// A caller whose identity has been checked against the user store.
///
/// `role` is the stored role at resolution time, lifted out of the
/// `Option` so later checks cannot forget the "no role" case.
#[derive(Debug, Clone)]
pub struct Principal {
  pub user: User,
  pub role: Role,
}

/// Load the authoritative user for `claim`.
///
/// Fails with [`Denial::UnknownIdentity`] if the user no longer exists and
/// [`Denial::NoRole`] if the stored record carries no role.
pub async fn resolve<U>(users: &U, claim: &IdentityClaim) -> Result<Principal>
where
  U: UserStore,
{
  let user = users
    .get_user(claim.subject_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      tracing::debug!(subject_id = claim.subject_id, "credential subject no longer exists");
      Denial::UnknownIdentity
    })?;

  let Some(role) = user.role else {
    tracing::debug!(user_id = user.user_id, "user has no role");
    return Err(Denial::NoRole.into());
  };

  if claim.role != Some(role) {
    tracing::warn!(
      user_id = user.user_id,
      claimed = ?claim.role,
      stored  = %role,
      "stale role in credential; using stored role"
    );
  }

  Ok(Principal { user, role })
}

#[cfg(test)]
pub(crate) mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use chrono::Utc;

  use super::*;
  use crate::{
    store::{UserDeletion, UserEdit},
    user::{NewUser, UniqueField, UserUpdate},
  };

  /// Minimal user store keyed by id, for resolver and policy tests.
  #[derive(Default)]
  pub(crate) struct FixedUsers(pub Mutex<HashMap<UserId, User>>);

  impl FixedUsers {
    pub(crate) fn with(users: impl IntoIterator<Item = User>) -> Self {
      FixedUsers(Mutex::new(users.into_iter().map(|u| (u.user_id, u)).collect()))
    }

    pub(crate) fn set_role(&self, id: UserId, role: Option<Role>) {
      if let Some(u) = self.0.lock().unwrap().get_mut(&id) {
        u.role = role;
      }
    }
  }

  pub(crate) fn user(id: UserId, role: Option<Role>) -> User {
    User {
      user_id:       id,
      first_name:    "Wanjiru".into(),
      last_name:     "Kamau".into(),
      email:         format!("user{id}@example.com"),
      phone_number:  "+254700000000".into(),
      kra_pin:       format!("A{id:09}Z"),
      address:       "Nairobi".into(),
      password_hash: String::new(),
      role,
      created_at:    Utc::now(),
    }
  }

  impl UserStore for FixedUsers {
    type Error = std::convert::Infallible;
    async fn create_user(&self, _: NewUser) -> Result<Result<User, UniqueField>, Self::Error> { unimplemented!() }
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
      Ok(self.0.lock().unwrap().get(&id).cloned())
    }
    async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn find_user_by_kra_pin(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn list_users(&self, _: Option<Role>) -> Result<Vec<User>, Self::Error> { unimplemented!() }
    async fn update_user(&self, _: UserId, _: UserUpdate) -> Result<UserEdit, Self::Error> { unimplemented!() }
    async fn delete_user(&self, _: UserId) -> Result<UserDeletion, Self::Error> { unimplemented!() }
  }

  fn claim_for(u: &User) -> IdentityClaim { IdentityClaim::from(u) }

  #[tokio::test]
  async fn resolves_existing_user_with_role() {
    let u     = user(1, Some(Role::Admin));
    let store = FixedUsers::with([u.clone()]);
    let p     = resolve(&store, &claim_for(&u)).await.unwrap();
    assert_eq!(p.role, Role::Admin);
    assert_eq!(p.user.user_id, 1);
  }

  #[tokio::test]
  async fn deleted_user_is_unknown_identity() {
    let u     = user(1, Some(Role::Admin));
    let store = FixedUsers::default();
    let err   = resolve(&store, &claim_for(&u)).await.unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::UnknownIdentity)));
  }

  #[tokio::test]
  async fn user_without_role_is_denied() {
    let u     = user(4, None);
    let store = FixedUsers::with([u.clone()]);
    let err   = resolve(&store, &claim_for(&u)).await.unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::NoRole)));
  }

  #[tokio::test]
  async fn stored_role_wins_over_claimed_role() {
    let u     = user(2, Some(Role::Engineer));
    let claim = claim_for(&u);
    let store = FixedUsers::with([u]);
    store.set_role(2, Some(Role::ProjectManager));

    let p = resolve(&store, &claim).await.unwrap();
    assert_eq!(claim.role, Some(Role::Engineer));
    assert_eq!(p.role, Role::ProjectManager);
  }
}
