//! The request gate: presence check → decode → resolve → policy.
//!
//! Operations that declare no role requirement pass straight through; the
//! credential is not even looked at. For everything else the steps run in
//! order and the first failure wins.

use crewboard_core::{
  Error as CoreError,
  identity::{Principal, resolve},
  policy::{Denial, authorize},
  role::Role,
  store::UserStore,
};

use crate::CredentialCodec;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value.
///
/// A missing header, a non-`Bearer` scheme and an empty token are all
/// [`Denial::MissingCredential`].
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, Denial> {
  authorization
    .and_then(|h| h.strip_prefix(BEARER_PREFIX))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Denial::MissingCredential)
}

/// Admit a request carrying `authorization` to an operation that requires
/// `required`.
///
/// Returns `Ok(None)` for operations with no requirement, otherwise the
/// resolved [`Principal`].
pub async fn admit<U>(
  codec: &CredentialCodec,
  users: &U,
  required: Option<&[Role]>,
  authorization: Option<&str>,
) -> Result<Option<Principal>, CoreError>
where
  U: UserStore,
{
  if required.is_none() {
    return Ok(None);
  }

  let token = bearer_token(authorization)?;

  let claim = codec.verify(token).map_err(|e| {
    tracing::debug!(error = %e, "rejected credential");
    Denial::InvalidCredential
  })?;

  let principal = resolve(users, &claim).await?;

  if let Err(denial) = authorize(required, &principal).into_result() {
    tracing::debug!(user_id = principal.user.user_id, %denial, "access denied");
    return Err(denial.into());
  }

  Ok(Some(principal))
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use chrono::{Duration, Utc};
  use crewboard_core::{
    identity::IdentityClaim,
    store::{UserDeletion, UserEdit},
    user::{NewUser, UniqueField, User, UserId, UserUpdate},
  };

  use super::*;
  use crate::TokenConfig;

  // A user store that counts lookups so tests can assert short-circuiting.
  #[derive(Default)]
  struct CountingUsers {
    users:   Mutex<HashMap<UserId, User>>,
    lookups: Mutex<usize>,
  }

  impl CountingUsers {
    fn insert(&self, id: UserId, role: Option<Role>) -> User {
      let u = User {
        user_id:       id,
        first_name:    "Achieng".into(),
        last_name:     "Odhiambo".into(),
        email:         format!("u{id}@example.com"),
        phone_number:  "+254711000000".into(),
        kra_pin:       format!("P{id:09}Q"),
        address:       "Kisumu".into(),
        password_hash: String::new(),
        role,
        created_at:    Utc::now(),
      };
      self.users.lock().unwrap().insert(id, u.clone());
      u
    }

    fn set_role(&self, id: UserId, role: Option<Role>) {
      self.users.lock().unwrap().get_mut(&id).unwrap().role = role;
    }

    fn remove(&self, id: UserId) { self.users.lock().unwrap().remove(&id); }

    fn lookups(&self) -> usize { *self.lookups.lock().unwrap() }
  }

  impl UserStore for CountingUsers {
    type Error = std::convert::Infallible;
    async fn create_user(&self, _: NewUser) -> Result<Result<User, UniqueField>, Self::Error> { unimplemented!() }
    async fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
      *self.lookups.lock().unwrap() += 1;
      Ok(self.users.lock().unwrap().get(&id).cloned())
    }
    async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn find_user_by_kra_pin(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
    async fn list_users(&self, _: Option<Role>) -> Result<Vec<User>, Self::Error> { unimplemented!() }
    async fn update_user(&self, _: UserId, _: UserUpdate) -> Result<UserEdit, Self::Error> { unimplemented!() }
    async fn delete_user(&self, _: UserId) -> Result<UserDeletion, Self::Error> { unimplemented!() }
  }

  fn codec() -> CredentialCodec {
    CredentialCodec::new(&TokenConfig {
      secret:   "gate-secret".into(),
      issuer:   "crewboard".into(),
      audience: "crewboard-api".into(),
    })
    .unwrap()
  }

  fn bearer(codec: &CredentialCodec, user: &User) -> String {
    format!("Bearer {}", codec.issue(&IdentityClaim::from(user)).unwrap())
  }

  fn denial(err: CoreError) -> Denial {
    match err {
      CoreError::Denied(d) => d,
      other => panic!("expected a denial, got {other:?}"),
    }
  }

  const ADMIN_ONLY: &[Role] = &[Role::Admin];

  #[tokio::test]
  async fn no_requirement_skips_everything() {
    let users = CountingUsers::default();
    let got   = admit(&codec(), &users, None, Some("Bearer garbage")).await.unwrap();
    assert!(got.is_none());
    assert_eq!(users.lookups(), 0);
  }

  #[tokio::test]
  async fn missing_or_malformed_header_is_missing_credential() {
    let users = CountingUsers::default();
    let c     = codec();
    for header in [None, Some(""), Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("bearer abc")] {
      let err = admit(&c, &users, Some(ADMIN_ONLY), header).await.unwrap_err();
      assert_eq!(denial(err), Denial::MissingCredential, "{header:?}");
    }
    assert_eq!(users.lookups(), 0);
  }

  #[tokio::test]
  async fn bad_token_is_invalid_credential_without_store_lookup() {
    let users = CountingUsers::default();
    let err   = admit(&codec(), &users, Some(ADMIN_ONLY), Some("Bearer not.a.token"))
      .await
      .unwrap_err();
    assert_eq!(denial(err), Denial::InvalidCredential);
    assert_eq!(users.lookups(), 0);
  }

  #[tokio::test]
  async fn expired_token_is_invalid_credential() {
    let users = CountingUsers::default();
    let c     = codec();
    let admin = users.insert(1, Some(Role::Admin));
    let token = c
      .issue_at(&IdentityClaim::from(&admin), Utc::now() - Duration::hours(11))
      .unwrap();
    let err = admit(&c, &users, Some(ADMIN_ONLY), Some(&format!("Bearer {token}")))
      .await
      .unwrap_err();
    assert_eq!(denial(err), Denial::InvalidCredential);
  }

  #[tokio::test]
  async fn admits_matching_role() {
    let users = CountingUsers::default();
    let c     = codec();
    let admin = users.insert(1, Some(Role::Admin));
    let p = admit(&c, &users, Some(ADMIN_ONLY), Some(&bearer(&c, &admin)))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(p.user.user_id, 1);
    assert_eq!(p.role, Role::Admin);
  }

  #[tokio::test]
  async fn insufficient_role_is_denied() {
    let users = CountingUsers::default();
    let c     = codec();
    let eng   = users.insert(2, Some(Role::Engineer));
    let err   = admit(&c, &users, Some(ADMIN_ONLY), Some(&bearer(&c, &eng)))
      .await
      .unwrap_err();
    assert_eq!(denial(err), Denial::InsufficientRole { actual: Role::Engineer });
  }

  #[tokio::test]
  async fn current_store_role_is_used_not_token_role() {
    let users  = CountingUsers::default();
    let c      = codec();
    let eng    = users.insert(2, Some(Role::Engineer));
    let header = bearer(&c, &eng);

    let managers: &[Role] = &[Role::Admin, Role::ProjectManager];
    assert!(admit(&c, &users, Some(managers), Some(&header)).await.is_err());

    users.set_role(2, Some(Role::ProjectManager));
    let p = admit(&c, &users, Some(managers), Some(&header)).await.unwrap().unwrap();
    assert_eq!(p.role, Role::ProjectManager);
  }

  #[tokio::test]
  async fn revoked_role_takes_effect_immediately() {
    let users  = CountingUsers::default();
    let c      = codec();
    let admin  = users.insert(1, Some(Role::Admin));
    let header = bearer(&c, &admin);

    users.set_role(1, Some(Role::Engineer));
    let err = admit(&c, &users, Some(ADMIN_ONLY), Some(&header)).await.unwrap_err();
    assert_eq!(denial(err), Denial::InsufficientRole { actual: Role::Engineer });

    users.set_role(1, None);
    let err = admit(&c, &users, Some(ADMIN_ONLY), Some(&header)).await.unwrap_err();
    assert_eq!(denial(err), Denial::NoRole);
  }

  #[tokio::test]
  async fn deleted_user_is_unknown_identity() {
    let users  = CountingUsers::default();
    let c      = codec();
    let admin  = users.insert(1, Some(Role::Admin));
    let header = bearer(&c, &admin);
    users.remove(1);

    let err = admit(&c, &users, Some(ADMIN_ONLY), Some(&header)).await.unwrap_err();
    assert_eq!(denial(err), Denial::UnknownIdentity);
  }

  #[test]
  fn bearer_token_trims_whitespace() {
    assert_eq!(bearer_token(Some("Bearer  abc ")), Ok("abc"));
  }
}
