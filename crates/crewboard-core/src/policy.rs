//! The access policy evaluator.
//!
//! Pure: given a declared requirement and a resolved [`Principal`], decide.
//! Requirements are role sets checked by membership.

use thiserror::Error;

use crate::{identity::Principal, role::Role};

/// Why a request was refused. Every variant is terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
  /// No `Authorization` header, or not a `Bearer` one.
  #[error("missing credential")]
  MissingCredential,

  /// Bad signature, expired, not yet valid, wrong issuer or audience, or
  /// simply malformed.
  #[error("invalid credential")]
  InvalidCredential,

  /// The credential's subject no longer exists.
  #[error("unknown identity")]
  UnknownIdentity,

  #[error("user has no role")]
  NoRole,

  #[error("insufficient role: user role is {actual}")]
  InsufficientRole { actual: Role },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny(Denial),
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Decision::Allow) }

  pub fn into_result(self) -> Result<(), Denial> {
    match self {
      Decision::Allow => Ok(()),
      Decision::Deny(d) => Err(d),
    }
  }
}

/// Decide whether `principal` satisfies `required`.
///
/// `None` means the operation declares no requirement and is always
/// allowed. `Some(&[])` is a requirement nobody can meet.
pub fn authorize(required: Option<&[Role]>, principal: &Principal) -> Decision {
  let Some(required) = required else {
    return Decision::Allow;
  };

  if required.contains(&principal.role) {
    Decision::Allow
  } else {
    Decision::Deny(Denial::InsufficientRole { actual: principal.role })
  }
}
