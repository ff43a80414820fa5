//! The credential codec: HS256 JWTs carrying an [`IdentityClaim`].
//!
//! Tokens are valid from the moment they are issued for a fixed ten hours.
//! They cannot be refreshed; an expired caller logs in again.

use chrono::{DateTime, Duration, Utc};
use crewboard_core::{identity::IdentityClaim, role::Role};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

use crate::{Error, Result};

/// How long an issued credential stays valid.
pub const VALIDITY_HOURS: i64 = 10;

const ALGORITHM: Algorithm = Algorithm::HS256;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Signing material and the fixed issuer/audience tags.
#[derive(Clone, Deserialize)]
pub struct TokenConfig {
  pub secret:   String,
  pub issuer:   String,
  pub audience: String,
}

impl std::fmt::Debug for TokenConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenConfig")
      .field("secret", &"<redacted>")
      .field("issuer", &self.issuer)
      .field("audience", &self.audience)
      .finish()
  }
}

// ─── Wire claims ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  /// Decimal user id.
  sub:   String,
  email: String,
  /// Advisory only; the gate re-reads the role from the store.
  #[serde(default, deserialize_with = "advisory_role")]
  role:  Option<Role>,
  iat:   i64,
  nbf:   i64,
  exp:   i64,
  iss:   String,
  aud:   String,
}

/// Any role claim that is not a known role name decodes as `None` instead of
/// failing the whole credential.
fn advisory_role<'de, D>(deserializer: D) -> std::result::Result<Option<Role>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawRole {
    Name(String),
    Other(IgnoredAny),
  }

  Ok(match Option::<RawRole>::deserialize(deserializer)? {
    Some(RawRole::Name(name)) => name.parse().ok(),
    Some(RawRole::Other(_)) | None => None,
  })
}

// ─── Codec ───────────────────────────────────────────────────────────────────

/// Issues and verifies credentials against one [`TokenConfig`].
#[derive(Clone)]
pub struct CredentialCodec {
  issuer:     String,
  audience:   String,
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl CredentialCodec {
  /// Build a codec. Fails with [`Error::MissingSecret`] if the secret is
  /// empty or whitespace.
  pub fn new(config: &TokenConfig) -> Result<Self> {
    if config.secret.trim().is_empty() {
      return Err(Error::MissingSecret);
    }

    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

    Ok(CredentialCodec {
      issuer:     config.issuer.clone(),
      audience:   config.audience.clone(),
      encoding:   EncodingKey::from_secret(config.secret.as_bytes()),
      decoding:   DecodingKey::from_secret(config.secret.as_bytes()),
      validation,
    })
  }

  /// Issue a credential for `identity`, valid from now.
  pub fn issue(&self, identity: &IdentityClaim) -> Result<String> {
    self.issue_at(identity, Utc::now())
  }

  /// Issue a credential as if the current time were `now`.
  pub fn issue_at(
    &self,
    identity: &IdentityClaim,
    now: DateTime<Utc>,
  ) -> Result<String> {
    let issued_at = now.timestamp();
    let claims = Claims {
      sub:   identity.subject_id.to_string(),
      email: identity.email.clone(),
      role:  identity.role,
      iat:   issued_at,
      nbf:   issued_at,
      exp:   (now + Duration::hours(VALIDITY_HOURS)).timestamp(),
      iss:   self.issuer.clone(),
      aud:   self.audience.clone(),
    };

    jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
      .map_err(Error::Signing)
  }

  /// Check signature, validity window, issuer and audience, and return the
  /// embedded identity.
  pub fn verify(&self, token: &str) -> Result<IdentityClaim> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| Error::InvalidCredential(e.to_string()))?;

    let subject_id = data
      .claims
      .sub
      .parse()
      .map_err(|_| Error::InvalidCredential(format!("non-numeric subject {:?}", data.claims.sub)))?;

    Ok(IdentityClaim {
      subject_id,
      email: data.claims.email,
      role:  data.claims.role,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(secret: &str) -> TokenConfig {
    TokenConfig {
      secret:   secret.to_string(),
      issuer:   "crewboard".to_string(),
      audience: "crewboard-api".to_string(),
    }
  }

  fn codec() -> CredentialCodec { CredentialCodec::new(&config("test-secret")).unwrap() }

  fn identity() -> IdentityClaim {
    IdentityClaim {
      subject_id: 3,
      email:      "otieno@example.com".to_string(),
      role:       Some(Role::Engineer),
    }
  }

  #[test]
  fn issued_credential_verifies() {
    let c     = codec();
    let token = c.issue(&identity()).unwrap();
    assert_eq!(c.verify(&token).unwrap(), identity());
  }

  #[test]
  fn missing_secret_is_a_configuration_error() {
    assert!(matches!(CredentialCodec::new(&config("")), Err(Error::MissingSecret)));
    assert!(matches!(CredentialCodec::new(&config("  ")), Err(Error::MissingSecret)));
  }

  #[test]
  fn expired_credential_fails() {
    let c     = codec();
    let token = c
      .issue_at(&identity(), Utc::now() - Duration::hours(VALIDITY_HOURS) - Duration::minutes(1))
      .unwrap();
    assert!(matches!(c.verify(&token), Err(Error::InvalidCredential(_))));
  }

  #[test]
  fn credential_near_end_of_window_still_verifies() {
    let c     = codec();
    let token = c
      .issue_at(&identity(), Utc::now() - Duration::hours(VALIDITY_HOURS) + Duration::minutes(1))
      .unwrap();
    assert!(c.verify(&token).is_ok());
  }

  #[test]
  fn not_yet_valid_credential_fails() {
    let c     = codec();
    let token = c.issue_at(&identity(), Utc::now() + Duration::hours(1)).unwrap();
    assert!(matches!(c.verify(&token), Err(Error::InvalidCredential(_))));
  }

  #[test]
  fn wrong_secret_fails() {
    let token = CredentialCodec::new(&config("other-secret"))
      .unwrap()
      .issue(&identity())
      .unwrap();
    assert!(matches!(codec().verify(&token), Err(Error::InvalidCredential(_))));
  }

  #[test]
  fn wrong_issuer_fails() {
    let mut cfg = config("test-secret");
    cfg.issuer = "someone-else".to_string();
    let token = CredentialCodec::new(&cfg).unwrap().issue(&identity()).unwrap();
    assert!(matches!(codec().verify(&token), Err(Error::InvalidCredential(_))));
  }

  #[test]
  fn wrong_audience_fails() {
    let mut cfg = config("test-secret");
    cfg.audience = "another-api".to_string();
    let token = CredentialCodec::new(&cfg).unwrap().issue(&identity()).unwrap();
    assert!(matches!(codec().verify(&token), Err(Error::InvalidCredential(_))));
  }

  #[test]
  fn garbage_fails() {
    let c = codec();
    for token in ["", "not.a.jwt", "abc", "a.b.c.d"] {
      assert!(matches!(c.verify(token), Err(Error::InvalidCredential(_))), "{token:?}");
    }
  }

  #[test]
  fn tampered_payload_fails() {
    let c        = codec();
    let genuine  = c.issue(&identity()).unwrap();
    let escalate = c
      .issue(&IdentityClaim { role: Some(Role::Admin), ..identity() })
      .unwrap();

    // Header and payload from one token, signature from the other.
    let (head_and_payload, _) = escalate.rsplit_once('.').unwrap();
    let (_, signature)        = genuine.rsplit_once('.').unwrap();
    let spliced               = format!("{head_and_payload}.{signature}");

    assert!(matches!(c.verify(&spliced), Err(Error::InvalidCredential(_))));
  }

  /// Same registered claims as [`Claims`], but a free-form role.
  #[derive(Serialize)]
  struct ForeignClaims<R> {
    sub:   String,
    email: String,
    role:  R,
    iat:   i64,
    nbf:   i64,
    exp:   i64,
    iss:   String,
    aud:   String,
  }

  fn sign_with_role<R: Serialize>(role: R) -> String {
    let now = Utc::now();
    let claims = ForeignClaims {
      sub: "3".to_string(),
      email: "otieno@example.com".to_string(),
      role,
      iat: now.timestamp(),
      nbf: now.timestamp(),
      exp: (now + Duration::hours(1)).timestamp(),
      iss: "crewboard".to_string(),
      aud: "crewboard-api".to_string(),
    };
    jsonwebtoken::encode(
      &Header::new(ALGORITHM),
      &claims,
      &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
  }

  #[test]
  fn unknown_role_name_verifies_without_role() {
    let verified = codec().verify(&sign_with_role("SUPERVISOR")).unwrap();
    assert_eq!(verified.subject_id, 3);
    assert_eq!(verified.email, "otieno@example.com");
    assert_eq!(verified.role, None);
  }

  #[test]
  fn non_string_role_verifies_without_role() {
    assert_eq!(codec().verify(&sign_with_role(7)).unwrap().role, None);
    assert_eq!(
      codec().verify(&sign_with_role("PROJECT_MANAGER")).unwrap().role,
      Some(Role::ProjectManager)
    );
  }

  #[test]
  fn legacy_identity_without_role_round_trips() {
    let c     = codec();
    let claim = IdentityClaim { role: None, ..identity() };
    let token = c.issue(&claim).unwrap();
    assert_eq!(c.verify(&token).unwrap().role, None);
  }
}
