//! Credentials for Crewboard: signing and verifying bearer tokens, hashing
//! passwords, and the request gate that strings the authorization steps
//! together.
//!
//! Nothing here knows about HTTP beyond the raw `Authorization` header
//! value.

pub mod credential;
pub mod error;
pub mod gate;
pub mod password;

pub use credential::{CredentialCodec, TokenConfig};
pub use error::{Error, Result};
pub use gate::admit;
