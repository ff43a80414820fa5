//! Core types and trait definitions for Crewboard.
//!
//! This crate is free of HTTP, token and database dependencies.
//! It holds the domain model, the store abstractions, and the three pieces
//! of authorization logic that only need those abstractions: the identity
//! resolver, the access policy evaluator, and the assignment engine.

// Store traits declare `Send` futures explicitly; test doubles implement
// them with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod assign;
pub mod error;
pub mod identity;
pub mod policy;
pub mod project;
pub mod role;
pub mod store;
pub mod user;

pub use error::{Error, Result};
