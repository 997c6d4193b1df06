//! # Hearth Shared Library
//!
//! Core of the Hearth household service: identity tokens, request identity
//! resolution, household-scoped authorization and the invitation lifecycle.
//! The HTTP server in `hearth-api` is a thin adapter over this crate.
//!
//! ## Module Organization
//!
//! - `auth`: Credential hashing, tokens, principal and identity middleware
//! - `models`: Records and their SQL
//! - `store`: The membership store contract and its implementations
//! - `services`: Auth workflow, household service, invitation engine
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Hearth shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
