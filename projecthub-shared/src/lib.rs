//! # ProjectHub Shared Library
//!
//! Core of the ProjectHub backend: identity, the project authorization
//! evaluator, database models and the resource gateways the HTTP server
//! calls into.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWTs, bearer principals and the authorization evaluator
//! - `db`: connection pool and migrations
//! - `models`: tables and their queries
//! - `gateway`: one function per user-facing operation, each authorized first
//! - `storage`: blob storage for uploaded files
//! - `error`: the `CoreError` taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod storage;

pub use error::{CoreError, CoreResult};

/// Current version of the ProjectHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
