//! Resource gateways
//!
//! Each gateway function is one user-facing operation. Project-scoped
//! operations follow the same shape:
//!
//! 1. acquire a connection (reads) or begin a transaction (writes)
//! 2. [`authorize`](crate::auth::authorization::authorize) the caller for the
//!    action, which loads the project and fails with `NotFound` / `Forbidden`
//! 3. perform the scoped read or write
//! 4. for writes, append an activity entry and commit
//!
//! A denial returns before any data is read or written. Dropping an
//! uncommitted transaction rolls it back, so every early `?` return leaves
//! the database untouched.

pub mod accounts;
pub mod activity;
pub mod comments;
pub mod files;
pub mod issues;
pub mod members;
pub mod projects;
pub mod tasks;

use crate::error::{CoreError, CoreResult};

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 10_000;
pub const COMMENT_MAX: usize = 10_000;

/// Trims `value` and checks it is non-empty and at most `max` characters
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, format!("{} is required", field)));
    }
    bounded_text(field, trimmed, max)
}

/// Checks length only; empty is allowed
pub(crate) fn bounded_text(field: &str, value: &str, max: usize) -> CoreResult<String> {
    if value.chars().count() > max {
        return Err(CoreError::validation(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(value.to_string())
}

pub(crate) fn optional_required_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> CoreResult<Option<String>> {
    value.map(|v| required_text(field, &v, max)).transpose()
}

pub(crate) fn optional_bounded_text(
    field: &str,
    value: Option<String>,
    max: usize,
) -> CoreResult<Option<String>> {
    value.map(|v| bounded_text(field, &v, max)).transpose()
}
