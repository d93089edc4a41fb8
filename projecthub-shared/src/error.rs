/// Core error taxonomy
///
/// Every gateway and the authorization evaluator surface failures as a
/// [`CoreError`]. The HTTP layer maps each variant to a status code; nothing
/// in the core converts a failure into an empty success.
///
/// | Variant           | Meaning                                           |
/// |-------------------|---------------------------------------------------|
/// | `Unauthenticated` | Missing or invalid bearer credential              |
/// | `Forbidden`       | Authenticated, but the effective role is too weak |
/// | `NotFound`        | Project or resource absent                        |
/// | `Conflict`        | Duplicate membership, username or email           |
/// | `Validation`      | Missing or malformed field, or a policy rejection |

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::auth::principal::AuthError;
use crate::storage::StorageError;

/// Result alias used across the gateways
pub type CoreResult<T> = Result<T, CoreError>;

/// Typed failure returned by the core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or invalid credential
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller's effective role does not permit the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Project or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Field-level validation failure
    #[error("Validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Blob store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Unexpected database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Credential hashing or token signing failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation failure on a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing resource
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                match db_err.constraint() {
                    Some("users_username_key") => {
                        return CoreError::Conflict("Username already taken".to_string())
                    }
                    Some("users_email_key") => {
                        return CoreError::Conflict("Email already registered".to_string())
                    }
                    Some("memberships_pkey") => {
                        return CoreError::Conflict(
                            "User is already a member of this project".to_string(),
                        )
                    }
                    Some("memberships_single_owner_idx") => {
                        return CoreError::Conflict("Project already has an owner".to_string())
                    }
                    _ => {}
                }

                // 23503 = foreign_key_violation
                if db_err.code().as_deref() == Some("23503") {
                    return CoreError::NotFound("Referenced resource not found".to_string());
                }

                CoreError::Database(sqlx::Error::Database(db_err))
            }
            other => CoreError::Database(other),
        }
    }
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::ProjectNotFound(id) => {
                CoreError::NotFound(format!("Project {} not found", id))
            }
            denied @ AuthzError::Denied { .. } => CoreError::Forbidden(denied.to_string()),
            AuthzError::Database(e) => CoreError::from(e),
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

/// Token *creation* failures only; validation failures are mapped to
/// `Unauthenticated` where tokens are checked
impl From<JwtError> for CoreError {
    fn from(err: JwtError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        CoreError::Unauthenticated(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::{EffectiveRole, ProjectAction};
    use uuid::Uuid;

    #[test]
    fn test_denial_maps_to_forbidden() {
        let err: CoreError = AuthzError::Denied {
            role: EffectiveRole::Viewer,
            action: ProjectAction::ManageContent,
        }
        .into();

        assert!(matches!(err, CoreError::Forbidden(_)));
        assert!(err.to_string().contains("viewer"));
    }

    #[test]
    fn test_missing_project_maps_to_not_found() {
        let err: CoreError = AuthzError::ProjectNotFound(Uuid::new_v4()).into();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: CoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_auth_error_maps_to_unauthenticated() {
        let err: CoreError = AuthError::MissingCredentials.into();
        assert!(matches!(err, CoreError::Unauthenticated(_)));
    }

    #[test]
    fn test_validation_display() {
        let err = CoreError::validation("title", "Title is required");
        assert_eq!(
            err.to_string(),
            "Validation failed on `title`: Title is required"
        );
    }
}
