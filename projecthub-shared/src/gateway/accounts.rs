//! Account operations: registration, login, token refresh, profile, and the
//! admin-only user management endpoints

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::auth::jwt::{self, Claims, TokenPair, TokenType};
use crate::auth::password;
use crate::auth::principal::Principal;
use crate::error::{CoreError, CoreResult};
use crate::models::project::Project;
use crate::models::user::{CreateUser, GlobalRole, UpdateUser, User};
use crate::storage::{project_prefix, BlobStore};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const EMAIL_MAX: usize = 255;
const DISPLAY_NAME_MAX: usize = 100;
const INVALID_CREDENTIALS: &str = "Invalid username, email or password";

/// Largest page `list_users` will return
pub const MAX_USERS_PAGE: i64 = 100;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    /// `Some(None)` clears the display name
    pub display_name: Option<Option<String>>,
}

/// A signed-in user with fresh tokens
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub fn validate_username(username: &str) -> CoreResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(CoreError::validation(
            "username",
            format!(
                "Username must be {}-{} characters",
                USERNAME_MIN, USERNAME_MAX
            ),
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if !username.chars().all(allowed) {
        return Err(CoreError::validation(
            "username",
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }

    Ok(())
}

/// Same HTML5 address rule the API's `#[validate(email)]` derives apply
pub fn validate_email(email: &str) -> CoreResult<()> {
    if email.len() > EMAIL_MAX || !ValidateEmail::validate_email(&email) {
        return Err(CoreError::validation("email", "Invalid email format"));
    }

    Ok(())
}

fn normalize_display_name(display_name: Option<String>) -> CoreResult<Option<String>> {
    match display_name.map(|name| name.trim().to_string()) {
        Some(name) if name.is_empty() => Ok(None),
        Some(name) if name.chars().count() > DISPLAY_NAME_MAX => Err(CoreError::validation(
            "display_name",
            format!("Display name must be at most {} characters", DISPLAY_NAME_MAX),
        )),
        other => Ok(other),
    }
}

fn check_password_strength(field: &str, candidate: &str) -> CoreResult<()> {
    password::validate_password_strength(candidate).map_err(|message| CoreError::Validation {
        field: field.to_string(),
        message,
    })
}

fn require_admin(principal: &Principal) -> CoreResult<()> {
    if !principal.is_admin() {
        warn!(user_id = %principal.user_id, "Non-admin attempted user management");
        return Err(CoreError::Forbidden(
            "Administrator role required".to_string(),
        ));
    }
    Ok(())
}

/// Creates a `student` account and signs it in
pub async fn register(pool: &PgPool, secret: &str, account: NewAccount) -> CoreResult<Session> {
    let username = account.username.trim().to_string();
    let email = account.email.trim().to_string();

    validate_username(&username)?;
    validate_email(&email)?;
    check_password_strength("password", &account.password)?;
    let display_name = normalize_display_name(account.display_name)?;

    let password_hash = password::hash_password(&account.password)?;

    let user = User::create(
        pool,
        CreateUser {
            username,
            email,
            password_hash,
            display_name,
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, user.global_role, secret)?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(Session { user, tokens })
}

/// Verifies credentials; `identifier` may be a username or an email
///
/// Unknown accounts and wrong passwords fail identically.
pub async fn login(
    pool: &PgPool,
    secret: &str,
    identifier: &str,
    candidate: &str,
) -> CoreResult<Session> {
    let user = User::find_by_login(pool, identifier.trim())
        .await?
        .ok_or_else(|| CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(candidate, &user.password_hash)? {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(CoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_login(pool, user.id).await?;
    let tokens = jwt::issue_token_pair(user.id, user.global_role, secret)?;

    info!(user_id = %user.id, "User logged in");
    Ok(Session { user, tokens })
}

/// Exchanges a refresh token for a new access token
///
/// The user is reloaded so the new token carries the current global role.
pub async fn refresh(pool: &PgPool, secret: &str, refresh_token: &str) -> CoreResult<String> {
    let claims = jwt::validate_refresh_token(refresh_token, secret)
        .map_err(|e| CoreError::Unauthenticated(e.to_string()))?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or_else(|| CoreError::Unauthenticated("Account no longer exists".to_string()))?;

    let access = Claims::new(user.id, user.global_role, TokenType::Access);
    Ok(jwt::create_token(&access, secret)?)
}

pub async fn profile(pool: &PgPool, principal: &Principal) -> CoreResult<User> {
    User::find_by_id(pool, principal.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User not found"))
}

pub async fn update_profile(
    pool: &PgPool,
    principal: &Principal,
    update: ProfileUpdate,
) -> CoreResult<User> {
    let email = match update.email {
        Some(email) => {
            let email = email.trim().to_string();
            validate_email(&email)?;
            Some(email)
        }
        None => None,
    };
    let display_name = update
        .display_name
        .map(normalize_display_name)
        .transpose()?;

    User::update(
        pool,
        principal.user_id,
        UpdateUser {
            email,
            password_hash: None,
            display_name,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("User not found"))
}

pub async fn change_password(
    pool: &PgPool,
    principal: &Principal,
    current: &str,
    new_password: &str,
) -> CoreResult<()> {
    let user = profile(pool, principal).await?;

    if !password::verify_password(current, &user.password_hash)? {
        return Err(CoreError::validation(
            "current_password",
            "Current password is incorrect",
        ));
    }
    check_password_strength("new_password", new_password)?;

    let password_hash = password::hash_password(new_password)?;
    User::update(
        pool,
        user.id,
        UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )
    .await?;

    info!(user_id = %user.id, "Password changed");
    Ok(())
}

pub async fn list_users(
    pool: &PgPool,
    principal: &Principal,
    limit: i64,
    offset: i64,
) -> CoreResult<UserPage> {
    require_admin(principal)?;

    let limit = limit.clamp(1, MAX_USERS_PAGE);
    let offset = offset.max(0);
    let users = User::list(pool, limit, offset).await?;
    let total = User::count(pool).await?;

    Ok(UserPage {
        users,
        total,
        limit,
        offset,
    })
}

pub async fn set_global_role(
    pool: &PgPool,
    principal: &Principal,
    user_id: Uuid,
    role: GlobalRole,
) -> CoreResult<User> {
    require_admin(principal)?;

    if user_id == principal.user_id && role != GlobalRole::Admin {
        return Err(CoreError::Conflict(
            "Administrators cannot demote themselves".to_string(),
        ));
    }

    let user = User::set_global_role(pool, user_id, role)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("User {} not found", user_id)))?;

    info!(
        actor_id = %principal.user_id,
        user_id = %user.id,
        role = role.as_str(),
        "Global role changed"
    );
    Ok(user)
}

/// Deletes an account; projects it owns go with it, including their blobs
pub async fn delete_user(
    pool: &PgPool,
    blobs: &dyn BlobStore,
    principal: &Principal,
    user_id: Uuid,
) -> CoreResult<()> {
    require_admin(principal)?;

    if user_id == principal.user_id {
        return Err(CoreError::Conflict(
            "Administrators cannot delete their own account".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let owned = Project::ids_owned_by(&mut *tx, user_id).await?;
    if !User::delete(&mut *tx, user_id).await? {
        return Err(CoreError::not_found(format!("User {} not found", user_id)));
    }
    tx.commit().await?;

    for project_id in &owned {
        if let Err(e) = blobs.delete_prefix(&project_prefix(*project_id)).await {
            warn!(project_id = %project_id, error = %e, "Failed to purge project blobs");
        }
    }

    info!(
        actor_id = %principal.user_id,
        user_id = %user_id,
        projects_removed = owned.len(),
        "User deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ada").is_ok());
        assert!(validate_username("grace.hopper-1_x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("émile").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("a da@example.com").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_validate_email_matches_request_validation() {
        for address in ["ada@exa..mple.com", "ada@-example.com", "a\"b@example.com"] {
            assert!(validate_email(address).is_err(), "{}", address);
            assert!(!ValidateEmail::validate_email(&address), "{}", address);
        }
    }

    #[test]
    fn test_blank_display_name_clears() {
        assert_eq!(normalize_display_name(Some("   ".into())).unwrap(), None);
        assert_eq!(
            normalize_display_name(Some(" Ada ".into())).unwrap(),
            Some("Ada".to_string())
        );
        assert!(normalize_display_name(Some("x".repeat(101))).is_err());
    }

    #[test]
    fn test_require_admin() {
        let student = Principal::new(Uuid::new_v4(), GlobalRole::Student);
        let admin = Principal::new(Uuid::new_v4(), GlobalRole::Admin);

        assert!(matches!(require_admin(&student), Err(CoreError::Forbidden(_))));
        assert!(require_admin(&admin).is_ok());
    }

    #[test]
    fn test_weak_password_is_validation_error() {
        match check_password_strength("password", "short") {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field, "password"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
