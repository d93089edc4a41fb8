/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength policy
/// - [`jwt`]: bearer token issuance and validation
/// - [`principal`]: the authenticated caller and the bearer middleware
/// - [`authorization`]: effective roles and the project permission matrix
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use projecthub_shared::auth::password::{hash_password, verify_password};
/// use projecthub_shared::models::user::GlobalRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Us3r!password")?;
/// assert!(verify_password("Us3r!password", &hash)?);
///
/// let pair = issue_token_pair(Uuid::new_v4(), GlobalRole::Student, "secret-key")?;
/// let claims = validate_access_token(&pair.access_token, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod password;
pub mod principal;
