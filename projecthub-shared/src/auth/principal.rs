/// Authenticated caller and bearer-token middleware
///
/// A [`Principal`] is what every gateway receives: the user id and the global
/// role recorded in the caller's access token. The axum middleware built by
/// [`create_bearer_middleware`] validates `Authorization: Bearer <token>` and
/// stores the principal in the request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use projecthub_shared::auth::principal::{create_bearer_middleware, Principal};
///
/// async fn whoami(Extension(principal): Extension<Principal>) -> String {
///     principal.user_id.to_string()
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(create_bearer_middleware("secret")));
/// ```

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::user::GlobalRole;

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Global role from the access token
    pub global_role: GlobalRole,
}

impl Principal {
    pub fn new(user_id: Uuid, global_role: GlobalRole) -> Self {
        Self {
            user_id,
            global_role,
        }
    }

    /// Global admins bypass project-level checks
    pub fn is_admin(&self) -> bool {
        self.global_role == GlobalRole::Admin
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }
}

/// Bearer authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not `Bearer <token>`
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Resolves an `Authorization` header value to a principal
///
/// # Errors
///
/// - `MissingCredentials` when the header is absent
/// - `InvalidFormat` when the scheme is not `Bearer`
/// - `InvalidToken` when the token is expired, forged or a refresh token
pub fn authenticate_bearer(header: Option<&str>, secret: &str) -> Result<Principal, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    Ok(Principal::from(&claims))
}

/// Bearer authentication middleware
///
/// Rejects the request with 401 unless it carries a valid access token.
pub async fn bearer_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let principal = authenticate_bearer(header, &secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer credential");
        e
    })?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Captures the JWT secret and returns a closure usable with
/// `axum::middleware::from_fn`
pub fn create_bearer_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(bearer_auth_middleware(secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, TokenType};
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn token(role: GlobalRole, token_type: TokenType) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, role, token_type);
        (user_id, create_token(&claims, SECRET).unwrap())
    }

    #[test]
    fn test_authenticate_bearer_accepts_access_token() {
        let (user_id, token) = token(GlobalRole::Admin, TokenType::Access);
        let header = format!("Bearer {}", token);

        let principal = authenticate_bearer(Some(&header), SECRET).unwrap();
        assert_eq!(principal.user_id, user_id);
        assert!(principal.is_admin());
    }

    #[test]
    fn test_authenticate_bearer_failures() {
        assert!(matches!(
            authenticate_bearer(None, SECRET),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate_bearer(Some("Basic abc"), SECRET),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            authenticate_bearer(Some("Bearer "), SECRET),
            Err(AuthError::InvalidFormat)
        ));

        let (_, refresh) = token(GlobalRole::Student, TokenType::Refresh);
        let header = format!("Bearer {}", refresh);
        assert!(matches!(
            authenticate_bearer(Some(&header), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_middleware_injects_principal() {
        async fn handler(Extension(principal): Extension<Principal>) -> String {
            principal.user_id.to_string()
        }

        let app = Router::new()
            .route("/me", get(handler))
            .layer(middleware::from_fn(create_bearer_middleware(SECRET)));

        let (user_id, token) = token(GlobalRole::Student, TokenType::Access);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string().as_bytes());

        let response = app
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
