/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use projecthub_api::{app::{build_router, AppState}, config::Config};
/// use projecthub_shared::storage::LocalBlobStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let blobs = LocalBlobStore::new(&config.storage.dir).await?;
/// let app = build_router(AppState::new(pool, config, Arc::new(blobs)));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use projecthub_shared::auth::principal::create_bearer_middleware;
use projecthub_shared::storage::BlobStore;
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            blobs,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                   public
/// /v1/auth/{register,login,refresh}         public
/// /v1/me, /v1/me/password                   bearer
/// /v1/admin/users[/:id[/role]]              bearer, admin
/// /v1/projects[/:id[/...]]                  bearer, per-project authorization
/// ```
///
/// Layers, outermost first: security headers, CORS, request tracing, then
/// bearer authentication on the protected subtree.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let upload_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD;

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/visibility", put(routes::projects::set_visibility))
        .route("/:id/access", get(routes::projects::check_access))
        .route(
            "/:id/members",
            get(routes::members::list_members).post(routes::members::add_member),
        )
        .route(
            "/:id/members/:user_id",
            patch(routes::members::update_member_role).delete(routes::members::remove_member),
        )
        .route(
            "/:id/tasks",
            get(routes::tasks::task_board).post(routes::tasks::create_task),
        )
        .route(
            "/:id/tasks/:task_id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:id/issues",
            get(routes::issues::list_issues).post(routes::issues::create_issue),
        )
        .route(
            "/:id/issues/:issue_id",
            get(routes::issues::get_issue)
                .patch(routes::issues::update_issue)
                .delete(routes::issues::delete_issue),
        )
        .route(
            "/:id/issues/:issue_id/comments",
            get(routes::comments::list_comments).post(routes::comments::add_comment),
        )
        .route(
            "/:id/issues/:issue_id/comments/:comment_id",
            delete(routes::comments::delete_comment),
        )
        .route(
            "/:id/files",
            get(routes::files::list_files)
                .post(routes::files::upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/:id/files/:file_id",
            get(routes::files::download_file).delete(routes::files::delete_file),
        )
        .route("/:id/activity", get(routes::activity::list_activity));

    let protected_routes = Router::new()
        .route(
            "/me",
            get(routes::me::get_profile).patch(routes::me::update_profile),
        )
        .route("/me/password", post(routes::me::change_password))
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/:id", delete(routes::admin::delete_user))
        .route("/admin/users/:id/role", patch(routes::admin::set_user_role))
        .nest("/projects", project_routes)
        .layer(middleware::from_fn(create_bearer_middleware(
            state.jwt_secret().to_string(),
        )));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
