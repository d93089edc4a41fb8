/// Database models for ProjectHub
///
/// Each model owns its SQL. Functions take any `PgExecutor` so they can run
/// against the pool or inside a transaction.
///
/// # Models
///
/// - `user`: accounts and the site-wide role
/// - `project`: projects and their visibility
/// - `membership`: user-project role assignments
/// - `task`: kanban board tasks
/// - `issue`: issue tracker entries
/// - `comment`: comments on issues
/// - `file`: uploaded file metadata
/// - `activity`: per-project audit trail
pub mod activity;
pub mod comment;
pub mod file;
pub mod issue;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;
