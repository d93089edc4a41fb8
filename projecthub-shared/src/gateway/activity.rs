//! Project activity feed

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::{authorize, ProjectAction};
use crate::auth::principal::Principal;
use crate::error::CoreResult;
use crate::models::activity::ActivityEntry;

pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Most recent entries first; pass the last seen id as `before` to page back
pub async fn list(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    before: Option<i64>,
    limit: Option<i64>,
) -> CoreResult<Vec<ActivityEntry>> {
    let mut conn = pool.acquire().await?;
    authorize(&mut conn, principal, project_id, ProjectAction::View).await?;

    Ok(ActivityEntry::list(
        &mut *conn,
        project_id,
        before,
        limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?)
}
