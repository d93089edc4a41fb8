/// Authorization evaluator
///
/// Every project-scoped read or write goes through this module. Access is
/// decided in two steps:
///
/// 1. [`effective_role`] derives the caller's [`EffectiveRole`] from the
///    global role, the stored membership (if any) and the project visibility.
/// 2. [`EffectiveRole::permits`] looks the requested [`ProjectAction`] up in
///    the permission matrix.
///
/// # Permission Matrix
///
/// | Action          | owner | editor | viewer | public_viewer | none |
/// |-----------------|-------|--------|--------|---------------|------|
/// | `View`          |   ✓   |   ✓    |   ✓    |       ✓       |  ✗   |
/// | `ManageContent` |   ✓   |   ✓    |   ✗    |       ✗       |  ✗   |
/// | `Comment`       |   ✓   |   ✓    |   ✓    |       ✓       |  ✗   |
/// | `ManageMembers` |   ✓   |   ✗    |   ✗    |       ✗       |  ✗   |
/// | `ManageProject` |   ✓   |   ✗    |   ✗    |       ✗       |  ✗   |
///
/// # Example
///
/// ```no_run
/// use projecthub_shared::auth::authorization::{authorize, ProjectAction};
/// use projecthub_shared::auth::principal::Principal;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, principal: Principal, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = pool.acquire().await?;
/// let grant = authorize(&mut conn, &principal, project_id, ProjectAction::ManageContent).await?;
/// println!("acting as {}", grant.role);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use super::principal::{authenticate_bearer, Principal};
use crate::error::CoreError;
use crate::models::membership::{MemberRole, Membership};
use crate::models::project::{Project, Visibility};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The project does not exist
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    /// The effective role does not permit the action
    #[error("Role '{role}' is not permitted to {action}")]
    Denied {
        role: EffectiveRole,
        action: ProjectAction,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access level a caller holds on one project for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveRole {
    Owner,
    Editor,
    Viewer,
    /// Authenticated non-member of a public project
    PublicViewer,
    /// No access at all
    #[serde(rename = "none")]
    NoAccess,
}

impl EffectiveRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveRole::Owner => "owner",
            EffectiveRole::Editor => "editor",
            EffectiveRole::Viewer => "viewer",
            EffectiveRole::PublicViewer => "public_viewer",
            EffectiveRole::NoAccess => "none",
        }
    }

    /// Looks `action` up in the permission matrix
    pub fn permits(self, action: ProjectAction) -> bool {
        match action {
            ProjectAction::View | ProjectAction::Comment => self != EffectiveRole::NoAccess,
            ProjectAction::ManageContent => {
                matches!(self, EffectiveRole::Owner | EffectiveRole::Editor)
            }
            ProjectAction::ManageMembers | ProjectAction::ManageProject => {
                self == EffectiveRole::Owner
            }
        }
    }
}

impl fmt::Display for EffectiveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MemberRole> for EffectiveRole {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Owner => EffectiveRole::Owner,
            MemberRole::Editor => EffectiveRole::Editor,
            MemberRole::Viewer => EffectiveRole::Viewer,
        }
    }
}

/// Actions a gateway can request on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    /// Read the project and its tasks, issues, comments, files, members
    View,

    /// Create, edit or delete tasks, issues and files
    ManageContent,

    /// Post a comment
    Comment,

    /// Add, remove or re-role members
    ManageMembers,

    /// Edit details, change visibility, delete the project
    ManageProject,
}

impl ProjectAction {
    pub const ALL: [ProjectAction; 5] = [
        ProjectAction::View,
        ProjectAction::ManageContent,
        ProjectAction::Comment,
        ProjectAction::ManageMembers,
        ProjectAction::ManageProject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectAction::View => "view",
            ProjectAction::ManageContent => "manage_content",
            ProjectAction::Comment => "comment",
            ProjectAction::ManageMembers => "manage_members",
            ProjectAction::ManageProject => "manage_project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the caller's effective role on a project
///
/// Pure: the result depends only on the arguments.
pub fn effective_role(
    principal: &Principal,
    membership: Option<MemberRole>,
    visibility: Visibility,
) -> EffectiveRole {
    if principal.is_admin() {
        return EffectiveRole::Owner;
    }

    match (membership, visibility) {
        (Some(role), _) => role.into(),
        (None, Visibility::Public) => EffectiveRole::PublicViewer,
        (None, Visibility::Private) => EffectiveRole::NoAccess,
    }
}

/// Checks a computed role against an action
pub fn check(role: EffectiveRole, action: ProjectAction) -> Result<(), AuthzError> {
    if role.permits(action) {
        Ok(())
    } else {
        Err(AuthzError::Denied { role, action })
    }
}

/// A permitted access: the loaded project and the role it was granted under
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub project: Project,
    pub role: EffectiveRole,
}

/// Resolves the caller's effective role on a project
///
/// # Errors
///
/// `ProjectNotFound` if the project does not exist
pub async fn resolve(
    conn: &mut PgConnection,
    principal: &Principal,
    project_id: Uuid,
) -> Result<AccessGrant, AuthzError> {
    let project = Project::find_by_id(&mut *conn, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound(project_id))?;

    let membership = Membership::get_role(&mut *conn, project_id, principal.user_id).await?;
    let role = effective_role(principal, membership, project.visibility);

    Ok(AccessGrant { project, role })
}

/// Loads the project, computes the effective role and checks `action`
///
/// # Errors
///
/// - `ProjectNotFound` if the project does not exist
/// - `Denied` if the role does not permit the action
pub async fn authorize(
    conn: &mut PgConnection,
    principal: &Principal,
    project_id: Uuid,
    action: ProjectAction,
) -> Result<AccessGrant, AuthzError> {
    let grant = resolve(conn, principal, project_id).await?;

    debug!(
        user_id = %principal.user_id,
        project_id = %project_id,
        role = %grant.role,
        action = %action,
        "Evaluated project access"
    );

    if let Err(e) = check(grant.role, action) {
        warn!(
            user_id = %principal.user_id,
            project_id = %project_id,
            role = %grant.role,
            action = %action,
            "Project access denied"
        );
        return Err(e);
    }

    Ok(grant)
}

/// Credential entry point: bearer header to an effective role
///
/// # Errors
///
/// - `Unauthenticated` if the header is missing or the token is invalid
/// - `NotFound` if the project does not exist
/// - `Forbidden` if the role does not permit the action
pub async fn evaluate_access(
    pool: &PgPool,
    bearer: Option<&str>,
    secret: &str,
    project_id: Uuid,
    action: ProjectAction,
) -> Result<EffectiveRole, CoreError> {
    let principal = authenticate_bearer(bearer, secret)?;
    let mut conn = pool.acquire().await?;

    let grant = authorize(&mut conn, &principal, project_id, action).await?;
    Ok(grant.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::GlobalRole;

    fn student() -> Principal {
        Principal::new(Uuid::new_v4(), GlobalRole::Student)
    }

    fn admin() -> Principal {
        Principal::new(Uuid::new_v4(), GlobalRole::Admin)
    }

    const MEMBERSHIPS: [Option<MemberRole>; 4] = [
        None,
        Some(MemberRole::Owner),
        Some(MemberRole::Editor),
        Some(MemberRole::Viewer),
    ];

    const VISIBILITIES: [Visibility; 2] = [Visibility::Private, Visibility::Public];

    #[test]
    fn test_admin_bypass() {
        for membership in MEMBERSHIPS {
            for visibility in VISIBILITIES {
                assert_eq!(
                    effective_role(&admin(), membership, visibility),
                    EffectiveRole::Owner
                );
            }
        }
    }

    #[test]
    fn test_membership_takes_precedence_over_visibility() {
        for visibility in VISIBILITIES {
            assert_eq!(
                effective_role(&student(), Some(MemberRole::Viewer), visibility),
                EffectiveRole::Viewer
            );
            assert_eq!(
                effective_role(&student(), Some(MemberRole::Editor), visibility),
                EffectiveRole::Editor
            );
            assert_eq!(
                effective_role(&student(), Some(MemberRole::Owner), visibility),
                EffectiveRole::Owner
            );
        }
    }

    #[test]
    fn test_non_member_depends_on_visibility() {
        assert_eq!(
            effective_role(&student(), None, Visibility::Public),
            EffectiveRole::PublicViewer
        );
        assert_eq!(
            effective_role(&student(), None, Visibility::Private),
            EffectiveRole::NoAccess
        );
    }

    #[test]
    fn test_effective_role_is_deterministic() {
        let principal = student();
        for membership in MEMBERSHIPS {
            for visibility in VISIBILITIES {
                let first = effective_role(&principal, membership, visibility);
                let second = effective_role(&principal, membership, visibility);
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_permission_matrix() {
        use EffectiveRole::*;
        use ProjectAction::*;

        let expected: [(EffectiveRole, [bool; 5]); 5] = [
            // View, ManageContent, Comment, ManageMembers, ManageProject
            (Owner, [true, true, true, true, true]),
            (Editor, [true, true, true, false, false]),
            (Viewer, [true, false, true, false, false]),
            (PublicViewer, [true, false, true, false, false]),
            (NoAccess, [false, false, false, false, false]),
        ];

        for (role, row) in expected {
            for (action, allowed) in [View, ManageContent, Comment, ManageMembers, ManageProject]
                .into_iter()
                .zip(row)
            {
                assert_eq!(
                    role.permits(action),
                    allowed,
                    "{} / {}",
                    role,
                    action
                );
            }
        }
    }

    #[test]
    fn test_readers_never_mutate_content() {
        for role in [EffectiveRole::Viewer, EffectiveRole::PublicViewer] {
            let err = check(role, ProjectAction::ManageContent).unwrap_err();
            assert!(matches!(err, AuthzError::Denied { .. }));
        }
    }

    #[test]
    fn test_private_project_non_member_scenario() {
        let role = effective_role(&student(), None, Visibility::Private);
        for action in ProjectAction::ALL {
            assert!(check(role, action).is_err());
        }
    }

    #[test]
    fn test_public_project_non_member_scenario() {
        let role = effective_role(&student(), None, Visibility::Public);
        assert!(check(role, ProjectAction::View).is_ok());
        assert!(check(role, ProjectAction::Comment).is_ok());
        assert!(check(role, ProjectAction::ManageContent).is_err());
    }

    #[test]
    fn test_editor_scenario() {
        let role = effective_role(&student(), Some(MemberRole::Editor), Visibility::Private);
        assert!(check(role, ProjectAction::ManageContent).is_ok());
        assert!(check(role, ProjectAction::ManageMembers).is_err());
        assert!(check(role, ProjectAction::ManageProject).is_err());
    }

    #[test]
    fn test_action_parse() {
        for action in ProjectAction::ALL {
            assert_eq!(ProjectAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(ProjectAction::parse("delete_everything"), None);
    }

    #[test]
    fn test_denied_display() {
        let err = AuthzError::Denied {
            role: EffectiveRole::PublicViewer,
            action: ProjectAction::ManageContent,
        };
        assert_eq!(
            err.to_string(),
            "Role 'public_viewer' is not permitted to manage_content"
        );
    }

    #[test]
    fn test_effective_role_serializes_none() {
        let json = serde_json::to_string(&EffectiveRole::NoAccess).unwrap();
        assert_eq!(json, "\"none\"");
        let json = serde_json::to_string(&EffectiveRole::PublicViewer).unwrap();
        assert_eq!(json, "\"public_viewer\"");
    }
}
