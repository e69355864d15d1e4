use serde::Serialize;

use crate::auth::permissions::{self, CapabilitySet};
use crate::models::{Project, User};

/// Actions a view may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewAction {
    CreateUser,
    ListUsers,
    EditUser,
    DeleteUser,
    CreateProject,
    EditProject,
    DeleteProject,
    BecomeCreator,
    EditProfile,
}

impl ViewAction {
    /// Actions that do not depend on a particular project.
    pub const GLOBAL: [Self; 7] = [
        Self::CreateUser,
        Self::ListUsers,
        Self::EditUser,
        Self::DeleteUser,
        Self::CreateProject,
        Self::BecomeCreator,
        Self::EditProfile,
    ];
}

/// Who is looking at a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
    pub username: String,
}

/// Capabilities of the current user.
pub fn capabilities_for(current_user: &User) -> CapabilitySet {
    permissions::derive_roles(current_user.roles.as_ref())
}

/// Decides which actions a rendered view exposes to the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewGate {
    capabilities: CapabilitySet,
    viewer: Option<Viewer>,
}

impl ViewGate {
    pub const fn new(capabilities: CapabilitySet, viewer: Option<Viewer>) -> Self {
        Self {
            capabilities,
            viewer,
        }
    }

    pub fn for_user(current_user: &User) -> Self {
        Self::new(
            capabilities_for(current_user),
            Some(Viewer {
                id: current_user.id,
                username: current_user.username.clone(),
            }),
        )
    }

    pub const fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// The viewer is the project's recorded owner. Owner id wins when the
    /// listing carries one, the owner username is the fallback.
    pub fn owns(&self, project: &Project) -> bool {
        let Some(viewer) = &self.viewer else {
            return false;
        };
        match (project.owner_id, project.owner_username.as_deref()) {
            (Some(owner_id), _) => owner_id == viewer.id,
            (None, Some(owner)) => owner == viewer.username,
            (None, None) => false,
        }
    }

    pub fn can_edit_project(&self, project: &Project) -> bool {
        self.capabilities.is_admin || (self.capabilities.is_creator && self.owns(project))
    }

    pub fn can_delete_project(&self, project: &Project) -> bool {
        self.can_edit_project(project)
    }

    /// Whether `action` is exposed; project-scoped actions need the project.
    pub fn allows(&self, action: ViewAction, project: Option<&Project>) -> bool {
        let caps = self.capabilities;
        match action {
            ViewAction::CreateUser
            | ViewAction::ListUsers
            | ViewAction::EditUser
            | ViewAction::DeleteUser => caps.is_admin,
            ViewAction::CreateProject => caps.is_creator,
            ViewAction::EditProject => project.is_some_and(|p| self.can_edit_project(p)),
            ViewAction::DeleteProject => project.is_some_and(|p| self.can_delete_project(p)),
            ViewAction::BecomeCreator => caps.can_become_creator(),
            ViewAction::EditProfile => self.viewer.is_some(),
        }
    }

    /// Menu of global actions for the dashboard.
    pub fn dashboard_actions(&self) -> Vec<ViewAction> {
        ViewAction::GLOBAL
            .into_iter()
            .filter(|action| self.allows(*action, None))
            .collect()
    }

    /// Actions shown on a project's detail view.
    pub fn project_actions(&self, project: &Project) -> Vec<ViewAction> {
        [ViewAction::EditProject, ViewAction::DeleteProject]
            .into_iter()
            .filter(|action| self.allows(*action, Some(project)))
            .collect()
    }
}
