use log::info;
use serde::Serialize;

use super::{current_gate, enter_view, require};
use crate::AppState;
use crate::constants::DASHBOARD_PATH;
use crate::error::AppResult;
use crate::models::{Project, ProjectRequest};
use crate::views::{ViewAction, filter_projects, remove_by_id};

/// A project with the actions its viewer may take on it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub project: Project,
    pub actions: Vec<ViewAction>,
}

fn detail_path(id: i64) -> String {
    format!("/projects/{id}")
}

pub async fn list_projects(state: &AppState, filter: Option<&str>) -> AppResult<Vec<Project>> {
    enter_view(state, DASHBOARD_PATH)?;
    let projects = state.client.list_projects().await?;
    Ok(match filter {
        Some(query) => filter_projects(&projects, query).into_iter().cloned().collect(),
        None => projects,
    })
}

pub async fn show_project(state: &AppState, id: i64) -> AppResult<ProjectView> {
    enter_view(state, &detail_path(id))?;
    let (gate, _) = current_gate(state).await?;
    let project = state.client.get_project(id).await?;
    Ok(ProjectView {
        actions: gate.project_actions(&project),
        project,
    })
}

pub async fn create_project(state: &AppState, request: &ProjectRequest) -> AppResult<Project> {
    enter_view(state, DASHBOARD_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::CreateProject, None)?;
    let project = state.client.create_project(request).await?;
    info!("Created project {} '{}'", project.id, project.title);
    Ok(project)
}

pub async fn edit_project(
    state: &AppState,
    id: i64,
    request: &ProjectRequest,
) -> AppResult<Project> {
    enter_view(state, &detail_path(id))?;
    let (gate, _) = current_gate(state).await?;
    let existing = state.client.get_project(id).await?;
    require(&gate, ViewAction::EditProject, Some(&existing))?;
    state.client.update_project(id, request).await
}

/// Delete a project and return the dashboard listing without it.
///
/// The listing is loaded once before the delete and pruned locally afterwards.
pub async fn delete_project(state: &AppState, id: i64) -> AppResult<Vec<Project>> {
    enter_view(state, DASHBOARD_PATH)?;
    let (gate, _) = current_gate(state).await?;
    let mut projects = state.client.list_projects().await?;

    let target = match projects.iter().find(|p| p.id == id) {
        Some(project) => project.clone(),
        None => state.client.get_project(id).await?,
    };
    require(&gate, ViewAction::DeleteProject, Some(&target))?;

    state.client.delete_project(id).await?;
    remove_by_id(&mut projects, id);
    info!("Deleted project {id}");
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state::{mock_me, signed_in};
    use crate::error::AppError;
    use serde_json::json;

    fn projects_body() -> String {
        json!([
            {"id": 1, "title": "Hive sensors", "ownerId": 5, "ownerUsername": "viewer"},
            {"id": 2, "title": "Garden", "ownerId": 9, "ownerUsername": "other"}
        ])
        .to_string()
    }

    async fn mock_listing(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/api/projects")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(projects_body())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let mut server = mockito::Server::new_async().await;
        let state = signed_in(&server, "ROLE_USER");
        mock_listing(&mut server).await;

        let projects = list_projects(&state, Some("hive")).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, 1);
    }

    #[tokio::test]
    async fn test_creator_deletes_own_project_and_list_is_pruned() {
        let mut server = mockito::Server::new_async().await;
        let state = signed_in(&server, "ROLE_USER,ROLE_CREATOR");
        mock_me(&mut server, 5, "ROLE_USER,ROLE_CREATOR").await;
        mock_listing(&mut server).await;
        let delete = server
            .mock("DELETE", "/api/projects/1")
            .with_status(204)
            .create_async()
            .await;

        let remaining = delete_project(&state, 1).await.unwrap();
        delete.assert_async().await;
        assert_eq!(remaining.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn test_creator_cannot_delete_foreign_project() {
        let mut server = mockito::Server::new_async().await;
        let state = signed_in(&server, "ROLE_USER,ROLE_CREATOR");
        mock_me(&mut server, 5, "ROLE_USER,ROLE_CREATOR").await;
        mock_listing(&mut server).await;
        let delete = server
            .mock("DELETE", "/api/projects/2")
            .expect(0)
            .create_async()
            .await;

        let err = delete_project(&state, 2).await.unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_admin_sees_edit_on_any_project() {
        let mut server = mockito::Server::new_async().await;
        let state = signed_in(&server, "ROLE_USER,ROLE_ADMIN");
        mock_me(&mut server, 5, "ROLE_USER,ROLE_ADMIN").await;
        server
            .mock("GET", "/api/projects/2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": 2, "title": "Garden", "ownerId": 9}).to_string())
            .create_async()
            .await;

        let view = show_project(&state, 2).await.unwrap();
        assert_eq!(
            view.actions,
            vec![ViewAction::EditProject, ViewAction::DeleteProject]
        );
    }

    #[tokio::test]
    async fn test_plain_user_cannot_create() {
        let mut server = mockito::Server::new_async().await;
        let state = signed_in(&server, "ROLE_USER");
        mock_me(&mut server, 5, "ROLE_USER").await;

        let request = ProjectRequest {
            title: "New".into(),
            ..ProjectRequest::default()
        };
        let err = create_project(&state, &request).await.unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }
}
