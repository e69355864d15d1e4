use std::collections::BTreeSet;

use log::{debug, info};

use super::{current_gate, enter_view, require};
use crate::AppState;
use crate::constants::{DASHBOARD_PATH, USERS_PATH};
use crate::error::AppResult;
use crate::models::{User, UserProjects, UserRequest};
use crate::views::{ViewAction, filter_users, remove_by_id, suggest_collaborators};

pub async fn list_users(state: &AppState, filter: Option<&str>) -> AppResult<Vec<User>> {
    enter_view(state, USERS_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::ListUsers, None)?;

    let users = state.client.list_users().await?;
    Ok(match filter {
        Some(query) => filter_users(&users, query).into_iter().cloned().collect(),
        None => users,
    })
}

pub async fn create_user(state: &AppState, request: &UserRequest) -> AppResult<User> {
    enter_view(state, USERS_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::CreateUser, None)?;

    let user = state.client.create_user(request).await?;
    info!("Created user {} ({})", user.username, user.id);
    Ok(user)
}

pub async fn edit_user(state: &AppState, id: i64, request: &UserRequest) -> AppResult<User> {
    enter_view(state, USERS_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::EditUser, None)?;
    state.client.update_user(id, request).await
}

/// Delete a user and return the admin listing without them.
pub async fn delete_user(state: &AppState, id: i64) -> AppResult<Vec<User>> {
    enter_view(state, USERS_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::DeleteUser, None)?;

    let mut users = state.client.list_users().await?;
    state.client.delete_user(id).await?;
    remove_by_id(&mut users, id);
    info!("Deleted user {id}");
    Ok(users)
}

/// Collaborator autocomplete. Returns `None` when a newer search superseded this one.
///
/// Suggestions come from the user directory, which only admins may read.
pub async fn search_users(
    state: &AppState,
    query: &str,
    selected: &BTreeSet<i64>,
    limit: usize,
) -> AppResult<Option<Vec<User>>> {
    enter_view(state, DASHBOARD_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::ListUsers, None)?;

    let Some(query) = state.search_debouncer.settle(query.to_string()).await else {
        debug!("Search superseded by a newer query");
        return Ok(None);
    };

    let users = state.client.list_users().await?;
    Ok(Some(
        suggest_collaborators(&users, &query, selected, limit)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

pub async fn user_projects(state: &AppState, id: i64) -> AppResult<UserProjects> {
    enter_view(state, DASHBOARD_PATH)?;
    state.client.user_projects(id).await
}
