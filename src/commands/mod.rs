pub mod auth_commands;
pub mod project_commands;
pub mod user_commands;

use log::debug;

use crate::AppState;
use crate::auth::{Claims, SessionStatus};
use crate::error::{AppError, AppResult};
use crate::models::{Project, User};
use crate::routing::GuardDecision;
use crate::views::{ViewAction, ViewGate};

/// Navigate to `path` through the route guard. A redirect becomes an error
/// naming where the user was sent.
pub(crate) fn enter_view(state: &AppState, path: &str) -> AppResult<Claims> {
    let check = state.guard().check(path);
    match (check.decision, check.status) {
        (GuardDecision::Allow, Some(status)) => status.into_claims(),
        (GuardDecision::Allow, None) => state.session.require_valid(),
        (GuardDecision::Redirect(to), Some(SessionStatus::Expired)) => Err(
            AppError::SessionExpired(format!("Session expired, redirected to {to}")),
        ),
        (GuardDecision::Redirect(to), _) => Err(AppError::AuthError(format!(
            "Sign in required, redirected to {to}"
        ))),
    }
}

/// Gate for the signed-in user, built from a fresh "who am I".
pub(crate) async fn current_gate(state: &AppState) -> AppResult<(ViewGate, User)> {
    let me = state.client.me().await?;
    debug!("View gate for user {}", me.id);
    Ok((ViewGate::for_user(&me), me))
}

pub(crate) fn require(
    gate: &ViewGate,
    action: ViewAction,
    project: Option<&Project>,
) -> AppResult<()> {
    if gate.allows(action, project) {
        Ok(())
    } else {
        Err(AppError::AccessDenied(format!(
            "Your account is not allowed to {}",
            describe(action)
        )))
    }
}

const fn describe(action: ViewAction) -> &'static str {
    match action {
        ViewAction::CreateUser => "create users",
        ViewAction::ListUsers => "list users",
        ViewAction::EditUser => "edit users",
        ViewAction::DeleteUser => "delete users",
        ViewAction::CreateProject => "create projects",
        ViewAction::EditProject => "edit this project",
        ViewAction::DeleteProject => "delete this project",
        ViewAction::BecomeCreator => "request the creator role",
        ViewAction::EditProfile => "edit a profile",
    }
}

#[cfg(test)]
pub(crate) mod test_state {
    use std::sync::Arc;

    use crate::AppState;
    use crate::auth::FixedClock;
    use crate::auth::test_support::{NOW, mint_token};
    use crate::auth::token_persistence::MemoryStorage;
    use crate::config::RuntimeConfig;

    pub fn state_for(server: &mockito::ServerGuard) -> AppState {
        let config = RuntimeConfig {
            api_url: server.url(),
            search_debounce_ms: 0,
            ..RuntimeConfig::default()
        };
        AppState::with_backend(
            config,
            Arc::new(MemoryStorage::default()),
            Arc::new(FixedClock::at(NOW)),
        )
        .unwrap()
    }

    pub fn signed_in(server: &mockito::ServerGuard, roles: &str) -> AppState {
        let state = state_for(server);
        state
            .session
            .sign_in(&mint_token("viewer@indhive.dev", NOW + 3600, Some(roles)))
            .unwrap();
        state
    }

    /// Mock `/api/auth/me` for the signed-in viewer.
    pub async fn mock_me(
        server: &mut mockito::ServerGuard,
        id: i64,
        roles: &str,
    ) -> mockito::Mock {
        server
            .mock("GET", "/api/auth/me")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "id": id,
                    "username": "viewer",
                    "email": "viewer@indhive.dev",
                    "roles": roles
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::test_state::state_for;
    use super::*;
    use crate::auth::test_support::{NOW, mint_token};

    #[tokio::test]
    async fn test_enter_view_without_session() {
        let server = mockito::Server::new_async().await;
        let state = state_for(&server);
        assert!(matches!(
            enter_view(&state, "/dashboard"),
            Err(AppError::AuthError(msg)) if msg.contains("/login")
        ));
    }

    #[tokio::test]
    async fn test_enter_view_with_expired_session() {
        let server = mockito::Server::new_async().await;
        let state = state_for(&server);
        state
            .session
            .store()
            .set(&mint_token("ana", NOW - 10, Some("ROLE_USER")))
            .unwrap();
        assert!(matches!(
            enter_view(&state, "/projects/3"),
            Err(AppError::SessionExpired(_))
        ));
        assert_eq!(state.session.store().get(), None);
    }
}
