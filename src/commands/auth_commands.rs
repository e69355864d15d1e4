use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use super::{current_gate, enter_view, require};
use crate::AppState;
use crate::api_clients::Elevation;
use crate::auth::permissions::{self, CapabilitySet};
use crate::auth::token_refresh::ensure_fresh_token;
use crate::auth::SessionStatus;
use crate::constants::{DASHBOARD_PATH, PROFILE_PATH};
use crate::error::AppResult;
use crate::models::User;
use crate::views::ViewAction;

/// Local view of the stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub status: &'static str,
    pub subject: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub roles: String,
    pub capabilities: CapabilitySet,
    pub remembered_email: Option<String>,
}

impl SessionSummary {
    fn from_status(status: &SessionStatus, remembered_email: Option<String>) -> Self {
        let claims = status.claims();
        Self {
            status: status.label(),
            subject: claims.and_then(|c| c.sub.clone()),
            expires_at: claims.and_then(|c| DateTime::from_timestamp(c.exp, 0)),
            roles: permissions::display_roles(claims.and_then(|c| c.roles.as_ref())),
            capabilities: permissions::derive(claims),
            remembered_email,
        }
    }
}

/// Signed-in user plus what the dashboard offers them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    pub roles: String,
    pub capabilities: CapabilitySet,
    pub actions: Vec<ViewAction>,
}

/// Exchange credentials for a session. Only the email is ever remembered.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
    remember_email: bool,
) -> AppResult<SessionSummary> {
    state.client.login(email, password).await?;

    let store = state.session.store();
    if remember_email {
        store.remember_email(email)?;
    } else {
        store.forget_email()?;
    }

    Ok(session_status(state))
}

pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let user = state.client.register(username, email, password).await?;
    info!("Registered account {} ({})", user.username, user.id);
    Ok(user)
}

pub async fn logout(state: &AppState) -> AppResult<()> {
    state.client.logout().await
}

/// Evaluate the stored session without touching the network.
pub fn session_status(state: &AppState) -> SessionSummary {
    let status = state.session.evaluate();
    SessionSummary::from_status(&status, state.session.store().remembered_email())
}

pub async fn whoami(state: &AppState) -> AppResult<Profile> {
    enter_view(state, DASHBOARD_PATH)?;
    let (gate, user) = current_gate(state).await?;
    Ok(Profile {
        roles: permissions::display_roles(user.roles.as_ref()),
        capabilities: gate.capabilities(),
        actions: gate.dashboard_actions(),
        user,
    })
}

/// Refresh the credential; with `min_ttl_secs`, only when it expires within that window.
pub async fn refresh(state: &AppState, min_ttl_secs: Option<i64>) -> AppResult<SessionSummary> {
    enter_view(state, DASHBOARD_PATH)?;
    match min_ttl_secs {
        Some(ttl) => {
            if !ensure_fresh_token(&state.client, ttl).await? {
                info!("Credential still valid for more than {ttl}s, not refreshed");
            }
        }
        None => {
            state.client.refresh().await?;
        }
    }
    Ok(session_status(state))
}

pub async fn become_creator(state: &AppState) -> AppResult<Elevation> {
    enter_view(state, PROFILE_PATH)?;
    let (gate, _) = current_gate(state).await?;
    require(&gate, ViewAction::BecomeCreator, None)?;
    state.client.become_creator().await
}

pub async fn change_password(state: &AppState, password: &str) -> AppResult<()> {
    enter_view(state, PROFILE_PATH)?;
    state.client.change_password(password).await
}

pub async fn update_profile(
    state: &AppState,
    username: &str,
    email: &str,
) -> AppResult<SessionSummary> {
    enter_view(state, PROFILE_PATH)?;
    state.client.update_profile(username, email).await?;
    Ok(session_status(state))
}

pub async fn recover_password(state: &AppState, email: &str) -> AppResult<()> {
    state.client.recover_password(email).await
}

pub async fn reset_password(state: &AppState, reset_token: &str, password: &str) -> AppResult<()> {
    state.client.reset_password(reset_token, password).await
}
