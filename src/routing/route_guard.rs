use log::{debug, info};
use serde::Serialize;

use super::router::{RouteAccess, Router};
use crate::auth::session::{SessionContext, SessionStatus};

/// Lifecycle of one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardState {
    Checking,
    Allowed,
    Denied,
}

impl GuardState {
    /// `Checking` resolves from the session status; `Allowed`/`Denied` are terminal.
    pub const fn resolve(self, status: &SessionStatus) -> Self {
        match self {
            Self::Checking => {
                if status.is_valid() {
                    Self::Allowed
                } else {
                    Self::Denied
                }
            }
            terminal => terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "lowercase")]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Everything a caller may want to know about one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardCheck {
    pub path: String,
    pub state: GuardState,
    pub decision: GuardDecision,
    /// Present when the session was evaluated, i.e. for protected paths
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteGuard<'a> {
    router: &'a Router,
    session: &'a SessionContext,
}

impl<'a> RouteGuard<'a> {
    pub const fn new(router: &'a Router, session: &'a SessionContext) -> Self {
        Self { router, session }
    }

    pub fn authorize(&self, path: &str) -> GuardDecision {
        self.check(path).decision
    }

    /// Evaluate the session at most once and decide where the navigation ends up.
    pub fn check(&self, path: &str) -> GuardCheck {
        if self.router.access_for(path) == RouteAccess::Public {
            debug!("Navigation to public path {path}");
            return GuardCheck {
                path: path.to_string(),
                state: GuardState::Allowed,
                decision: GuardDecision::Allow,
                status: None,
            };
        }

        let state = GuardState::Checking;
        let status = self.session.evaluate();
        let state = state.resolve(&status);

        let decision = match state {
            GuardState::Allowed => GuardDecision::Allow,
            GuardState::Checking | GuardState::Denied => {
                info!(
                    "Navigation to {path} denied ({}), redirecting to {}",
                    status.label(),
                    self.router.login_path()
                );
                GuardDecision::Redirect(self.router.login_path().to_string())
            }
        };

        GuardCheck {
            path: path.to_string(),
            state,
            decision,
            status: Some(status),
        }
    }
}
