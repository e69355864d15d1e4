use serde::Serialize;

use crate::constants::{
    DASHBOARD_PATH, LANDING_PATH, PROFILE_PATH, PROJECT_DETAIL_PATH, RECOVER_PATH, REGISTER_PATH,
    RESET_PASSWORD_PATH, USERS_PATH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteAccess {
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Path pattern; `:name` segments match any single non-empty segment
    pub pattern: String,
    pub access: RouteAccess,
}

impl Route {
    pub fn matches(&self, path: &str) -> bool {
        let pattern = segments(&self.pattern);
        let path = segments(path);
        pattern.len() == path.len()
            && pattern
                .iter()
                .zip(&path)
                .all(|(p, s)| (p.starts_with(':') && !s.is_empty()) || p == s)
    }
}

/// Declarative route table. Every navigation goes through here.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    login_path: String,
}

impl Router {
    pub fn new(login_path: impl Into<String>) -> Self {
        let login_path = login_path.into();
        Self {
            routes: vec![Route {
                pattern: login_path.clone(),
                access: RouteAccess::Public,
            }],
            login_path,
        }
    }

    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, access: RouteAccess) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            access,
        });
        self
    }

    /// The Indhive views.
    pub fn indhive(login_path: &str) -> Self {
        Self::new(login_path)
            .route(LANDING_PATH, RouteAccess::Public)
            .route(REGISTER_PATH, RouteAccess::Public)
            .route(RECOVER_PATH, RouteAccess::Public)
            .route(RESET_PASSWORD_PATH, RouteAccess::Public)
            .route(DASHBOARD_PATH, RouteAccess::Protected)
            .route(PROJECT_DETAIL_PATH, RouteAccess::Protected)
            .route(USERS_PATH, RouteAccess::Protected)
            .route(PROFILE_PATH, RouteAccess::Protected)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Unknown paths are treated as protected.
    pub fn access_for(&self, path: &str) -> RouteAccess {
        self.resolve(path)
            .map_or(RouteAccess::Protected, |route| route.access)
    }
}

// Query string and trailing slash do not take part in matching
fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}
