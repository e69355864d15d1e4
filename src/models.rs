use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::token_introspection::Roles;
use crate::constants::MAX_PROJECT_DESCRIPTION_CHARS;
use crate::error::{AppError, AppResult};

/// Account as returned by `/api/auth/me` and the user admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Option<Roles>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleUser {
    pub id: i64,
    pub username: String,
}

/// Older project payloads list collaborators by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collaborator {
    User(SimpleUser),
    Name(String),
}

impl Collaborator {
    pub fn display_name(&self) -> &str {
        match self {
            Self::User(user) => &user.username,
            Self::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    /// Rich-text (HTML) body
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub title: String,
    pub description: String,
    pub collaborator_ids: BTreeSet<i64>,
}

impl ProjectRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Project title is required".to_string(),
            ));
        }
        let length = self.description.chars().count();
        if length > MAX_PROJECT_DESCRIPTION_CHARS {
            return Err(AppError::ValidationError(format!(
                "Description is {length} characters, the limit is {MAX_PROJECT_DESCRIPTION_CHARS}"
            )));
        }
        Ok(())
    }
}

/// Body for admin user creation/edit. `password` and `roles` are optional on edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,
}

impl UserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::ValidationError("Username is required".to_string()));
        }
        validate_email(&self.email)?;
        if self
            .password
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(AppError::ValidationError(
                "Password cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChangeRequest<'a> {
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
}

/// Role elevation reply; `roles` is not always echoed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatorResponse {
    pub token: String,
    #[serde(default)]
    pub roles: Option<Roles>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjects {
    #[serde(default)]
    pub owned_projects: Vec<Project>,
    #[serde(default)]
    pub collaborated_projects: Vec<Project>,
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "'{email}' is not a valid email address"
        )))
    }
}
