use log::{debug, error, info, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error_handling::{ensure_success, map_status_error};
use crate::auth::header_utils::apply_auth_headers;
use crate::auth::permissions::{self, CapabilitySet};
use crate::auth::session::{SessionContext, SessionStatus};
use crate::auth::token_introspection::{self, Claims, Roles};
use crate::config::RuntimeConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreatorResponse, EmailRequest, LoginRequest, PasswordChangeRequest, ProfileUpdateResponse,
    Project, ProjectRequest, RegisterRequest, ResetPasswordRequest, TokenResponse, User,
    UserProjects, UserRequest, validate_email,
};

/// Result of a role elevation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Elevation {
    pub roles: Option<Roles>,
    pub capabilities: CapabilitySet,
}

/// REST client for the Indhive API.
///
/// Authenticated calls check the session locally first and fail without a
/// round-trip when it is not valid.
#[derive(Debug, Clone)]
pub struct IndhiveClient {
    http_client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl IndhiveClient {
    pub fn new(config: &RuntimeConfig, session: Arc<SessionContext>) -> AppResult<Self> {
        config.validate()?;
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.api_base().to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn public(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http_client.request(method, self.url(endpoint))
    }

    fn authorized(&self, method: Method, endpoint: &str) -> AppResult<RequestBuilder> {
        let token = self.session.bearer_token()?;
        Ok(apply_auth_headers(self.public(method, endpoint), &token))
    }

    async fn send(builder: RequestBuilder, context: &str) -> AppResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .inspect_err(|e| error!("Request for {context} failed: {e}"))?;
        ensure_success(response, context).await
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, context: &str) -> AppResult<T> {
        Self::send(builder, context).await?.json::<T>().await.map_err(|e| {
            error!("Failed to parse {context} response: {e}");
            AppError::InvalidResponse(format!("Failed to parse {context} response: {e}"))
        })
    }

    async fn send_unit(builder: RequestBuilder, context: &str) -> AppResult<()> {
        Self::send(builder, context).await.map(|_| ())
    }

    /// Store a credential from the server and insist that it is usable.
    /// A credential that does not decode is never stored.
    fn adopt_token(&self, token: &str) -> AppResult<Claims> {
        token_introspection::decode(token)?;
        match self.session.sign_in(token)? {
            SessionStatus::Valid(claims) => Ok(claims),
            other => Err(AppError::InvalidResponse(format!(
                "Server issued a credential that is {}",
                other.label()
            ))),
        }
    }

    // Auth

    pub async fn login(&self, email: &str, password: &str) -> AppResult<Claims> {
        validate_email(email)?;
        info!("Signing in");
        let builder = self
            .public(Method::POST, "/api/auth/login")
            .json(&LoginRequest { email, password });
        let response: TokenResponse = Self::send_json(builder, "login").await?;
        let claims = self.adopt_token(&response.token)?;
        info!("Signed in as '{}'", claims.subject());
        Ok(claims)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        UserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: Some(password.to_string()),
            roles: None,
        }
        .validate()?;
        let builder = self
            .public(Method::POST, "/api/auth/register")
            .json(&RegisterRequest {
                username,
                email,
                password,
            });
        Self::send_json(builder, "registration").await
    }

    /// "Who am I" for the current session.
    pub async fn me(&self) -> AppResult<User> {
        let builder = self.authorized(Method::GET, "/api/auth/me")?;
        Self::send_json(builder, "user info fetch").await
    }

    /// Revoke the credential server-side when possible; always clear it locally.
    pub async fn logout(&self) -> AppResult<()> {
        if let Some(token) = self.session.store().get() {
            let builder = apply_auth_headers(self.public(Method::POST, "/api/auth/logout"), &token);
            if let Err(e) = Self::send_unit(builder, "logout").await {
                warn!("Server-side logout failed, clearing local credential anyway: {e}");
            }
        } else {
            debug!("Logout requested with no stored credential");
        }
        self.session.sign_out()
    }

    pub async fn refresh(&self) -> AppResult<Claims> {
        let builder = self.authorized(Method::GET, "/api/auth/refresh")?;
        let response: TokenResponse = match Self::send_json(builder, "token refresh").await {
            Ok(response) => response,
            Err(AppError::AuthError(msg)) => {
                warn!("Refresh endpoint returned 401, clearing token");
                self.session.sign_out()?;
                return Err(AppError::AuthError(msg));
            }
            Err(e) => return Err(e),
        };
        let claims = self.adopt_token(&response.token)?;
        info!("Token refreshed successfully");
        Ok(claims)
    }

    pub async fn recover_password(&self, email: &str) -> AppResult<()> {
        validate_email(email)?;
        let builder = self
            .public(Method::POST, "/api/auth/recover")
            .json(&EmailRequest { email });
        Self::send_unit(builder, "password recovery").await
    }

    pub async fn reset_password(&self, reset_token: &str, password: &str) -> AppResult<()> {
        if password.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Password cannot be blank".to_string(),
            ));
        }
        let builder = self
            .public(Method::POST, "/api/auth/reset-password")
            .json(&ResetPasswordRequest {
                token: reset_token,
                password,
            });
        Self::send_unit(builder, "password reset").await
    }

    // Users

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let builder = self.authorized(Method::GET, "/api/users")?;
        Self::send_json(builder, "user listing").await
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        let builder = self.authorized(Method::GET, &format!("/api/users/{id}"))?;
        Self::send_json(builder, "user fetch").await
    }

    pub async fn create_user(&self, request: &UserRequest) -> AppResult<User> {
        request.validate()?;
        let builder = self.authorized(Method::POST, "/api/users")?.json(request);
        Self::send_json(builder, "user creation").await
    }

    pub async fn update_user(&self, id: i64, request: &UserRequest) -> AppResult<User> {
        request.validate()?;
        let builder = self
            .authorized(Method::PUT, &format!("/api/users/{id}"))?
            .json(request);
        Self::send_json(builder, "user update").await
    }

    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        let builder = self.authorized(Method::DELETE, &format!("/api/users/{id}"))?;
        Self::send_unit(builder, "user deletion").await
    }

    pub async fn user_projects(&self, id: i64) -> AppResult<UserProjects> {
        let builder = self.authorized(Method::GET, &format!("/api/users/{id}/projects"))?;
        Self::send_json(builder, "user projects fetch").await
    }

    /// A 401 here means the credential is no longer accepted; it is cleared.
    pub async fn change_password(&self, password: &str) -> AppResult<()> {
        if password.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Password cannot be blank".to_string(),
            ));
        }
        let builder = self
            .authorized(Method::PUT, "/api/users/me/password")?
            .json(&PasswordChangeRequest { password });
        let response = builder.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Password change rejected with 401, clearing credential");
            self.session.sign_out()?;
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(StatusCode::UNAUTHORIZED, &body, "password change"));
        }
        ensure_success(response, "password change").await?;
        info!("Password changed");
        Ok(())
    }

    /// Update own username/email. The server answers with a fresh credential.
    pub async fn update_profile(&self, username: &str, email: &str) -> AppResult<Claims> {
        let request = UserRequest {
            username: username.to_string(),
            email: email.to_string(),
            ..UserRequest::default()
        };
        request.validate()?;
        let builder = self.authorized(Method::PUT, "/api/users/me")?.json(&request);
        let response: ProfileUpdateResponse = Self::send_json(builder, "profile update").await?;
        if let Some(message) = &response.message {
            debug!("Profile update: {message}");
        }
        self.adopt_token(&response.token)
    }

    /// Ask for the creator role. The server's roles value is authoritative; when
    /// it is not echoed, the roles inside the new credential are used.
    pub async fn become_creator(&self) -> AppResult<Elevation> {
        let builder = self.authorized(Method::PUT, "/api/users/me/creator")?;
        let response: CreatorResponse = Self::send_json(builder, "role elevation").await?;
        let claims = self.adopt_token(&response.token)?;
        let roles = response.roles.or(claims.roles);
        let capabilities = permissions::derive_roles(roles.as_ref());
        info!(
            "Role elevation complete: {}",
            permissions::display_roles(roles.as_ref())
        );
        Ok(Elevation {
            roles,
            capabilities,
        })
    }

    // Projects

    pub async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let builder = self.authorized(Method::GET, "/api/projects")?;
        Self::send_json(builder, "project listing").await
    }

    pub async fn get_project(&self, id: i64) -> AppResult<Project> {
        let builder = self.authorized(Method::GET, &format!("/api/projects/{id}"))?;
        Self::send_json(builder, "project fetch").await
    }

    pub async fn create_project(&self, request: &ProjectRequest) -> AppResult<Project> {
        request.validate()?;
        let builder = self.authorized(Method::POST, "/api/projects")?.json(request);
        Self::send_json(builder, "project creation").await
    }

    pub async fn update_project(&self, id: i64, request: &ProjectRequest) -> AppResult<Project> {
        request.validate()?;
        let builder = self
            .authorized(Method::PUT, &format!("/api/projects/{id}"))?
            .json(request);
        Self::send_json(builder, "project update").await
    }

    pub async fn delete_project(&self, id: i64) -> AppResult<()> {
        let builder = self.authorized(Method::DELETE, &format!("/api/projects/{id}"))?;
        Self::send_unit(builder, "project deletion").await
    }
}
