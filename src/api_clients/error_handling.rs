use log::error;
use reqwest::{Response, StatusCode};

use crate::error::{AppError, AppResult};

/// Map a non-success HTTP status and its body text to an [`AppError`].
pub fn map_status_error(status: StatusCode, body: &str, context: &str) -> AppError {
    let detail = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no details")
            .to_string()
    } else {
        body.trim().to_string()
    };

    match status {
        StatusCode::UNAUTHORIZED => AppError::AuthError(format!("{context}: {detail}")),
        StatusCode::FORBIDDEN => AppError::AccessDenied(format!("{context}: {detail}")),
        StatusCode::NOT_FOUND => AppError::NotFoundError(format!("{context}: {detail}")),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::ValidationError(format!("{context}: {detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => AppError::TooManyAttempts(format!("{context}: {detail}")),
        _ => AppError::ExternalServiceError(format!("{context} ({status}): {detail}")),
    }
}

/// Pass successful responses through; turn anything else into an error.
pub async fn ensure_success(response: Response, context: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!("Server returned error during {context}. Status: {status}, Error: {body}");
    Err(map_status_error(status, &body, context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, "Error: Credenciales inválidas", "login"),
            AppError::AuthError(msg) if msg.contains("Credenciales")
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, "", "list users"),
            AppError::AccessDenied(msg) if msg.contains("Forbidden")
        ));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "slow down", "login"),
            AppError::TooManyAttempts(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_REQUEST, "Username ya está en uso", "register"),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, "", "projects"),
            AppError::ExternalServiceError(_)
        ));
    }
}
