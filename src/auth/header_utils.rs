use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;

/// Applies the bearer authorization header to a request.
pub fn apply_auth_headers(builder: RequestBuilder, token: &str) -> RequestBuilder {
    builder.header(AUTHORIZATION, format!("Bearer {token}"))
}
