use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
use std::sync::Arc;

use super::clock::FixedClock;
use super::session::SessionContext;
use super::token_persistence::MemoryStorage;
use super::token_store::TokenStore;

pub const NOW: i64 = 1_700_000_000;

/// Unsigned token with the given payload JSON.
pub fn mint_token_from_json(payload: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512"}"#),
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode("unverified-signature"),
    )
}

/// Unsigned token shaped like the ones the Indhive server issues.
pub fn mint_token(sub: &str, exp: i64, roles: Option<&str>) -> String {
    let mut payload = json!({ "sub": sub, "exp": exp, "iat": exp - 86_400 });
    if let Some(roles) = roles {
        payload["roles"] = json!(roles);
    }
    mint_token_from_json(&payload.to_string())
}

/// Session over in-memory storage with a clock pinned at [`NOW`].
pub fn memory_session() -> (SessionContext, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::at(NOW));
    let session = SessionContext::new(
        TokenStore::new(Arc::new(MemoryStorage::default())),
        Arc::clone(&clock) as Arc<dyn super::clock::Clock>,
    );
    (session, clock)
}
