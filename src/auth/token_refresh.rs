use log::debug;
use tokio::sync::Mutex;

use super::token_introspection;
use crate::api_clients::IndhiveClient;
use crate::error::AppResult;

/// Serializes refresh attempts so concurrent callers do not each hit the server.
static REFRESH_LOCK: Mutex<()> = Mutex::const_new(());

/// Refresh the credential if it expires within `min_ttl_secs`.
///
/// Returns whether a refresh happened. Without a stored credential this is a no-op.
pub async fn ensure_fresh_token(client: &IndhiveClient, min_ttl_secs: i64) -> AppResult<bool> {
    let _lock = REFRESH_LOCK.lock().await;

    let session = client.session();
    let Some(token) = session.store().get() else {
        return Ok(false);
    };

    if !token_introspection::is_expiring_within(&token, min_ttl_secs, session.clock()) {
        return Ok(false);
    }

    debug!("Token expiring within {min_ttl_secs} seconds, refreshing proactively");
    client.refresh().await?;
    Ok(true)
}
