use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::permissions::{self, CapabilitySet};
use super::storage_trait::KeyValueStore;
use super::token_introspection::{self, Claims};
use super::token_store::TokenStore;
use crate::error::{AppError, AppResult};

/// Outcome of a single session check. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "claims", rename_all = "camelCase")]
pub enum SessionStatus {
    Unauthenticated,
    Expired,
    Valid(Claims),
}

impl SessionStatus {
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Valid(claims) => Some(claims),
            Self::Unauthenticated | Self::Expired => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Expired => "expired",
            Self::Valid(_) => "valid",
        }
    }

    /// The valid claims, or the error a protected operation should fail with.
    pub fn into_claims(self) -> AppResult<Claims> {
        match self {
            Self::Valid(claims) => Ok(claims),
            Self::Expired => Err(AppError::SessionExpired(
                "Stored session has expired, sign in again".to_string(),
            )),
            Self::Unauthenticated => Err(AppError::AuthError("Not signed in".to_string())),
        }
    }
}

/// Explicit session object handed to everything that needs to know who is signed in.
#[derive(Debug, Clone)]
pub struct SessionContext {
    store: TokenStore,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::new(TokenStore::new(backend), Arc::new(SystemClock))
    }

    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Check the stored credential. Corrupt or expired credentials are cleared.
    pub fn evaluate(&self) -> SessionStatus {
        let Some(token) = self.store.get() else {
            debug!("Session check: no credential stored");
            return SessionStatus::Unauthenticated;
        };

        let claims = match token_introspection::decode(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Session check: stored credential is malformed ({e}), clearing it");
                self.discard_credential();
                return SessionStatus::Unauthenticated;
            }
        };

        let now = self.clock.now_secs();
        if claims.is_expired_at(now) {
            info!(
                "Session check: credential for '{}' expired {}s ago, clearing it",
                claims.subject(),
                now.saturating_sub(claims.exp)
            );
            self.discard_credential();
            return SessionStatus::Expired;
        }

        debug!(
            "Session check: valid for '{}' ({}s left)",
            claims.subject(),
            claims.seconds_until_expiry(now)
        );
        SessionStatus::Valid(claims)
    }

    /// Capabilities of the current session; all false unless it is valid.
    pub fn capabilities(&self) -> CapabilitySet {
        permissions::derive(self.evaluate().claims())
    }

    /// Valid claims or the matching auth error.
    pub fn require_valid(&self) -> AppResult<Claims> {
        self.evaluate().into_claims()
    }

    /// Credential for an `Authorization` header, only if the session is valid.
    pub fn bearer_token(&self) -> AppResult<String> {
        self.require_valid()?;
        self.store
            .get()
            .ok_or_else(|| AppError::AuthError("Not signed in".to_string()))
    }

    /// Store a credential handed out by an authentication exchange and report
    /// what it amounts to.
    pub fn sign_in(&self, token: &str) -> AppResult<SessionStatus> {
        self.store.set(token)?;
        Ok(self.evaluate())
    }

    pub fn sign_out(&self) -> AppResult<()> {
        self.store.clear()
    }

    fn discard_credential(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear invalid credential: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;
    use crate::auth::test_support::{NOW, memory_session, mint_token, mint_token_from_json};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absent_credential_is_unauthenticated() {
        let (session, _clock) = memory_session();
        assert_eq!(session.evaluate(), SessionStatus::Unauthenticated);
        assert!(session.capabilities().is_empty());
    }

    #[test]
    fn test_malformed_credential_is_cleared() {
        let (session, _clock) = memory_session();
        for bad in ["header.signature", "a.b.c", "onlyone", "x.e30.y"] {
            session.store().set(bad).unwrap();
            assert_eq!(session.evaluate(), SessionStatus::Unauthenticated, "{bad}");
            assert_eq!(session.store().get(), None, "{bad}");
        }
    }

    #[test]
    fn test_expired_credential_is_cleared() {
        let (session, _clock) = memory_session();
        session
            .store()
            .set(&mint_token("ana", NOW - 10, Some("ROLE_USER")))
            .unwrap();
        assert_eq!(session.evaluate(), SessionStatus::Expired);
        assert_eq!(session.store().get(), None);
    }

    #[test]
    fn test_credential_without_subject_is_valid() {
        let (session, _clock) = memory_session();
        let token = mint_token_from_json(&format!(
            r#"{{"exp":{},"roles":"ROLE_USER"}}"#,
            NOW + 3600
        ));
        session.store().set(&token).unwrap();

        let status = session.evaluate();
        assert!(status.is_valid());
        assert!(status.claims().unwrap().sub.is_none());
        assert!(session.capabilities().is_authenticated_user);
        assert_eq!(session.store().get().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_fractional_expiry_is_valid() {
        let (session, _clock) = memory_session();
        let token = mint_token_from_json(&format!(r#"{{"sub":"a","exp":{}.5}}"#, NOW + 3600));
        session.store().set(&token).unwrap();

        assert!(session.evaluate().is_valid());
        assert_eq!(session.store().get().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_extreme_expiry_is_expired_with_logging_on() {
        log::set_max_level(log::LevelFilter::Trace);
        let (session, _clock) = memory_session();
        session
            .store()
            .set(&mint_token_from_json(r#"{"sub":"a","exp":-9223372036854775808}"#))
            .unwrap();

        assert_eq!(session.evaluate(), SessionStatus::Expired);
        assert_eq!(session.store().get(), None);
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let (session, _clock) = memory_session();
        session
            .store()
            .set(&mint_token("ana", NOW, Some("ROLE_USER")))
            .unwrap();
        assert_eq!(session.evaluate(), SessionStatus::Expired);
    }

    #[test]
    fn test_valid_credential_leaves_storage_untouched() {
        let (session, _clock) = memory_session();
        let token = mint_token("ana", NOW + 3600, Some("ROLE_USER,ROLE_ADMIN"));
        session.store().set(&token).unwrap();

        let status = session.evaluate();
        let claims = status.claims().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("ana"));
        assert_eq!(claims.exp, NOW + 3600);
        assert_eq!(session.store().get().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let (session, _clock) = memory_session();
        session
            .store()
            .set(&mint_token("ana", NOW + 60, Some("ROLE_USER")))
            .unwrap();
        assert_eq!(session.evaluate(), session.evaluate());

        session.sign_out().unwrap();
        assert_eq!(session.evaluate(), session.evaluate());
    }

    #[test]
    fn test_session_expires_as_clock_moves() {
        let (session, clock) = memory_session();
        session
            .sign_in(&mint_token("ana", NOW + 60, Some("ROLE_USER")))
            .unwrap();
        assert!(session.evaluate().is_valid());

        clock.advance(61);
        assert_eq!(session.evaluate(), SessionStatus::Expired);
        assert_eq!(session.evaluate(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn test_bearer_token_requires_valid_session() {
        let (session, _clock) = memory_session();
        assert!(matches!(session.bearer_token(), Err(AppError::AuthError(_))));

        session
            .store()
            .set(&mint_token("ana", NOW - 1, None))
            .unwrap();
        assert!(matches!(
            session.bearer_token(),
            Err(AppError::SessionExpired(_))
        ));

        let token = mint_token("ana", NOW + 1, None);
        session.sign_in(&token).unwrap();
        assert_eq!(session.bearer_token().unwrap(), token);
    }

    #[test]
    fn test_sign_in_reports_status() {
        let session = SessionContext::new(
            TokenStore::new(Arc::new(
                crate::auth::token_persistence::MemoryStorage::default(),
            )),
            Arc::new(FixedClock::at(NOW)),
        );
        let status = session
            .sign_in(&mint_token("ana", NOW + 5, Some("ROLE_CREATOR")))
            .unwrap();
        assert!(status.is_valid());
        assert!(session.capabilities().is_creator);
    }
}
