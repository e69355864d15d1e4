pub mod api_clients;
pub mod auth;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routing;
pub mod utils;
pub mod views;

use std::sync::Arc;

use crate::api_clients::IndhiveClient;
use crate::auth::token_persistence::open_storage;
use crate::auth::{Clock, KeyValueStore, SessionContext, SystemClock, TokenStore};
use crate::config::RuntimeConfig;
use crate::error::AppResult;
use crate::routing::{RouteGuard, Router};
use crate::views::Debouncer;

/// Everything the commands need, wired once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub session: Arc<SessionContext>,
    pub client: IndhiveClient,
    pub router: Router,
    pub search_debouncer: Debouncer,
}

impl AppState {
    /// State backed by the storage selected in `config`.
    pub fn new(config: RuntimeConfig) -> AppResult<Self> {
        let backend = open_storage(config.storage_mode)?;
        Self::with_backend(config, backend, Arc::new(SystemClock))
    }

    pub fn with_backend(
        config: RuntimeConfig,
        backend: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let session = Arc::new(SessionContext::new(TokenStore::new(backend), clock));
        let client = IndhiveClient::new(&config, Arc::clone(&session))?;
        let router = Router::indhive(&config.login_path);
        let search_debouncer = Debouncer::new(config.search_debounce());

        Ok(Self {
            config,
            session,
            client,
            router,
            search_debouncer,
        })
    }

    pub fn guard(&self) -> RouteGuard<'_> {
        RouteGuard::new(&self.router, &self.session)
    }
}
