//! Application state
//!
//! Holds the match context, token validation, configuration and the handles
//! readiness probes check.

use std::sync::Arc;

use vibe_cache::{RedisEventSubscriber, RedisPool};
use vibe_common::{AppConfig, JwtService};
use vibe_db::PgPool;
use vibe_service::MatchContext;

/// Infrastructure handles that exist only for the selected backends
#[derive(Clone, Default)]
pub struct Backends {
    pub database: Option<PgPool>,
    pub redis: Option<RedisPool>,
    pub subscriber: Option<Arc<RedisEventSubscriber>>,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    match_context: Arc<MatchContext>,
    jwt_service: Arc<JwtService>,
    config: Arc<AppConfig>,
    backends: Backends,
}

impl AppState {
    pub fn new(match_context: MatchContext, config: AppConfig, backends: Backends) -> Self {
        let jwt_service = JwtService::new(
            &config.jwt.secret,
            config.jwt.audience.clone(),
            config.jwt.access_token_expiry,
        );

        Self {
            match_context: Arc::new(match_context),
            jwt_service: Arc::new(jwt_service),
            config: Arc::new(config),
            backends,
        }
    }

    pub fn match_context(&self) -> &MatchContext {
        &self.match_context
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("match_context", &self.match_context)
            .field("storage", &self.config.backends.storage)
            .field("events", &self.config.backends.events)
            .finish()
    }
}
