//! Server setup and initialization
//!
//! Wires the selected storage and event backends into a [`MatchContext`],
//! runs the deadline sweeper next to the HTTP server and stops both on
//! shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use vibe_cache::{LocalEventBus, RedisEventPublisher, RedisEventSubscriber, RedisPool, SubscriberConfig};
use vibe_common::{AppConfig, AppError, EventBackend, StorageBackend};
use vibe_core::SnowflakeGenerator;
use vibe_db::{
    create_pool, run_migrations, MemoryMatchStore, PgLedger, PgPairingStore, PgWaitingPoolStore,
    PoolConfig,
};
use vibe_service::{DeadlineSweeper, MatchContext};

use crate::middleware::apply_middleware_with_config;
use crate::routes::{create_router, health_routes};
use crate::state::{AppState, Backends};

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;

    Ok(api.merge(health_routes()).with_state(state))
}

/// Connect the configured backends and build the shared state
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let mut backends = Backends::default();

    let mut builder = MatchContext::builder()
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
        .settings(config.matching.clone());

    builder = match config.backends.storage {
        StorageBackend::Postgres => {
            info!("Connecting to PostgreSQL...");
            let pool = create_pool(&PoolConfig::from(&config.database))
                .await
                .map_err(|e| AppError::Unavailable(format!("database: {e}")))?;
            info!("PostgreSQL connection established");

            if config.database.run_migrations {
                run_migrations(&pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                info!("Migrations applied");
            }

            backends.database = Some(pool.clone());
            builder
                .pool_store(Arc::new(PgWaitingPoolStore::new(pool.clone())))
                .pairing_store(Arc::new(PgPairingStore::new(pool.clone())))
                .ledger(Arc::new(PgLedger::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using the in-process store; pool and pairing state is lost on restart");
            let store = Arc::new(MemoryMatchStore::new());
            builder
                .pool_store(store.clone())
                .pairing_store(store.clone())
                .ledger(store)
        }
    };

    builder = match config.backends.events {
        EventBackend::Redis => {
            info!("Connecting to Redis...");
            let redis =
                RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
            let subscriber = Arc::new(RedisEventSubscriber::start(SubscriberConfig::from(
                &config.redis,
            )));

            backends.redis = Some(redis.clone());
            backends.subscriber = Some(subscriber.clone());
            builder
                .publisher(Arc::new(RedisEventPublisher::new(redis)))
                .events(subscriber)
        }
        EventBackend::Local => {
            let bus = Arc::new(LocalEventBus::default());
            builder.publisher(bus.clone()).events(bus)
        }
    };

    let match_context = builder.build().map_err(AppError::from)?;

    Ok(AppState::new(match_context, config, backends))
}

/// A bound listener with its application, ready to serve
pub struct Server {
    listener: TcpListener,
    state: AppState,
    app: Router,
}

impl Server {
    /// Connect backends and bind `config.api.address()`. Port 0 picks a free port.
    pub async fn bind(config: AppConfig) -> Result<Self, AppError> {
        let addr = config.api.address();
        let state = create_app_state(config).await?;
        let app = create_app(state.clone())?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

        Ok(Self {
            listener,
            state,
            app,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::Config(format!("No local address: {e}")))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` resolves, then stop the sweeper and the event
    /// subscriber.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        let Self {
            listener,
            state,
            app,
        } = self;

        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = DeadlineSweeper::new(state.match_context().clone()).spawn(stop_rx);

        info!("Server listening on http://{}", addr);

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")));

        let _ = stop_tx.send(true);
        if let Err(e) = sweeper.await {
            warn!(error = %e, "Deadline sweeper task failed");
        }
        if let Some(subscriber) = &state.backends().subscriber {
            if let Err(e) = subscriber.shutdown().await {
                warn!(error = %e, "Event subscriber did not shut down cleanly");
            }
        }

        info!("Server stopped");
        result
    }
}

/// Run the complete server with configuration until Ctrl+C or SIGTERM
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    Server::bind(config).await?.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
