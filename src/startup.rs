//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::application::realtime::{ConnectionRegistry, GroupOverlay};
use crate::application::services::{
    GroupService, JwtVerifier, MessageHistoryService, MessageRouter, PresenceService,
    TokenVerifier,
};
use crate::config::Settings;
use crate::infrastructure::cache::{self, RedisPresenceMirror};
use crate::infrastructure::database;
use crate::infrastructure::push::FcmPushGateway;
use crate::infrastructure::repositories::{
    PgDeviceTokenRepository, PgGroupRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

pub type AppPresence = PresenceService<PgUserRepository>;
pub type AppRouter = MessageRouter<PgMessageRepository, PgDeviceTokenRepository, FcmPushGateway>;
pub type AppGroups = GroupService<PgGroupRepository>;
pub type AppHistory = MessageHistoryService<PgMessageRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: Option<ConnectionManager>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub registry: Arc<ConnectionRegistry>,
    pub overlay: Arc<GroupOverlay>,
    pub presence: Arc<AppPresence>,
    pub router: Arc<AppRouter>,
    pub groups: Arc<AppGroups>,
    pub history: Arc<AppHistory>,
    pub device_tokens: Arc<PgDeviceTokenRepository>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the realtime core on top of already opened connections.
    pub fn new(settings: Settings, db: PgPool, redis: Option<ConnectionManager>) -> Result<Self> {
        let snowflake = Arc::new(SnowflakeGenerator::new(settings.snowflake.machine_id));
        let registry = Arc::new(ConnectionRegistry::new(settings.realtime.registration_policy));
        let overlay = Arc::new(GroupOverlay::new());

        let mut presence = PresenceService::new(
            Arc::new(PgUserRepository::new(db.clone())),
            registry.clone(),
            overlay.clone(),
        );
        if let Some(conn) = &redis {
            presence = presence.with_mirror(Arc::new(RedisPresenceMirror::new(
                conn.clone(),
                settings.redis.presence_ttl_secs,
            )));
        }

        let device_tokens = Arc::new(PgDeviceTokenRepository::new(db.clone()));
        let push = Arc::new(FcmPushGateway::new(&settings.push)?);
        let messages = Arc::new(PgMessageRepository::new(db.clone()));
        let router = MessageRouter::new(
            messages.clone(),
            device_tokens.clone(),
            push,
            registry.clone(),
            overlay.clone(),
            snowflake.clone(),
        )
        .with_max_content_length(settings.realtime.max_content_length);

        let history = MessageHistoryService::new(messages);
        let groups = GroupService::new(Arc::new(PgGroupRepository::new(db.clone())), overlay.clone());
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&settings.jwt));

        Ok(Self {
            db,
            redis,
            snowflake,
            registry,
            overlay,
            presence: Arc::new(presence),
            router: Arc::new(router),
            groups: Arc::new(groups),
            history: Arc::new(history),
            device_tokens,
            verifier,
            settings: Arc::new(settings),
        })
    }
}

/// Build the HTTP router with all middleware applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state).layer(
        ServiceBuilder::new()
            .layer(logging::create_trace_layer())
            .layer(cors),
    )
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            tracing::info!("Database migrations applied");
        }

        // Redis only backs the optional presence mirror
        let redis = if settings.redis.enabled {
            Some(cache::create_redis_client(&settings.redis).await?)
        } else {
            tracing::info!("Redis disabled; presence is process-local only");
            None
        };

        let addr = settings.server_addr();
        let state = AppState::new(settings, db, redis)?;
        spawn_mirror_refresh(&state);
        let router = build_router(state);

        // Bind to address
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Mirrored presence keys expire; re-mark online users at half the TTL.
fn spawn_mirror_refresh(state: &AppState) {
    if state.redis.is_none() {
        return;
    }
    let presence = state.presence.clone();
    let period = Duration::from_secs((state.settings.redis.presence_ttl_secs / 2).max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            presence.refresh_mirror().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
