//! Timetable server implementation
//!
//! This module wires the API router, static file serving and middleware
//! into one axum server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::pipeline::ScheduleService;
use crate::storage::ScheduleStore;

use super::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Refresh and lookup service
    pub service: Arc<ScheduleService>,

    /// Store holding schedules and directories
    pub store: Arc<dyn ScheduleStore>,

    /// Wall-clock budget of one refresh
    pub refresh_timeout: Duration,

    /// Maximum hits per search list
    pub search_limit: usize,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Build state around a service, sharing its store
    pub fn new(service: ScheduleService, config: &ServerConfig) -> Self {
        Self {
            store: service.store().clone(),
            service: Arc::new(service),
            refresh_timeout: Duration::from_secs(config.refresh_timeout_secs),
            search_limit: config.search_limit,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Timetable Server
// ============================================================================

/// HTTP server exposing the timetable API
pub struct TimetableServer {
    config: ServerConfig,
    state: AppState,
}

impl TimetableServer {
    /// Create a new server from configuration and a store
    pub fn new(config: &Config, store: Arc<dyn ScheduleStore>) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let service =
            ScheduleService::new(config, store).map_err(|e| ServerError::Init(e.to_string()))?;

        Ok(Self::with_state(
            config.server.clone(),
            AppState::new(service, &config.server),
        ))
    }

    /// Create a server around prepared state
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        // Serve the browser UI for everything the API does not handle
        if let Some(dir) = self.public_dir() {
            router = router.fallback_service(ServeDir::new(dir));
        }

        // Add CORS layer if enabled
        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        // Add tracing layer if enabled
        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    fn public_dir(&self) -> Option<PathBuf> {
        let dir = self.config.public_dir.as_ref()?;
        if dir.is_dir() {
            Some(dir.clone())
        } else {
            tracing::warn!(dir = %dir.display(), "Public dir not found, static files disabled");
            None
        }
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!("Server started at http://{}", listener.local_addr().unwrap_or(addr));

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            public_dir: self.config.public_dir.clone(),
            refresh_timeout_secs: self.config.refresh_timeout_secs,
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub public_dir: Option<PathBuf>,
    pub refresh_timeout_secs: u64,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Timetable Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Public Dir: {}\n\
             Refresh Timeout: {}s\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.public_dir
                .as_ref()
                .map_or_else(|| "none".to_string(), |d| d.display().to_string()),
            self.refresh_timeout_secs,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Failed to bind to address
    #[error("Failed to bind: {0}")]
    Bind(String),

    /// Server error
    #[error("Server error: {0}")]
    Serve(String),
}
