//! `BeaconServer` — axum HTTP server assembly.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::middleware;
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use beacon_registry::Registry;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::gate::access_gate;
use crate::health::{self, HealthResponse};
use crate::routes;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from handlers and the gate.
#[derive(Clone)]
pub struct AppState {
    /// The durable registry.
    pub registry: Registry,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The Beacon control-plane server.
pub struct BeaconServer {
    config: Arc<ServerConfig>,
    registry: Registry,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl BeaconServer {
    /// Create a new server. Seeds the bootstrap credential if configured.
    pub fn new(config: ServerConfig, registry: Registry) -> Result<Self, beacon_registry::RegistryError> {
        if let Some(key) = &config.bootstrap_api_key {
            registry.seed_credential(key, "bootstrap")?;
        }
        Ok(Self {
            config: Arc::new(config),
            registry,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        })
    }

    /// Build the axum router with all routes and the access gate.
    ///
    /// CORS is permissive: peers reach the control plane from arbitrary
    /// origins (mobile data, LAN hostnames).
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/api/auth", post(routes::auth))
            .route("/api/add-friend", post(routes::add_friend))
            .route("/api/friends/{id}", get(routes::friends))
            .layer(middleware::from_fn_with_state(state.clone(), access_gate))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port 0) and the serve task.
    pub async fn listen(
        &self,
    ) -> std::io::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "server error");
            }
        });

        Ok((addr, handle))
    }

    /// Get the shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the registry handle.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// GET /health (gate-exempt).
async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let identities = state.registry.identity_count()?;
    Ok(Json(health::health_check(state.start_time, identities)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
