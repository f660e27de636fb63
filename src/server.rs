//! # Server Module
//!
//! HTTP server setup and route configuration for the meal planner.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::access::AccessLedger;
use crate::auth::google::GoogleOAuthClient;
use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::config::{Config, ServerConfig};
use crate::database::{MemoryStore, UserRepository};
use crate::routes::{auth, health::ping, meal_plans, meals};
use crate::services::PlannerService;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub planner: PlannerService,
    pub users: Arc<dyn UserRepository>,
    pub jwt_service: Arc<JwtService>,
    pub google: Arc<GoogleOAuthClient>,
}

impl AppState {
    /// Wire every service against a fresh in-memory store
    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let ledger = AccessLedger::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            config.sharing.policy,
            config.sharing.default_link_ttl_hours,
        );

        Ok(Self {
            planner: PlannerService::new(store.clone(), store.clone(), ledger),
            users: store,
            jwt_service: Arc::new(JwtService::new(
                &config.auth.jwt_secret,
                config.auth.token_ttl_hours,
            )),
            google: Arc::new(
                GoogleOAuthClient::new(config.google.clone())
                    .context("Failed to build Google OAuth HTTP client")?,
            ),
        })
    }
}

/// Build the application router
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    // Everything under /api requires a bearer token
    let api_routes = Router::new()
        .route("/api/me", get(auth::me))
        .route(
            "/api/meal-plans",
            get(meal_plans::list_meal_plans).post(meal_plans::create_meal_plan),
        )
        .route("/api/meal-plans/share", post(meal_plans::share_meal_plan))
        .route(
            "/api/meal-plans/generate-link",
            post(meal_plans::generate_share_link),
        )
        .route("/api/meal-plans/join", post(meal_plans::join_meal_plan))
        .route(
            "/api/meal-plans/{id}",
            get(meal_plans::get_meal_plan)
                .put(meal_plans::update_meal_plan)
                .delete(meal_plans::delete_meal_plan),
        )
        .route("/api/meals", get(meals::list_meals).post(meals::create_meal))
        .route(
            "/api/meals/{id}",
            get(meals::get_meal)
                .put(meals::update_meal)
                .delete(meals::delete_meal),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            AuthMiddleware::validate_token,
        ));

    let auth_routes = Router::new()
        .route("/auth/google/login", get(auth::google_login))
        .route(
            "/auth/google/callback",
            get(auth::google_callback).post(auth::google_credential_callback),
        );

    let mut app = Router::new()
        .route("/ping", get(ping))
        .merge(auth_routes)
        .merge(api_routes);

    if let Some(dir) = &server.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Starts the meal planner HTTP server and runs until Ctrl+C.
pub async fn start(config: Config) -> Result<()> {
    let state = AppState::in_memory(&config)?;
    let app = build_router(state, &config.server);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} - port may already be in use"))?;

    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🔐 Sign in at http://{}/auth/google/login", addr);
    tracing::info!("🛡️  Role enforcement: {:?}", config.sharing.policy);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests;
