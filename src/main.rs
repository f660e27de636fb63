//! # Meal Planner Server
//!
//! HTTP API for collaborative meal planning, built with Rust, Axum, and Tokio.
//!
//! ## Features
//! - Google sign-in (redirect flow and ID-token flow) with JWT sessions
//! - CRUD over meal plans and their meals
//! - Sharing by email or through expiring share links
//! - Owner / editor / viewer roles checked on every request
//!
//! ## Architecture
//! The server is organized into modules:
//! - `server`: Router assembly and server lifecycle
//! - `config`: Environment variable configuration
//! - `auth`: JWT issuing, bearer middleware, Google OAuth client
//! - `access`: Role resolution, grants and share links
//! - `services`: Meal plan and meal operations
//! - `database`: Models, repository traits, in-memory store
//! - `routes`: HTTP handlers organized by resource
//!
//! ## Running the Server
//! ```bash
//! cp .env.example .env
//! cargo run
//! ```
//!
//! The server listens on `http://0.0.0.0:8080` by default:
//! ```bash
//! curl http://localhost:8080/ping
//! ```

mod access;
mod auth;
mod config;
mod database;
mod error;
mod routes;
mod server;
mod services;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting Meal Planner Server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    });

    let config = Config::from_env()?;
    server::start(config).await
}
