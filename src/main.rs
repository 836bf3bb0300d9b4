//! Application entry point and server initialization
//!
//! Loads configuration, opens the database, wires up the core services and
//! runs the HTTP server with graceful shutdown support.

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

mod auth;
mod cache;
mod codec;
mod config;
mod error;
mod handler;
mod model;
mod password;
mod route;
mod shortener;
mod store;
mod token;

use auth::AuthGateway;
use cache::TtlCache;
use config::Config;
use handler::AppState;
use route::create_app;
use shortener::ResolutionEngine;
use store::{MappingStore, RedbStore};
use token::TokenService;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("linkcut=debug,tower_http=debug")
        .init();

    // Settings are resolved exactly once; a missing secret aborts here.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {}", err);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn MappingStore> = Arc::new(
        RedbStore::open(&config.database_url).expect("Failed to initialize database"),
    );
    let cache = Arc::new(TtlCache::new());
    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl_seconds);

    let state = AppState {
        engine: Arc::new(ResolutionEngine::new(
            store.clone(),
            cache,
            config.base_url.clone(),
        )),
        auth: Arc::new(AuthGateway::new(store.clone(), tokens)),
        store,
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind port");

    tracing::info!(port = config.port, db = %config.database_url, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Resolves when SIGINT (Ctrl+C) or, on Unix, SIGTERM arrives. Open
/// connections drain and in-flight database writes finish before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stopping server");
}
