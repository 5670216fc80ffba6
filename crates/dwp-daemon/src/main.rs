//! dwp-daemon entry point.
//!
//! Sets up tracing, loads config and the order store, registers the
//! promotion schedule, wires middleware, and starts the HTTP server.
//! Route handlers live in `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use dwp_config::{report_unused_keys, ConfigMode, LoadedConfig, UnusedKeyPolicy};
use dwp_daemon::{routes, schedule::Registration, state};
use dwp_orders::JsonFileOrderStore;
use dwp_runtime::{PassSettings, PromotionRunner};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = load_config()?;
    let report = report_unused_keys(ConfigMode::Daemon, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "unused config keys");
    }
    let cfg = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, timezone = %cfg.window.timezone, "config loaded");

    let orders_path = std::env::var("DWP_ORDERS_FILE").context("DWP_ORDERS_FILE is not set")?;
    let store = Arc::new(JsonFileOrderStore::open(&orders_path)?);
    info!(path = %orders_path, orders = store.records().len(), "order store opened");

    let runner = Arc::new(PromotionRunner::new(store, PassSettings::from_config(&cfg)?));
    let shared = Arc::new(state::AppState::new(runner, Some(loaded.config_hash.clone())));

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    if state::schedule_promotion(&shared, &cfg.schedule) == Registration::AlreadyScheduled {
        warn!(schedule = %cfg.schedule.name, "promotion schedule was already registered");
    }

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_from_config(&cfg.daemon.cors_origins));

    let addr = match bind_addr_from_env() {
        Some(addr) => addr,
        None => cfg.bind_addr()?,
    };
    info!("dwp-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    info!("dwp-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `DWP_CONFIG` is a comma-separated list of YAML layers, base first.
fn load_config() -> anyhow::Result<LoadedConfig> {
    match std::env::var("DWP_CONFIG") {
        Ok(raw) if !raw.trim().is_empty() => {
            let paths: Vec<&str> = raw.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
            dwp_config::load_layered_yaml(&paths)
        }
        _ => dwp_config::load_defaults(),
    }
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("DWP_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}

/// CORS: allow only the origins listed in `daemon.cors_origins`.
fn cors_from_config(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
