//! Kiwi Relay - Kiwify to MailerLite webhook bridge.
//!
//! This binary receives purchase-lifecycle events from Kiwify and mirrors
//! subscriber state into MailerLite's group/tag model.
//!
//! # Architecture
//!
//! - Axum web framework with a single webhook intake route
//! - Pure event classification in `kiwi-relay-core`
//! - MailerLite REST API for subscriber, group, and tag mutations
//! - Stateless: the remote directory is the sole source of truth
//!
//! # Security
//!
//! This binary only has access to:
//! - The MailerLite API (bearer token)
//!
//! Inbound requests are authenticated by a static shared token when
//! `KIWIFY_WEBHOOK_TOKEN` is configured; there is no further signature
//! verification by design of the sender.

#![cfg_attr(not(test), forbid(unsafe_code))]

use kiwi_relay::catalog;
use kiwi_relay::config::RelayConfig;
use kiwi_relay::routes;
use kiwi_relay::state::AppState;

use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &RelayConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = RelayConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kiwi_relay=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Load the product catalog (built-in or RELAY_PRODUCT_CATALOG file)
    let products = catalog::load(config.catalog_path.as_deref())
        .expect("Failed to load product catalog");
    tracing::info!(products = products.len(), "Product catalog loaded");

    if config.dry_run {
        tracing::warn!("Dry run enabled: no remote mutations will be issued");
    }
    if config.webhook_token.is_none() {
        tracing::warn!("KIWIFY_WEBHOOK_TOKEN not set: webhook token check disabled");
    }

    // Build application state
    let state = AppState::new(config.clone(), products)
        .expect("Failed to initialize application state");

    // Build router
    let app = routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
