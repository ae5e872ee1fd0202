use anyhow::Result;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    handlers, metrics,
    middleware::chrome_logger_middleware,
    payload::PROTOCOL_VERSION,
    signals::shutdown_signal,
};

/// Start the demo server
///
/// This function:
/// 1. Initializes metrics (when enabled)
/// 2. Creates the Axum application with the chrome logger middleware
/// 3. Binds to the configured address
/// 4. Serves requests until SIGINT/SIGTERM
pub async fn start_server(config: Config) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let app = create_router(&config, metrics_handle);

    let addr = SocketAddr::from((config.server.host.parse::<IpAddr>()?, config.server.port));

    info!("Starting chromelogger demo on {}", addr);
    info!(
        "Protocol version {}, backtraces {}, metrics {}",
        PROTOCOL_VERSION,
        if config.logger.backtraces { "on" } else { "off" },
        if config.metrics.enabled {
            config.metrics.endpoint.as_str()
        } else {
            "off"
        }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
///
/// Only the demo routes carry the chrome logger middleware; `/health` and the
/// metrics endpoint never get a payload header.
pub fn create_router(config: &Config, metrics_handle: Option<Arc<PrometheusHandle>>) -> Router {
    let demo_routes = Router::new()
        .route("/", get(handlers::demo::index))
        .route("/group", get(handlers::demo::group))
        .route("/oversized", get(handlers::demo::oversized))
        .layer(middleware::from_fn_with_state(
            config.logger.clone(),
            chrome_logger_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(demo_routes);

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route(
                    &config.metrics.endpoint,
                    get(handlers::metrics_handler::metrics),
                )
                .with_state(handle),
        );
    }

    app.layer(TraceLayer::new_for_http())
}
