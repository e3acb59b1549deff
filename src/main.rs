use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailgate::config::Config;
use tailgate::consumer;
use tailgate::error::GatewayError;
use tailgate::server;
use tailgate::shutdown::{shutdown_signal, AppContext, ExitCode, StopReason};
use tailgate::TailgateEngine;

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = Config::load().map_err(GatewayError::from);

    let log_level = config
        .as_ref()
        .map(|c| c.server.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let log_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter)
        .init();

    let context = AppContext::new();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return context.fail(ExitCode::for_error(&e)).await;
        }
    };

    info!("🚀 Tailgate v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        capacity = config.history.capacity,
        sentinel = %config.history.sentinel_key,
        backend = ?config.consumer.backend,
        "History initialized"
    );

    let engine = TailgateEngine::new(&config.history);

    // 1. Stream consumer
    let consumer = match consumer::connect(&config.consumer, engine.history.clone()).map_err(GatewayError::from) {
        Ok(handle) => Arc::new(handle),
        Err(e) => {
            error!(error = %e, "Failed to start stream consumer");
            return context.fail(ExitCode::for_error(&e)).await;
        }
    };
    let closing = consumer.clone();
    context.on_shutdown("stream consumer", move || async move {
        closing.close().await;
        Ok(())
    });

    // 2. HTTP server
    let addr = config.server.addr();
    let listener = match TcpListener::bind(&addr).await.map_err(GatewayError::from) {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Failed to bind {}", addr);
            return context.fail(ExitCode::for_error(&e)).await;
        }
    };

    let stop = CancellationToken::new();
    let server_stop = stop.clone();
    let server = tokio::spawn(async move {
        let result = server::serve(listener, engine, server_stop.clone()).await;
        // Wake main if the server ends on its own
        server_stop.cancel();
        result
    });
    let server_stop = stop.clone();
    context.on_shutdown("http server", move || async move {
        server_stop.cancel();
        match server.await {
            Ok(result) => result.map_err(GatewayError::Server),
            Err(e) => Err(GatewayError::Task(e.to_string())),
        }
    });

    let reason = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            StopReason::Signal
        }
        _ = stop.cancelled() => {
            error!("HTTP server stopped unexpectedly");
            StopReason::ServerStopped
        }
    };

    context.finish(reason).await
}
