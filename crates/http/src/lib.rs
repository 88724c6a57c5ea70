//! HTTP server facade for Folio with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method, Uri},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use folio_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

/// Start the HTTP server with the given module registry.
///
/// Returns once a shutdown signal has been received and in-flight requests
/// have drained.
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_router(registry, settings).context("failed to build HTTP router")?;

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<Router> {
    let allowed_origin = HeaderValue::from_str(&settings.cors.allowed_origin).with_context(|| {
        format!(
            "invalid CORS origin '{}'",
            settings.cors.allowed_origin
        )
    })?;

    let mut router_builder = RouterBuilder::new().route("/", get(health_check));

    for module in registry.modules() {
        let base_path = module.base_path();
        tracing::info!(
            module = module.name(),
            "mounting module routes under {}",
            base_path
        );
        router_builder = router_builder.mount_module(&base_path, module.routes());
    }

    let router = router_builder
        .with_openapi(registry)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_timeout(settings.server.request_timeout_ms)
        .with_cors(allowed_origin)
        .with_tracing()
        .with_request_id()
        .build();

    Ok(router)
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::method_not_allowed(format!("{} is not supported on {}", method, uri.path()))
}

/// Resolves on Ctrl-C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
