//! HTTP front end
//!
//! Routes map one-to-one onto [`KvService`] calls. The service blocks under
//! logger backpressure, so every call runs on tokio's blocking pool.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::error::{Error, Result};
use crate::service::{KvService, ServiceStats};

/// Build the router with `service` attached as shared state
pub fn router(service: Arc<KvService>) -> Router {
    Router::new()
        .route(
            "/v1/:key",
            get(handle_get).put(handle_put).delete(handle_delete),
        )
        .route("/v1/delete/:key", get(handle_delete))
        .route("/stats", get(handle_stats))
        .layer(Extension(service))
}

/// Serve on `addr` until `shutdown` resolves.
///
/// The logger is left open; callers close it once in-flight requests are done.
pub async fn serve<F>(service: Arc<KvService>, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// HTTP status reported for a failed request
pub fn status_for(err: &Error) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_already_exists() {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(err: &Error) -> (StatusCode, String) {
    (status_for(err), format!("{}\n", err.audit_message()))
}

async fn run_blocking<T, F>(service: Arc<KvService>, op: F) -> Result<T>
where
    F: FnOnce(&KvService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let worker = service.clone();
    match tokio::task::spawn_blocking(move || op(&worker)).await {
        Ok(result) => result,
        Err(e) => Err(service.record_internal(format!("request task failed: {}", e))),
    }
}

async fn handle_get(
    Extension(service): Extension<Arc<KvService>>,
    Path(key): Path<String>,
) -> (StatusCode, String) {
    match run_blocking(service, move |s| s.get(&key)).await {
        Ok(value) => (StatusCode::OK, value),
        Err(e) => error_response(&e),
    }
}

async fn handle_put(
    Extension(service): Extension<Arc<KvService>>,
    Path(key): Path<String>,
    body: Bytes,
) -> (StatusCode, String) {
    let outcome = run_blocking(service, move |s| {
        let value = std::str::from_utf8(&body)
            .map_err(|e| s.record_internal(format!("request body is not valid UTF-8: {}", e)))?;
        s.put(&key, value)?;
        Ok(key)
    })
    .await;

    match outcome {
        Ok(key) => (StatusCode::OK, format!("key added successfully {{key:{}}}\n", key)),
        Err(e) => error_response(&e),
    }
}

async fn handle_delete(
    Extension(service): Extension<Arc<KvService>>,
    Path(key): Path<String>,
) -> (StatusCode, String) {
    let outcome = run_blocking(service, move |s| {
        s.delete(&key)?;
        Ok(key)
    })
    .await;

    match outcome {
        Ok(key) => (StatusCode::OK, format!("successfully deleted key {}\n", key)),
        Err(e) => error_response(&e),
    }
}

async fn handle_stats(Extension(service): Extension<Arc<KvService>>) -> Json<ServiceStats> {
    Json(service.stats())
}
