pub mod domain;
pub mod proxy;
pub mod ssl;

use std::future::Future;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;
use crate::app_error::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    let tenant_routes = Router::new()
        .merge(domain::router())
        .merge(ssl::router())
        .merge(proxy::router());

    Router::new()
        .route("/health", get(health))
        .nest("/tenants/{tenant_id}", tenant_routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run a mutating operation on its own task. A client that disconnects
/// mid-request drops only the waiting handler; the DNS/ACME/proxy work and
/// the status writes that follow it still run to completion.
pub(crate) async fn detached<T, F>(operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(operation).await.map_err(|e| {
        tracing::error!(error = %e, "Detached domain operation panicked");
        AppError::Internal(format!("operation aborted: {e}"))
    })?
}
