use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use super::detached;
use crate::{
    adapters::http::{app_state::AppState, extractors::CurrentActor},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ssl", get(ssl_status))
        .route("/ssl/request", post(request_ssl))
        .route("/ssl/renew", post(renew_ssl))
        .route("/ssl/revoke", post(revoke_ssl))
}

#[derive(Deserialize, Default)]
struct RequestSslPayload {
    /// ACME account contact; the platform address is used when absent.
    #[serde(default)]
    email: Option<String>,
}

async fn request_ssl(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
    payload: Option<Json<RequestSslPayload>>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let use_cases = app_state.domain_use_cases.clone();
    let outcome = detached(async move {
        use_cases
            .request_ssl(tenant_id, actor_id, payload.email.as_deref())
            .await
    })
    .await?;
    Ok(Json(outcome))
}

async fn renew_ssl(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let outcome = detached(async move { use_cases.renew_ssl(tenant_id, actor_id).await }).await?;
    Ok(Json(outcome))
}

async fn revoke_ssl(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let outcome = detached(async move { use_cases.revoke_ssl(tenant_id, actor_id).await }).await?;
    Ok(Json(outcome))
}

async fn ssl_status(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .domain_use_cases
        .ssl_status(tenant_id, actor_id)
        .await?;
    Ok(Json(outcome))
}
