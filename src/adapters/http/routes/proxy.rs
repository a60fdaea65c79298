use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use super::detached;
use crate::{
    adapters::http::{app_state::AppState, extractors::CurrentActor},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/proxy",
        get(get_proxy_config)
            .post(create_proxy_config)
            .put(update_proxy_config)
            .delete(remove_proxy_config),
    )
}

#[derive(Deserialize, Default)]
struct ProxyConfigPayload {
    #[serde(default)]
    upstream_port: Option<u16>,
}

async fn create_proxy_config(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
    payload: Option<Json<ProxyConfigPayload>>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let use_cases = app_state.domain_use_cases.clone();
    let outcome = detached(async move {
        use_cases
            .create_proxy_config(tenant_id, actor_id, payload.upstream_port)
            .await
    })
    .await?;
    Ok(Json(outcome))
}

async fn update_proxy_config(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
    payload: Option<Json<ProxyConfigPayload>>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let use_cases = app_state.domain_use_cases.clone();
    let outcome = detached(async move {
        use_cases
            .update_proxy_config(tenant_id, actor_id, payload.upstream_port)
            .await
    })
    .await?;
    Ok(Json(outcome))
}

async fn remove_proxy_config(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let outcome =
        detached(async move { use_cases.remove_proxy_config(tenant_id, actor_id).await }).await?;
    Ok(Json(outcome))
}

async fn get_proxy_config(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let view = app_state
        .domain_use_cases
        .get_proxy_config(tenant_id, actor_id)
        .await?;
    Ok(Json(view))
}
