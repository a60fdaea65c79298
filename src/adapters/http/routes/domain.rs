use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::detached;
use crate::{
    adapters::http::{app_state::AppState, extractors::CurrentActor},
    app_error::AppResult,
    domain::entities::tenant_domain::TenantDomain,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/domain",
            post(claim_domain).get(get_domain).delete(remove_domain),
        )
        .route("/domain/verify", post(verify_domain))
}

#[derive(Deserialize)]
struct ClaimDomainPayload {
    domain: String,
}

#[derive(Serialize)]
struct RemovedResponse {
    message: &'static str,
    record: TenantDomain,
}

async fn claim_domain(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
    Json(payload): Json<ClaimDomainPayload>,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let config = detached(async move {
        use_cases
            .claim_domain(tenant_id, actor_id, &payload.domain)
            .await
    })
    .await?;

    Ok((StatusCode::CREATED, Json(config)))
}

async fn get_domain(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let config = app_state
        .domain_use_cases
        .get_domain_config(tenant_id, actor_id)
        .await?;
    Ok(Json(config))
}

async fn remove_domain(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let record =
        detached(async move { use_cases.remove_domain(tenant_id, actor_id).await }).await?;

    Ok(Json(RemovedResponse {
        message: "Custom domain removed",
        record,
    }))
}

async fn verify_domain(
    State(app_state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    CurrentActor(actor_id): CurrentActor,
) -> AppResult<impl IntoResponse> {
    let use_cases = app_state.domain_use_cases.clone();
    let outcome =
        detached(async move { use_cases.verify_domain(tenant_id, actor_id).await }).await?;
    Ok(Json(outcome))
}
