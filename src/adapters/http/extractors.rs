use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{adapters::http::app_state::AppState, app_error::AppError, application::jwt};

/// The authenticated actor, taken from a `Bearer` token or the
/// `access_token` session cookie.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Uuid);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get("access_token")
                .map(|c| c.value().to_string())
                .ok_or(AppError::InvalidCredentials)?,
        };

        let actor_id = jwt::actor_id_from_token(&token, &app_state.config.jwt_secret)?;
        Ok(CurrentActor(actor_id))
    }
}
