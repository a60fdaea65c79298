use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::app_error::{AppError, ErrorCode};
use crate::application::ports::CommandOutput;

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a CommandOutput>,
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            code: code.as_str(),
            message,
            reset_in: None,
            output: None,
        }),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        match &self {
            AppError::ExternalFailure { .. } | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        match self {
            AppError::Database(_) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None),
            AppError::Internal(_) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None),
            AppError::InvalidCredentials => error_resp(StatusCode::UNAUTHORIZED, code, None),
            AppError::RateLimited { reset_in_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    code: code.as_str(),
                    message: Some(format!(
                        "Too many domain attempts. Try again in {reset_in_secs}s."
                    )),
                    reset_in: Some(reset_in_secs),
                    output: None,
                }),
            )
                .into_response(),
            AppError::InvalidInput(msg)
            | AppError::BadRequest(msg)
            | AppError::DomainRejected(msg) => {
                error_resp(StatusCode::BAD_REQUEST, code, Some(msg))
            }
            AppError::Forbidden(msg) => error_resp(StatusCode::FORBIDDEN, code, Some(msg)),
            AppError::Conflict(msg) => error_resp(StatusCode::CONFLICT, code, Some(msg)),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, None),
            AppError::ExternalFailure {
                message, output, ..
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    code: code.as_str(),
                    message: Some(message),
                    reset_in: None,
                    output: output.as_ref(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_error::ExternalKind;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::DomainRejected("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::RateLimited { reset_in_secs: 30 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AppError::external(ExternalKind::ProxyReload, "x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
