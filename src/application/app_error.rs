use thiserror::Error;

use crate::application::ports::CommandOutput;

/// Which external system produced an `ExternalFailure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalKind {
    Dns,
    CertificateClient,
    ProxyConfigTest,
    ProxyReload,
    Filesystem,
}

impl ExternalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalKind::Dns => "dns",
            ExternalKind::CertificateClient => "certificate_client",
            ExternalKind::ProxyConfigTest => "proxy_config_test",
            ExternalKind::ProxyReload => "proxy_reload",
            ExternalKind::Filesystem => "filesystem",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many domain attempts. Try again in {reset_in_secs}s.")]
    RateLimited { reset_in_secs: u64 },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Domain rejected: {0}")]
    DomainRejected(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    /// A DNS, certificate-client or proxy operation failed. `output` keeps the
    /// raw command output for operators.
    #[error("{} failed: {message}", kind.as_str())]
    ExternalFailure {
        kind: ExternalKind,
        message: String,
        output: Option<CommandOutput>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn external(kind: ExternalKind, message: impl Into<String>) -> Self {
        AppError::ExternalFailure {
            kind,
            message: message.into(),
            output: None,
        }
    }

    pub fn external_with_output(
        kind: ExternalKind,
        message: impl Into<String>,
        output: CommandOutput,
    ) -> Self {
        AppError::ExternalFailure {
            kind,
            message: message.into(),
            output: Some(output),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::DomainRejected(_) => ErrorCode::DomainRejected,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::ExternalFailure { .. } => ErrorCode::ExternalFailure,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    RateLimited,
    InvalidInput,
    Forbidden,
    DomainRejected,
    Conflict,
    BadRequest,
    NotFound,
    ExternalFailure,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::InvalidInput => "VALIDATION_ERROR",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::DomainRejected => "DOMAIN_REJECTED",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ExternalFailure => "EXTERNAL_FAILURE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
