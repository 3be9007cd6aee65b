//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid query parameter '{name}': {reason}")]
    InvalidQueryParameter { name: &'static str, reason: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("sequence allocation for {scope} failed after {attempts} attempts")]
    AllocationExhausted { scope: String, attempts: u32 },
    #[error("internal: {0}")]
    Fatal(String),
}

impl AppError {
    pub(crate) fn invalid_param(name: &'static str, reason: impl Into<String>) -> Self {
        AppError::InvalidQueryParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Contention-class failure worth another allocation attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Db(e) => is_transient_db(e),
            _ => false,
        }
    }
}

/// serialization_failure, deadlock_detected, unique_violation, lock_not_available.
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "23505", "55P03"];

fn is_transient_db(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db
            .code()
            .map(|c| TRANSIENT_SQLSTATES.iter().any(|s| c == *s))
            .unwrap_or(false),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::InvalidQueryParameter { .. } => (StatusCode::BAD_REQUEST, "invalid_query_parameter"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::AllocationExhausted { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "allocation_failed"),
            AppError::Fatal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let details = match &self {
            AppError::InvalidQueryParameter { name, .. } => Some(serde_json::json!({ "parameter": name })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parameter_errors_are_client_errors() {
        let e = AppError::invalid_param("limit", "must be at least 1");
        assert_eq!(e.status_and_code(), (StatusCode::BAD_REQUEST, "invalid_query_parameter"));
        assert_eq!(e.to_string(), "invalid query parameter 'limit': must be at least 1");
    }

    #[test]
    fn allocation_exhaustion_is_a_server_error() {
        let e = AppError::AllocationExhausted {
            scope: "finance.bills".into(),
            attempts: 5,
        };
        assert_eq!(e.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.is_transient());
    }

    #[test]
    fn every_variant_has_a_status() {
        let cases = [
            (AppError::NotFound("bills".into()), StatusCode::NOT_FOUND, "not_found"),
            (
                AppError::Config(ConfigError::InvalidIdentifier("a b".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
            ),
            (AppError::Db(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            (AppError::Fatal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (e, status, code) in cases {
            assert_eq!(e.status_and_code(), (status, code));
        }
    }

    #[test]
    fn pool_timeout_is_transient() {
        assert!(AppError::Db(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!AppError::Db(sqlx::Error::RowNotFound).is_transient());
    }
}
