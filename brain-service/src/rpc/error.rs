use crate::services::store::StoreError;
use crate::services::token::TokenError;
use serde::Serialize;
use service_core::error::AppError;
use thiserror::Error;

pub const INVALID_PARAMS: i64 = -32602;
pub const SERVICE_ERROR: i64 = -32000;

/// Message returned for every authorisation failure, whatever the cause.
pub const UNAUTHORISED: &str = "Unauthorised";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("{}", UNAUTHORISED)]
    Forbidden,

    #[error("{}", UNAUTHORISED)]
    InvalidToken,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Service(String),
}

impl RpcError {
    /// Failures that abort dispatch with an HTTP status instead of a
    /// JSON-RPC error object.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::ProviderNotFound(_)
                | RpcError::MethodNotFound(_)
                | RpcError::Forbidden
                | RpcError::InvalidToken
        )
    }

    pub fn to_body(&self) -> RpcErrorBody {
        let code = match self {
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            _ => SERVICE_ERROR,
        };
        RpcErrorBody {
            code,
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl From<RpcError> for AppError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::ProviderNotFound(_) | RpcError::MethodNotFound(_) => {
                AppError::NotFound(anyhow::anyhow!(err.to_string()))
            }
            RpcError::Forbidden | RpcError::InvalidToken => {
                AppError::Forbidden(anyhow::anyhow!(UNAUTHORISED))
            }
            RpcError::InvalidParams(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            RpcError::Service(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => RpcError::Service(format!("{} not found", entity)),
            other => {
                tracing::error!(error = %other, "Store failure during RPC call");
                RpcError::Service("internal error".to_string())
            }
        }
    }
}

impl From<TokenError> for RpcError {
    fn from(err: TokenError) -> Self {
        tracing::error!(error = %err, "Token issuance failed");
        RpcError::Service("internal error".to_string())
    }
}

impl From<validator::ValidationErrors> for RpcError {
    fn from(err: validator::ValidationErrors) -> Self {
        RpcError::InvalidParams(err.to_string())
    }
}

impl From<crate::models::IdentifierError> for RpcError {
    fn from(err: crate::models::IdentifierError) -> Self {
        RpcError::InvalidParams(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn authorisation_failures_share_one_response() {
        for err in [RpcError::Forbidden, RpcError::InvalidToken] {
            assert_eq!(err.to_string(), "Unauthorised");
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn resolution_failures_are_not_found() {
        let response =
            AppError::from(RpcError::ProviderNotFound("Nope".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_internals_are_not_leaked() {
        let err = RpcError::from(StoreError::Database(anyhow::anyhow!("10.0.0.7 refused")));
        assert!(!err.to_string().contains("10.0.0.7"));
        assert_eq!(err.to_body().code, SERVICE_ERROR);
    }
}
