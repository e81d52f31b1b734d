//! Gatekeeper for every RPC call.
//!
//! Resolves the provider, validates the token and checks the method against
//! the principal's effective permissions before any provider code runs.

use crate::models::Claims;
use crate::rpc::{CallContext, ProviderRegistry, RpcError, RpcProvider, RpcRequest};
use crate::services::{PermissionService, TokenService};
use crate::AppState;
use axum::{
    async_trait,
    body::{self, Body},
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct Authoriser {
    tokens: TokenService,
    permissions: PermissionService,
    providers: Arc<ProviderRegistry>,
}

impl Authoriser {
    pub fn new(
        tokens: TokenService,
        permissions: PermissionService,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            tokens,
            permissions,
            providers,
        }
    }

    /// Returns the provider, the bare method name and the call context, or
    /// the reason the call may not proceed.
    pub async fn authorise<'a>(
        &self,
        full_method: &'a str,
        authorization: Option<&str>,
    ) -> Result<(Arc<dyn RpcProvider>, &'a str, CallContext), RpcError> {
        let (provider, method) = self.providers.resolve(full_method)?;

        if provider.is_public(method) {
            return Ok((provider, method, CallContext::public()));
        }

        let token = authorization
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            tracing::info!(method = %full_method, reason = "missing token", "Call rejected");
            return Err(RpcError::Forbidden);
        };

        let claims = self.tokens.validate(token).map_err(|e| {
            tracing::warn!(method = %full_method, reason = %e, "Token rejected");
            RpcError::InvalidToken
        })?;

        self.check_permission(&claims, full_method).await?;

        tracing::debug!(
            method = %full_method,
            claims_kind = %claims.kind(),
            party_id = %claims.tenant_location().party_id,
            "Call authorised"
        );
        Ok((provider, method, CallContext::authenticated(claims)))
    }

    async fn check_permission(&self, claims: &Claims, full_method: &str) -> Result<(), RpcError> {
        if self.permissions.is_allowed(claims, full_method).await {
            return Ok(());
        }
        tracing::info!(
            method = %full_method,
            claims_kind = %claims.kind(),
            reason = "permission not held",
            "Call rejected"
        );
        Err(RpcError::Forbidden)
    }
}

/// An RPC call that has passed authorisation, ready for dispatch.
#[derive(Clone)]
pub struct AuthorisedCall {
    pub id: Value,
    pub method: String,
    pub provider: Arc<dyn RpcProvider>,
    pub context: CallContext,
    pub params: Value,
}

/// Middleware that parses the JSON-RPC envelope and authorises the call.
pub async fn authorise_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let bytes = body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read body: {}", e)))?;
    let request: RpcRequest = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid JSON-RPC request: {}", e)))?;

    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let (provider, method, context) = state
        .authoriser
        .authorise(&request.method, authorization)
        .await?;
    let method = method.to_string();

    parts.extensions.insert(AuthorisedCall {
        id: request.id,
        method,
        provider,
        context,
        params: request.params,
    });

    Ok(next.run(Request::from_parts(parts, Body::empty())).await)
}

/// Extractor for the call placed in the request by [`authorise_middleware`].
pub struct Authorised(pub AuthorisedCall);

#[async_trait]
impl<S> FromRequestParts<S> for Authorised
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let call = parts.extensions.get::<AuthorisedCall>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Authorised call missing from request extensions"
            ))
        })?;

        Ok(Authorised(call.clone()))
    }
}
