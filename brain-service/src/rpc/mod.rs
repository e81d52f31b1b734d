//! JSON-RPC dispatch surface.
//!
//! Methods are addressed as `"<Service>.<Method>"`. Each service is an
//! [`RpcProvider`] that declares its methods, the subset callable without a
//! token, and its permission lists.

pub mod error;
pub mod providers;

pub use error::RpcError;

use crate::models::{Claims, ServicePermissions};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<error::RpcErrorBody>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, err: &RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(err.to_body()),
        }
    }
}

/// Splits `"Service.Method"`. Anything else is an unknown method.
pub fn parse_method(full: &str) -> Result<(&str, &str), RpcError> {
    match full.split_once('.') {
        Some((service, method))
            if !service.is_empty() && !method.is_empty() && !method.contains('.') =>
        {
            Ok((service, method))
        }
        _ => Err(RpcError::MethodNotFound(full.to_string())),
    }
}

/// Per-call context handed to providers. Holds the validated claims unless
/// the method is callable without a token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    claims: Option<Claims>,
}

impl CallContext {
    pub fn public() -> Self {
        Self { claims: None }
    }

    pub fn authenticated(claims: Claims) -> Self {
        Self {
            claims: Some(claims),
        }
    }

    pub fn claims(&self) -> Result<&Claims, RpcError> {
        self.claims.as_ref().ok_or(RpcError::Forbidden)
    }
}

#[async_trait]
pub trait RpcProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn methods(&self) -> &'static [&'static str];

    /// Methods that run without a token.
    fn public_methods(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_public(&self, method: &str) -> bool {
        self.public_methods().iter().any(|m| *m == method)
    }

    fn permissions(&self) -> ServicePermissions;

    async fn call(
        &self,
        ctx: &CallContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError>;
}

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn RpcProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn RpcProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    /// Resolve a full method name to its provider and bare method name.
    pub fn resolve<'a>(
        &self,
        full: &'a str,
    ) -> Result<(Arc<dyn RpcProvider>, &'a str), RpcError> {
        let (service, method) = parse_method(full)?;
        let provider = self
            .providers
            .get(service)
            .cloned()
            .ok_or_else(|| RpcError::ProviderNotFound(service.to_string()))?;
        if !provider.methods().iter().any(|m| *m == method) {
            return Err(RpcError::MethodNotFound(full.to_string()));
        }
        Ok((provider, method))
    }
}

/// Decode params given as an object or as a one-element array.
pub fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let params = match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

pub fn encode_result<T: Serialize>(result: &T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode RPC result");
        RpcError::Service("internal error".to_string())
    })
}
