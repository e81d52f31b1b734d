use crate::models::{Claims, ClaimsKind, ServicePermissions};
use crate::rpc::{decode_params, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, SigfoxBackendStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const NAME: &str = "SigfoxBackendCallbackServer";

// Sigfox uplink payloads are at most 12 bytes.
const MAX_PAYLOAD_BYTES: usize = 12;

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME).claims_grant(ClaimsKind::SigfoxBackend, &["Handle"])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleRequest {
    pub device_id: String,
    pub data: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub seq_number: Option<i64>,
}

/// Acknowledges uplink callbacks from a registered Sigfox backend.
pub struct SigfoxBackendCallbackServer {
    store: Arc<dyn BrainStore>,
}

impl SigfoxBackendCallbackServer {
    pub fn new(store: Arc<dyn BrainStore>) -> Self {
        Self { store }
    }

    async fn handle(&self, claims: &Claims, request: HandleRequest) -> Result<(), RpcError> {
        let Claims::SigfoxBackend(backend) = claims else {
            return Err(RpcError::Forbidden);
        };

        // a valid signature is not enough; the backend must still be registered
        if self
            .store
            .retrieve_sigfox_backend(&backend.backend_id)
            .await?
            .is_none()
        {
            tracing::warn!(
                backend_id = %backend.backend_id,
                reason = "unknown backend",
                "Sigfox callback rejected"
            );
            return Err(RpcError::Forbidden);
        }

        if request.device_id.trim().is_empty() {
            return Err(RpcError::InvalidParams("deviceId is blank".to_string()));
        }
        let payload = hex::decode(&request.data)
            .map_err(|e| RpcError::InvalidParams(format!("data is not hex: {}", e)))?;
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(RpcError::InvalidParams(format!(
                "data exceeds {} bytes",
                MAX_PAYLOAD_BYTES
            )));
        }

        tracing::info!(
            backend_id = %backend.backend_id,
            device_id = %request.device_id,
            seq_number = ?request.seq_number,
            time = ?request.time,
            payload_bytes = payload.len(),
            "Sigfox callback received"
        );
        Ok(())
    }
}

#[async_trait]
impl RpcProvider for SigfoxBackendCallbackServer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Handle"]
    }

    fn permissions(&self) -> ServicePermissions {
        permissions()
    }

    async fn call(
        &self,
        ctx: &CallContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            "Handle" => {
                self.handle(ctx.claims()?, decode_params(params)?).await?;
                Ok(json!({}))
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PartyType, SigfoxBackend, SigfoxBackendClaims};
    use crate::services::memory::InMemoryStore;

    fn backend(backend_id: &str) -> Claims {
        Claims::SigfoxBackend(SigfoxBackendClaims {
            backend_id: backend_id.to_string(),
        })
    }

    fn request(device_id: &str, data: &str) -> HandleRequest {
        HandleRequest {
            device_id: device_id.to_string(),
            data: data.to_string(),
            time: None,
            seq_number: None,
        }
    }

    async fn server() -> SigfoxBackendCallbackServer {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_sigfox_backend(&SigfoxBackend {
                id: "backend-1".to_string(),
                name: "eu-west".to_string(),
                owner_party_type: PartyType::System,
                owner_id: "system".to_string(),
                token: String::new(),
            })
            .await
            .unwrap();
        SigfoxBackendCallbackServer::new(store)
    }

    #[tokio::test]
    async fn accepts_twelve_byte_payload() {
        let server = server().await;
        assert!(server
            .handle(&backend("backend-1"), request("1A2B3C", "0011223344556677889900aa"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_oversized_or_non_hex_payload() {
        let server = server().await;
        let long = "00".repeat(MAX_PAYLOAD_BYTES + 1);
        for (device_id, data) in [("1A2B3C", long.as_str()), ("1A2B3C", "zz"), (" ", "00")] {
            assert!(matches!(
                server
                    .handle(&backend("backend-1"), request(device_id, data))
                    .await,
                Err(RpcError::InvalidParams(_))
            ));
        }
    }

    #[tokio::test]
    async fn unregistered_backend_is_forbidden() {
        let server = server().await;
        assert!(matches!(
            server
                .handle(&backend("backend-2"), request("1A2B3C", "00"))
                .await,
            Err(RpcError::Forbidden)
        ));
    }
}
