//! Registration of Sigfox backends.
//!
//! Creating a backend also issues the `SigfoxBackend` token its operator
//! configures as the callback credential. The token is stored on the record
//! so it can be handed out again.

use crate::models::{Claims, SigfoxBackend, SigfoxBackendClaims, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, SigfoxBackendStore};
use crate::services::token::TokenService;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub const NAME: &str = "SigfoxBackendAdministrator";

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME).system(&["Create"])
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewBackend {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub backend: NewBackend,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub backend: SigfoxBackend,
}

pub struct SigfoxBackendAdministrator {
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
}

impl SigfoxBackendAdministrator {
    pub fn new(store: Arc<dyn BrainStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    async fn create(
        &self,
        claims: &Claims,
        request: CreateRequest,
    ) -> Result<CreateResponse, RpcError> {
        request.backend.validate()?;
        let owner = claims.tenant_location();
        let owner_party_type = owner.party_type.ok_or(RpcError::Forbidden)?;

        let id = uuid::Uuid::new_v4().to_string();
        let token = self
            .tokens
            .issue(&Claims::SigfoxBackend(SigfoxBackendClaims {
                backend_id: id.clone(),
            }))?;
        let backend = SigfoxBackend {
            id,
            name: request.backend.name,
            owner_party_type,
            owner_id: owner.party_id,
            token,
        };
        self.store.create_sigfox_backend(&backend).await?;

        tracing::info!(backend_id = %backend.id, "Sigfox backend registered");
        Ok(CreateResponse { backend })
    }
}

#[async_trait]
impl RpcProvider for SigfoxBackendAdministrator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Create"]
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
            "Create" => {
                let response = self.create(ctx.claims()?, decode_params(params)?).await?;
                encode_result(&response)
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
