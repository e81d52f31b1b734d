use crate::models::{Role, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, RoleStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const NAME: &str = "RoleRecordHandler";

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME).system(&["Retrieve"])
}

#[derive(Debug, Deserialize)]
pub struct RetrieveRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub role: Role,
}

pub struct RoleRecordHandler {
    store: Arc<dyn BrainStore>,
}

impl RoleRecordHandler {
    pub fn new(store: Arc<dyn BrainStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RpcProvider for RoleRecordHandler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Retrieve"]
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
        ctx.claims()?;
        match method {
            "Retrieve" => {
                let request: RetrieveRequest = decode_params(params)?;
                let role = self
                    .store
                    .retrieve_role(&request.name)
                    .await?
                    .ok_or_else(|| RpcError::Service("role not found".to_string()))?;
                encode_result(&RetrieveResponse { role })
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
