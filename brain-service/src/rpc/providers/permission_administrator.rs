use crate::models::{Claims, HumanUser, Identifier, Permission, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::permission::PermissionService;
use crate::services::store::{BrainStore, HumanUserStore};
use crate::services::tenant_filter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const NAME: &str = "PermissionAdministrator";

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME).all_tiers(&["UserHasPermission", "GetAllUsersAPIPermissions"])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHasPermissionRequest {
    pub user_identifier: Identifier,
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
pub struct UserHasPermissionResponse {
    pub result: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllUsersApiPermissionsRequest {
    pub user_identifier: Identifier,
}

#[derive(Debug, Serialize)]
pub struct GetAllUsersApiPermissionsResponse {
    pub permission: Vec<Permission>,
}

pub struct PermissionAdministrator {
    store: Arc<dyn BrainStore>,
    permissions: PermissionService,
}

impl PermissionAdministrator {
    pub fn new(store: Arc<dyn BrainStore>, permissions: PermissionService) -> Self {
        Self { store, permissions }
    }

    async fn user_permissions(
        &self,
        claims: &Claims,
        identifier: &Identifier,
    ) -> Result<Vec<Permission>, RpcError> {
        identifier.validate()?;
        let user = self.retrieve_user(claims, identifier).await?;
        let permissions = self.permissions.role_permissions(&user.roles).await?;
        Ok(permissions.into_iter().collect())
    }

    async fn retrieve_user(
        &self,
        claims: &Claims,
        identifier: &Identifier,
    ) -> Result<HumanUser, RpcError> {
        let filter = tenant_filter::scope_by("partyId", identifier.to_filter(), claims);
        self.store
            .find_one_user(&filter)
            .await?
            .ok_or_else(|| RpcError::Service("user not found".to_string()))
    }
}

#[async_trait]
impl RpcProvider for PermissionAdministrator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["UserHasPermission", "GetAllUsersAPIPermissions"]
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
        let claims = ctx.claims()?;
        match method {
            "UserHasPermission" => {
                let request: UserHasPermissionRequest = decode_params(params)?;
                let granted = self
                    .user_permissions(claims, &request.user_identifier)
                    .await?;
                encode_result(&UserHasPermissionResponse {
                    result: granted.contains(&request.permission),
                })
            }
            "GetAllUsersAPIPermissions" => {
                let request: GetAllUsersApiPermissionsRequest = decode_params(params)?;
                let permission = self
                    .user_permissions(claims, &request.user_identifier)
                    .await?;
                encode_result(&GetAllUsersApiPermissionsResponse { permission })
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
