use crate::models::{
    Claims, ClaimsKind, HumanUser, Identifier, ResetPasswordClaims, ServicePermissions,
};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, HumanUserStore};
use crate::services::tenant_filter;
use crate::services::token::TokenService;
use crate::utils::password::{hash_password_blocking, Password};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

pub const NAME: &str = "HumanUserAdministrator";

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME)
        .all_tiers(&["SetPassword"])
        .system(&["IssueResetPasswordToken"])
        .claims_grant(ClaimsKind::ResetPassword, &["SetPassword"])
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResetPasswordTokenRequest {
    pub user_identifier: Identifier,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResetPasswordTokenResponse {
    pub reset_token: String,
}

pub struct HumanUserAdministrator {
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
    reset_expiry: Duration,
}

impl HumanUserAdministrator {
    pub fn new(store: Arc<dyn BrainStore>, tokens: TokenService, reset_expiry: Duration) -> Self {
        Self {
            store,
            tokens,
            reset_expiry,
        }
    }

    /// Only ever changes the password of the user the claims speak for.
    async fn set_password(
        &self,
        claims: &Claims,
        request: SetPasswordRequest,
    ) -> Result<(), RpcError> {
        let user_id = match claims {
            Claims::HumanUserLogin(c) => c.user_id.as_str(),
            Claims::ResetPassword(c) => c.user_id.as_str(),
            _ => return Err(RpcError::Forbidden),
        };
        request.validate()?;

        let mut user = self
            .store
            .find_one_user(&Identifier::id(user_id).to_filter())
            .await?
            .ok_or_else(|| RpcError::Service("user not found".to_string()))?;

        user.password_hash = hash_password_blocking(Password::new(request.new_password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash new password");
                RpcError::Service("internal error".to_string())
            })?;
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.id, claims_kind = %claims.kind(), "Password changed");
        Ok(())
    }

    async fn issue_reset_password_token(
        &self,
        claims: &Claims,
        request: IssueResetPasswordTokenRequest,
    ) -> Result<IssueResetPasswordTokenResponse, RpcError> {
        request.user_identifier.validate()?;
        let filter =
            tenant_filter::scope_by("partyId", request.user_identifier.to_filter(), claims);
        let user = self
            .store
            .find_one_user(&filter)
            .await?
            .ok_or_else(|| RpcError::Service("user not found".to_string()))?;

        let reset_token = self.tokens.issue(&self.reset_claims(&user))?;
        tracing::info!(user_id = %user.id, "Reset password token issued");
        Ok(IssueResetPasswordTokenResponse { reset_token })
    }

    fn reset_claims(&self, user: &HumanUser) -> Claims {
        let now = Utc::now();
        Claims::ResetPassword(ResetPasswordClaims {
            user_id: user.id.clone(),
            issue_time: now.timestamp(),
            expiration_time: (now + self.reset_expiry).timestamp(),
            party_type: user.party_type,
            party_id: user.party_id.clone(),
            parent_party_type: user.parent_party_type,
            parent_id: user.parent_id.clone(),
        })
    }
}

#[async_trait]
impl RpcProvider for HumanUserAdministrator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["SetPassword", "IssueResetPasswordToken"]
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
            "SetPassword" => {
                self.set_password(claims, decode_params(params)?).await?;
                Ok(json!({}))
            }
            "IssueResetPasswordToken" => {
                let response = self
                    .issue_reset_password_token(claims, decode_params(params)?)
                    .await?;
                encode_result(&response)
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
