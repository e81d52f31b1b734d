use crate::models::{ApiUser, Claims, Identifier, LoginClaims, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{ApiUserStore, BrainStore, StoreError};
use crate::services::tenant_filter;
use crate::services::token::TokenService;
use crate::utils::password::{verify_password_blocking, Password};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const NAME: &str = "APIUserAuth";

const LOGIN_FAILED: &str = "log in failed";

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Login for machine accounts. The issued claims carry no role; the
/// authoriser checks the account's stored permission list instead.
pub struct ApiUserAuthProvider {
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
    system_claims: Arc<Claims>,
    login_expiry: Duration,
}

impl ApiUserAuthProvider {
    pub fn new(
        store: Arc<dyn BrainStore>,
        tokens: TokenService,
        system_claims: Arc<Claims>,
        login_expiry: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            system_claims,
            login_expiry,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, RpcError> {
        let failed = || RpcError::Service(LOGIN_FAILED.to_string());

        let api_user = self.find_api_user(&request.username).await.map_err(|e| {
            tracing::error!(error = %e, "API user lookup failed during login");
            failed()
        })?;

        let password = Password::new(request.password);
        let Some(api_user) = api_user else {
            let _ = verify_password_blocking(password, None).await;
            tracing::info!(reason = "unknown user", "API user login rejected");
            return Err(failed());
        };

        let verified = verify_password_blocking(password, Some(api_user.password_hash.clone()))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                failed()
            })?;
        if !verified {
            tracing::info!(
                api_user_id = %api_user.id,
                reason = "bad password",
                "API user login rejected"
            );
            return Err(failed());
        }

        let token = self
            .tokens
            .issue(&api_user_login_claims(&api_user, self.login_expiry))
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to issue API user token");
                failed()
            })?;

        tracing::info!(
            api_user_id = %api_user.id,
            party_id = %api_user.party_id,
            "API user logged in"
        );
        Ok(LoginResponse { token })
    }

    async fn find_api_user(&self, username: &str) -> Result<Option<ApiUser>, StoreError> {
        if username.trim().is_empty() {
            return Ok(None);
        }
        let filter = tenant_filter::scope(
            Identifier::username(username).to_filter(),
            &self.system_claims,
        );
        self.store.find_one_api_user(&filter).await
    }
}

fn api_user_login_claims(api_user: &ApiUser, expiry: Duration) -> Claims {
    let now = Utc::now();
    Claims::ApiUserLogin(LoginClaims {
        user_id: api_user.id.clone(),
        issue_time: now.timestamp(),
        expiration_time: (now + expiry).timestamp(),
        party_type: api_user.party_type,
        party_id: api_user.party_id.clone(),
        parent_party_type: api_user.parent_party_type,
        parent_id: api_user.parent_id.clone(),
    })
}

#[async_trait]
impl RpcProvider for ApiUserAuthProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Login"]
    }

    fn public_methods(&self) -> &'static [&'static str] {
        &["Login"]
    }

    fn permissions(&self) -> ServicePermissions {
        permissions()
    }

    async fn call(
        &self,
        _ctx: &CallContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            "Login" => encode_result(&self.login(decode_params(params)?).await?),
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
