use crate::models::{Claims, HumanUser, Identifier, LoginClaims, ServicePermissions};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, HumanUserStore, StoreError};
use crate::services::token::TokenService;
use crate::utils::password::{verify_password_blocking, Password};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const NAME: &str = "Auth";

const LOGIN_FAILED: &str = "log in failed";

pub fn permissions() -> ServicePermissions {
    // Login needs no token and so appears in no tier
    ServicePermissions::new(NAME).all_tiers(&["Logout"])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email_address: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub struct AuthProvider {
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
    login_expiry: Duration,
}

impl AuthProvider {
    pub fn new(store: Arc<dyn BrainStore>, tokens: TokenService, login_expiry: Duration) -> Self {
        Self {
            store,
            tokens,
            login_expiry,
        }
    }

    /// Every failure path returns the same error so callers cannot tell
    /// which usernames exist.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, RpcError> {
        let failed = || RpcError::Service(LOGIN_FAILED.to_string());

        let user = self
            .find_user(&request.username_or_email_address)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "User lookup failed during login");
                failed()
            })?;

        let password = Password::new(request.password);
        let Some(user) = user else {
            let _ = verify_password_blocking(password, None).await;
            tracing::info!(reason = "unknown user", "Login rejected");
            return Err(failed());
        };

        let verified = verify_password_blocking(password, Some(user.password_hash.clone()))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                failed()
            })?;
        if !user.registered {
            tracing::info!(user_id = %user.id, reason = "not registered", "Login rejected");
            return Err(failed());
        }
        if !verified {
            tracing::info!(user_id = %user.id, reason = "bad password", "Login rejected");
            return Err(failed());
        }

        let claims = login_claims(&user, self.login_expiry);
        let token = self.tokens.issue(&claims).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue login token");
            failed()
        })?;

        tracing::info!(user_id = %user.id, party_id = %user.party_id, "User logged in");
        Ok(LoginResponse { token })
    }

    async fn find_user(
        &self,
        username_or_email_address: &str,
    ) -> Result<Option<HumanUser>, StoreError> {
        if username_or_email_address.trim().is_empty() {
            return Ok(None);
        }

        let by_username = Identifier::username(username_or_email_address).to_filter();
        if let Some(user) = self.store.find_one_user(&by_username).await? {
            return Ok(Some(user));
        }

        let by_email = Identifier::email_address(username_or_email_address).to_filter();
        self.store.find_one_user(&by_email).await
    }
}

fn login_claims(user: &HumanUser, expiry: Duration) -> Claims {
    let now = Utc::now();
    Claims::HumanUserLogin(LoginClaims {
        user_id: user.id.clone(),
        issue_time: now.timestamp(),
        expiration_time: (now + expiry).timestamp(),
        party_type: user.party_type,
        party_id: user.party_id.clone(),
        parent_party_type: user.parent_party_type,
        parent_id: user.parent_id.clone(),
    })
}

#[async_trait]
impl RpcProvider for AuthProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        &["Login", "Logout"]
    }

    fn public_methods(&self) -> &'static [&'static str] {
        &["Login"]
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
            "Login" => encode_result(&self.login(decode_params(params)?).await?),
            // tokens are stateless; the client discards its copy
            "Logout" => {
                ctx.claims()?;
                Ok(json!({}))
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
