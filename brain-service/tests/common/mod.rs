//! Shared setup for brain-service integration tests.
//!
//! Builds the full router over an in-memory store with a fixed RSA key pair
//! and a small tenant tree:
//!
//! ```text
//! System (root)
//! ├── Company A
//! │   └── Client client-1
//! └── Company B
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use brain_service::{
    build_router, compose,
    config::{
        BootstrapConfig, BrainConfig, Environment, MongoConfig, StoreBackend, TokenConfig,
    },
    models::{
        Claims, HumanUser, LoginClaims, Party, PartyRecord, PartyType, ServicePermissions,
    },
    rpc::{CallContext, RpcError, RpcProvider},
    services::{
        store::{HumanUserStore, PartyStore},
        InMemoryStore,
    },
    utils::password::{hash_password, Password},
    AppState,
};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

const TEST_PRIVATE_KEY: &str = include_str!("../../test-keys/private.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../../test-keys/public.pem");

pub const COMPANY_A: &str = "company-a";
pub const COMPANY_B: &str = "company-b";
pub const CLIENT_1: &str = "client-1";
pub const PASSWORD: &str = "correct-horse-battery";

/// Test application wired exactly as the binary wires it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    _key_files: (NamedTempFile, NamedTempFile),
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryStore::new()), None).await
    }

    /// Spawn over an existing store, optionally with a root password file.
    pub async fn spawn_with(
        store: Arc<InMemoryStore>,
        root_password_file: Option<String>,
    ) -> Self {
        Self::try_spawn_with(store, root_password_file)
            .await
            .expect("Failed to compose application")
    }

    pub async fn try_spawn_with(
        store: Arc<InMemoryStore>,
        root_password_file: Option<String>,
    ) -> Result<Self, anyhow::Error> {
        let (private_file, public_file) = create_test_keys()?;
        let config = create_test_config(
            private_file.path().to_str().unwrap(),
            public_file.path().to_str().unwrap(),
            root_password_file,
        );

        let tokens = brain_service::services::TokenService::new(&config.token)?;
        let extra: Vec<Arc<dyn RpcProvider>> = vec![Arc::new(TenantEcho)];
        let state = compose(config, store.clone(), tokens, extra).await?;

        Ok(Self {
            router: build_router(state.clone()),
            state,
            store,
            _key_files: (private_file, public_file),
        })
    }

    /// Company A and B under System, client-1 under Company A.
    pub async fn seed_tenants(&self) {
        let system_id = self.state.system_claims.tenant_location().party_id;
        let parties = [
            Party::Company(record(COMPANY_A, "Acme", PartyType::System, &system_id)),
            Party::Company(record(COMPANY_B, "Bolt", PartyType::System, &system_id)),
            Party::Client(record(CLIENT_1, "Client One", PartyType::Company, COMPANY_A)),
        ];
        for party in &parties {
            self.store.create_party(party).await.unwrap();
        }
    }

    /// Registered user with [`PASSWORD`] under `client-1`.
    pub async fn create_client_user(&self, username: &str, roles: &[&str]) -> HumanUser {
        let user = HumanUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: username.to_string(),
            surname: "Tester".to_string(),
            username: username.to_string(),
            email_address: format!("{}@client-one.test", username),
            password_hash: hash_password(&Password::new(PASSWORD.to_string())).unwrap(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            party_type: PartyType::Client,
            party_id: CLIENT_1.to_string(),
            parent_party_type: PartyType::Company,
            parent_id: COMPANY_A.to_string(),
            registered: true,
        };
        self.store.create_user(&user).await.unwrap();
        user
    }

    pub fn issue(&self, claims: &Claims) -> String {
        self.state.tokens.issue(claims).unwrap()
    }

    /// Root token issued directly, bypassing the password login.
    pub fn root_token(&self) -> String {
        self.issue(&self.state.system_claims)
    }

    pub fn login_claims(&self, user: &HumanUser, expiration_time: i64) -> Claims {
        Claims::HumanUserLogin(LoginClaims {
            user_id: user.id.clone(),
            issue_time: chrono::Utc::now().timestamp(),
            expiration_time,
            party_type: user.party_type,
            party_id: user.party_id.clone(),
            parent_party_type: user.parent_party_type,
            parent_id: user.parent_id.clone(),
        })
    }

    /// Logs in through `Auth.Login` and returns the issued token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .rpc(
                None,
                "Auth.Login",
                json!({ "usernameOrEmailAddress": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["result"]["token"]
            .as_str()
            .unwrap_or_else(|| panic!("login failed: {}", body))
            .to_string()
    }

    /// Posts a JSON-RPC call to `/api` and returns status and JSON body.
    pub async fn rpc(
        &self,
        token: Option<&str>,
        method: &str,
        params: Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api")
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            request = request.header("Authorization", token);
        }
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, body)
    }
}

fn record(id: &str, name: &str, parent_party_type: PartyType, parent_id: &str) -> PartyRecord {
    PartyRecord {
        id: id.to_string(),
        name: name.to_string(),
        admin_email_address: format!("admin@{}.test", id),
        parent_party_type,
        parent_id: parent_id.to_string(),
    }
}

/// Provider whose two methods sit in different tiers, used to observe the
/// authoriser and the claims a handler receives.
pub struct TenantEcho;

#[async_trait]
impl RpcProvider for TenantEcho {
    fn name(&self) -> &'static str {
        "TenantEcho"
    }

    fn methods(&self) -> &'static [&'static str] {
        &["ClientUserOnly", "WhereAmI"]
    }

    fn permissions(&self) -> ServicePermissions {
        ServicePermissions::new("TenantEcho")
            .client_user(&["ClientUserOnly"])
            .client_admin(&["WhereAmI"])
    }

    async fn call(
        &self,
        ctx: &CallContext,
        _method: &str,
        _params: Value,
    ) -> Result<Value, RpcError> {
        let location = ctx.claims()?.tenant_location();
        Ok(json!({ "partyId": location.party_id, "parentId": location.parent_id }))
    }
}

fn create_test_keys() -> Result<(NamedTempFile, NamedTempFile), std::io::Error> {
    let mut private_file = NamedTempFile::new()?;
    private_file.write_all(TEST_PRIVATE_KEY.as_bytes())?;
    private_file.flush()?;

    let mut public_file = NamedTempFile::new()?;
    public_file.write_all(TEST_PUBLIC_KEY.as_bytes())?;
    public_file.flush()?;

    Ok((private_file, public_file))
}

fn create_test_config(
    private_key_path: &str,
    public_key_path: &str,
    root_password_file: Option<String>,
) -> BrainConfig {
    BrainConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "brain-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        store: StoreBackend::Memory,
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "brain_test".to_string(),
        },
        token: TokenConfig {
            private_key_path: Some(private_key_path.to_string()),
            public_key_path: public_key_path.to_string(),
            login_expiry_minutes: 90,
            registration_expiry_minutes: 90,
        },
        bootstrap: BootstrapConfig { root_password_file },
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}
