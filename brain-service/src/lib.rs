pub mod config;
pub mod envelope;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rpc;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use chrono::Duration;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::BrainConfig;
use crate::middleware::{authorise_middleware, Authoriser};
use crate::models::{Claims, PartyType};
use crate::rpc::providers::{
    self, ApiUserAuthProvider, AuthProvider, HumanUserAdministrator, PartyRecordHandler,
    PartyRegistrar, PermissionAdministrator, RoleRecordHandler, SigfoxBackendAdministrator,
    SigfoxBackendCallbackServer,
};
use crate::rpc::{ProviderRegistry, RpcProvider};
use crate::services::{BrainStore, PermissionRegistry, PermissionService, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub config: BrainConfig,
    pub store: Arc<dyn BrainStore>,
    pub tokens: TokenService,
    pub authoriser: Authoriser,
    pub providers: Arc<ProviderRegistry>,
    /// Claims of the root user, resolved once at startup and never changed.
    pub system_claims: Arc<Claims>,
}

/// Wires the permission registry, bootstrap and providers together.
///
/// Permission lists are compiled before any provider exists, so providers
/// that evaluate permissions can be handed a finished `PermissionService`.
/// `extra` providers are registered alongside the built-in ones.
pub async fn compose(
    config: BrainConfig,
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
    extra: Vec<Arc<dyn RpcProvider>>,
) -> Result<AppState, anyhow::Error> {
    let mut registry = PermissionRegistry::new();
    for declared in providers::declared_permissions() {
        registry.register(&declared);
    }
    for provider in &extra {
        registry.register(&provider.permissions());
    }
    let registry = Arc::new(registry);

    let system_claims =
        Arc::new(services::setup::setup(store.as_ref(), &registry, &config.bootstrap).await?);
    tracing::info!(
        party_id = %system_claims.tenant_location().party_id,
        "System claims resolved"
    );

    let permissions = PermissionService::new(registry, store.clone());
    let login_expiry = Duration::minutes(config.token.login_expiry_minutes);
    let registration_expiry = Duration::minutes(config.token.registration_expiry_minutes);

    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(AuthProvider::new(
        store.clone(),
        tokens.clone(),
        login_expiry,
    )));
    providers.register(Arc::new(ApiUserAuthProvider::new(
        store.clone(),
        tokens.clone(),
        system_claims.clone(),
        login_expiry,
    )));
    providers.register(Arc::new(PermissionAdministrator::new(
        store.clone(),
        permissions.clone(),
    )));
    providers.register(Arc::new(RoleRecordHandler::new(store.clone())));
    providers.register(Arc::new(PartyRegistrar::new(
        store.clone(),
        tokens.clone(),
        registration_expiry,
    )));
    providers.register(Arc::new(HumanUserAdministrator::new(
        store.clone(),
        tokens.clone(),
        registration_expiry,
    )));
    providers.register(Arc::new(SigfoxBackendAdministrator::new(
        store.clone(),
        tokens.clone(),
    )));
    providers.register(Arc::new(SigfoxBackendCallbackServer::new(store.clone())));
    for party_type in PartyType::ALL {
        providers.register(Arc::new(PartyRecordHandler::new(party_type, store.clone())));
    }
    for provider in extra {
        providers.register(provider);
    }
    let providers = Arc::new(providers);

    Ok(AppState {
        config,
        store,
        authoriser: Authoriser::new(tokens.clone(), permissions, providers.clone()),
        tokens,
        providers,
        system_claims,
    })
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api", post(handlers::handle_rpc))
        .layer(from_fn_with_state(state.clone(), authorise_middleware));

    Router::new()
        .merge(api)
        .route("/health", get(handlers::health_check))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins(&state.config.allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }

    AllowOrigin::list(origins.iter().filter_map(|o| {
        o.parse::<HeaderValue>()
            .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
            .ok()
    }))
}
