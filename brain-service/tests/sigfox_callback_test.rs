mod common;

use axum::http::StatusCode;
use brain_service::models::{Claims, SigfoxBackendClaims};
use brain_service::services::store::SigfoxBackendStore;
use common::TestApp;
use serde_json::json;

/// Registers a backend through the administrator and returns its token.
async fn backend_token(app: &TestApp) -> String {
    let (status, body) = app
        .rpc(
            Some(&app.root_token()),
            "SigfoxBackendAdministrator.Create",
            json!({ "backend": { "name": "eu-west" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body["result"]["backend"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("backend not created: {}", body))
        .to_string()
}

#[tokio::test]
async fn created_backend_is_stored_with_its_token() {
    let app = TestApp::spawn().await;
    let token = backend_token(&app).await;

    let Claims::SigfoxBackend(claims) = app.state.tokens.validate(&token).unwrap() else {
        panic!("expected SigfoxBackend claims");
    };
    let stored = app
        .store
        .retrieve_sigfox_backend(&claims.backend_id)
        .await
        .unwrap()
        .expect("backend stored");

    assert_eq!(stored.name, "eu-west");
    assert_eq!(stored.token, token);
    assert_eq!(
        stored.owner_id,
        app.state.system_claims.tenant_location().party_id
    );
}

#[tokio::test]
async fn backend_claims_reach_handle() {
    let app = TestApp::spawn().await;
    let token = backend_token(&app).await;

    let (status, body) = app
        .rpc(
            Some(&token),
            "SigfoxBackendCallbackServer.Handle",
            json!({ "deviceId": "1A2B3C", "data": "0a0b0c", "seqNumber": 7 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({}));
}

#[tokio::test]
async fn unregistered_backend_token_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.issue(&Claims::SigfoxBackend(SigfoxBackendClaims {
        backend_id: "never-created".to_string(),
    }));

    let (status, body) = app
        .rpc(
            Some(&token),
            "SigfoxBackendCallbackServer.Handle",
            json!({ "deviceId": "1A2B3C", "data": "00" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorised");
}

#[tokio::test]
async fn backend_creation_is_system_only() {
    let app = TestApp::spawn().await;
    let token = backend_token(&app).await;

    let (status, _) = app
        .rpc(
            Some(&token),
            "SigfoxBackendAdministrator.Create",
            json!({ "backend": { "name": "rogue" } }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn root_cannot_impersonate_a_backend() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .rpc(
            Some(&app.root_token()),
            "SigfoxBackendCallbackServer.Handle",
            json!({ "deviceId": "1A2B3C", "data": "00" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn backend_claims_reach_nothing_else() {
    let app = TestApp::spawn().await;
    let token = backend_token(&app).await;

    let (status, _) = app
        .rpc(Some(&token), "CompanyRecordHandler.Collect", json!({}))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn oversized_payload_is_invalid_params() {
    let app = TestApp::spawn().await;
    let token = backend_token(&app).await;

    let (status, body) = app
        .rpc(
            Some(&token),
            "SigfoxBackendCallbackServer.Handle",
            json!({ "deviceId": "1A2B3C", "data": "00".repeat(13) }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32602);
}
