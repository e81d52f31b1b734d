//! Machine accounts log in with a password and act with exactly the
//! permissions stored on their record.

mod common;

use axum::http::StatusCode;
use brain_service::{
    models::{ApiUser, Claims, PartyType, Permission},
    services::store::ApiUserStore,
    utils::password::{hash_password, Password},
};
use common::{TestApp, CLIENT_1, COMPANY_A, PASSWORD};
use serde_json::{json, Value};

async fn create_importer(app: &TestApp) -> ApiUser {
    let api_user = ApiUser {
        id: "api-importer".to_string(),
        name: "Importer".to_string(),
        username: "importer".to_string(),
        password_hash: hash_password(&Password::new(PASSWORD.to_string())).unwrap(),
        description: "nightly device import".to_string(),
        permissions: vec![Permission::from("TenantEcho.WhereAmI")],
        party_type: PartyType::Client,
        party_id: CLIENT_1.to_string(),
        parent_party_type: PartyType::Company,
        parent_id: COMPANY_A.to_string(),
    };
    app.store.create_api_user(&api_user).await.unwrap();
    api_user
}

async fn api_login(app: &TestApp, username: &str, password: &str) -> (StatusCode, Value) {
    app.rpc(
        None,
        "APIUserAuth.Login",
        json!({ "username": username, "password": password }),
    )
    .await
}

#[tokio::test]
async fn login_issues_api_user_claims() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    let api_user = create_importer(&app).await;

    let (status, body) = api_login(&app, "importer", PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    let token = body["result"]["token"].as_str().unwrap();
    let claims = app.state.tokens.validate(token).unwrap();
    assert!(matches!(claims, Claims::ApiUserLogin(_)));
    assert_eq!(claims.user_id(), Some(api_user.id.as_str()));
    assert_eq!(claims.tenant_location().party_id, CLIENT_1);
    assert_eq!(claims.tenant_location().parent_id, COMPANY_A);
}

#[tokio::test]
async fn api_user_gets_exactly_its_stored_permissions() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    create_importer(&app).await;
    let (_, body) = api_login(&app, "importer", PASSWORD).await;
    let token = body["result"]["token"].as_str().unwrap().to_string();

    let (status, body) = app.rpc(Some(&token), "TenantEcho.WhereAmI", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["partyId"], CLIENT_1);

    // both are granted to some tier, neither is on the stored list
    for method in ["TenantEcho.ClientUserOnly", "PermissionAdministrator.UserHasPermission"] {
        let (status, _) = app.rpc(Some(&token), method, json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} should be denied", method);
    }
}

#[tokio::test]
async fn failed_api_logins_share_one_message() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    create_importer(&app).await;

    for (username, password) in [("importer", "wrong"), ("nobody", PASSWORD), ("", PASSWORD)] {
        let (status, body) = api_login(&app, username, password).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["message"], "log in failed");
    }
}

#[tokio::test]
async fn human_login_does_not_accept_api_users() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    create_importer(&app).await;

    let (status, body) = app
        .rpc(
            None,
            "Auth.Login",
            json!({ "usernameOrEmailAddress": "importer", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["message"], "log in failed");
}
