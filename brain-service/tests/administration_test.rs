//! Role records and permission queries.

mod common;

use axum::http::StatusCode;
use common::{TestApp, PASSWORD};
use serde_json::{json, Value};

fn contains(list: &Value, permission: &str) -> bool {
    list.as_array()
        .map(|items| items.iter().any(|p| p == permission))
        .unwrap_or(false)
}

#[tokio::test]
async fn seeded_tier_role_is_retrievable_by_system() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .rpc(
            Some(&app.root_token()),
            "RoleRecordHandler.Retrieve",
            json!({ "name": "clientUser" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let permissions = &body["result"]["role"]["permissions"];
    assert!(contains(permissions, "TenantEcho.ClientUserOnly"));
    assert!(contains(permissions, "CompanyRecordHandler.Collect"));
    assert!(!contains(permissions, "TenantEcho.WhereAmI"));
}

#[tokio::test]
async fn unknown_role_is_a_method_error() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .rpc(
            Some(&app.root_token()),
            "RoleRecordHandler.Retrieve",
            json!({ "name": "noSuchRole" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["message"], "role not found");
}

#[tokio::test]
async fn role_records_are_system_only() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    app.create_client_user("ca", &["clientAdmin"]).await;
    let token = app.login("ca", PASSWORD).await;

    let (status, _) = app
        .rpc(
            Some(&token),
            "RoleRecordHandler.Retrieve",
            json!({ "name": "clientAdmin" }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn all_permissions_follow_the_users_roles() {
    let app = TestApp::spawn().await;
    app.seed_tenants().await;
    app.create_client_user("ca", &["clientAdmin"]).await;

    let (status, body) = app
        .rpc(
            Some(&app.root_token()),
            "PermissionAdministrator.GetAllUsersAPIPermissions",
            json!({ "userIdentifier": { "type": "Username", "value": { "username": "ca" } } }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let permissions = &body["result"]["permission"];
    assert!(contains(permissions, "TenantEcho.WhereAmI"));
    assert!(contains(permissions, "PartyRegistrar.InviteClientUser"));
    assert!(!contains(permissions, "TenantEcho.ClientUserOnly"));
    assert!(!contains(permissions, "PartyRegistrar.InviteCompanyUser"));
}
