//! Integration tests for user management and tenant scoping

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "requires database"]
async fn test_admin_creates_viewer_in_own_enterprise() {
    let app = common::TestApp::new().await;
    let (cnpj, _, admin_token) = app.onboard_tenant("mkviewer", "AdminPassword123!").await;

    let email = format!("employee_{}@example.com", common::rand_digits());
    let body = json!({
        "name": "New Employee",
        "email": email,
        "password": "EmployeePass123!",
    });

    let (status, response) = app
        .post_auth("/users/viewers", &body.to_string(), &admin_token)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);

    let viewer: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(viewer["role"], "CLIENT_VIEWER");
    assert_eq!(viewer["enterprise_cnpj"], cnpj);

    // The new account shows up in the tenant listing
    let (status, listing) = app.get_auth("/users", &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert!(listing
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["email"] == email));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_viewer_cannot_create_viewers() {
    let app = common::TestApp::new().await;
    let (cnpj, _, _) = app.onboard_tenant("viewerdeny", "AdminPassword123!").await;

    let email = format!("viewer_{}@example.com", common::rand_digits());
    let register = json!({
        "name": "Lowly Viewer",
        "email": email,
        "password": "ViewerPassword123!",
        "enterprise_cnpj": cnpj,
    });
    let (status, _) = app.post("/auth/register", &register.to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    let viewer_token = app.login(&email, "ViewerPassword123!").await;

    let body = json!({
        "name": "Should Not Exist",
        "email": format!("nope_{}@example.com", common::rand_digits()),
        "password": "SomePassword123!",
    });
    let (status, _) = app
        .post_auth("/users/viewers", &body.to_string(), &viewer_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_master_creates_admin_for_enterprise() {
    let app = common::TestApp::new().await;
    let (_, admin_email, admin_token) =
        app.onboard_tenant("mkadmin", "AdminPassword123!").await;
    let (_, master_token) = app.register_master("MasterPassword123!").await;

    // Resolve the enterprise id through the first admin's view
    let (_, me) = app.get_auth("/enterprises/me", &admin_token).await;
    let me: serde_json::Value = serde_json::from_str(&me).unwrap();
    let enterprise_id = me["id"].as_str().unwrap();

    let email = format!("second_admin_{}@example.com", common::rand_digits());
    let body = json!({
        "name": "Second Admin",
        "email": email,
        "password": "SecondAdmin123!",
        "enterprise_id": enterprise_id,
    });

    let (status, response) = app
        .post_auth("/users/admins", &body.to_string(), &master_token)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    let created: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(created["role"], "CLIENT_ADMIN");

    // The tenant's first admin cannot reach the master-only route
    let (status, _) = app
        .post_auth("/users/admins", &body.to_string(), &admin_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let _ = admin_email;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_admin_cannot_deactivate_self_or_other_admins() {
    let app = common::TestApp::new().await;
    let (_, _, admin_token) = app.onboard_tenant("noselfdeact", "AdminPassword123!").await;
    let (_, master_token) = app.register_master("MasterPassword123!").await;

    let (_, me) = app.get_auth("/users/me", &admin_token).await;
    let me: serde_json::Value = serde_json::from_str(&me).unwrap();
    let admin_id = me["id"].as_str().unwrap();

    // Self-deactivation is a client error
    let (status, _) = app
        .patch_auth(&format!("/users/{}/deactivate", admin_id), "{}", &admin_token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A second admin in the same enterprise is protected too
    let (_, ent) = app.get_auth("/enterprises/me", &admin_token).await;
    let ent: serde_json::Value = serde_json::from_str(&ent).unwrap();
    let body = json!({
        "name": "Other Admin",
        "email": format!("other_admin_{}@example.com", common::rand_digits()),
        "password": "OtherAdmin123!",
        "enterprise_id": ent["id"].as_str().unwrap(),
    });
    let (status, response) = app
        .post_auth("/users/admins", &body.to_string(), &master_token)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let other: serde_json::Value = serde_json::from_str(&response).unwrap();

    let (status, _) = app
        .patch_auth(
            &format!("/users/{}/deactivate", other["id"].as_str().unwrap()),
            "{}",
            &admin_token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_admin_cannot_touch_accounts_of_other_tenants() {
    let app = common::TestApp::new().await;
    let (cnpj_a, _, admin_a_token) = app.onboard_tenant("tenant-a", "AdminPassword123!").await;
    let (_, _, admin_b_token) = app.onboard_tenant("tenant-b", "AdminPassword123!").await;

    // A viewer in tenant A
    let email = format!("a_viewer_{}@example.com", common::rand_digits());
    let register = json!({
        "name": "Tenant A Viewer",
        "email": email,
        "password": "ViewerPassword123!",
        "enterprise_cnpj": cnpj_a,
    });
    let (status, response) = app.post("/auth/register", &register.to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    let viewer: serde_json::Value = serde_json::from_str(&response).unwrap();
    let viewer_id = viewer["id"].as_str().unwrap();

    // Tenant B's admin cannot deactivate across the tenant boundary
    let (status, _) = app
        .patch_auth(
            &format!("/users/{}/deactivate", viewer_id),
            "{}",
            &admin_b_token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Tenant A's admin can
    let (status, _) = app
        .patch_auth(
            &format!("/users/{}/deactivate", viewer_id),
            "{}",
            &admin_a_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // And reactivate
    let (status, response) = app
        .patch_auth(
            &format!("/users/{}/activate", viewer_id),
            "{}",
            &admin_a_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let activated: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(activated["is_active"], true);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_change_password_requires_current_password() {
    let app = common::TestApp::new().await;
    let (_, email, token) = app.onboard_tenant("chpass", "OriginalPass123!").await;

    // Wrong current password
    let body = json!({
        "old_password": "not-the-password",
        "new_password": "ReplacementPass123!",
    });
    let (status, _) = app.put_auth("/users/password", &body.to_string(), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Correct current password
    let body = json!({
        "old_password": "OriginalPass123!",
        "new_password": "ReplacementPass123!",
    });
    let (status, _) = app.put_auth("/users/password", &body.to_string(), &token).await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works; the new one does
    let login = json!({ "email": email, "password": "OriginalPass123!" });
    let (status, _) = app.post("/auth/login", &login.to_string()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let _ = app.login(&email, "ReplacementPass123!").await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_master_listing_requires_enterprise_id() {
    let app = common::TestApp::new().await;
    let (cnpj, admin_email, admin_token) =
        app.onboard_tenant("masterlist", "AdminPassword123!").await;
    let (_, master_token) = app.register_master("MasterPassword123!").await;

    // Without the query parameter the request is rejected
    let (status, _) = app.get_auth("/users", &master_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = app.get_auth("/enterprises/me", &admin_token).await;
    let me: serde_json::Value = serde_json::from_str(&me).unwrap();

    let (status, listing) = app
        .get_auth(
            &format!("/users?enterprise_id={}", me["id"].as_str().unwrap()),
            &master_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert!(listing
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["email"] == admin_email && u["enterprise_cnpj"] == cnpj));
}
