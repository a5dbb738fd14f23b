//! Login, session and logout flows through the HTTP surface.

mod test_utils;

use axum::http::{Method, StatusCode};
use jobdesk::repositories::DirectoryRepository;
use jobdesk::session::provider::hash_password;
use test_utils::{TestApp, insert_directory_entry, insert_rm, insert_superadmin};

#[tokio::test]
async fn rm_logs_in_with_case_insensitive_short_code() {
    let app = TestApp::new().await.unwrap();
    let uid = insert_rm(app.db(), "rm042", "pass123", &[]).await.unwrap();

    let (status, body) = app.try_login("  RM042 ", "pass123").await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["session"]["uid"], uid.as_str());
    assert_eq!(body["session"]["role"], "rms");
    assert_eq!(body["session"]["loginMethod"], "shortCode");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn short_code_login_records_last_login() {
    let app = TestApp::new().await.unwrap();
    insert_rm(app.db(), "rm042", "pass123", &[]).await.unwrap();

    app.login("rm042", "pass123").await;

    let entry = DirectoryRepository::new(app.db())
        .find_by_code("rm042")
        .await
        .unwrap()
        .unwrap();
    assert!(entry.last_login_at.is_some());
}

#[tokio::test]
async fn hashed_directory_secrets_are_accepted() {
    let app = TestApp::new().await.unwrap();
    insert_directory_entry(app.db(), "rm7", "uid-rm7", &hash_password("s3cret"), "active")
        .await
        .unwrap();
    test_utils::insert_profile(app.db(), "uid-rm7", "rms", None, &[])
        .await
        .unwrap();

    let (status, _) = app.try_login("rm7", "s3cret").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.try_login("rm7", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INCORRECT_CREDENTIAL");
}

#[tokio::test]
async fn unknown_short_code_is_an_invalid_identifier() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.try_login("nobody", "pass123").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn blank_identifier_is_rejected() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.try_login("   ", "pass123").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn wrong_password_is_an_incorrect_credential() {
    let app = TestApp::new().await.unwrap();
    insert_rm(app.db(), "rm042", "pass123", &[]).await.unwrap();

    let (status, body) = app.try_login("rm042", "PASS123").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INCORRECT_CREDENTIAL");
}

#[tokio::test]
async fn inactive_accounts_cannot_log_in() {
    let app = TestApp::new().await.unwrap();
    insert_directory_entry(app.db(), "rm9", "uid-rm9", "pass123", "Suspended")
        .await
        .unwrap();
    test_utils::insert_profile(app.db(), "uid-rm9", "rms", None, &[])
        .await
        .unwrap();

    let (status, body) = app.try_login("rm9", "pass123").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
    assert!(app.state.sessions.store().is_empty().await);
}

#[tokio::test]
async fn account_status_check_ignores_case_and_padding() {
    let app = TestApp::new().await.unwrap();
    insert_directory_entry(app.db(), "rm9", "uid-rm9", "pass123", " ACTIVE ")
        .await
        .unwrap();
    test_utils::insert_profile(app.db(), "uid-rm9", "rms", None, &[])
        .await
        .unwrap();

    let (status, _) = app.try_login("rm9", "pass123").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_profile_fails_closed() {
    let app = TestApp::new().await.unwrap();
    insert_directory_entry(app.db(), "ghost", "uid-ghost", "pass123", "active")
        .await
        .unwrap();

    let (status, body) = app.try_login("ghost", "pass123").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PROFILE_NOT_FOUND");
    assert!(app.state.sessions.store().is_empty().await);
}

#[tokio::test]
async fn unknown_profile_role_fails_closed() {
    let app = TestApp::new().await.unwrap();
    insert_directory_entry(app.db(), "odd", "uid-odd", "pass123", "active")
        .await
        .unwrap();
    test_utils::insert_profile(app.db(), "uid-odd", "auditor", None, &[])
        .await
        .unwrap();

    let (status, body) = app.try_login("odd", "pass123").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn superadmin_logs_in_by_email() {
    let app = TestApp::new().await.unwrap();
    let uid = insert_superadmin(app.db(), "admin@example.com", "topsecret", &[])
        .await
        .unwrap();

    let (status, body) = app.try_login("Admin@Example.com", "topsecret").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["session"]["uid"], uid.as_str());
    assert_eq!(body["session"]["role"], "superadmin");
    assert_eq!(body["session"]["loginMethod"], "provider");

    let (status, body) = app.try_login("admin@example.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INCORRECT_CREDENTIAL");

    let (status, body) = app.try_login("stranger@example.com", "topsecret").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn session_endpoint_reflects_the_token() {
    let app = TestApp::new().await.unwrap();
    let uid = insert_rm(app.db(), "rm042", "pass123", &[("viewReports", true)])
        .await
        .unwrap();
    let token = app.login("rm042", "pass123").await;

    let (status, body) = app.get("/api/v1/auth/session", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], uid.as_str());
    assert_eq!(body["permissions"]["viewReports"], true);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app
        .request(Method::GET, "/api/v1/auth/session", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/api/v1/jobs", "forged-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_tears_the_session_down() {
    let app = TestApp::new().await.unwrap();
    insert_rm(app.db(), "rm042", "pass123", &[]).await.unwrap();
    let token = app.login("rm042", "pass123").await;

    let (status, _) = app
        .request(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/v1/auth/session", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_new_login_replaces_the_previous_session() {
    let app = TestApp::new().await.unwrap();
    insert_rm(app.db(), "rm042", "pass123", &[]).await.unwrap();

    let first = app.login("rm042", "pass123").await;
    let second = app.login("rm042", "pass123").await;

    let (status, _) = app.get("/api/v1/auth/session", &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/v1/auth/session", &second).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn error_bodies_carry_the_trace_id() {
    let app = TestApp::new().await.unwrap();

    let (_, body) = app.try_login("nobody", "pass123").await;

    assert!(body["trace_id"].as_str().is_some_and(|id| !id.is_empty()));
}
