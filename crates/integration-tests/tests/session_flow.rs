//! Login, registration, logout, and restore against the mock backend.

use edenshop_integration_tests::{
    CUSTOMER_EMAIL, CUSTOMER_PASSWORD, LOGIN_ACCESS_TOKEN, TestContext, customer,
};
use edenshop_storefront::StorefrontError;
use edenshop_storefront::api::RegisterRequest;
use edenshop_storefront::storage::PersistedSession;
use edenshop_storefront::stores::SessionSnapshot;

#[tokio::test]
async fn test_login_valid_credentials() {
    let ctx = TestContext::start().await;

    let user = ctx
        .session
        .login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD)
        .await
        .expect("login succeeds");
    assert_eq!(user, customer());

    let snapshot = ctx.session.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.user, Some(customer()));

    let persisted = PersistedSession::load(&ctx.storage)
        .expect("storage readable")
        .expect("session persisted");
    assert!(persisted.is_authenticated);
    assert_eq!(persisted.token.as_deref(), Some(LOGIN_ACCESS_TOKEN));
    assert_eq!(persisted.user, Some(customer()));
}

#[tokio::test]
async fn test_login_invalid_credentials_keeps_backend_payload() {
    let ctx = TestContext::start().await;

    let err = ctx
        .session
        .login(CUSTOMER_EMAIL, "nope")
        .await
        .expect_err("login rejected");

    let body = err.api_body().expect("backend payload surfaced");
    assert_eq!(body.message, "Invalid credentials");
    assert_eq!(body.status, 401);
    assert_eq!(body.timestamp.as_deref(), Some("2024-05-01T12:00:00"));

    assert_eq!(ctx.session.snapshot().await, SessionSnapshot::default());
    assert!(PersistedSession::load(&ctx.storage).expect("readable").is_none());
}

#[tokio::test]
async fn test_login_by_phone_sends_phone_field() {
    let ctx = TestContext::start().await;

    // The mock only knows the email account, so a phone login is rejected,
    // but it must still reach the backend as a login attempt.
    let err = ctx
        .session
        .login("+56911112222", CUSTOMER_PASSWORD)
        .await
        .expect_err("unknown phone");
    assert!(matches!(err, StorefrontError::Unauthorized(_)));
    assert_eq!(ctx.backend.requests_to("POST", "/api/auth/login").len(), 1);
}

#[tokio::test]
async fn test_register_logs_in_new_account() {
    let ctx = TestContext::start().await;

    let user = ctx
        .session
        .register(RegisterRequest {
            email: Some("new@example.com".to_string()),
            password: "pw".to_string(),
            ..RegisterRequest::default()
        })
        .await
        .expect("registration succeeds");

    assert_eq!(user.email.as_deref(), Some("new@example.com"));
    assert!(ctx.session.is_authenticated().await);
}

#[tokio::test]
async fn test_register_conflict_surfaces_status() {
    let ctx = TestContext::start().await;

    let err = ctx
        .session
        .register(RegisterRequest {
            email: Some(CUSTOMER_EMAIL.to_string()),
            password: "pw".to_string(),
            ..RegisterRequest::default()
        })
        .await
        .expect_err("email taken");

    assert_eq!(err.status(), Some(409));
    assert!(!ctx.session.is_authenticated().await);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let ctx = TestContext::start().await;
    ctx.login().await;

    let restarted = ctx.restart().await;
    let snapshot = restarted.session.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.user, Some(customer()));

    restarted.session.refresh_user().await;
    assert_eq!(ctx.backend.requests_to("GET", "/api/users/me").len(), 1);
}

#[tokio::test]
async fn test_refresh_user_failure_keeps_session() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    let before = ctx.session.snapshot().await;
    ctx.backend.set_current_user_fails(true);

    ctx.session.refresh_user().await;

    assert_eq!(ctx.backend.requests_to("GET", "/api/users/me").len(), 1);
    assert_eq!(ctx.session.snapshot().await, before);
    assert!(ctx.api.credentials().has_access().await);
    let persisted = PersistedSession::load(&ctx.storage)
        .expect("readable")
        .expect("session still persisted");
    assert!(persisted.is_authenticated);
    assert_eq!(persisted.token.as_deref(), Some(LOGIN_ACCESS_TOKEN));
    assert_eq!(persisted.user, Some(customer()));
    assert_eq!(ctx.redirects.count(), 0);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let ctx = TestContext::start().await;
    ctx.login().await;

    ctx.session.logout().await;

    assert_eq!(ctx.session.snapshot().await, SessionSnapshot::default());
    assert!(!ctx.api.credentials().has_access().await);
    assert!(PersistedSession::load(&ctx.storage).expect("readable").is_none());

    let restarted = ctx.restart().await;
    assert!(!restarted.session.is_authenticated().await);
}
