use admin_console::config::PlatformSettings;
use admin_console::services::api_client::ApiClient;
use admin_console::startup::build_router;
use admin_console::AppState;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Router against a platform URL nothing listens on. Routes that guard
/// before calling out stay fully testable this way.
fn test_app() -> Router {
    let api = Arc::new(ApiClient::new(PlatformSettings {
        url: "http://127.0.0.1:1".to_string(),
    }));
    build_router(AppState::new(api))
}

#[tokio::test]
async fn health_check_works() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn landing_page_renders() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_page_renders() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_dashboard_redirects_to_login() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
async fn anonymous_user_fragment_redirects_to_login() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/dashboard/users?page=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn anonymous_moderation_action_redirects_to_login() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/users/7/ban")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("user=%7B%7D&ban_reason=spam"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn metrics_endpoint_is_public() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
