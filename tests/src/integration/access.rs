//! # Access Control
//!
//! Authentication, role groups and per-record ownership as seen by clients.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

use super::harness::{app, app_with};
use pk_04_api_gateway::GatewayConfig;

#[tokio::test]
async fn test_unauthenticated_me_is_rejected() {
    let t = app();
    let (status, body) = t.call(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_tampered_and_expired_tokens() {
    let t = app();
    let parent = t.parent("p@x.io").await;

    let tampered = format!("{}x", parent.token);
    let (status, _) = t.get("/api/auth/me", &tampered).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.get("/api/auth/me", &parent.token).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(Duration::days(8));
    let (status, body) = t.get("/api/auth/me", &parent.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
}

#[tokio::test]
async fn test_role_groups() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;

    let (status, _) = t.get("/api/teachers/me/students", &parent.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.get("/api/parents/me/children", &teacher.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Shared groups accept both roles.
    for session in [&teacher, &parent] {
        let (status, _) = t.get("/api/notifications/me", &session.token).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = t.get("/api/users/profile", &session.token).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_notifications_are_private_to_their_parties() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let outsider = t.parent("o@x.io").await;

    let (_, sent) = t
        .post(
            "/api/teachers/me/notifications/send",
            &teacher.token,
            json!({ "parentId": parent.id, "title": "Note", "message": "Bring a coat" }),
        )
        .await;
    let uri = format!("/api/notifications/{}", sent["data"]["id"].as_str().unwrap());

    let (status, _) = t.get(&uri, &teacher.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.get(&uri, &parent.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.get(&uri, &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .call(Method::DELETE, &uri, Some(&outsider.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listing) = t.get("/api/notifications/me", &outsider.token).await;
    assert_eq!(listing["total"], 0);
}

#[tokio::test]
async fn test_students_are_scoped_to_their_teacher() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let other = t.teacher("other@x.io").await;
    let student = t.student(&teacher, "Ada").await;

    let uri = format!("/api/teachers/me/students/{}", student);
    let (status, body) = t.get(&uri, &teacher.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "Ada");

    let (status, _) = t.get(&uri, &other.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listing) = t.get("/api/teachers/me/students", &other.token).await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn test_teacher_directory_is_public() {
    let t = app();
    t.teacher("t@x.io").await;
    let (status, body) = t.call(Method::GET, "/api/auth/teachers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert!(body["data"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = GatewayConfig::default();
    config.http.max_body_bytes = 256;
    let t = app_with(config);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "a@x.io", "password": "p".repeat(1024) }).to_string(),
        ))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let t = app();
    let (status, _) = t.call(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
