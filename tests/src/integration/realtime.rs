//! # Live Delivery
//!
//! Notifications committed over HTTP reach every connection joined under the
//! recipient identity, and nobody else.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use super::harness::{app, Session, TestApp};
use pickup_types::IdentityId;
use pk_04_api_gateway::WebSocketSession;

fn identity(session: &Session) -> IdentityId {
    IdentityId::parse(&session.id).unwrap()
}

async fn message_parent(t: &TestApp, teacher: &Session, parent: &Session, title: &str) -> String {
    let (status, body) = t
        .post(
            "/api/teachers/me/notifications/send",
            &teacher.token,
            json!({ "parentId": parent.id, "title": title, "message": "See you at 3pm" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_joined_connection_receives_new_notification() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;

    let registry = Arc::clone(&t.state.registry);
    let (conn, mut rx) = registry.connect();
    assert!(registry.join(conn, identity(&parent)));

    let id = message_parent(&t, &teacher, &parent, "Pickup").await;

    let view = rx.try_recv().unwrap();
    assert_eq!(view.id.to_string(), id);
    assert_eq!(view.title, "Pickup");
    assert_eq!(view.sender.full_name, "Tess Teacher");
    assert!(!view.is_read);
}

#[tokio::test]
async fn test_every_connection_of_the_recipient_is_notified() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let other = t.parent("o@x.io").await;

    let registry = Arc::clone(&t.state.registry);
    let (phone, mut phone_rx) = registry.connect();
    let (laptop, mut laptop_rx) = registry.connect();
    let (bystander, mut bystander_rx) = registry.connect();
    registry.join(phone, identity(&parent));
    registry.join(laptop, identity(&parent));
    registry.join(bystander, identity(&other));

    message_parent(&t, &teacher, &parent, "Hello").await;

    assert!(phone_rx.try_recv().is_ok());
    assert!(laptop_rx.try_recv().is_ok());
    assert!(bystander_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_connection_stops_receiving() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;

    let registry = Arc::clone(&t.state.registry);
    let (conn, mut rx) = registry.connect();
    registry.join(conn, identity(&parent));
    registry.remove_connection(conn);
    assert_eq!(registry.listeners(identity(&parent)), 0);

    // Nobody listening; the send still commits.
    let id = message_parent(&t, &teacher, &parent, "Offline").await;
    assert!(rx.try_recv().is_err());

    let (status, body) = t
        .get(&format!("/api/notifications/{}", id), &parent.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Offline");
}

#[tokio::test]
async fn test_session_join_then_release_notice_is_pushed() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;
    t.attach(&parent, &student).await;
    t.school_reached(&parent, &teacher, &student).await;

    let registry = Arc::clone(&t.state.registry);
    let session = WebSocketSession::new(
        Arc::clone(&registry),
        Arc::clone(&t.state.guard),
        true,
        Duration::from_secs(30),
    );
    let (conn, mut rx) = registry.connect();
    let frame = json!({ "event": "join", "userId": parent.id, "token": parent.token });
    let reply = session.handle_text(conn, &frame.to_string()).await;
    assert_eq!(serde_json::to_value(&reply).unwrap()["event"], "joined");

    let (status, _) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::OK);

    let view = rx.try_recv().unwrap();
    assert_eq!(
        serde_json::to_value(view.as_ref()).unwrap()["type"],
        "student_released"
    );
}

#[tokio::test]
async fn test_session_refuses_someone_elses_identity() {
    let t = app();
    let parent = t.parent("p@x.io").await;
    let other = t.parent("o@x.io").await;

    let registry = Arc::clone(&t.state.registry);
    let session = WebSocketSession::new(
        Arc::clone(&registry),
        Arc::clone(&t.state.guard),
        true,
        Duration::from_secs(30),
    );
    let (conn, _rx) = registry.connect();
    let frame = json!({ "event": "join", "userId": other.id, "token": parent.token });
    let reply = session.handle_text(conn, &frame.to_string()).await;

    assert_eq!(serde_json::to_value(&reply).unwrap()["event"], "error");
    assert_eq!(registry.listeners(identity(&other)), 0);
}
