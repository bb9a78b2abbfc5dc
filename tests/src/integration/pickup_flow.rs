//! # Pickup Flow
//!
//! Arrival → release round trip between one Guardian and one Educator:
//!
//! ```text
//! Educator creates student ─► Guardian attaches ─► Guardian sends school_reached
//!        │                                                   │
//!        └────────────── release (today only) ◄──────────────┘
//!                             │
//!                             ▼
//!              student_released in the Guardian inbox
//! ```

use axum::http::StatusCode;
use chrono::Duration;
use futures::future::join_all;
use serde_json::json;

use super::harness::app;

#[tokio::test]
async fn test_arrival_then_release() {
    let t = app();
    let teacher = t.teacher("tess@school.io").await;
    let parent = t.parent("pat@home.io").await;
    let student = t.student(&teacher, "Ada Lovelace").await;

    let (status, _) = t.attach(&parent, &student).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, sent) = t.school_reached(&parent, &teacher, &student).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["data"]["type"], "school_reached");

    let (status, inbox) = t.get("/api/teachers/me/notifications", &teacher.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["total"], 1);
    assert_eq!(inbox["data"][0]["sender"]["fullName"], "Pat Parent");
    assert_eq!(inbox["data"][0]["relatedStudent"]["fullName"], "Ada Lovelace");

    let (status, released) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(released["message"], "Student released successfully");
    assert_eq!(released["data"]["isReleased"], true);
    assert_eq!(released["data"]["releasedBy"], json!(teacher.id));

    let (status, inbox) = t.get("/api/parents/me/notifications", &parent.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox["total"], 1);
    assert_eq!(inbox["unread"], 1);
    let notice = &inbox["data"][0];
    assert_eq!(notice["type"], "student_released");
    assert_eq!(notice["priority"], "high");
    assert_eq!(notice["title"], "Student Released");
    assert_eq!(notice["message"], "Ada Lovelace has been released");
}

#[tokio::test]
async fn test_second_release_conflicts_and_sends_nothing() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;
    t.attach(&parent, &student).await;
    t.school_reached(&parent, &teacher, &student).await;

    let (status, _) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "student already released");

    let (_, inbox) = t.get("/api/parents/me/notifications", &parent.token).await;
    assert_eq!(inbox["total"], 1);
}

#[tokio::test]
async fn test_concurrent_releases_commit_once() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;
    t.attach(&parent, &student).await;
    t.school_reached(&parent, &teacher, &student).await;

    let results = join_all((0..4).map(|_| t.release(&teacher, &student))).await;
    let ok = results.iter().filter(|(s, _)| *s == StatusCode::OK).count();
    let conflicts = results
        .iter()
        .filter(|(s, _)| *s == StatusCode::CONFLICT)
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 3);

    let (_, inbox) = t.get("/api/parents/me/notifications", &parent.token).await;
    assert_eq!(inbox["total"], 1);
}

#[tokio::test]
async fn test_arrival_from_an_earlier_day_does_not_count() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;
    t.attach(&parent, &student).await;
    t.school_reached(&parent, &teacher, &student).await;

    t.clock.advance(Duration::hours(49));

    let (status, body) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "parent must send school_reached first");
}

#[tokio::test]
async fn test_arrival_for_unclaimed_student_is_forbidden() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;

    let (status, _) = t.school_reached(&parent, &teacher, &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_teacher_cannot_release() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let stranger = t.teacher("s@x.io").await;
    let parent = t.parent("p@x.io").await;
    let student = t.student(&teacher, "Ada").await;
    t.attach(&parent, &student).await;
    t.school_reached(&parent, &stranger, &student).await;

    let (status, _) = t.release(&stranger, &student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Arrival went to the wrong Educator.
    let (status, _) = t.release(&teacher, &student).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attach_is_idempotent_and_exclusive() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let first = t.parent("first@x.io").await;
    let second = t.parent("second@x.io").await;
    let student = t.student(&teacher, "Ada").await;

    let (status, _) = t.attach(&first, &student).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.attach(&first, &student).await;
    assert_eq!(status, StatusCode::OK);

    let (_, children) = t.get("/api/parents/me/children", &first.token).await;
    assert_eq!(children["count"], 1);

    let (status, body) = t.attach(&second, &student).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Student is already linked to another parent");

    let (_, children) = t.get("/api/parents/me/children", &second.token).await;
    assert_eq!(children["count"], 0);
}

#[tokio::test]
async fn test_concurrent_attach_has_one_winner() {
    let t = app();
    let teacher = t.teacher("t@x.io").await;
    let a = t.parent("a@x.io").await;
    let b = t.parent("b@x.io").await;
    let student = t.student(&teacher, "Ada").await;

    let (ra, rb) = tokio::join!(t.attach(&a, &student), t.attach(&b, &student));
    let statuses = [ra.0, rb.0];
    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::CONFLICT));
}

#[tokio::test]
async fn test_attach_unknown_student_is_not_found() {
    let t = app();
    let parent = t.parent("p@x.io").await;
    let (status, _) = t
        .attach(&parent, &pickup_types::StudentId::new().to_string())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
