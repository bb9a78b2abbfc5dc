//! Router harness shared by the integration flows.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use pickup_types::ManualTimeSource;
use pk_04_api_gateway::{build_router, AppState, GatewayConfig};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub clock: Arc<ManualTimeSource>,
}

/// A signed-in identity.
pub struct Session {
    pub token: String,
    pub id: String,
}

pub fn app() -> TestApp {
    app_with(GatewayConfig::default())
}

pub fn app_with(mut config: GatewayConfig) -> TestApp {
    config.auth.hash_iterations = 1_000;
    let clock = Arc::new(ManualTimeSource::new(
        Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
    ));
    let state = AppState::in_memory(config, clock.clone());
    TestApp {
        app: build_router(state.clone()),
        state,
        clock,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn teacher(&self, email: &str) -> Session {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register/teacher",
                None,
                Some(json!({
                    "fullName": "Tess Teacher",
                    "email": email,
                    "password": "secret-pw",
                    "phoneNumber": "555-0100",
                    "subject": "Science",
                    "classes": ["4B"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        session(&body)
    }

    pub async fn parent(&self, email: &str) -> Session {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register/parent",
                None,
                Some(json!({
                    "fullName": "Pat Parent",
                    "email": email,
                    "password": "secret-pw",
                    "phoneNumber": "555-0199",
                    "address": "1 Elm St"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        session(&body)
    }

    /// Student created by `teacher`; returns its id.
    pub async fn student(&self, teacher: &Session, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/teachers/me/students",
                &teacher.token,
                json!({ "fullName": name, "grade": "4" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn attach(&self, parent: &Session, student: &str) -> (StatusCode, Value) {
        self.post(
            "/api/parents/me/children/attach",
            &parent.token,
            json!({ "studentId": student, "relation": "Mother" }),
        )
        .await
    }

    pub async fn school_reached(
        &self,
        parent: &Session,
        teacher: &Session,
        student: &str,
    ) -> (StatusCode, Value) {
        self.post(
            "/api/parents/me/notifications/send",
            &parent.token,
            json!({
                "teacherId": teacher.id,
                "title": "Arrived",
                "message": "Waiting at the front gate",
                "type": "school_reached",
                "relatedStudent": student
            }),
        )
        .await
    }

    pub async fn release(&self, teacher: &Session, student: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            &format!("/api/teachers/me/students/{}/release", student),
            Some(&teacher.token),
            None,
        )
        .await
    }
}

fn session(body: &Value) -> Session {
    Session {
        token: body["token"].as_str().unwrap().to_string(),
        id: body["data"]["id"].as_str().unwrap().to_string(),
    }
}
