//! Route table and shared handler state.

use axum::extract::{DefaultBodyLimit, State};
use axum::middleware::map_response_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::config::GatewayConfig;
use crate::handlers::{auth, notifications, parents, teachers, users};
use crate::middleware::{create_cors_layer, redact_internal_errors, AuthLayer, TracingLayer};
use crate::ws::ws_upgrade;
use pickup_types::{Role, TimeSource};
use pk_01_identity::{
    AccountService, AuthGuard, InMemoryIdentityStore, Pbkdf2Hasher, TokenConfig, TokenIssuer,
};
use pk_02_notifications::{
    ConnectionRegistry, InMemoryNotificationStore, LedgerLimits, NotificationLedger,
};
use pk_03_roster::{InMemoryStudentStore, RosterService, StoreDirectory};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub roster: Arc<RosterService>,
    pub guard: Arc<AuthGuard>,
    pub registry: Arc<ConnectionRegistry>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Wire every service over the in-memory adapters.
    pub fn in_memory(config: GatewayConfig, clock: Arc<dyn TimeSource>) -> Self {
        let identities = Arc::new(InMemoryIdentityStore::new());
        let students = Arc::new(InMemoryStudentStore::new());
        let registry = Arc::new(ConnectionRegistry::new(config.websocket.buffer_size));

        let directory = Arc::new(StoreDirectory::new(identities.clone(), students.clone()));
        let ledger = Arc::new(
            NotificationLedger::new(
                Arc::new(InMemoryNotificationStore::new()),
                directory,
                registry.clone(),
                clock.clone(),
            )
            .with_limits(LedgerLimits {
                default_page_limit: config.limits.default_page_limit,
                max_page_limit: config.limits.max_page_limit,
                max_batch_size: config.limits.max_batch_size,
            }),
        );

        let issuer = Arc::new(TokenIssuer::new(
            TokenConfig {
                secret: config.auth.jwt_secret.clone(),
                issuer: config.auth.issuer.clone(),
                ttl: config.auth.token_ttl,
            },
            clock.clone(),
        ));
        let guard = Arc::new(AuthGuard::new(issuer.clone(), identities.clone()));
        let accounts = Arc::new(AccountService::new(
            identities.clone(),
            Arc::new(Pbkdf2Hasher::new(config.auth.hash_iterations)),
            issuer,
            clock.clone(),
        ));
        let roster = Arc::new(RosterService::new(students, identities, ledger, clock));

        Self {
            accounts,
            roster,
            guard,
            registry,
            config: Arc::new(config),
        }
    }
}

/// Build the full HTTP router: `/api/...`, `/health` and the WebSocket route.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let guard = Arc::clone(&state.guard);

    let auth_routes = Router::new()
        .route("/teachers", get(auth::list_teachers))
        .route("/register/parent", post(auth::register_parent))
        .route("/register/teacher", post(auth::register_teacher))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(AuthLayer::new(guard.clone())),
        );

    let parent_routes = Router::new()
        .route(
            "/me",
            get(parents::get_profile).put(parents::update_profile),
        )
        .route("/me/notifications", get(parents::inbox))
        .route("/me/notifications/send", post(parents::send_to_teacher))
        .route("/me/children", get(parents::list_children))
        .route("/me/children/attach", post(parents::attach_child))
        .route_layer(AuthLayer::require(guard.clone(), &[Role::Guardian]));

    let teacher_routes = Router::new()
        .route(
            "/me",
            get(teachers::get_profile).put(teachers::update_profile),
        )
        .route("/me/notifications", get(teachers::inbox))
        .route("/me/notifications/send", post(teachers::send_to_parent))
        .route(
            "/me/notifications/send-multiple",
            post(teachers::send_to_parents),
        )
        .route(
            "/me/students",
            get(teachers::list_students).post(teachers::create_student),
        )
        .route("/me/students/:student_id", get(teachers::get_student))
        .route(
            "/me/students/:student_id/release",
            post(teachers::release_student),
        )
        .route_layer(AuthLayer::require(guard.clone(), &[Role::Educator]));

    let notification_routes = Router::new()
        .route("/me", get(notifications::list_mine))
        .route("/read-multiple", put(notifications::mark_many_read))
        .route(
            "/multiple",
            axum::routing::delete(notifications::delete_many),
        )
        .route(
            "/:id",
            get(notifications::get_one).delete(notifications::delete_one),
        )
        .route("/:id/read", put(notifications::mark_read))
        .route_layer(AuthLayer::new(guard.clone()));

    let user_routes = Router::new()
        .route("/profile", get(users::profile))
        .route("/:id", get(users::get_user))
        .route_layer(AuthLayer::new(guard));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/parents", parent_routes)
        .nest("/teachers", teacher_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes);

    let mut app = Router::new()
        .nest("/api", api)
        .route("/health", get(health_check));
    if config.websocket.enabled {
        app = app.route(&config.websocket.path, get(ws_upgrade));
    }

    app.layer(map_response_with_state(
        config.environment,
        redact_internal_errors,
    ))
    .layer(DefaultBodyLimit::max(config.http.max_body_bytes))
    .layer(create_cors_layer(&config.cors))
    .layer(TracingLayer::new())
    .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": state.registry.connection_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use pickup_types::ManualTimeSource;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        state: AppState,
    }

    fn harness() -> Harness {
        let mut config = GatewayConfig::default();
        config.auth.hash_iterations = 1_000;
        let clock = Arc::new(ManualTimeSource::new(
            Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
        ));
        let state = AppState::in_memory(config, clock);
        Harness {
            app: build_router(state.clone()),
            state,
        }
    }

    impl Harness {
        async fn call(
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

        async fn register_teacher(&self, email: &str) -> (String, String) {
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
                        "subject": "Math",
                        "classes": ["5A"]
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            (
                body["token"].as_str().unwrap().to_string(),
                body["data"]["id"].as_str().unwrap().to_string(),
            )
        }

        async fn register_parent(&self, email: &str, extra: Value) -> (String, Value) {
            let mut payload = json!({
                "fullName": "Pat Parent",
                "email": email,
                "password": "secret-pw",
                "phoneNumber": "555-0199"
            });
            if let (Some(target), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
                target.extend(extra.clone());
            }
            let (status, body) = self
                .call(Method::POST, "/api/auth/register/parent", None, Some(payload))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            (body["token"].as_str().unwrap().to_string(), body["data"].clone())
        }
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, body) = h.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let h = harness();
        h.register_teacher("Tess@School.io").await;

        let (status, body) = h
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "tess@school.io", "password": "secret-pw" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = h.call(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["data"]["email"], "tess@school.io");
        assert_eq!(me["data"]["role"], "Teacher");
        assert!(me["data"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let h = harness();
        h.register_teacher("t@x.io").await;
        let (status, body) = h
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "t@x.io", "password": "nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_me_routes_require_token() {
        let h = harness();
        for uri in ["/api/auth/me", "/api/parents/me", "/api/teachers/me", "/api/notifications/me"] {
            let (status, body) = h.call(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["success"], false);
            assert!(body.get("data").is_none());
        }
    }

    #[tokio::test]
    async fn test_role_groups_are_enforced() {
        let h = harness();
        let (teacher, _) = h.register_teacher("t@x.io").await;
        let (status, _) = h.call(Method::GET, "/api/parents/me", Some(&teacher), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = h.call(Method::GET, "/api/teachers/me", Some(&teacher), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let h = harness();
        let (status, body) = h
            .call(
                Method::POST,
                "/api/auth/register/parent",
                None,
                Some(json!({ "fullName": "Pat" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["email", "password", "phoneNumber"]));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let h = harness();
        h.register_parent("p@x.io", json!({})).await;
        let (status, _) = h
            .call(
                Method::POST,
                "/api/auth/register/parent",
                None,
                Some(json!({
                    "fullName": "Again",
                    "email": "P@x.io",
                    "password": "pw",
                    "phoneNumber": "1"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_inline_children_join_teacher_roster() {
        let h = harness();
        let (teacher, teacher_id) = h.register_teacher("t@x.io").await;
        let (_, parent) = h
            .register_parent(
                "p@x.io",
                json!({
                    "children": [
                        { "fullName": "Kid One", "relation": "Mother", "teacherId": teacher_id },
                        { "fullName": "Kid Two" }
                    ]
                }),
            )
            .await;
        assert_eq!(parent["children"].as_array().unwrap().len(), 2);

        let (status, body) = h
            .call(Method::GET, "/api/teachers/me/students", Some(&teacher), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["fullName"], "Kid One");
        assert_eq!(body["data"][0]["relation"], "Mother");
    }

    #[tokio::test]
    async fn test_inline_child_without_name_creates_nothing() {
        let h = harness();
        let (status, body) = h
            .call(
                Method::POST,
                "/api/auth/register/parent",
                None,
                Some(json!({
                    "fullName": "Pat",
                    "email": "p@x.io",
                    "password": "pw",
                    "phoneNumber": "1",
                    "children": [{ "grade": "3" }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["children[0].fullName"]));
        assert!(h
            .state
            .accounts
            .store()
            .find_by_email("p@x.io")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_release_flow_over_http() {
        let h = harness();
        let (teacher, teacher_id) = h.register_teacher("t@x.io").await;
        let (parent, _) = h.register_parent("p@x.io", json!({})).await;

        let (status, student) = h
            .call(
                Method::POST,
                "/api/teachers/me/students",
                Some(&teacher),
                Some(json!({ "fullName": "Ada", "grade": "4" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let student_id = student["data"]["id"].as_str().unwrap().to_string();

        let (status, attached) = h
            .call(
                Method::POST,
                "/api/parents/me/children/attach",
                Some(&parent),
                Some(json!({ "studentId": student_id, "relation": "Father" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(attached["data"]["relation"], "Father");

        let release_uri = format!("/api/teachers/me/students/{}/release", student_id);
        let (status, body) = h.call(Method::POST, &release_uri, Some(&teacher), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "parent must send school_reached first");

        let (status, _) = h
            .call(
                Method::POST,
                "/api/parents/me/notifications/send",
                Some(&parent),
                Some(json!({
                    "teacherId": teacher_id,
                    "title": "Arrived",
                    "message": "At the gate",
                    "type": "school_reached",
                    "relatedStudent": student_id
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = h.call(Method::POST, &release_uri, Some(&teacher), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isReleased"], true);

        let (status, _) = h.call(Method::POST, &release_uri, Some(&teacher), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, inbox) = h
            .call(Method::GET, "/api/parents/me/notifications", Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inbox["total"], 1);
        assert_eq!(inbox["unread"], 1);
        assert_eq!(inbox["data"][0]["type"], "student_released");
        assert_eq!(inbox["data"][0]["priority"], "high");
        assert_eq!(inbox["data"][0]["relatedStudent"]["fullName"], "Ada");
    }

    #[tokio::test]
    async fn test_notification_read_and_delete() {
        let h = harness();
        let (teacher, _) = h.register_teacher("t@x.io").await;
        let (parent, parent_body) = h.register_parent("p@x.io", json!({})).await;
        let parent_id = parent_body["id"].as_str().unwrap().to_string();

        let (status, sent) = h
            .call(
                Method::POST,
                "/api/teachers/me/notifications/send",
                Some(&teacher),
                Some(json!({ "parentId": parent_id, "title": "Hi", "message": "Trip on Friday" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = sent["data"]["id"].as_str().unwrap().to_string();

        // Sender cannot mark as read.
        let read_uri = format!("/api/notifications/{}/read", id);
        let (status, _) = h.call(Method::PUT, &read_uri, Some(&teacher), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = h.call(Method::PUT, &read_uri, Some(&parent), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isRead"], true);

        let (status, body) = h
            .call(
                Method::PUT,
                "/api/notifications/read-multiple",
                Some(&teacher),
                Some(json!({ "notificationIds": [id] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["modifiedCount"], 0);

        let (status, _) = h
            .call(
                Method::PUT,
                "/api/notifications/read-multiple",
                Some(&teacher),
                Some(json!({})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = h
            .call(
                Method::DELETE,
                "/api/notifications/multiple",
                Some(&teacher),
                Some(json!({ "notificationIds": [id] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedCount"], 1);

        let (status, _) = h
            .call(Method::GET, &format!("/api/notifications/{}", id), Some(&parent), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_multiple_skips_unknown_parents() {
        let h = harness();
        let (teacher, _) = h.register_teacher("t@x.io").await;
        let (_, a) = h.register_parent("a@x.io", json!({})).await;
        let (_, b) = h.register_parent("b@x.io", json!({})).await;

        let (status, body) = h
            .call(
                Method::POST,
                "/api/teachers/me/notifications/send-multiple",
                Some(&teacher),
                Some(json!({
                    "parentIds": [a["id"], b["id"], pickup_types::IdentityId::new()],
                    "title": "Closure",
                    "message": "School closed tomorrow",
                    "type": "announcement"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_batches_ignore_malformed_ids() {
        let h = harness();
        let (teacher, _) = h.register_teacher("t@x.io").await;
        let (parent, parent_body) = h.register_parent("p@x.io", json!({})).await;
        let parent_id = parent_body["id"].as_str().unwrap().to_string();

        let (status, body) = h
            .call(
                Method::POST,
                "/api/teachers/me/notifications/send-multiple",
                Some(&teacher),
                Some(json!({
                    "parentIds": [parent_id, "garbage"],
                    "title": "Trip",
                    "message": "Museum on Friday"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["count"], 1);
        let id = body["data"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = h
            .call(
                Method::PUT,
                "/api/notifications/read-multiple",
                Some(&parent),
                Some(json!({ "notificationIds": [id, "garbage"] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["modifiedCount"], 1);

        let (status, body) = h
            .call(
                Method::DELETE,
                "/api/notifications/multiple",
                Some(&parent),
                Some(json!({ "notificationIds": ["garbage", id] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["deletedCount"], 1);

        let (status, body) = h
            .call(
                Method::POST,
                "/api/teachers/me/notifications/send-multiple",
                Some(&teacher),
                Some(json!({ "parentIds": ["garbage"], "title": "T", "message": "M" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_ill_typed_body_is_bad_request() {
        let h = harness();
        let (parent, _) = h.register_parent("p@x.io", json!({})).await;
        let (status, body) = h
            .call(
                Method::PUT,
                "/api/notifications/read-multiple",
                Some(&parent),
                Some(json!({ "notificationIds": "all" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_user_route_checks_ownership() {
        let h = harness();
        let (token, id) = h.register_teacher("t@x.io").await;
        let (status, _) = h
            .call(Method::GET, &format!("/api/users/{}", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let other = pickup_types::IdentityId::new();
        let (status, _) = h
            .call(Method::GET, &format!("/api/users/{}", other), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_ids_are_bad_requests() {
        let h = harness();
        let (teacher, _) = h.register_teacher("t@x.io").await;
        let (status, body) = h
            .call(Method::GET, "/api/teachers/me/students/not-a-uuid", Some(&teacher), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = h
            .call(
                Method::GET,
                "/api/notifications/me?limit=lots",
                Some(&teacher),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
