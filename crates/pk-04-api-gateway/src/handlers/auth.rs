//! `/auth`: registration, login and the caller's own profile.

use axum::extract::State;
use axum::Extension;
use serde::Deserialize;
use tracing::info;

use super::ApiJson;
use crate::domain::{ApiResult, Envelope};
use crate::router::AppState;
use pickup_types::{Identity, Role};
use pk_01_identity::{Caller, EducatorRegistration, EducatorSummary, GuardianRegistration};
use pk_03_roster::InlineChild;

/// Guardian sign-up body: account fields plus optional inline children.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSignup {
    #[serde(flatten)]
    pub account: GuardianRegistration,
    #[serde(default)]
    pub children: Vec<InlineChild>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `GET /auth/teachers`
pub async fn list_teachers(
    State(state): State<AppState>,
) -> ApiResult<Envelope<Vec<EducatorSummary>>> {
    let teachers = state.accounts.list_educators().await?;
    let count = teachers.len();
    Ok(Envelope::data(teachers).count(count))
}

/// `POST /auth/register/parent`
pub async fn register_parent(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ParentSignup>,
) -> ApiResult<Envelope<Identity>> {
    InlineChild::validate_all(&body.children)?;
    let session = state.accounts.register_guardian(body.account).await?;

    let identity = if body.children.is_empty() {
        session.identity
    } else {
        state
            .roster
            .enroll_children(session.identity.id, &body.children)
            .await?;
        state
            .accounts
            .me(&Caller {
                id: session.identity.id,
                role: Role::Guardian,
            })
            .await?
    };

    info!(identity = %identity.id, children = body.children.len(), "Parent registered");
    Ok(Envelope::data(identity)
        .token(session.token)
        .message("Parent registered successfully")
        .created())
}

/// `POST /auth/register/teacher`
pub async fn register_teacher(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EducatorRegistration>,
) -> ApiResult<Envelope<Identity>> {
    let session = state.accounts.register_educator(body).await?;
    info!(identity = %session.identity.id, "Teacher registered");
    Ok(Envelope::data(session.identity)
        .token(session.token)
        .message("Teacher registered successfully")
        .created())
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Envelope<Identity>> {
    let session = state
        .accounts
        .login(body.email.as_deref(), body.password.as_deref())
        .await?;
    Ok(Envelope::data(session.identity)
        .token(session.token)
        .message("Login successful"))
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(state.accounts.me(&caller).await?))
}
