//! `/parents/me/...`, Guardian-only.

use axum::extract::State;
use axum::Extension;
use serde::Deserialize;

use super::{required, ApiJson, ApiQuery, FeedParams};
use crate::domain::{ApiResult, Envelope};
use crate::router::AppState;
use pickup_types::{Identity, IdentityId, Role, Student, StudentId};
use pk_01_identity::{Caller, GuardianUpdate};
use pk_02_notifications::{NotificationDraft, NotificationView};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToTeacher {
    pub teacher_id: Option<IdentityId>,
    #[serde(flatten)]
    pub draft: NotificationDraft,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub student_id: Option<StudentId>,
    pub relation: Option<String>,
}

/// `GET /parents/me`
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(
        state.accounts.profile(&caller, Role::Guardian).await?,
    ))
}

/// `PUT /parents/me`
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(update): ApiJson<GuardianUpdate>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(
        state
            .accounts
            .update_guardian_profile(&caller, update)
            .await?,
    ))
}

/// `GET /parents/me/children`
pub async fn list_children(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Vec<Student>>> {
    let children = state.roster.list_children(&caller).await?;
    let count = children.len();
    Ok(Envelope::data(children).count(count))
}

/// `POST /parents/me/children/attach`
pub async fn attach_child(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<AttachRequest>,
) -> ApiResult<Envelope<Student>> {
    let student_id = required(body.student_id, "studentId")?;
    let student = state
        .roster
        .attach_student(&caller, student_id, body.relation)
        .await?;
    Ok(Envelope::data(student).message("Student attached successfully"))
}

/// `GET /parents/me/notifications`
pub async fn inbox(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<FeedParams>,
) -> ApiResult<Envelope<Vec<NotificationView>>> {
    let page = state
        .roster
        .ledger()
        .list_inbox(caller.party(), params.filter()?, params.page())
        .await?;
    Ok(Envelope::data(page.items)
        .total(page.total)
        .unread(page.unread))
}

/// `POST /parents/me/notifications/send`
pub async fn send_to_teacher(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<SendToTeacher>,
) -> ApiResult<Envelope<NotificationView>> {
    let teacher = required(body.teacher_id, "teacherId")?;
    let view = state
        .roster
        .send_from_guardian(&caller, teacher, body.draft)
        .await?;
    Ok(Envelope::data(view).created())
}
