//! `/teachers/me/...`, Educator-only.

use axum::extract::State;
use axum::Extension;
use serde::Deserialize;

use super::{parse_ids, required, ApiJson, ApiPath, ApiQuery, FeedParams};
use crate::domain::{ApiError, ApiResult, Envelope};
use crate::router::AppState;
use pickup_types::{Identity, IdentityId, Party, Role, Student, StudentId};
use pk_01_identity::{Caller, EducatorUpdate};
use pk_02_notifications::{NotificationDraft, NotificationView};
use pk_03_roster::NewStudent;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToParent {
    pub parent_id: Option<IdentityId>,
    #[serde(flatten)]
    pub draft: NotificationDraft,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToParents {
    pub parent_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub draft: NotificationDraft,
}

/// `GET /teachers/me`
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(
        state.accounts.profile(&caller, Role::Educator).await?,
    ))
}

/// `PUT /teachers/me`
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(update): ApiJson<EducatorUpdate>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(
        state
            .accounts
            .update_educator_profile(&caller, update)
            .await?,
    ))
}

/// `GET /teachers/me/notifications`
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

/// `POST /teachers/me/notifications/send`
pub async fn send_to_parent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<SendToParent>,
) -> ApiResult<Envelope<NotificationView>> {
    let parent = required(body.parent_id, "parentId")?;
    let view = state
        .roster
        .ledger()
        .send(caller.party(), Party::guardian(parent), body.draft)
        .await?;
    Ok(Envelope::data(view).created())
}

/// `POST /teachers/me/notifications/send-multiple`
pub async fn send_to_parents(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<SendToParents>,
) -> ApiResult<Envelope<Vec<NotificationView>>> {
    let raw = body
        .parent_ids
        .ok_or_else(|| ApiError::missing("parentIds", "Parent IDs array is required"))?;
    let recipients: Vec<Party> = parse_ids::<IdentityId>(&raw)
        .into_iter()
        .map(Party::guardian)
        .collect();
    if recipients.is_empty() && !raw.is_empty() {
        return Ok(Envelope::data(Vec::new()).count(0).created());
    }
    let created = state
        .roster
        .ledger()
        .send_many(caller.party(), &recipients, body.draft)
        .await?;
    let count = created.len();
    Ok(Envelope::data(created).count(count).created())
}

/// `GET /teachers/me/students`
pub async fn list_students(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Vec<Student>>> {
    let students = state.roster.list_students(&caller).await?;
    let count = students.len();
    Ok(Envelope::data(students).count(count))
}

/// `POST /teachers/me/students`
pub async fn create_student(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<NewStudent>,
) -> ApiResult<Envelope<Student>> {
    let student = state.roster.create_student(&caller, body).await?;
    Ok(Envelope::data(student)
        .message("Student created successfully")
        .created())
}

/// `GET /teachers/me/students/:student_id`
pub async fn get_student(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(student_id): ApiPath<StudentId>,
) -> ApiResult<Envelope<Student>> {
    Ok(Envelope::data(
        state.roster.get_student(&caller, student_id).await?,
    ))
}

/// `POST /teachers/me/students/:student_id/release`
pub async fn release_student(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(student_id): ApiPath<StudentId>,
) -> ApiResult<Envelope<Student>> {
    let student = state.roster.release(&caller, student_id).await?;
    Ok(Envelope::data(student).message("Student released successfully"))
}
