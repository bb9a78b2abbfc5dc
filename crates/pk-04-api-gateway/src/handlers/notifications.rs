//! `/notifications/...`, any authenticated caller, scoped to notifications
//! the caller sent or received.

use axum::extract::State;
use axum::Extension;
use serde::Deserialize;

use super::{parse_ids, ApiJson, ApiPath, ApiQuery, FeedParams};
use crate::domain::{ApiError, ApiResult, Envelope};
use crate::router::AppState;
use pickup_types::NotificationId;
use pk_01_identity::Caller;
use pk_02_notifications::NotificationView;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdBatch {
    pub notification_ids: Option<Vec<String>>,
}

impl IdBatch {
    /// Well-formed ids of the batch; malformed entries match nothing.
    fn ids(self) -> Result<Vec<NotificationId>, ApiError> {
        self.notification_ids
            .map(|raw| parse_ids(&raw))
            .ok_or_else(|| {
                ApiError::missing("notificationIds", "Notification IDs array is required")
            })
    }
}

/// `GET /notifications/me`
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<FeedParams>,
) -> ApiResult<Envelope<Vec<NotificationView>>> {
    let page = state
        .roster
        .ledger()
        .list_for_user(caller.id, params.filter()?, params.page())
        .await?;
    Ok(Envelope::data(page.items).total(page.total))
}

/// `GET /notifications/:id`
pub async fn get_one(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Envelope<NotificationView>> {
    Ok(Envelope::data(
        state.roster.ledger().get(id, caller.id).await?,
    ))
}

/// `PUT /notifications/:id/read`
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Envelope<NotificationView>> {
    Ok(Envelope::data(
        state.roster.ledger().mark_read(id, caller.id).await?,
    ))
}

/// `PUT /notifications/read-multiple`
pub async fn mark_many_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<IdBatch>,
) -> ApiResult<Envelope<()>> {
    let ids = body.ids()?;
    let n = state.roster.ledger().mark_many_read(&ids, caller.id).await?;
    Ok(Envelope::notice(format!("{} notifications marked as read", n)).modified(n))
}

/// `DELETE /notifications/:id`
pub async fn delete_one(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Envelope<()>> {
    state.roster.ledger().delete(id, caller.id).await?;
    Ok(Envelope::notice("Notification deleted successfully"))
}

/// `DELETE /notifications/multiple`
pub async fn delete_many(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<IdBatch>,
) -> ApiResult<Envelope<()>> {
    let ids = body.ids()?;
    let n = state.roster.ledger().delete_many(&ids, caller.id).await?;
    Ok(Envelope::notice(format!("{} notifications deleted", n)).deleted(n))
}
