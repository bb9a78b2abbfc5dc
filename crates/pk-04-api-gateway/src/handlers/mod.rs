//! HTTP handlers, one module per route group.
//!
//! | Group | Auth |
//! |-------|------|
//! | `/auth` | public, except `/auth/me` |
//! | `/parents/me/...` | bearer, Parent |
//! | `/teachers/me/...` | bearer, Teacher |
//! | `/notifications/...` | bearer |
//! | `/users/...` | bearer |

pub mod auth;
pub mod notifications;
pub mod parents;
pub mod teachers;
pub mod users;

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::{ApiError, ApiResult};
use pickup_types::NotificationType;
use pk_02_notifications::{ListFilter, PageRequest};

/// `Json` whose rejection renders as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection renders as an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejection renders as an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Listing query string: `?type=&isRead=&limit=&skip=`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_read: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl FeedParams {
    /// `isRead` is true only for the literal `"true"`.
    pub fn filter(&self) -> ApiResult<ListFilter> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<NotificationType>()
                    .map_err(|e| ApiError::missing("type", e))?,
            ),
        };
        Ok(ListFilter {
            kind,
            is_read: self.is_read.as_deref().map(|v| v == "true"),
        })
    }

    pub fn page(&self) -> PageRequest {
        PageRequest {
            limit: self.limit,
            skip: self.skip,
        }
    }
}

/// Extract a required field or fail with a field-level validation error.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::missing(field, format!("{} is required", field)))
}

/// Parse each id of a batch, dropping entries that are not valid ids.
pub(crate) fn parse_ids<T: FromStr>(raw: &[String]) -> Vec<T> {
    let ids: Vec<T> = raw.iter().filter_map(|s| s.trim().parse().ok()).collect();
    if ids.len() < raw.len() {
        debug!(skipped = raw.len() - ids.len(), "Dropped malformed ids from batch");
    }
    ids
}
