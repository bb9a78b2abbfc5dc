//! Success envelope shared by every JSON route.
//!
//! `{ "success": true, "message"?, "data"?, "token"?, "total"?, "unread"?,
//! "count"?, "modifiedCount"?, "deletedCount"? }`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unread: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_count: Option<usize>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: None,
            data: None,
            token: None,
            total: None,
            unread: None,
            count: None,
            modified_count: None,
            deleted_count: None,
        }
    }

    /// 201 Created
    pub fn created(mut self) -> Self {
        self.status = StatusCode::CREATED;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn unread(mut self, unread: Option<usize>) -> Self {
        self.unread = unread;
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl Envelope<()> {
    /// Envelope with a message and no data.
    pub fn notice(message: impl Into<String>) -> Self {
        Self::blank().message(message)
    }

    pub fn modified(mut self, n: usize) -> Self {
        self.modified_count = Some(n);
        self
    }

    pub fn deleted(mut self, n: usize) -> Self {
        self.deleted_count = Some(n);
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
