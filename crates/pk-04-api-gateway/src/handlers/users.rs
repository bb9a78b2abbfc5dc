//! `/users/...`

use axum::extract::State;
use axum::Extension;

use super::ApiPath;
use crate::domain::{ApiResult, Envelope};
use crate::router::AppState;
use pickup_types::Identity;
use pk_01_identity::Caller;

/// `GET /users/profile`. Superseded by `/auth/me`.
pub async fn profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Envelope<Identity>> {
    Ok(Envelope::data(state.accounts.me(&caller).await?)
        .message("Please use /api/auth/me endpoint to get your profile"))
}

/// `GET /users/:id`. Only the caller's own id is readable.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Envelope<Identity>> {
    state.guard.check_ownership(&caller, &id)?;
    Ok(Envelope::data(state.accounts.me(&caller).await?))
}
