/// User endpoints
///
/// # Endpoints
///
/// - `GET /api/users` - Active members of the caller's household
/// - `GET /api/users/me` - The caller's profile
/// - `GET /api/users/me/invitations` - Open invitations addressed to the caller
/// - `GET /api/users/:id` - A member of the caller's household
/// - `DELETE /api/users/:id` - Soft-delete a member of the caller's household

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hearth_shared::auth::principal::Principal;
use hearth_shared::models::invitation::InvitationDetails;
use hearth_shared::models::user::UserSummary;
use hearth_shared::services::DomainError;
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = state.households.list_household_users(principal.household_id).await?;

    Ok(Json(users))
}

pub async fn get_me(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<UserSummary>> {
    let user = state.households.get_user_profile(principal.user_id).await?;

    Ok(Json(user))
}

/// Lists the caller's open invitations, newest first
///
/// Lapsed invitations anywhere in the system are marked expired before the
/// list is read.
pub async fn my_invitations(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<InvitationDetails>>> {
    let invitations = state.invitations.list_pending_invitations(principal.user_id).await?;

    Ok(Json(invitations))
}

fn parse_user_id(id: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(id).map_err(|_| DomainError::UserNotFound)
}

/// Fetch a user in the caller's household
///
/// An unknown ID, a malformed ID and a user in another household all return
/// the same `404`.
pub async fn get_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> ApiResult<Json<UserSummary>> {
    let user_id = parse_user_id(&id)?;

    let user = state
        .households
        .get_user_in_household(user_id, principal.household_id)
        .await?;

    Ok(Json(user))
}

/// Soft-delete a user in the caller's household
///
/// # Response
///
/// `204 No Content`. The deleted user's email stays reserved.
///
/// # Errors
///
/// - `404 Not Found`: unknown, malformed, already deleted, or in another household
pub async fn delete_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = parse_user_id(&id)?;

    state
        .households
        .delete_user(user_id, principal.household_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
