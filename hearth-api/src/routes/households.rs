/// Household endpoints
///
/// Every handler scopes itself to the caller's household as carried by the
/// token; no household ID is ever read from the request.
///
/// # Endpoints
///
/// - `GET /api/households` - The caller's household and its members
/// - `PUT /api/households` - Rename the caller's household
/// - `POST /api/households/invitations` - Invite a user by email

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{field_errors, reject_invalid, require_non_blank},
};
use axum::{extract::State, http::StatusCode, Json};
use hearth_shared::auth::principal::Principal;
use hearth_shared::models::household::{HouseholdDetails, HouseholdUpdate};
use hearth_shared::models::invitation::InvitationDetails;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenameHouseholdRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateInvitationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

pub async fn get_household(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<HouseholdDetails>> {
    let household = state.households.get_household(principal.household_id).await?;

    Ok(Json(household))
}

/// Rename the caller's household
///
/// The name is trimmed and must be 1-100 characters. Validation messages:
/// "Name is required", "Name cannot be blank",
/// "Name cannot exceed 100 characters".
pub async fn update_household(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<RenameHouseholdRequest>,
) -> ApiResult<Json<HouseholdUpdate>> {
    let updated = state
        .households
        .rename_household(principal.household_id, &req.name)
        .await?;

    Ok(Json(updated))
}

/// Invite an existing user into the caller's household
///
/// # Response
///
/// `201 Created` with the invitation, status `PENDING`, expiring in 7 days.
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, already a member, or already invited
/// - `404 Not Found`: no active user with that email
pub async fn create_invitation(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationDetails>)> {
    let mut details = Vec::new();
    require_non_blank(&mut details, "email", &req.email, "Email is required");
    if details.is_empty() {
        details = field_errors(&req);
    }
    reject_invalid(details)?;

    let invitation = state
        .invitations
        .create_invitation(principal.household_id, principal.user_id, req.email.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(invitation)))
}
