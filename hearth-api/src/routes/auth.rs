/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a user and their household
/// - `POST /api/auth/login` - Exchange email and password for a token

use crate::{
    app::AppState,
    error::ApiResult,
    routes::{field_errors, reject_invalid, require_max_chars, require_non_blank},
};
use axum::{extract::State, http::StatusCode, Json};
use hearth_shared::services::{AuthSession, Registration};
use serde::Deserialize;
use validator::Validate;

const MAX_NAME_CHARS: usize = 100;

/// Register request
///
/// Missing fields deserialize as empty strings so they are reported as
/// validation failures rather than body rejections. Names are checked by
/// hand so their errors carry the camelCase field names.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,

    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "firstName": "John",
///   "lastName": "Doe",
///   "email": "john@example.com",
///   "password": "password123"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "token": "eyJ...", "user": { ... } }`
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let mut details = field_errors(&req);
    require_non_blank(&mut details, "firstName", &req.first_name, "First name is required");
    require_max_chars(
        &mut details,
        "firstName",
        &req.first_name,
        MAX_NAME_CHARS,
        "First name must be at most 100 characters",
    );
    require_non_blank(&mut details, "lastName", &req.last_name, "Last name is required");
    require_max_chars(
        &mut details,
        "lastName",
        &req.last_name,
        MAX_NAME_CHARS,
        "Last name must be at most 100 characters",
    );
    reject_invalid(details)?;

    let session = state
        .auth
        .register(Registration {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Login
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "john@example.com", "password": "password123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials, identical for an unknown email
///   and a wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    let mut details = field_errors(&req);
    require_non_blank(&mut details, "password", &req.password, "Password is required");
    reject_invalid(details)?;

    let session = state.auth.login(req.email.trim(), &req.password).await?;

    Ok(Json(session))
}
