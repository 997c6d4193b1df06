/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `households`: The caller's household and invitations out of it
/// - `users`: Household members, the caller's profile and invitations in

pub mod auth;
pub mod health;
pub mod households;
pub mod users;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use validator::Validate;

/// Collects `validator` failures as per-field details
pub(crate) fn field_errors<T: Validate>(req: &T) -> Vec<ValidationErrorDetail> {
    let Err(errors) = req.validate() else {
        return Vec::new();
    };

    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                ValidationErrorDetail::new(
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                )
            })
        })
        .collect()
}

/// Adds a field error when `value` is empty or whitespace-only
pub(crate) fn require_non_blank(
    details: &mut Vec<ValidationErrorDetail>,
    field: &str,
    value: &str,
    message: &str,
) {
    if value.trim().is_empty() {
        details.push(ValidationErrorDetail::new(field, message));
    }
}

/// Adds a field error when the trimmed `value` is longer than `max` characters
pub(crate) fn require_max_chars(
    details: &mut Vec<ValidationErrorDetail>,
    field: &str,
    value: &str,
    max: usize,
    message: &str,
) {
    if value.trim().chars().count() > max {
        details.push(ValidationErrorDetail::new(field, message));
    }
}

/// Fails with a 400 if any field error was collected
pub(crate) fn reject_invalid(mut details: Vec<ValidationErrorDetail>) -> ApiResult<()> {
    if details.is_empty() {
        return Ok(());
    }

    details.sort_by(|a, b| a.field.cmp(&b.field));
    Err(ApiError::ValidationError(details))
}
