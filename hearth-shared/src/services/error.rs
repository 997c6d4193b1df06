/// Domain errors raised by the core services
///
/// These describe business-rule outcomes only. Mapping them to transport
/// status codes belongs to the adapter; nothing here knows about HTTP.

use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    /// Covers both "no such active user" and "wrong password"
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Household not found")]
    HouseholdNotFound,

    #[error("User already belongs to your household")]
    AlreadyMember,

    #[error("Active invitation already exists for this user")]
    DuplicateInvitation,

    #[error("{0}")]
    InvalidName(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    /// Storage or infrastructure failure; the message is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        tracing::warn!(error = %err, "Membership store failure");
        DomainError::Internal(err.to_string())
    }
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => DomainError::Unauthenticated,
            TokenError::CreateError(msg) => DomainError::Internal(msg),
        }
    }
}

impl From<PasswordError> for DomainError {
    fn from(err: PasswordError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
