/// Registration and login
///
/// Registration always creates a fresh household for the new user; the two
/// rows are written together or not at all. Login never reveals whether an
/// email is registered: an unknown email and a wrong password fail the same way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{DomainError, DomainResult};
use crate::auth::jwt::TokenService;
use crate::auth::password::CredentialVerifier;
use crate::models::household::CreateHousehold;
use crate::models::user::{CreateUser, User, UserSummary};
use crate::store::{MembershipStore, USERS_EMAIL_KEY};

/// Input for registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Token plus the user it was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn MembershipStore>,
    credentials: Arc<dyn CredentialVerifier>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        credentials: Arc<dyn CredentialVerifier>,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            credentials,
            tokens,
        }
    }

    /// Registers a user in a new household named after them
    ///
    /// # Errors
    ///
    /// - `DuplicateEmail` if any account, including a deleted one, holds the email
    pub async fn register(&self, registration: Registration) -> DomainResult<AuthSession> {
        let Registration {
            first_name,
            last_name,
            email,
            password,
        } = registration;

        if self.store.email_exists_including_deleted(&email).await? {
            return Err(DomainError::DuplicateEmail(email));
        }

        let household = CreateHousehold::for_owner(&first_name, &last_name);
        let hashed_password = self.credentials.hash(&password)?;
        let owner = CreateUser {
            first_name,
            last_name,
            email: email.clone(),
            hashed_password,
            household_id: None,
        };

        let (household, user) = self
            .store
            .create_household_with_owner(household, owner)
            .await
            .map_err(|e| {
                if e.violates(USERS_EMAIL_KEY) {
                    DomainError::DuplicateEmail(email.clone())
                } else {
                    e.into()
                }
            })?;

        info!(user_id = %user.id, household_id = %household.id, "User registered");

        self.session_for(&user, household.id)
    }

    /// Authenticates an active user by email and password
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown email or a wrong password alike
    /// - `HouseholdNotFound` if the user currently has no household
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthSession> {
        let Some(user) = self.store.find_active_user_by_email(email).await? else {
            return Err(DomainError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &user.hashed_password)? {
            return Err(DomainError::InvalidCredentials);
        }

        let household_id = user.household_id.ok_or(DomainError::HouseholdNotFound)?;

        info!(user_id = %user.id, "User logged in");

        self.session_for(&user, household_id)
    }

    fn session_for(&self, user: &User, household_id: uuid::Uuid) -> DomainResult<AuthSession> {
        let token = self.tokens.issue(user.id, household_id, &user.email)?;

        Ok(AuthSession {
            token,
            user: user.summary(),
        })
    }
}
