/// Membership store abstraction
///
/// The core services depend on [`MembershipStore`], never on a concrete
/// database. Two implementations are provided:
///
/// - [`postgres::PgMembershipStore`]: production store on PostgreSQL
/// - [`memory::InMemoryMembershipStore`]: process-local store used by tests and
///   by `STORE_BACKEND=memory`
///
/// Both enforce the same two uniqueness rules and report them under the same
/// constraint names:
///
/// - [`USERS_EMAIL_KEY`]: email is unique across all users, deleted or not
/// - [`ONE_PENDING_INVITATION`]: at most one pending invitation per
///   (household, invited user)
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hearth_shared::store::{memory::InMemoryMembershipStore, MembershipStore};
///
/// let store: Arc<dyn MembershipStore> = Arc::new(InMemoryMembershipStore::new());
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::household::{CreateHousehold, Household, HouseholdWithMembers};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationDetails};
use crate::models::user::{CreateUser, User};

/// Unique constraint on `users.email`
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Partial unique index over pending invitations
pub const ONE_PENDING_INVITATION: &str = "household_invitations_one_pending";

/// Unique constraint on `household_invitations.token`
pub const INVITATION_TOKEN_KEY: &str = "household_invitations_token_key";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Referenced row does not exist
    #[error("Referenced record not found: {0}")]
    MissingReference(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn unique(constraint: &str) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    /// True if this error is a violation of the named constraint
    pub fn violates(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(
                    db_err.constraint().unwrap_or_default().to_string(),
                );
            }
        }

        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for users, households and invitations
///
/// Every "active" user read excludes soft-deleted accounts. Email comparisons
/// are case-insensitive.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Verifies the backing store is reachable
    async fn health_check(&self) -> StoreResult<()>;

    // Households

    /// Creates a household and its first member atomically
    async fn create_household_with_owner(
        &self,
        household: CreateHousehold,
        owner: CreateUser,
    ) -> StoreResult<(Household, User)>;

    async fn find_household(&self, id: Uuid) -> StoreResult<Option<Household>>;

    async fn household_with_active_members(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<HouseholdWithMembers>>;

    async fn rename_household(&self, id: Uuid, name: &str) -> StoreResult<Option<Household>>;

    // Users

    async fn create_user(&self, user: CreateUser) -> StoreResult<User>;

    /// Finds a user by ID, including soft-deleted ones
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_active_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_active_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Active user lookup scoped to a household
    async fn find_active_user_in_household(
        &self,
        id: Uuid,
        household_id: Uuid,
    ) -> StoreResult<Option<User>>;

    async fn active_users_by_household(&self, household_id: Uuid) -> StoreResult<Vec<User>>;

    async fn active_email_exists(&self, email: &str) -> StoreResult<bool>;

    async fn email_exists_including_deleted(&self, email: &str) -> StoreResult<bool>;

    /// Returns false if the user is missing or already deleted
    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // Invitations

    async fn create_invitation(&self, invitation: CreateInvitation) -> StoreResult<Invitation>;

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>>;

    async fn find_pending_invitation(
        &self,
        household_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>>;

    /// Transitions every pending invitation with `expires_at < now` to expired
    ///
    /// Returns the number of rows transitioned by this call.
    async fn expire_pending_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Pending invitations for a user with `expires_at >= now`, newest first
    async fn pending_invitations_for_user(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<InvitationDetails>>;
}
