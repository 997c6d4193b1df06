/// User model and database operations
///
/// A user belongs to at most one household. Accounts are soft-deleted by
/// setting `deleted_at`; a deleted user is invisible to every membership and
/// auth read, yet still holds its email address in the uniqueness namespace.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email CITEXT NOT NULL,
///     hashed_password VARCHAR(255) NOT NULL,
///     household_id UUID REFERENCES households(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ,
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use hearth_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_active_by_email(&pool, "user@example.com").await? {
///     println!("Found {}", user.full_name());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// SQL predicate selecting users that have not been soft-deleted
///
/// Every "active" query below goes through this fragment.
pub const ACTIVE_USER: &str = "deleted_at IS NULL";

const USER_COLUMNS: &str = "id, first_name, last_name, email::TEXT AS email, hashed_password, \
                            household_id, created_at, updated_at, deleted_at";

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,

    /// Email address (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id PHC string
    pub hashed_password: String,

    /// Current household, if any
    pub household_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub hashed_password: String,

    pub household_id: Option<Uuid>,
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub household_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A household member as listed on the household page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl User {
    /// The single soft-delete predicate for in-process filtering
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            household_id: self.household_id,
            created_at: self.created_at,
        }
    }

    pub fn member_summary(&self) -> MemberSummary {
        MemberSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            joined_at: self.created_at,
        }
    }

    /// Creates a new user
    ///
    /// Accepts any executor so it can run inside the registration transaction.
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `users_email_key` if the email is taken,
    /// including by a soft-deleted account.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (first_name, last_name, email, hashed_password, household_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.email)
            .bind(data.hashed_password)
            .bind(data.household_id)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID, deleted or not
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active user by ID
    pub async fn find_active_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND {ACTIVE_USER}");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active user by email (case-insensitive)
    pub async fn find_active_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext AND {ACTIVE_USER}");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds an active user, but only if they belong to `household_id`
    ///
    /// A user in another household and a user that does not exist both
    /// produce `None`.
    pub async fn find_active_in_household(
        pool: &PgPool,
        id: Uuid,
        household_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE id = $1 AND household_id = $2 AND {ACTIVE_USER}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(household_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the active members of a household, oldest first
    pub async fn list_active_by_household(
        pool: &PgPool,
        household_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE household_id = $1 AND {ACTIVE_USER} \
             ORDER BY created_at ASC, id ASC"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(household_id)
            .fetch_all(pool)
            .await
    }

    /// Returns true if an active user holds this email
    pub async fn active_email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1::citext AND {ACTIVE_USER})");

        sqlx::query_scalar(&query).bind(email).fetch_one(pool).await
    }

    /// Returns true if any user, including soft-deleted ones, holds this email
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1::citext)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Soft-deletes a user
    ///
    /// Returns false if the user does not exist or was already deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND {ACTIVE_USER}"
        );

        let result = sqlx::query(&query).bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            hashed_password: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            household_id: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_is_active_follows_deleted_at() {
        let mut u = user();
        assert!(u.is_active());

        u.deleted_at = Some(Utc::now());
        assert!(!u.is_active());
    }

    #[test]
    fn test_summary_serializes_camel_case_without_password() {
        let u = user();
        let json = serde_json::to_value(u.summary()).unwrap();

        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Doe");
        assert_eq!(json["householdId"], u.household_id.unwrap().to_string());
        assert!(json.get("hashedPassword").is_none());
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn test_member_summary_joined_at_is_created_at() {
        let u = user();
        let member = u.member_summary();

        assert_eq!(member.joined_at, u.created_at);
        assert_eq!(u.full_name(), "Jane Doe");
    }
}
