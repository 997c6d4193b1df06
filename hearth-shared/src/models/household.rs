/// Household model and database operations
///
/// A household is the tenant boundary. It is created implicitly when its first
/// member registers, and it owns its users through `users.household_id`.
/// Members are never walked implicitly; [`Household::with_active_members`] is
/// the explicit query for "household plus its current members".
///
/// # Schema
///
/// ```sql
/// CREATE TABLE households (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::user::{CreateUser, MemberSummary, User};

/// Maximum household name length, in characters
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a household
#[derive(Debug, Clone)]
pub struct CreateHousehold {
    pub name: String,
}

const OWNER_SUFFIX: &str = "'s Household";

impl CreateHousehold {
    /// The household every new registrant starts in
    ///
    /// The owner's name is cut short so the whole name stays within
    /// [`MAX_NAME_LENGTH`] characters.
    pub fn for_owner(first_name: &str, last_name: &str) -> Self {
        let owner = format!("{} {}", first_name, last_name);
        let room = MAX_NAME_LENGTH - OWNER_SUFFIX.chars().count();
        let owner: String = owner.chars().take(room).collect();

        Self {
            name: format!("{}{}", owner.trim_end(), OWNER_SUFFIX),
        }
    }
}

/// A household together with its active members
#[derive(Debug, Clone)]
pub struct HouseholdWithMembers {
    pub household: Household,
    pub members: Vec<User>,
}

/// Household page returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdDetails {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberSummary>,
    pub member_count: usize,
}

impl From<HouseholdWithMembers> for HouseholdDetails {
    fn from(value: HouseholdWithMembers) -> Self {
        let members: Vec<MemberSummary> = value
            .members
            .iter()
            .filter(|m| m.is_active())
            .map(User::member_summary)
            .collect();

        Self {
            id: value.household.id,
            name: value.household.name,
            created_at: value.household.created_at,
            member_count: members.len(),
            members,
        }
    }
}

/// Result of a rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdUpdate {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Household> for HouseholdUpdate {
    fn from(h: Household) -> Self {
        Self {
            id: h.id,
            name: h.name,
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

impl Household {
    pub async fn create<'e, E>(executor: E, data: CreateHousehold) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .fetch_one(executor)
        .await
    }

    /// Creates a household and its first member in one transaction
    ///
    /// Either both rows exist afterwards or neither does. The owner's
    /// `household_id` is overwritten with the new household's ID.
    pub async fn create_with_owner(
        pool: &PgPool,
        household: CreateHousehold,
        mut owner: CreateUser,
    ) -> Result<(Self, User), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let household = Self::create(&mut *tx, household).await?;
        owner.household_id = Some(household.id);
        let user = User::create(&mut *tx, owner).await?;

        tx.commit().await?;

        Ok((household, user))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM households
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads a household and its active members
    pub async fn with_active_members(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<HouseholdWithMembers>, sqlx::Error> {
        let Some(household) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let members = User::list_active_by_household(pool, id).await?;

        Ok(Some(HouseholdWithMembers { household, members }))
    }

    /// Renames a household; the name must already be validated and trimmed
    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Household>(
            r#"
            UPDATE households
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }
}
