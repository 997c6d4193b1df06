/// Household invitation model and database operations
///
/// # Lifecycle
///
/// ```text
/// PENDING --> ACCEPTED
///         --> DECLINED
///         --> EXPIRED
/// ```
///
/// All three targets are terminal. A pending invitation whose `expires_at` has
/// passed is already expired in meaning; the `EXPIRED` status is written lazily
/// by [`Invitation::expire_pending`] the next time pending invitations are read.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'declined', 'expired');
///
/// CREATE TABLE household_invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     household_id UUID NOT NULL REFERENCES households(id) ON DELETE CASCADE,
///     invited_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invited_by_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token VARCHAR(64) NOT NULL UNIQUE,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX household_invitations_one_pending
///     ON household_invitations (household_id, invited_user_id)
///     WHERE status = 'pending';
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::household::Household;
use super::user::{MemberSummary, User};

/// How long an invitation stays open
pub fn invitation_ttl() -> Duration {
    Duration::days(7)
}

/// Prefix of every invitation token
pub const TOKEN_PREFIX: &str = "inv_";

/// Number of random base62 characters after the prefix
pub const TOKEN_RANDOM_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Declined => "DECLINED",
            InvitationStatus::Expired => "EXPIRED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub household_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by_user_id: Uuid,

    /// Opaque invitation credential; never accepted as an auth token
    #[serde(skip_serializing)]
    pub token: String,

    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// True if the invitation is pending and its deadline has not passed
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at >= now
    }

    /// True if the invitation is pending but past its deadline
    pub fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at < now
    }
}

/// Input for creating an invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub household_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by_user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Invitation as shown to the invited user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationDetails {
    pub id: Uuid,
    pub household_id: Uuid,
    pub household_name: String,
    pub invited_email: String,
    pub invited_by: MemberSummary,
    pub expires_at: DateTime<Utc>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

impl InvitationDetails {
    pub fn new(invitation: &Invitation, household: &Household, invitee: &User, inviter: &User) -> Self {
        Self {
            id: invitation.id,
            household_id: household.id,
            household_name: household.name.clone(),
            invited_email: invitee.email.clone(),
            invited_by: inviter.member_summary(),
            expires_at: invitation.expires_at,
            status: invitation.status,
            created_at: invitation.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InvitationDetailsRow {
    id: Uuid,
    household_id: Uuid,
    household_name: String,
    invited_email: String,
    inviter_id: Uuid,
    inviter_first_name: String,
    inviter_last_name: String,
    inviter_email: String,
    inviter_created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: InvitationStatus,
    created_at: DateTime<Utc>,
}

impl From<InvitationDetailsRow> for InvitationDetails {
    fn from(row: InvitationDetailsRow) -> Self {
        Self {
            id: row.id,
            household_id: row.household_id,
            household_name: row.household_name,
            invited_email: row.invited_email,
            invited_by: MemberSummary {
                id: row.inviter_id,
                first_name: row.inviter_first_name,
                last_name: row.inviter_last_name,
                email: row.inviter_email,
                joined_at: row.inviter_created_at,
            },
            expires_at: row.expires_at,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

const INVITATION_COLUMNS: &str = "id, household_id, invited_user_id, invited_by_user_id, token, \
                                  status, expires_at, created_at, updated_at";

impl Invitation {
    /// Inserts a new pending invitation
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `household_invitations_one_pending` if
    /// the pair already has a pending invitation.
    pub async fn create(pool: &PgPool, data: CreateInvitation) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO household_invitations \
                 (household_id, invited_user_id, invited_by_user_id, token, status, \
                  expires_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $6) \
             RETURNING {INVITATION_COLUMNS}"
        );

        sqlx::query_as::<_, Invitation>(&query)
            .bind(data.household_id)
            .bind(data.invited_user_id)
            .bind(data.invited_by_user_id)
            .bind(data.token)
            .bind(data.expires_at)
            .bind(data.created_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM household_invitations WHERE id = $1");

        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {INVITATION_COLUMNS} FROM household_invitations WHERE token = $1");

        sqlx::query_as::<_, Invitation>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Finds the pending invitation linking a household and a user, if any
    pub async fn find_pending(
        pool: &PgPool,
        household_id: Uuid,
        invited_user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM household_invitations \
             WHERE household_id = $1 AND invited_user_id = $2 AND status = 'pending'"
        );

        sqlx::query_as::<_, Invitation>(&query)
            .bind(household_id)
            .bind(invited_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks every pending invitation past its deadline as expired
    ///
    /// Idempotent: rows that are no longer pending are not matched, so
    /// concurrent sweeps never transition a row twice.
    pub async fn expire_pending(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE household_invitations
            SET status = 'expired', updated_at = $1
            WHERE status = 'pending' AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists a user's open invitations, newest first
    pub async fn pending_for_user(
        pool: &PgPool,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<InvitationDetails>, sqlx::Error> {
        let rows = sqlx::query_as::<_, InvitationDetailsRow>(
            r#"
            SELECT i.id, i.household_id, h.name AS household_name,
                   invitee.email::TEXT AS invited_email,
                   inviter.id AS inviter_id,
                   inviter.first_name AS inviter_first_name,
                   inviter.last_name AS inviter_last_name,
                   inviter.email::TEXT AS inviter_email,
                   inviter.created_at AS inviter_created_at,
                   i.expires_at, i.status, i.created_at
            FROM household_invitations i
            JOIN households h ON h.id = i.household_id
            JOIN users invitee ON invitee.id = i.invited_user_id
            JOIN users inviter ON inviter.id = i.invited_by_user_id
            WHERE i.invited_user_id = $1
              AND i.status = 'pending'
              AND i.expires_at >= $2
            ORDER BY i.created_at DESC, i.id DESC
            "#,
        )
        .bind(invited_user_id)
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(InvitationDetails::from).collect())
    }
}
