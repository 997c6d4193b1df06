/// PostgreSQL membership store
///
/// Thin adapter from [`MembershipStore`] to the model queries. Uniqueness is
/// enforced by the schema (`users_email_key`, `household_invitations_one_pending`),
/// so concurrent writers that both pass an application-level check still
/// cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MembershipStore, StoreResult};
use crate::db::pool;
use crate::models::household::{CreateHousehold, Household, HouseholdWithMembers};
use crate::models::invitation::{CreateInvitation, Invitation, InvitationDetails};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(pool::health_check(&self.pool).await?)
    }

    async fn create_household_with_owner(
        &self,
        household: CreateHousehold,
        owner: CreateUser,
    ) -> StoreResult<(Household, User)> {
        Ok(Household::create_with_owner(&self.pool, household, owner).await?)
    }

    async fn find_household(&self, id: Uuid) -> StoreResult<Option<Household>> {
        Ok(Household::find_by_id(&self.pool, id).await?)
    }

    async fn household_with_active_members(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<HouseholdWithMembers>> {
        Ok(Household::with_active_members(&self.pool, id).await?)
    }

    async fn rename_household(&self, id: Uuid, name: &str) -> StoreResult<Option<Household>> {
        Ok(Household::rename(&self.pool, id, name).await?)
    }

    async fn create_user(&self, user: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, user).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_active_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_active_by_id(&self.pool, id).await?)
    }

    async fn find_active_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_active_by_email(&self.pool, email).await?)
    }

    async fn find_active_user_in_household(
        &self,
        id: Uuid,
        household_id: Uuid,
    ) -> StoreResult<Option<User>> {
        Ok(User::find_active_in_household(&self.pool, id, household_id).await?)
    }

    async fn active_users_by_household(&self, household_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(User::list_active_by_household(&self.pool, household_id).await?)
    }

    async fn active_email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(User::active_email_exists(&self.pool, email).await?)
    }

    async fn email_exists_including_deleted(&self, email: &str) -> StoreResult<bool> {
        Ok(User::email_exists(&self.pool, email).await?)
    }

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(User::soft_delete(&self.pool, id).await?)
    }

    async fn create_invitation(&self, invitation: CreateInvitation) -> StoreResult<Invitation> {
        Ok(Invitation::create(&self.pool, invitation).await?)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_id(&self.pool, id).await?)
    }

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_token(&self.pool, token).await?)
    }

    async fn find_pending_invitation(
        &self,
        household_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_pending(&self.pool, household_id, invited_user_id).await?)
    }

    async fn expire_pending_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Invitation::expire_pending(&self.pool, now).await?)
    }

    async fn pending_invitations_for_user(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<InvitationDetails>> {
        Ok(Invitation::pending_for_user(&self.pool, invited_user_id, now).await?)
    }
}
