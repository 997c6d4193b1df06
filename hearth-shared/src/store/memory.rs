/// In-memory membership store
///
/// Holds every table in one `RwLock`, so each write (uniqueness check plus
/// insert) happens under a single exclusive lock and concurrent writers are
/// serialized the same way the PostgreSQL constraints serialize them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    MembershipStore, StoreError, StoreResult, INVITATION_TOKEN_KEY, ONE_PENDING_INVITATION,
    USERS_EMAIL_KEY,
};
use crate::models::household::{CreateHousehold, Household, HouseholdWithMembers};
use crate::models::invitation::{
    CreateInvitation, Invitation, InvitationDetails, InvitationStatus,
};
use crate::models::user::{CreateUser, User};

/// Compares emails the way a CITEXT column does, lowercasing both sides
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Default)]
struct Tables {
    households: HashMap<Uuid, Household>,
    users: HashMap<Uuid, User>,
    invitations: HashMap<Uuid, Invitation>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| same_email(&u.email, email))
    }

    fn insert_user(&mut self, data: CreateUser) -> StoreResult<User> {
        if self.email_taken(&data.email) {
            return Err(StoreError::unique(USERS_EMAIL_KEY));
        }
        if let Some(household_id) = data.household_id {
            if !self.households.contains_key(&household_id) {
                return Err(StoreError::MissingReference("users_household_id_fkey".to_string()));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            hashed_password: data.hashed_password,
            household_id: data.household_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.users.insert(user.id, user.clone());

        Ok(user)
    }

    fn active_user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id).filter(|u| u.is_active())
    }

    fn details(&self, invitation: &Invitation) -> Option<InvitationDetails> {
        let household = self.households.get(&invitation.household_id)?;
        let invitee = self.users.get(&invitation.invited_user_id)?;
        let inviter = self.users.get(&invitation.invited_by_user_id)?;

        Some(InvitationDetails::new(invitation, household, invitee, inviter))
    }
}

/// Process-local [`MembershipStore`]
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    tables: RwLock<Tables>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_household_with_owner(
        &self,
        household: CreateHousehold,
        mut owner: CreateUser,
    ) -> StoreResult<(Household, User)> {
        let mut tables = self.tables.write().await;

        // Checked before the household row exists so a failure leaves nothing behind.
        if tables.email_taken(&owner.email) {
            return Err(StoreError::unique(USERS_EMAIL_KEY));
        }

        let now = Utc::now();
        let household = Household {
            id: Uuid::new_v4(),
            name: household.name,
            created_at: now,
            updated_at: now,
        };
        tables.households.insert(household.id, household.clone());

        owner.household_id = Some(household.id);
        let user = tables.insert_user(owner)?;

        Ok((household, user))
    }

    async fn find_household(&self, id: Uuid) -> StoreResult<Option<Household>> {
        Ok(self.tables.read().await.households.get(&id).cloned())
    }

    async fn household_with_active_members(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<HouseholdWithMembers>> {
        let tables = self.tables.read().await;
        let Some(household) = tables.households.get(&id).cloned() else {
            return Ok(None);
        };

        let mut members: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.is_active() && u.household_id == Some(id))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(Some(HouseholdWithMembers { household, members }))
    }

    async fn rename_household(&self, id: Uuid, name: &str) -> StoreResult<Option<Household>> {
        let mut tables = self.tables.write().await;

        Ok(tables.households.get_mut(&id).map(|h| {
            h.name = name.to_string();
            h.updated_at = Utc::now();
            h.clone()
        }))
    }

    async fn create_user(&self, user: CreateUser) -> StoreResult<User> {
        self.tables.write().await.insert_user(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_active_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.active_user(id).cloned())
    }

    async fn find_active_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.is_active() && same_email(&u.email, email))
            .cloned())
    }

    async fn find_active_user_in_household(
        &self,
        id: Uuid,
        household_id: Uuid,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .active_user(id)
            .filter(|u| u.household_id == Some(household_id))
            .cloned())
    }

    async fn active_users_by_household(&self, household_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(self
            .household_with_active_members(household_id)
            .await?
            .map(|h| h.members)
            .unwrap_or_default())
    }

    async fn active_email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_active_user_by_email(email).await?.is_some())
    }

    async fn email_exists_including_deleted(&self, email: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.email_taken(email))
    }

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        match tables.users.get_mut(&id) {
            Some(user) if user.is_active() => {
                let now = Utc::now();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        let mut tables = self.tables.write().await;

        if !tables.households.contains_key(&data.household_id) {
            return Err(StoreError::MissingReference(
                "household_invitations_household_id_fkey".to_string(),
            ));
        }
        if !tables.users.contains_key(&data.invited_user_id)
            || !tables.users.contains_key(&data.invited_by_user_id)
        {
            return Err(StoreError::MissingReference(
                "household_invitations_user_fkey".to_string(),
            ));
        }

        let already_pending = tables.invitations.values().any(|i| {
            i.status == InvitationStatus::Pending
                && i.household_id == data.household_id
                && i.invited_user_id == data.invited_user_id
        });
        if already_pending {
            return Err(StoreError::unique(ONE_PENDING_INVITATION));
        }
        if tables.invitations.values().any(|i| i.token == data.token) {
            return Err(StoreError::unique(INVITATION_TOKEN_KEY));
        }

        let invitation = Invitation {
            id: Uuid::new_v4(),
            household_id: data.household_id,
            invited_user_id: data.invited_user_id,
            invited_by_user_id: data.invited_by_user_id,
            token: data.token,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            created_at: data.created_at,
            updated_at: data.created_at,
        };
        tables.invitations.insert(invitation.id, invitation.clone());

        Ok(invitation)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(self.tables.read().await.invitations.get(&id).cloned())
    }

    async fn find_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(self
            .tables
            .read()
            .await
            .invitations
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn find_pending_invitation(
        &self,
        household_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>> {
        Ok(self
            .tables
            .read()
            .await
            .invitations
            .values()
            .find(|i| {
                i.status == InvitationStatus::Pending
                    && i.household_id == household_id
                    && i.invited_user_id == invited_user_id
            })
            .cloned())
    }

    async fn expire_pending_invitations(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut expired = 0;

        for invitation in tables.invitations.values_mut() {
            if invitation.is_lapsed_at(now) {
                invitation.status = InvitationStatus::Expired;
                invitation.updated_at = now;
                expired += 1;
            }
        }

        Ok(expired)
    }

    async fn pending_invitations_for_user(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<InvitationDetails>> {
        let tables = self.tables.read().await;

        let mut open: Vec<&Invitation> = tables
            .invitations
            .values()
            .filter(|i| i.invited_user_id == invited_user_id && i.is_open_at(now))
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(open.into_iter().filter_map(|i| tables.details(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            household_id: None,
        }
    }

    async fn registered(store: &InMemoryMembershipStore, email: &str) -> (Household, User) {
        store
            .create_household_with_owner(CreateHousehold::for_owner("Test", "User"), new_user(email))
            .await
            .unwrap()
    }

    fn invite(household: &Household, invitee: &User, inviter: &User, at: DateTime<Utc>) -> CreateInvitation {
        CreateInvitation {
            household_id: household.id,
            invited_user_id: invitee.id,
            invited_by_user_id: inviter.id,
            token: format!("inv_{}", Uuid::new_v4().simple()),
            expires_at: at + Duration::days(7),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_registration_is_atomic_on_duplicate_email() {
        let store = InMemoryMembershipStore::new();
        registered(&store, "dup@example.com").await;

        let result = store
            .create_household_with_owner(CreateHousehold::for_owner("X", "Y"), new_user("DUP@example.com"))
            .await;

        assert!(result.unwrap_err().violates(USERS_EMAIL_KEY));
        assert_eq!(store.tables.read().await.households.len(), 1);
        assert_eq!(store.tables.read().await.users.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_users_keep_email_but_vanish_from_reads() {
        let store = InMemoryMembershipStore::new();
        let (household, user) = registered(&store, "gone@example.com").await;

        assert!(store.soft_delete_user(user.id).await.unwrap());
        assert!(!store.soft_delete_user(user.id).await.unwrap());

        assert!(store.email_exists_including_deleted("gone@example.com").await.unwrap());
        assert!(!store.active_email_exists("gone@example.com").await.unwrap());
        assert!(store.find_active_user(user.id).await.unwrap().is_none());
        assert!(store.find_user(user.id).await.unwrap().is_some());
        assert!(store
            .find_active_user_in_household(user.id, household.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.active_users_by_household(household.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = InMemoryMembershipStore::new();
        let (_, user) = registered(&store, "Mixed@Example.com").await;

        let found = store.find_active_user_by_email("mixed@example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_non_ascii_emails_fold_case() {
        let store = InMemoryMembershipStore::new();
        let (_, user) = registered(&store, "Élodie@Example.com").await;

        let found = store.find_active_user_by_email("élodie@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(store.email_exists_including_deleted("ÉLODIE@EXAMPLE.COM").await.unwrap());

        let err = store
            .create_household_with_owner(
                CreateHousehold::for_owner("Test", "User"),
                new_user("élodie@example.com"),
            )
            .await
            .unwrap_err();
        assert!(err.violates(USERS_EMAIL_KEY));
    }

    #[tokio::test]
    async fn test_household_scoped_lookup() {
        let store = InMemoryMembershipStore::new();
        let (home, alice) = registered(&store, "alice@example.com").await;
        let (other, bob) = registered(&store, "bob@example.com").await;

        assert!(store.find_active_user_in_household(alice.id, home.id).await.unwrap().is_some());
        assert!(store.find_active_user_in_household(bob.id, home.id).await.unwrap().is_none());
        assert!(store.find_active_user_in_household(Uuid::new_v4(), home.id).await.unwrap().is_none());
        assert!(store.find_active_user_in_household(bob.id, other.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_one_pending_invitation_per_pair() {
        let store = InMemoryMembershipStore::new();
        let (home, alice) = registered(&store, "alice@example.com").await;
        let (_, bob) = registered(&store, "bob@example.com").await;
        let now = Utc::now();

        store.create_invitation(invite(&home, &bob, &alice, now)).await.unwrap();
        let second = store.create_invitation(invite(&home, &bob, &alice, now)).await;
        assert!(second.unwrap_err().violates(ONE_PENDING_INVITATION));

        // Once expired, the pair may be invited again.
        store.expire_pending_invitations(now + Duration::days(8)).await.unwrap();
        assert!(store.create_invitation(invite(&home, &bob, &alice, now)).await.is_ok());
    }

    #[tokio::test]
    async fn test_expiry_sweep_is_idempotent() {
        let store = InMemoryMembershipStore::new();
        let (home, alice) = registered(&store, "alice@example.com").await;
        let (_, bob) = registered(&store, "bob@example.com").await;
        let created = Utc::now();

        let invitation = store.create_invitation(invite(&home, &bob, &alice, created)).await.unwrap();
        let later = created + Duration::days(8);

        assert_eq!(store.expire_pending_invitations(later).await.unwrap(), 1);
        assert_eq!(store.expire_pending_invitations(later).await.unwrap(), 0);

        let stored = store.find_invitation(invitation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
        assert_eq!(
            store.find_invitation_by_token(&invitation.token).await.unwrap().map(|i| i.id),
            Some(invitation.id)
        );
    }

    #[tokio::test]
    async fn test_pending_invitations_newest_first() {
        let store = InMemoryMembershipStore::new();
        let (first_home, alice) = registered(&store, "alice@example.com").await;
        let (second_home, carol) = registered(&store, "carol@example.com").await;
        let (_, bob) = registered(&store, "bob@example.com").await;
        let now = Utc::now();

        store
            .create_invitation(invite(&first_home, &bob, &alice, now - Duration::hours(2)))
            .await
            .unwrap();
        store
            .create_invitation(invite(&second_home, &bob, &carol, now - Duration::hours(1)))
            .await
            .unwrap();

        let pending = store.pending_invitations_for_user(bob.id, now).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].household_id, second_home.id);
        assert_eq!(pending[0].invited_by.id, carol.id);
        assert_eq!(pending[1].household_id, first_home.id);
        assert_eq!(pending[1].invited_email, "bob@example.com");
    }
}
