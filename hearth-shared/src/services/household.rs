/// Household-scoped reads and writes
///
/// Every method takes the caller's household from the [`Principal`], never
/// from request input. A user outside that household is reported exactly like
/// a user that does not exist.
///
/// [`Principal`]: crate::auth::principal::Principal

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::error::{DomainError, DomainResult};
use crate::models::household::{HouseholdDetails, HouseholdUpdate, MAX_NAME_LENGTH};
use crate::models::user::UserSummary;
use crate::store::MembershipStore;

/// Trims and checks a household name
///
/// Returns the trimmed name, or `InvalidName` with a message that tells empty,
/// blank and over-long input apart.
pub fn validate_household_name(raw: &str) -> DomainResult<String> {
    if raw.is_empty() {
        return Err(DomainError::InvalidName("Name is required".to_string()));
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName("Name cannot be blank".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "Name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct HouseholdService {
    store: Arc<dyn MembershipStore>,
}

impl HouseholdService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Household plus its active members
    pub async fn get_household(&self, household_id: Uuid) -> DomainResult<HouseholdDetails> {
        self.store
            .household_with_active_members(household_id)
            .await?
            .map(HouseholdDetails::from)
            .ok_or(DomainError::HouseholdNotFound)
    }

    pub async fn rename_household(
        &self,
        household_id: Uuid,
        new_name: &str,
    ) -> DomainResult<HouseholdUpdate> {
        let name = validate_household_name(new_name)?;

        let household = self
            .store
            .rename_household(household_id, &name)
            .await?
            .ok_or(DomainError::HouseholdNotFound)?;

        info!(household_id = %household.id, "Household renamed");

        Ok(household.into())
    }

    /// Looks up a user, but only within the caller's household
    pub async fn get_user_in_household(
        &self,
        user_id: Uuid,
        household_id: Uuid,
    ) -> DomainResult<UserSummary> {
        self.store
            .find_active_user_in_household(user_id, household_id)
            .await?
            .map(|u| u.summary())
            .ok_or(DomainError::UserNotFound)
    }

    pub async fn list_household_users(&self, household_id: Uuid) -> DomainResult<Vec<UserSummary>> {
        let users = self.store.active_users_by_household(household_id).await?;

        Ok(users.iter().map(|u| u.summary()).collect())
    }

    /// Soft-deletes a user in the caller's household
    ///
    /// The email stays reserved. A user in another household is reported as
    /// `UserNotFound`, the same as a missing one.
    pub async fn delete_user(&self, user_id: Uuid, household_id: Uuid) -> DomainResult<()> {
        self.store
            .find_active_user_in_household(user_id, household_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        // A concurrent delete can win between the lookup and the write.
        if !self.store.soft_delete_user(user_id).await? {
            return Err(DomainError::UserNotFound);
        }

        info!(user_id = %user_id, household_id = %household_id, "User deleted");

        Ok(())
    }

    /// The caller's own profile
    pub async fn get_user_profile(&self, user_id: Uuid) -> DomainResult<UserSummary> {
        self.store
            .find_active_user(user_id)
            .await?
            .map(|u| u.summary())
            .ok_or(DomainError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::household::{CreateHousehold, Household};
    use crate::models::user::{CreateUser, User};
    use crate::store::memory::InMemoryMembershipStore;

    async fn member_of_new_household(
        store: &InMemoryMembershipStore,
        email: &str,
    ) -> (Household, User) {
        store
            .create_household_with_owner(
                CreateHousehold::for_owner("Test", "User"),
                CreateUser {
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    email: email.to_string(),
                    hashed_password: "hash".to_string(),
                    household_id: None,
                },
            )
            .await
            .unwrap()
    }

    async fn join(store: &InMemoryMembershipStore, household: &Household, email: &str) -> User {
        store
            .create_user(CreateUser {
                first_name: "Extra".to_string(),
                last_name: "Member".to_string(),
                email: email.to_string(),
                hashed_password: "hash".to_string(),
                household_id: Some(household.id),
            })
            .await
            .unwrap()
    }

    fn setup() -> (HouseholdService, Arc<InMemoryMembershipStore>) {
        let store = Arc::new(InMemoryMembershipStore::new());
        (HouseholdService::new(store.clone()), store)
    }

    #[test]
    fn test_validate_household_name() {
        assert_eq!(
            validate_household_name(""),
            Err(DomainError::InvalidName("Name is required".to_string()))
        );
        assert_eq!(
            validate_household_name("   "),
            Err(DomainError::InvalidName("Name cannot be blank".to_string()))
        );
        assert_eq!(
            validate_household_name(&"a".repeat(101)),
            Err(DomainError::InvalidName("Name cannot exceed 100 characters".to_string()))
        );
        assert_eq!(validate_household_name(&"a".repeat(100)), Ok("a".repeat(100)));
        assert_eq!(validate_household_name("  The Smiths  "), Ok("The Smiths".to_string()));
    }

    #[test]
    fn test_length_is_counted_after_trimming() {
        let padded = format!("  {}  ", "b".repeat(100));
        assert_eq!(validate_household_name(&padded), Ok("b".repeat(100)));
    }

    #[tokio::test]
    async fn test_get_household_counts_active_members() {
        let (service, store) = setup();
        let (household, _) = member_of_new_household(&store, "owner@example.com").await;
        let extra = join(&store, &household, "extra@example.com").await;
        join(&store, &household, "third@example.com").await;
        store.soft_delete_user(extra.id).await.unwrap();

        let details = service.get_household(household.id).await.unwrap();

        assert_eq!(details.member_count, 2);
        assert_eq!(details.members.len(), 2);
        assert!(details.members.iter().all(|m| m.id != extra.id));
    }

    #[tokio::test]
    async fn test_get_missing_household() {
        let (service, _) = setup();
        assert_eq!(
            service.get_household(Uuid::new_v4()).await.unwrap_err(),
            DomainError::HouseholdNotFound
        );
    }

    #[tokio::test]
    async fn test_rename_household() {
        let (service, store) = setup();
        let (household, _) = member_of_new_household(&store, "owner@example.com").await;

        let updated = service.rename_household(household.id, "  The Smiths ").await.unwrap();
        assert_eq!(updated.name, "The Smiths");
        assert!(updated.updated_at >= household.updated_at);

        let err = service.rename_household(household.id, "   ").await.unwrap_err();
        assert_eq!(err, DomainError::InvalidName("Name cannot be blank".to_string()));
        assert_eq!(service.get_household(household.id).await.unwrap().name, "The Smiths");

        let err = service.rename_household(Uuid::new_v4(), "Valid").await.unwrap_err();
        assert_eq!(err, DomainError::HouseholdNotFound);
    }

    #[tokio::test]
    async fn test_cross_household_lookup_looks_like_missing_user() {
        let (service, store) = setup();
        let (home, alice) = member_of_new_household(&store, "alice@example.com").await;
        let (_, bob) = member_of_new_household(&store, "bob@example.com").await;

        assert_eq!(
            service.get_user_in_household(alice.id, home.id).await.unwrap().id,
            alice.id
        );

        let other_household = service.get_user_in_household(bob.id, home.id).await.unwrap_err();
        let nonexistent = service
            .get_user_in_household(Uuid::new_v4(), home.id)
            .await
            .unwrap_err();

        assert_eq!(other_household, DomainError::UserNotFound);
        assert_eq!(other_household, nonexistent);
        assert_eq!(other_household.to_string(), nonexistent.to_string());
    }

    #[tokio::test]
    async fn test_list_household_users_only_lists_own_active_members() {
        let (service, store) = setup();
        let (home, alice) = member_of_new_household(&store, "alice@example.com").await;
        member_of_new_household(&store, "bob@example.com").await;
        let gone = join(&store, &home, "gone@example.com").await;
        store.soft_delete_user(gone.id).await.unwrap();

        let users = service.list_household_users(home.id).await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, alice.id);
    }

    #[tokio::test]
    async fn test_delete_user_is_household_scoped() {
        let (service, store) = setup();
        let (home, _) = member_of_new_household(&store, "alice@example.com").await;
        let (_, bob) = member_of_new_household(&store, "bob@example.com").await;
        let carol = join(&store, &home, "carol@example.com").await;

        assert_eq!(
            service.delete_user(bob.id, home.id).await.unwrap_err(),
            DomainError::UserNotFound
        );
        assert!(store.find_active_user(bob.id).await.unwrap().is_some());

        service.delete_user(carol.id, home.id).await.unwrap();
        assert!(store.find_active_user(carol.id).await.unwrap().is_none());
        assert!(store.email_exists_including_deleted("carol@example.com").await.unwrap());

        // Already deleted.
        assert_eq!(
            service.delete_user(carol.id, home.id).await.unwrap_err(),
            DomainError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_profile_of_deleted_user() {
        let (service, store) = setup();
        let (_, alice) = member_of_new_household(&store, "alice@example.com").await;

        assert_eq!(service.get_user_profile(alice.id).await.unwrap().email, "alice@example.com");

        store.soft_delete_user(alice.id).await.unwrap();
        assert_eq!(
            service.get_user_profile(alice.id).await.unwrap_err(),
            DomainError::UserNotFound
        );
    }
}
