/// Invitation lifecycle engine
///
/// Creates invitations, enforces the one-pending-invitation rule, and expires
/// invitations lazily: every listing first sweeps lapsed pending rows to
/// `EXPIRED`, so a caller never sees a pending invitation past its deadline.
///
/// The duplicate check before insert only produces a friendly error early.
/// The store's uniqueness rule is what actually holds under concurrent
/// requests, and its violation is reported as the same `DuplicateInvitation`.

use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use tracing::info;
use uuid::Uuid;

use super::clock::Clock;
use super::error::{DomainError, DomainResult};
use crate::models::invitation::{
    invitation_ttl, CreateInvitation, Invitation, InvitationDetails, TOKEN_PREFIX,
    TOKEN_RANDOM_LENGTH,
};
use crate::store::{MembershipStore, ONE_PENDING_INVITATION};

/// Generates an opaque invitation token: `inv_` followed by 32 base62 characters
pub fn generate_invitation_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LENGTH)
        .map(char::from)
        .collect();

    format!("{}{}", TOKEN_PREFIX, random)
}

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
}

impl InvitationService {
    pub fn new(store: Arc<dyn MembershipStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Invites the active user with `email` into `household_id`
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `UserNotFound` if no active user has the email
    /// - `AlreadyMember` if that user is already in the household
    /// - `DuplicateInvitation` if a pending invitation already links the pair
    ///
    /// Lapsed invitations are swept to `EXPIRED` before the duplicate check.
    ///
    /// `HouseholdNotFound` and `Unauthenticated` are returned if the caller's
    /// household or account no longer exist.
    pub async fn create_invitation(
        &self,
        household_id: Uuid,
        invited_by_user_id: Uuid,
        email: &str,
    ) -> DomainResult<InvitationDetails> {
        let household = self
            .store
            .find_household(household_id)
            .await?
            .ok_or(DomainError::HouseholdNotFound)?;
        let inviter = self
            .store
            .find_active_user(invited_by_user_id)
            .await?
            .ok_or(DomainError::Unauthenticated)?;

        let invitee = self
            .store
            .find_active_user_by_email(email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if invitee.household_id == Some(household_id) {
            return Err(DomainError::AlreadyMember);
        }

        // A lapsed invitation must not block a fresh one.
        let now = self.clock.now();
        self.store.expire_pending_invitations(now).await?;

        if self
            .store
            .find_pending_invitation(household_id, invitee.id)
            .await?
            .is_some()
        {
            return Err(DomainError::DuplicateInvitation);
        }

        let invitation = self
            .store
            .create_invitation(CreateInvitation {
                household_id,
                invited_user_id: invitee.id,
                invited_by_user_id: inviter.id,
                token: generate_invitation_token(),
                expires_at: now + invitation_ttl(),
                created_at: now,
            })
            .await
            .map_err(|e| {
                if e.violates(ONE_PENDING_INVITATION) {
                    DomainError::DuplicateInvitation
                } else {
                    e.into()
                }
            })?;

        info!(
            invitation_id = %invitation.id,
            household_id = %household_id,
            invited_user_id = %invitee.id,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(InvitationDetails::new(&invitation, &household, &invitee, &inviter))
    }

    /// Open invitations for a user, newest first
    ///
    /// Sweeps every lapsed pending invitation in the system to `EXPIRED` first.
    pub async fn list_pending_invitations(&self, user_id: Uuid) -> DomainResult<Vec<InvitationDetails>> {
        let now = self.clock.now();

        let expired = self.store.expire_pending_invitations(now).await?;
        if expired > 0 {
            info!(expired, "Expired lapsed invitations");
        }

        Ok(self.store.pending_invitations_for_user(user_id, now).await?)
    }

    /// Raw invitation by ID
    pub async fn get_invitation(&self, id: Uuid) -> DomainResult<Option<Invitation>> {
        Ok(self.store.find_invitation(id).await?)
    }
}
