/// Core services
///
/// - [`auth`]: Registration and login
/// - [`household`]: Household-scoped reads and writes
/// - [`invitation`]: Invitation creation, lazy expiry and listing
/// - [`clock`]: Injected time source
/// - [`error`]: Domain error kinds shared by all services
///
/// Services hold an `Arc<dyn MembershipStore>` and are cheap to clone.

pub mod auth;
pub mod clock;
pub mod error;
pub mod household;
pub mod invitation;

pub use auth::{AuthService, AuthSession, Registration};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult, FieldError};
pub use household::HouseholdService;
pub use invitation::InvitationService;
