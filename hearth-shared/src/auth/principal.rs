/// Request-scoped identity
///
/// A [`Principal`] is derived solely from a verified token by the identity
/// resolver in [`super::middleware`]. It is never persisted and lives only in
/// the extensions of the request that produced it. Handlers receive it as an
/// explicit extractor argument:
///
/// ```no_run
/// use hearth_shared::auth::principal::Principal;
///
/// async fn whoami(principal: Principal) -> String {
///     format!("{} in household {}", principal.email, principal.household_id)
/// }
/// ```

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::middleware::AuthError;

/// Verified identity and tenant scope of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user
    pub user_id: Uuid,

    /// Household every membership-sensitive operation is scoped to
    pub household_id: Uuid,

    /// Email address carried by the token
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}
