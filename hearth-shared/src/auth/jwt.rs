/// Token issuance and verification
///
/// Tokens are compact JWTs signed with HS256 (HMAC-SHA256). They carry the
/// identity and tenant scope of a user: `userId`, `householdId` and `email`,
/// all as strings, plus `iat` and `exp`.
///
/// # Security
///
/// - **Algorithm**: HS256 with a symmetric secret held only by [`TokenService`]
/// - **Expiration**: Configurable TTL (default 24 hours), no leeway
/// - **Confidentiality**: none. Claims are integrity-protected, not encrypted,
///   so nothing secret may be placed in them.
///
/// # Example
///
/// ```
/// use hearth_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::with_default_ttl("a-secret-key-of-at-least-32-bytes!!");
///
/// let user_id = Uuid::new_v4();
/// let household_id = Uuid::new_v4();
/// let token = tokens.issue(user_id, household_id, "alice@example.com")?;
///
/// let principal = tokens.verify(&token)?;
/// assert_eq!(principal.user_id, user_id);
/// assert_eq!(principal.household_id, household_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::principal::Principal;

/// Issuer embedded in and required of every token
pub const TOKEN_ISSUER: &str = "hearth";

/// Default token lifetime
pub fn default_ttl() -> Duration {
    Duration::hours(24)
}

/// Error type for token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature, structure or claim contents are invalid
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims structure
///
/// Identity claims are kept in their string form so that an issue/verify round
/// trip reproduces exactly what was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Household (tenant) ID
    #[serde(rename = "householdId")]
    pub household_id: String,

    /// Email address at issue time
    pub email: String,

    /// Issuer - always [`TOKEN_ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    fn into_principal(self) -> Result<Principal, TokenError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|_| TokenError::Invalid("userId claim is not a valid id".to_string()))?;
        let household_id = Uuid::parse_str(&self.household_id)
            .map_err(|_| TokenError::Invalid("householdId claim is not a valid id".to_string()))?;

        Ok(Principal {
            user_id,
            household_id,
            email: self.email,
        })
    }
}

/// Issues and verifies identity tokens
///
/// Cheap to clone; the keys are shared by value and carry no interior state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service
    ///
    /// # Arguments
    ///
    /// * `secret` - Symmetric signing secret (should be at least 32 bytes)
    /// * `ttl` - Lifetime of issued tokens
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Creates a token service with the default 24 hour lifetime
    pub fn with_default_ttl(secret: &str) -> Self {
        Self::new(secret, default_ttl())
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a signed token for the given identity
    ///
    /// # Errors
    ///
    /// Returns `TokenError::CreateError` if encoding fails
    pub fn issue(
        &self,
        user_id: Uuid,
        household_id: Uuid,
        email: &str,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            household_id: household_id.to_string(),
            email: email.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        self.encode(&claims)
    }

    /// Verifies a token and returns the identity it carries
    ///
    /// Total over its input: any structural, signature, issuer, claim or
    /// expiry problem yields an error, never a partial principal.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        self.decode(token)?.into_principal()
    }

    /// Verifies a token and returns its raw claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        // A token is no longer valid at the instant of `exp`.
        if token_data.claims.is_expired() {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = TokenService::with_default_ttl(SECRET);
        let user_id = Uuid::new_v4();
        let household_id = Uuid::new_v4();

        let token = tokens
            .issue(user_id, household_id, "john.doe@example.com")
            .expect("Should issue token");
        let principal = tokens.verify(&token).expect("Should verify token");

        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.household_id, household_id);
        assert_eq!(principal.email, "john.doe@example.com");
    }

    #[test]
    fn test_claims_carry_ids_as_strings() {
        let tokens = TokenService::with_default_ttl(SECRET);
        let user_id = Uuid::new_v4();
        let household_id = Uuid::new_v4();

        let token = tokens.issue(user_id, household_id, "a@example.com").unwrap();
        let claims = tokens.decode(&token).unwrap();

        assert_eq!(claims.user_id, user_id.to_string());
        assert_eq!(claims.household_id, household_id.to_string());
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, Duration::hours(24).num_seconds());
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = TokenService::with_default_ttl(SECRET)
            .issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com")
            .unwrap();

        let other = TokenService::with_default_ttl("another-secret-key-at-least-32-bytes");
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_tampered_payload() {
        let tokens = TokenService::with_default_ttl(SECRET);
        let token = tokens.issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com").unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = tokens.issue(Uuid::new_v4(), Uuid::new_v4(), "b@example.com").unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();

        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_verify_malformed_input_never_panics() {
        let tokens = TokenService::with_default_ttl(SECRET);

        for input in ["", "not-a-token", "a.b", "a.b.c", "...", "Bearer x", "eyJ.eyJ.sig"] {
            assert!(
                matches!(tokens.verify(input), Err(TokenError::Invalid(_))),
                "{:?} should be rejected as invalid",
                input
            );
        }
    }

    #[test]
    fn test_verify_already_expired_token() {
        let tokens = TokenService::new(SECRET, Duration::seconds(-3600));
        let token = tokens.issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com").unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_after_short_ttl_elapses() {
        let tokens = TokenService::new(SECRET, Duration::milliseconds(1));
        let token = tokens.issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com").unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_rejects_non_uuid_claims() {
        let tokens = TokenService::with_default_ttl(SECRET);
        let now = Utc::now();
        let claims = Claims {
            user_id: "42".to_string(),
            household_id: Uuid::new_v4().to_string(),
            email: "a@example.com".to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = tokens.encode(&claims).unwrap();

        assert!(tokens.decode(&token).is_ok());
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let tokens = TokenService::with_default_ttl(SECRET);
        let now = Utc::now();
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            household_id: Uuid::new_v4().to_string(),
            email: "a@example.com".to_string(),
            iss: "someone-else".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = tokens.encode(&claims).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }
}
