/// Authentication utilities
///
/// This module provides the identity primitives for Hearth:
///
/// # Modules
///
/// - [`password`]: Argon2id credential verifier
/// - [`jwt`]: Token issuance and verification
/// - [`principal`]: The request-scoped identity and its extractor
/// - [`middleware`]: Identity resolution from the `Authorization` header
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256 signing with configurable expiration and no leeway
/// - **Request Scope**: A principal exists only in the extensions of the request
///   whose token produced it
///
/// # Example
///
/// ```no_run
/// use hearth_shared::auth::password::{Argon2Verifier, CredentialVerifier};
/// use hearth_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = Argon2Verifier::default();
/// let hash = verifier.hash("user_password")?;
/// assert!(verifier.verify("user_password", &hash)?);
///
/// let tokens = TokenService::with_default_ttl("a-secret-key-of-at-least-32-bytes!!");
/// let token = tokens.issue(Uuid::new_v4(), Uuid::new_v4(), "user@example.com")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod principal;
