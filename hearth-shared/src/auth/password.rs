/// Password hashing using Argon2id
///
/// This module is the credential verifier consumed by the auth workflow. The
/// hash is treated as an opaque one-way function: callers only ever hash a new
/// password or compare a candidate against a stored PHC string.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use hearth_shared::auth::password::{Argon2Verifier, CredentialVerifier};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = Argon2Verifier::default();
/// let hash = verifier.hash("password123")?;
///
/// assert!(verifier.verify("password123", &hash)?);
/// assert!(!verifier.verify("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way credential hashing and comparison
///
/// Implementations must be constant-time on `verify` and must never return
/// the plaintext or anything derived from it other than the hash.
pub trait CredentialVerifier: Send + Sync {
    /// Hashes a plaintext password into a self-describing hash string
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Returns `Ok(true)` if `password` matches `hash`, `Ok(false)` on mismatch
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id credential verifier
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    params: Params,
}

impl Argon2Verifier {
    /// Creates a verifier with explicit cost parameters
    ///
    /// # Arguments
    ///
    /// * `m_cost` - Memory in KiB
    /// * `t_cost` - Number of passes
    /// * `p_cost` - Degree of parallelism
    ///
    /// Lower costs are only meant for tests; production should use
    /// [`Argon2Verifier::default`].
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Self { params })
    }
}

impl Default for Argon2Verifier {
    fn default() -> Self {
        // 64 MB, 3 iterations, 4 lanes are all within argon2's accepted ranges.
        let params = Params::new(65536, 3, 4, Some(32)).unwrap_or_default();
        Self { params }
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with_params(password, self.params.clone())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        verify_password(password, hash)
    }
}

/// Hashes a password using Argon2id with the default production parameters
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    Argon2Verifier::default().hash(password)
}

fn hash_with_params(password: &str, params: Params) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Parameters are read back from the PHC string, so hashes produced with any
/// cost setting verify correctly. Comparison is constant-time.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}
