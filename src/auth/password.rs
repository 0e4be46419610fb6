/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt. Input policy (length limits) lives in
/// `validators`; this module only transforms and compares, but it refuses
/// input bcrypt would silently truncate.

use bcrypt::{hash, verify};

use crate::error::{AppError, DatabaseError, ValidationError};

/// bcrypt reads at most this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt
    ///
    /// Two calls with the same input give different strings because each
    /// embeds a fresh salt. This is CPU-bound and deliberately slow.
    ///
    /// # Errors
    /// - `ValidationError::TooLong` if the password exceeds `MAX_PASSWORD_BYTES`
    /// - `AppError::Internal` if bcrypt fails (bad cost or no randomness)
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::Validation(ValidationError::TooLong(
                "password".to_string(),
                MAX_PASSWORD_BYTES,
            )));
        }

        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its stored hash
    ///
    /// A wrong password is `Ok(false)`, never an error. Nothing longer than
    /// `MAX_PASSWORD_BYTES` can have been hashed, so such input never matches.
    ///
    /// # Errors
    /// Returns `DatabaseError::DataIntegrity` if `hash` is not a bcrypt hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        verify(password, hash).map_err(|e| {
            AppError::Database(DatabaseError::DataIntegrity(format!(
                "stored password hash is unreadable: {}",
                e
            )))
        })
    }
}
