/// JWT Claims structure
///
/// The payload carried by every token this service issues: who the caller
/// is and the window in which the token may be used. Standard registered
/// claim names (RFC 7519) are used so any HS256 verifier can read them.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::TokenError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// User email, copied at issue time and not re-checked against the store
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims that start now and last for `ttl`
    pub fn new(user_id: Uuid, email: String, ttl: Duration) -> Self {
        Self::issued_at(user_id, email, Utc::now().timestamp(), ttl)
    }

    /// Create claims for an explicit issue time
    pub fn issued_at(user_id: Uuid, email: String, now: i64, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            email,
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenError::Malformed` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }

    /// A token is usable only while `now < exp`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
