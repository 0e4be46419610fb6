/// JWT Token Generation and Validation
///
/// `TokenIssuer` mints HS256 tokens and `TokenVerifier` checks them. Both
/// are built from `JwtSettings` once at startup and hold no mutable state,
/// so they can be cloned freely into every worker.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, ConfigError};

/// Lifetime of every refresh token.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong segment count, undecodable base64, or undecodable claims
    Malformed,
    /// Signature does not match the header and payload
    BadSignature,
    /// Signature is valid but the expiry has passed
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::BadSignature => write!(f, "bad signature"),
            TokenError::Expired => write!(f, "token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Access and refresh token handed to a client after login or refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_token_ttl: Duration,
}

impl TokenIssuer {
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the access token lifetime does
    /// not fit in a `chrono::Duration`
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigError> {
        let access_token_ttl = Duration::try_minutes(config.access_token_expiry_minutes)
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "jwt.access_token_expiry_minutes out of range: {}",
                    config.access_token_expiry_minutes
                ))
            })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            access_token_ttl,
        })
    }

    /// Generate a new access token using the configured lifetime
    pub fn issue_access_token(&self, user_id: &Uuid, email: &str) -> Result<String, AppError> {
        self.issue_token(user_id, email, self.access_token_ttl)
    }

    /// Generate a refresh token, valid for `REFRESH_TOKEN_TTL_DAYS`
    pub fn issue_refresh_token(&self, user_id: &Uuid, email: &str) -> Result<String, AppError> {
        self.issue_token(user_id, email, Duration::days(REFRESH_TOKEN_TTL_DAYS))
    }

    /// Generate a token that expires `ttl` after now
    ///
    /// A zero or negative `ttl` yields a token that no verifier will accept.
    pub fn issue_token(
        &self,
        user_id: &Uuid,
        email: &str,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let claims = Claims::new(*user_id, email.to_string(), ttl);
        self.sign(&claims)
    }

    /// Generate both tokens for a login or refresh response
    pub fn issue_pair(&self, user_id: &Uuid, email: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, email)?,
            refresh_token: self.issue_refresh_token(user_id, email)?,
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    /// Sign an arbitrary claim set with HS256
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the claims cannot be serialized
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `parse_at` against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token against the current time
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Validate a token against `now` (Unix seconds)
    ///
    /// The signature is verified before any claim is read; only then is the
    /// expiry compared with `now`.
    ///
    /// # Errors
    /// - `Malformed` if the token is not three base64url segments with a
    ///   decodable claim set, or if `exp` is not after `iat`
    /// - `BadSignature` if the signature does not match
    /// - `Expired` if `now >= exp`
    pub fn parse_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }
}
