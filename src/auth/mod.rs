/// Authentication module
///
/// Password hashing (`PasswordHasher`), the token claim set (`Claims`),
/// and HS256 token issue/verification (`TokenIssuer`, `TokenVerifier`).

mod claims;
mod jwt;
mod password;

pub use claims::Claims;
pub use jwt::{TokenError, TokenIssuer, TokenPair, TokenVerifier, REFRESH_TOKEN_TTL_DAYS};
pub use password::{PasswordHasher, MAX_PASSWORD_BYTES};
