/// Authentication Routes
///
/// Account creation, login, token refresh, profile lookup and logout.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{PasswordHasher, TokenIssuer, TokenPair, TokenVerifier};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::middleware::AuthenticatedUser;
use crate::user_store::{NewUser, User, UserStore};
use crate::validators::{is_present_password, is_valid_email, is_valid_name, is_valid_new_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access and refresh tokens returned by login and refresh
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }
    }
}

/// Public view of a user; the password hash is never included
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct RegisterResponse {
    message: String,
    user: UserResponse,
}

#[derive(Serialize)]
struct ProfileResponse {
    user: UserResponse,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

// bcrypt is slow on purpose; keep it off the async workers.
async fn hash_blocking(hasher: PasswordHasher, password: String) -> Result<String, AppError> {
    web::block(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_blocking(
    hasher: PasswordHasher,
    password: String,
    password_hash: String,
) -> Result<bool, AppError> {
    web::block(move || hasher.verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

/// POST /auth/register
///
/// Create an account from name, email and password.
///
/// # Errors
/// - 400: Validation errors (invalid email/password/name)
/// - 409: Email already registered
/// - 500: Hashing or storage failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    store: web::Data<UserStore>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    let RegisterRequest {
        name,
        email,
        password,
    } = form.into_inner();

    let name = is_valid_name(&name)?;
    let email = is_valid_email(&email)?;
    is_valid_new_password(&password)?;

    // Fast path; the unique constraint still decides concurrent registrations.
    if store.find_by_email(&email).await?.is_some() {
        return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
            "Email already registered".to_string(),
        )));
    }

    let password_hash = hash_blocking(*hasher.get_ref(), password).await?;

    let user = store
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered successfully");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "user created successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

/// POST /auth/login
///
/// Check email and password, then issue an access and refresh token.
///
/// # Errors
/// - 400: Malformed body or email
/// - 401: Unknown email or wrong password (same response for both)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<UserStore>,
    hasher: web::Data<PasswordHasher>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();

    let email = is_valid_email(&email)?;
    is_present_password(&password)?;

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    let password_valid =
        verify_blocking(*hasher.get_ref(), password, user.password_hash.clone()).await?;
    if !password_valid {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let tokens = issuer.issue_pair(&user.id, &user.email)?;

    tracing::info!(user_id = %user.id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// POST /auth/refresh
///
/// Exchange a valid refresh token for a new token pair. Nothing is stored
/// server side, so the old refresh token stays valid until it expires.
///
/// # Errors
/// - 400: Malformed body
/// - 401: Malformed, tampered or expired refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    issuer: web::Data<TokenIssuer>,
    verifier: web::Data<TokenVerifier>,
) -> Result<HttpResponse, AppError> {
    let claims = verifier.parse(&form.refresh_token)?;
    let user_id = claims.user_id()?;

    let tokens = issuer.issue_pair(&user_id, &claims.email)?;

    tracing::info!(user_id = %user_id, "Token refreshed successfully");

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// GET /auth/me
///
/// Profile of the authenticated caller. Requires
/// `Authorization: Bearer <access_token>`; the identity comes from the JWT
/// middleware.
///
/// # Errors
/// - 401: Missing or invalid token (handled by middleware)
/// - 404: The account no longer exists
pub async fn get_current_user(
    caller: web::ReqData<AuthenticatedUser>,
    store: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("User not found".to_string())))?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: UserResponse::from(&user),
    }))
}

/// POST /auth/logout
///
/// Acknowledges the request. Tokens are stateless, so there is nothing to
/// clear on the server; the client discards its tokens.
pub async fn logout(caller: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    tracing::info!(user_id = %caller.id, "User logged out");

    HttpResponse::Ok().json(MessageResponse {
        message: "logged out successfully".to_string(),
    })
}
