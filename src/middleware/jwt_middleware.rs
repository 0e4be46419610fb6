/// JWT Authentication Middleware
///
/// Guards protected resources. Reads `Authorization: Bearer <token>`,
/// verifies the token, and injects an `AuthenticatedUser` into request
/// extensions. Any failure ends the request with a 401 before the wrapped
/// handler runs.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

/// Verified caller identity, available to handlers via `web::ReqData`
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

/// Pull the token out of an `Authorization` header value
///
/// The scheme must be exactly `Bearer`, followed by one space and a
/// non-empty token.
pub fn extract_bearer_token(header_value: Option<&str>) -> Result<&str, AuthError> {
    let value = header_value.ok_or(AuthError::MissingToken)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

/// Verify the header value and produce the caller's identity
pub fn authenticate(
    header_value: Option<&str>,
    verifier: &TokenVerifier,
) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_bearer_token(header_value)?;
    let claims = verifier.parse(token)?;
    let id = claims.user_id()?;

    Ok(AuthenticatedUser {
        id,
        email: claims.email,
    })
}

pub struct JwtMiddleware {
    verifier: TokenVerifier,
}

impl JwtMiddleware {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    verifier: TokenVerifier,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default());

        match authenticate(header_value, &self.verifier) {
            Ok(user) => {
                tracing::debug!(
                    user_id = %user.id,
                    email = %user.email,
                    "JWT validated successfully"
                );
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(
                    path = %req.path(),
                    reason = %e,
                    "Rejected unauthenticated request"
                );
                let error: Error = AppError::Auth(e).into();
                Box::pin(async move { Err::<ServiceResponse<B>, Error>(error) })
            }
        }
    }
}
