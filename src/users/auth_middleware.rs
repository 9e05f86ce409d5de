// src/users/auth_middleware.rs

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::users_structs::{Claims, User, UserRole};
use crate::config::AuthConfig;
use crate::error::AppError;

/// The caller of a protected route, taken from a valid JWT.
///
/// Handlers pass this value explicitly into the core instead of re-reading
/// any session state.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden: admin access required".into()))
        }
    }
}

/// Sign a token for `user`, valid for `auth.token_ttl_hours`.
pub fn issue_token(user: &User, auth: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::hours(auth.token_ttl_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
}

/// Validate a token and return its claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => {
            tracing::debug!(error = ?e, "rejected jwt");
            let message = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expired.",
                jsonwebtoken::errors::ErrorKind::InvalidSignature => "Invalid token signature.",
                jsonwebtoken::errors::ErrorKind::InvalidToken => "Malformed token.",
                _ => "Invalid authentication token.",
            };
            Err(AppError::Unauthorized(message.into()))
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let auth = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        tracing::error!("AuthConfig missing from app data");
        AppError::Internal("Server configuration error.".into())
    })?;

    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token.".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authentication token.".into()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid token format. Expected 'Bearer <token>'.".into())
    })?;

    let claims = decode_token(token, &auth.jwt_secret)?;
    Ok(AuthenticatedUser {
        user_id: claims.sub,
        name: claims.name,
        email: claims.email,
        role: claims.role,
    })
}

/// Extractor for protected routes: validates the bearer token in `Authorization`.
impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
