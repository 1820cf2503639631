use actix_web::{dev::Payload, http, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::JwtAuthConfig;
use crate::core::AppError;
use crate::models::users::{Role, UserProfile};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub email: String,
    pub role: Role,
    pub exp: usize, // expiration time
}

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
    pub claims: JwtClaims,
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        Err(AppError::forbidden_error(format!(
            "This action is not available to a {}",
            self.role
        )))
    }
}

pub fn generate_jwt_token(
    config: &JwtAuthConfig,
    user: &UserProfile,
) -> Result<(String, DateTime<Utc>), AppError> {
    let expires_at = Utc::now() + Duration::hours(config.token_expiration_time);
    let claims = JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: expires_at.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.expose_secret().as_bytes());
    let token = encode(&Header::default(), &claims, &encoding_key).map_err(|e| {
        tracing::error!("Failed to generate token string: {:?}", e);
        AppError::internal_error("Failed to generate JWT token")
    })?;

    Ok((token, expires_at))
}

pub fn decode_jwt_token(config: &JwtAuthConfig, token: &str) -> Result<JwtClaims, AppError> {
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid token"))
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let config = req
        .app_data::<web::Data<JwtAuthConfig>>()
        .ok_or_else(|| AppError::internal_error("JWT configuration is missing"))?;

    let token = bearer_token(req)
        .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided"))?;

    let claims = decode_jwt_token(config, &token)?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

    let user = AuthUser {
        user_id,
        role: claims.role,
        claims,
    };
    req.extensions_mut().insert(user.clone());

    Ok(user)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
