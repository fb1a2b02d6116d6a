/*!
 * # Authentication and Authorization
 *
 * Session tokens are HS256 JWTs carrying the account id and its role. Protected
 * handlers take an [`AuthUser`] argument, which validates the bearer token on
 * extraction; ownership rules live on `AuthUser` so handlers never trust ids sent
 * by the client.
 */

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::AppConfig, errors::ServiceError};

mod password;

pub use password::PasswordHasher;

/// The three kinds of account that can sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Transporter,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Transporter => write!(f, "transporter"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Claim structure for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Account id
    pub role: Role,   // Account table the id belongs to
    pub jti: String,  // Token id
    pub iat: i64,     // Issued at
    pub exp: i64,     // Expiration
    pub nbf: i64,     // Not valid before
    pub iss: String,  // Issuer
    pub aud: String,  // Audience
}

/// Session token handed out on login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionToken {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration_secs),
            password_memory_kib: cfg.password_hash_memory_kib,
            password_iterations: cfg.password_hash_iterations,
        }
    }
}

/// Issues and validates session tokens, and owns the password hasher.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    passwords: PasswordHasher,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.config.jwt_issuer)
            .field("audience", &self.config.jwt_audience)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let passwords = PasswordHasher::new(config.password_memory_kib, config.password_iterations)?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            passwords,
            config,
        })
    }

    pub fn passwords(&self) -> &PasswordHasher {
        &self.passwords
    }

    /// Signs a token for `account_id` acting as `role`.
    pub fn issue_token(&self, role: Role, account_id: i32) -> Result<SessionToken, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| AuthError::TokenCreation("invalid token lifetime".to_string()))?;

        let claims = Claims {
            sub: account_id.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(SessionToken {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!("rejected session token: {}", e);
                    AuthError::InvalidToken
                }
            })
    }
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub account_id: i32,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_producer(&self, producer_id: i32) -> bool {
        self.role == Role::Producer && self.account_id == producer_id
    }

    pub fn is_transporter(&self, transporter_id: i32) -> bool {
        self.role == Role::Transporter && self.account_id == transporter_id
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    /// The producer themself, or an administrator.
    pub fn require_producer_or_admin(&self, producer_id: i32) -> Result<(), ServiceError> {
        if self.is_admin() || self.is_producer(producer_id) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    /// The transporter themself, or an administrator.
    pub fn require_transporter_or_admin(&self, transporter_id: i32) -> Result<(), ServiceError> {
        if self.is_admin() || self.is_transporter(transporter_id) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }
}

fn forbidden() -> ServiceError {
    ServiceError::Forbidden("insufficient permissions for this resource".to_string())
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let account_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            account_id,
            role: claims.role,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let auth = Arc::<AuthService>::from_ref(state);
        let claims = auth.validate_token(bearer_token(&parts.headers)?)?;
        let user = AuthUser::try_from(claims)?;
        parts.extensions.insert(user);
        Ok(user)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::Hashing(msg) => ServiceError::HashError(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::StatusCode;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit_test_secret_that_is_long_enough_for_hs256".to_string(),
            jwt_audience: "harvest-trace-api".to_string(),
            jwt_issuer: "harvest-trace".to_string(),
            access_token_expiration: Duration::from_secs(600),
            password_memory_kib: 1024,
            password_iterations: 1,
        }
    }

    #[test]
    fn issued_token_round_trips_role_and_account() {
        let service = AuthService::new(config()).unwrap();
        let token = service.issue_token(Role::Transporter, 42).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 600);

        let claims = service.validate_token(&token.access_token).unwrap();
        let user = AuthUser::try_from(claims).unwrap();
        assert_eq!(
            user,
            AuthUser {
                account_id: 42,
                role: Role::Transporter
            }
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = AuthService::new(AuthConfig {
            jwt_secret: "a_completely_different_secret_of_enough_length".to_string(),
            ..config()
        })
        .unwrap();
        let validator = AuthService::new(config()).unwrap();

        let token = issuer.issue_token(Role::Admin, 1).unwrap();
        assert_matches!(
            validator.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn token_for_other_audience_is_rejected() {
        let issuer = AuthService::new(AuthConfig {
            jwt_audience: "someone-else".to_string(),
            ..config()
        })
        .unwrap();
        let validator = AuthService::new(config()).unwrap();

        let token = issuer.issue_token(Role::Producer, 3).unwrap();
        assert!(validator.validate_token(&token.access_token).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_matches!(bearer_token(&headers), Err(AuthError::MissingToken));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_matches!(bearer_token(&headers), Err(AuthError::InvalidToken));

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn ownership_rules() {
        let producer = AuthUser {
            account_id: 7,
            role: Role::Producer,
        };
        let transporter = AuthUser {
            account_id: 7,
            role: Role::Transporter,
        };
        let admin = AuthUser {
            account_id: 1,
            role: Role::Admin,
        };

        assert!(producer.require_producer_or_admin(7).is_ok());
        assert!(producer.require_producer_or_admin(8).is_err());
        assert!(transporter.require_producer_or_admin(7).is_err());
        assert!(transporter.require_transporter_or_admin(7).is_ok());
        assert!(admin.require_producer_or_admin(99).is_ok());
        assert!(admin.require_transporter_or_admin(99).is_ok());
        assert!(producer.require_admin().is_err());
    }

    #[test]
    fn auth_errors_map_to_http_status() {
        assert_eq!(
            ServiceError::from(AuthError::MissingToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::Hashing("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
