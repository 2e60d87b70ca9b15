//! Password hashing, bearer tokens and the authenticated-user extractor.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::JwtConfig;
use crate::errors::ApiError;
use crate::models::User;
use crate::server::AppState;

const NOT_AUTHENTICATED: &str = "Not authenticated";
const INVALID_CREDENTIALS: &str = "Could not validate credentials";

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

/// Token claims. `sub` is the user id as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
}

/// Issues and validates HMAC-signed tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            lifetime: Duration::try_minutes(config.expire_minutes).unwrap_or(Duration::MAX),
        }
    }

    /// Sign a token for `user` expiring after the configured lifetime.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp: Utc::now()
                .checked_add_signed(self.lifetime)
                .ok_or_else(|| ApiError::internal("token lifetime out of range"))?
                .timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(self.algorithm))
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                invalid_credentials()
            })
    }
}

/// bcrypt hashing on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: String) -> Result<String, ApiError> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::internal)
    }

    /// `false` for a wrong password or an unreadable stored hash.
    pub async fn verify(&self, password: String, hash: String) -> Result<bool, ApiError> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(ApiError::internal)?;
        match verified {
            Ok(ok) => Ok(ok),
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be verified");
                Ok(false)
            }
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The user a request's bearer token resolves to.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;
        let claims = state.tokens.verify(token)?;
        let id: i64 = claims.sub.parse().map_err(|_| invalid_credentials())?;

        let user = state
            .storage
            .get_user(id)
            .await?
            .ok_or_else(invalid_credentials)?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::NaiveDate;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            algorithm: Algorithm::HS256,
            expire_minutes: 60,
        }
    }

    fn user() -> User {
        User {
            id: 42,
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
            password_hash: String::new(),
            created_at: NaiveDate::from_ymd_opt(2026, 10, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new(&config("secret"));
        let token = tokens.issue(&user()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "budi@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired() {
        let tokens = TokenService::new(&config("secret"));
        let other = TokenService::new(&config("other"));
        let token = other.issue(&user()).unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(ApiError::Unauthorized(_))
        ));

        let expired = tokens
            .sign(&Claims {
                sub: "42".to_string(),
                email: "budi@example.com".to_string(),
                exp: Utc::now().timestamp() - 3600,
            })
            .unwrap();
        assert!(tokens.verify(&expired).is_err());
        assert!(tokens.verify("not-a-token").is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_fails_without_panicking() {
        let mut huge = config("secret");
        huge.expire_minutes = i64::MAX / 2;
        let tokens = TokenService::new(&huge);
        assert!(matches!(tokens.issue(&user()), Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("password".to_string()).await.unwrap();
        assert!(hasher
            .verify("password".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!hasher.verify("wrong".to_string(), hash).await.unwrap());
        assert!(!hasher
            .verify("password".to_string(), "not-a-hash".to_string())
            .await
            .unwrap());
    }
}
