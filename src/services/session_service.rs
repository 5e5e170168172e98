//! Login sessions as signed tokens.
//!
//! The token only carries the user id; every request re-reads the user so
//! profile changes and deletions take effect immediately.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::UserRepository;
use crate::models::User;
use crate::utils::{AppError, AppResult};

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    fn issue_session(&self, user: &User) -> AppResult<String>;

    /// `None` for bad signatures, expired tokens and users that no longer exist
    async fn resolve_session(&self, token: &str) -> AppResult<Option<User>>;
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,  // user id (hex)
    pub iat: usize,   // issued at
    pub exp: usize,   // expiration
    pub jti: String,  // JWT ID
}

pub struct JwtSessionStore {
    users: Arc<dyn UserRepository>,
    secret: String,
    ttl: Duration,
}

impl JwtSessionStore {
    pub fn new(users: Arc<dyn UserRepository>, secret: &str, ttl_hours: i64) -> Self {
        Self {
            users,
            secret: secret.to_string(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue_session_at(&self, user: &User, now: DateTime<Utc>) -> AppResult<String> {
        let sub = user
            .id
            .ok_or_else(|| AppError::Internal("Cannot issue a session for an unsaved user".to_string()))?
            .to_hex();

        let claims = SessionClaims {
            sub,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    fn verify(&self, token: &str) -> Option<SessionClaims> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| log::debug!("🔒 Rejected session token: {}", e))
        .ok()
    }
}

#[async_trait::async_trait]
impl SessionStore for JwtSessionStore {
    fn issue_session(&self, user: &User) -> AppResult<String> {
        self.issue_session_at(user, Utc::now())
    }

    async fn resolve_session(&self, token: &str) -> AppResult<Option<User>> {
        let Some(claims) = self.verify(token) else {
            return Ok(None);
        };

        let Ok(id) = ObjectId::parse_str(&claims.sub) else {
            return Ok(None);
        };

        self.users.find_user(&id).await
    }
}
