use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::crypto::gravatar_url;

// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Always stored trimmed and lowercased
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expires: Option<BsonDateTime>,
    #[serde(default)]
    pub hearts: Vec<ObjectId>,
}

impl User {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn has_hearted(&self, store_id: &ObjectId) -> bool {
        self.hearts.contains(store_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "password-confirm")]
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
    #[serde(rename = "password-confirm")]
    pub password_confirm: String,
}

/// Public user payload (no password hash, no reset token)
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub gravatar: String,
    pub hearts: Vec<String>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            id: u.id_hex(),
            email: u.email.clone(),
            name: u.name.clone(),
            gravatar: gravatar_url(&u.email),
            hearts: u.hearts.iter().map(|id| id.to_hex()).collect(),
        }
    }
}
