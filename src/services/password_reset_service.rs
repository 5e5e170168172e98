//! Forgot/reset password flow.
//!
//! NoReset → PendingReset when a token is issued, PendingReset → NoReset
//! once a new password is set. Unknown and expired tokens are reported with
//! the same `InvalidOrExpiredToken` error.

use chrono::{DateTime, Duration, Utc};

use super::auth_service::hash_password;
use super::mail_service::{password_reset_email, Mailer};
use crate::database::UserRepository;
use crate::models::User;
use crate::utils::crypto::generate_reset_token;
use crate::utils::validation::{confirm_passwords, normalize_email};
use crate::utils::{AppError, AppResult};

pub const NO_ACCOUNT: &str = "No account with that email exists";

pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Issues a token valid for one hour and mails `<base_url>/account/reset/<token>`
pub async fn request_reset(
    users: &dyn UserRepository,
    mailer: &dyn Mailer,
    email: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let email = normalize_email(email);

    let Some(user) = users.find_user_by_email(&email).await? else {
        log::warn!("🔑 Password reset requested for unknown email: {}", email);
        return Err(AppError::NotFound(NO_ACCOUNT.to_string()));
    };
    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))?;

    let token = generate_reset_token();
    users
        .set_reset_token(&user_id, &token, now + reset_token_ttl())
        .await?;

    let reset_url = format!("{}/account/reset/{}", base_url.trim_end_matches('/'), token);
    mailer.send(password_reset_email(&user.email, &reset_url)).await?;

    log::info!("🔑 Password reset issued for {}", user.email);
    Ok(())
}

/// The user holding `token`, provided it has not expired at `now`
pub async fn find_pending(
    users: &dyn UserRepository,
    token: &str,
    now: DateTime<Utc>,
) -> AppResult<User> {
    users
        .find_user_by_reset_token(token, now)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)
}

/// Sets the new password and clears the token. The confirmation is checked
/// before the token is looked at, so a typo leaves the reset pending.
pub async fn complete_reset(
    users: &dyn UserRepository,
    token: &str,
    password: &str,
    password_confirm: &str,
    bcrypt_cost: u32,
    now: DateTime<Utc>,
) -> AppResult<User> {
    confirm_passwords(password, password_confirm)?;

    let user = find_pending(users, token, now).await?;
    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))?;

    let password_hash = hash_password(password, bcrypt_cost)?;
    let user = users
        .complete_password_reset(&user_id, &password_hash)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

    log::info!("✅ Password reset completed for {}", user.email);
    Ok(user)
}
