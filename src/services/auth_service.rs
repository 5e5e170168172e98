use bcrypt::{hash, verify};

use crate::database::UserRepository;
use crate::models::{LoginForm, RegisterForm, User};
use crate::utils::validation::{confirm_passwords, normalize_email, require, validate_email};
use crate::utils::{AppError, AppResult};

pub const FAILED_LOGIN: &str = "Failed login";

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(hash(password, cost)?)
}

// User registration
pub async fn register(
    users: &dyn UserRepository,
    form: &RegisterForm,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let name = require(&form.name, "You must supply a name!")?;
    let email = validate_email(&form.email)?;
    confirm_passwords(&form.password, &form.password_confirm)?;

    let user = User {
        id: None,
        email,
        name,
        password_hash: hash_password(&form.password, bcrypt_cost)?,
        reset_password_token: None,
        reset_password_expires: None,
        hearts: Vec::new(),
    };

    let user = users.insert_user(user).await?;
    log::info!("✅ User registered: {} ({})", user.email, user.id_hex());
    Ok(user)
}

// User login
pub async fn login(users: &dyn UserRepository, form: &LoginForm) -> AppResult<User> {
    let email = normalize_email(&form.email);

    let Some(user) = users.find_user_by_email(&email).await? else {
        log::warn!("❌ Login for unknown email: {}", email);
        return Err(AppError::Unauthorized(FAILED_LOGIN.to_string()));
    };

    if !verify(&form.password, &user.password_hash)? {
        log::warn!("❌ Wrong password for: {}", email);
        return Err(AppError::Unauthorized(FAILED_LOGIN.to_string()));
    }

    log::info!("✅ Login successful: {}", email);
    Ok(user)
}
