use mongodb::bson::oid::ObjectId;

use crate::database::{StoreRepository, UserRepository};
use crate::models::{AccountForm, User};
use crate::utils::validation::{require, validate_email};
use crate::utils::{AppError, AppResult};

/// Adds the store to the user's hearts, or removes it when already there.
///
/// The membership test reads the caller's copy of the user, so two
/// concurrent toggles by the same user are last-write-wins.
pub async fn toggle_heart(
    users: &dyn UserRepository,
    stores: &dyn StoreRepository,
    user: &User,
    store_id: &ObjectId,
) -> AppResult<User> {
    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))?;

    if stores.find_store(store_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Store {}", store_id)));
    }

    let updated = if user.has_hearted(store_id) {
        log::info!("💔 {} unhearted {}", user.email, store_id);
        users.remove_heart(&user_id, store_id).await?
    } else {
        log::info!("❤️  {} hearted {}", user.email, store_id);
        users.add_heart(&user_id, store_id).await?
    };

    updated.ok_or_else(|| AppError::NotFound("User".to_string()))
}

pub async fn update_account(
    users: &dyn UserRepository,
    user: &User,
    form: &AccountForm,
) -> AppResult<User> {
    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))?;

    let name = require(&form.name, "You must supply a name!")?;
    let email = validate_email(&form.email)?;

    let updated = users
        .update_profile(&user_id, &name, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    log::info!("✏️  Profile updated: {}", updated.email);
    Ok(updated)
}
