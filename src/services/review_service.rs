use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::database::{ReviewRepository, StoreRepository};
use crate::models::{bson_datetime, Review, ReviewForm, Store, User};
use crate::utils::validation::require;
use crate::utils::{AppError, AppResult};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Saves a review by `author`; returns it with the store it belongs to
pub async fn add_review(
    stores: &dyn StoreRepository,
    reviews: &dyn ReviewRepository,
    author: &User,
    store_id: &ObjectId,
    form: &ReviewForm,
    now: DateTime<Utc>,
) -> AppResult<(Review, Store)> {
    let author_id = author
        .id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))?;

    let text = require(&form.text, "Your review must have text!")?;
    if !(MIN_RATING..=MAX_RATING).contains(&form.rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    let store = stores
        .find_store(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {}", store_id)))?;

    let review = reviews
        .insert_review(Review {
            id: None,
            author: author_id,
            store: *store_id,
            text,
            rating: form.rating,
            created: bson_datetime(now),
        })
        .await?;

    log::info!("⭐ Review ({}/5) saved for {} by {}", review.rating, store.slug, author.email);
    Ok((review, store))
}
