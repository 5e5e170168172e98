//! Persistence ports used by the services.
//!
//! `MongoDB` implements all three against the document store; the test
//! suite swaps in an in-memory implementation with the same semantics.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::models::{RankedStore, Review, Store, StoreSummary, TagCount, User};
use crate::utils::AppResult;

pub const DUPLICATE_EMAIL: &str = "A user with the given email is already registered";

#[async_trait::async_trait]
pub trait StoreRepository: Send + Sync {
    /// Inserts and returns the store with its assigned id
    async fn insert_store(&self, store: Store) -> AppResult<Store>;

    /// Replaces the whole document; `None` when the id no longer exists
    async fn replace_store(&self, store: &Store) -> AppResult<Option<Store>>;

    async fn find_store(&self, id: &ObjectId) -> AppResult<Option<Store>>;

    async fn find_store_by_slug(&self, slug: &str) -> AppResult<Option<Store>>;

    async fn find_stores_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Store>>;

    /// Number of stores whose slug is `base` or `base-<digits>` (case-insensitive),
    /// ignoring `exclude`
    async fn count_slug_collisions(&self, base: &str, exclude: Option<ObjectId>)
        -> AppResult<u64>;

    /// Newest first
    async fn list_stores(&self, skip: u64, limit: i64) -> AppResult<Vec<Store>>;

    async fn count_stores(&self) -> AppResult<u64>;

    /// Stores carrying `tag`, or every store with at least one tag
    async fn find_stores_by_tag(&self, tag: Option<&str>) -> AppResult<Vec<Store>>;

    /// Occurrences of each tag across all stores, most popular first
    async fn tag_counts(&self) -> AppResult<Vec<TagCount>>;

    /// Stores with more than one review, best average rating first
    async fn top_rated(&self, limit: i64) -> AppResult<Vec<RankedStore>>;

    /// Stores within `max_distance` meters of the point, nearest first
    async fn find_near(
        &self,
        lng: f64,
        lat: f64,
        max_distance: f64,
        limit: i64,
    ) -> AppResult<Vec<StoreSummary>>;

    /// Text search over name and description, best score first
    async fn search_stores(&self, query: &str, limit: i64) -> AppResult<Vec<Store>>;
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with a validation error when the email is already registered
    async fn insert_user(&self, user: User) -> AppResult<User>;

    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn update_profile(&self, id: &ObjectId, name: &str, email: &str)
        -> AppResult<Option<User>>;

    async fn set_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expires: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Matches only while the token's expiry is strictly after `now`
    async fn find_user_by_reset_token(&self, token: &str, now: DateTime<Utc>)
        -> AppResult<Option<User>>;

    /// Stores the new hash and clears both reset fields
    async fn complete_password_reset(&self, id: &ObjectId, password_hash: &str)
        -> AppResult<Option<User>>;

    /// Set semantics: adding twice keeps a single entry
    async fn add_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>>;

    async fn remove_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>>;
}

#[async_trait::async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: Review) -> AppResult<Review>;

    async fn find_reviews_for_store(&self, store: &ObjectId) -> AppResult<Vec<Review>>;
}
