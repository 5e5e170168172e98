//! In-memory repositories for tests. Mirrors the Mongo query semantics
//! closely enough for the services to be exercised without a server.

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use regex::RegexBuilder;
use std::sync::Mutex;

use super::repository::{ReviewRepository, StoreRepository, UserRepository, DUPLICATE_EMAIL};
use crate::models::{bson_datetime, RankedStore, Review, Store, StoreSummary, TagCount, User};
use crate::services::aggregation::{rank_top_stores, tally_tags};
use crate::services::slug_service::collision_pattern;
use crate::utils::{AppError, AppResult};

/// Radius MongoDB uses for 2dsphere distances
const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

#[derive(Default)]
pub struct MemoryDatabase {
    stores: Mutex<Vec<Store>>,
    users: Mutex<Vec<User>>,
    reviews: Mutex<Vec<Review>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Vec<Store> {
        self.stores.lock().unwrap().clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    /// Test hook for moving a token's expiry around
    pub fn set_reset_expiry(&self, id: &ObjectId, expires: DateTime<Utc>) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id.as_ref() == Some(id)) {
            user.reset_password_expires = Some(bson_datetime(expires));
        }
    }

    fn update_user<F>(&self, id: &ObjectId, f: F) -> AppResult<Option<User>>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.id.as_ref() == Some(id))
            .map(|user| {
                f(user);
                user.clone()
            }))
    }
}

pub fn haversine_meters(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait::async_trait]
impl StoreRepository for MemoryDatabase {
    async fn insert_store(&self, mut store: Store) -> AppResult<Store> {
        store.id = Some(store.id.unwrap_or_default());
        self.stores.lock().unwrap().push(store.clone());
        Ok(store)
    }

    async fn replace_store(&self, store: &Store) -> AppResult<Option<Store>> {
        let mut stores = self.stores.lock().unwrap();
        Ok(stores.iter_mut().find(|s| s.id == store.id).map(|existing| {
            *existing = store.clone();
            existing.clone()
        }))
    }

    async fn find_store(&self, id: &ObjectId) -> AppResult<Option<Store>> {
        let stores = self.stores.lock().unwrap();
        Ok(stores.iter().find(|s| s.id.as_ref() == Some(id)).cloned())
    }

    async fn find_store_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        let stores = self.stores.lock().unwrap();
        Ok(stores.iter().find(|s| s.slug == slug).cloned())
    }

    async fn find_stores_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Store>> {
        let stores = self.stores.lock().unwrap();
        Ok(stores
            .iter()
            .filter(|s| s.id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn count_slug_collisions(
        &self,
        base: &str,
        exclude: Option<ObjectId>,
    ) -> AppResult<u64> {
        let re = RegexBuilder::new(&collision_pattern(base))
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let stores = self.stores.lock().unwrap();
        Ok(stores
            .iter()
            .filter(|s| exclude.is_none() || s.id != exclude)
            .filter(|s| re.is_match(&s.slug))
            .count() as u64)
    }

    async fn list_stores(&self, skip: u64, limit: i64) -> AppResult<Vec<Store>> {
        let mut stores = self.stores();
        stores.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(stores
            .into_iter()
            .skip(skip as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_stores(&self) -> AppResult<u64> {
        Ok(self.stores.lock().unwrap().len() as u64)
    }

    async fn find_stores_by_tag(&self, tag: Option<&str>) -> AppResult<Vec<Store>> {
        let stores = self.stores.lock().unwrap();
        Ok(stores
            .iter()
            .filter(|s| match tag {
                Some(tag) => s.tags.iter().any(|t| t == tag),
                None => !s.tags.is_empty(),
            })
            .cloned()
            .collect())
    }

    async fn tag_counts(&self) -> AppResult<Vec<TagCount>> {
        let stores = self.stores.lock().unwrap();
        Ok(tally_tags(stores.iter().map(|s| s.tags.as_slice())))
    }

    async fn top_rated(&self, limit: i64) -> AppResult<Vec<RankedStore>> {
        let stores = self.stores();
        let reviews = self.reviews.lock().unwrap().clone();
        Ok(rank_top_stores(&stores, &reviews, limit.max(0) as usize))
    }

    async fn find_near(
        &self,
        lng: f64,
        lat: f64,
        max_distance: f64,
        limit: i64,
    ) -> AppResult<Vec<StoreSummary>> {
        let stores = self.stores.lock().unwrap();
        let mut hits: Vec<(f64, StoreSummary)> = stores
            .iter()
            .map(|s| {
                let d = haversine_meters(lng, lat, s.location.lng(), s.location.lat());
                (d, StoreSummary::from(s))
            })
            .filter(|(d, _)| *d <= max_distance)
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, s)| s)
            .collect())
    }

    async fn search_stores(&self, query: &str, limit: i64) -> AppResult<Vec<Store>> {
        let terms = words(query);
        let stores = self.stores.lock().unwrap();

        let mut scored: Vec<(usize, Store)> = stores
            .iter()
            .map(|s| {
                let haystack = words(&format!("{} {}", s.name, s.description));
                let score = haystack.iter().filter(|w| terms.contains(w)).count();
                (score, s.clone())
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, s)| s)
            .collect())
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryDatabase {
    async fn insert_user(&self, mut user: User) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }
        user.id = Some(user.id.unwrap_or_default());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        name: &str,
        email: &str,
    ) -> AppResult<Option<User>> {
        let taken = self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email == email && u.id.as_ref() != Some(id));
        if taken {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }

        self.update_user(id, |u| {
            u.name = name.to_string();
            u.email = email.to_string();
        })
    }

    async fn set_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expires: DateTime<Utc>,
    ) -> AppResult<()> {
        self.update_user(id, |u| {
            u.reset_password_token = Some(token.to_string());
            u.reset_password_expires = Some(bson_datetime(expires));
        })?;
        Ok(())
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        let now: BsonDateTime = bson_datetime(now);
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token)
                    && u.reset_password_expires.map(|e| e > now).unwrap_or(false)
            })
            .cloned())
    }

    async fn complete_password_reset(
        &self,
        id: &ObjectId,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        self.update_user(id, |u| {
            u.password_hash = password_hash.to_string();
            u.reset_password_token = None;
            u.reset_password_expires = None;
        })
    }

    async fn add_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>> {
        self.update_user(id, |u| {
            if !u.hearts.contains(store) {
                u.hearts.push(*store);
            }
        })
    }

    async fn remove_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>> {
        self.update_user(id, |u| u.hearts.retain(|h| h != store))
    }
}

#[async_trait::async_trait]
impl ReviewRepository for MemoryDatabase {
    async fn insert_review(&self, mut review: Review) -> AppResult<Review> {
        review.id = Some(review.id.unwrap_or_default());
        self.reviews.lock().unwrap().push(review.clone());
        Ok(review)
    }

    async fn find_reviews_for_store(&self, store: &ObjectId) -> AppResult<Vec<Review>> {
        let reviews = self.reviews.lock().unwrap();
        Ok(reviews.iter().filter(|r| &r.store == store).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // Toronto City Hall → CN Tower is roughly 1.1 km
        let d = haversine_meters(-79.3832, 43.6534, -79.3871, 43.6426);
        assert!(d > 1_000.0 && d < 1_300.0, "distance was {}", d);
        assert_eq!(haversine_meters(1.0, 2.0, 1.0, 2.0), 0.0);
    }
}
