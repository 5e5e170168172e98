//! Store catalogue: create/edit with slug assignment, paginated listing,
//! tag browsing, proximity and text search, rankings.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use super::slug_service::assign_slug;
use crate::database::{ReviewRepository, StoreRepository, UserRepository};
use crate::models::{
    bson_datetime, Location, RankedStore, Review, Store, StoreForm, StoreSummary, TagCount, User,
};
use crate::utils::validation::require;
use crate::utils::{AppError, AppResult};

pub const PAGE_SIZE: u64 = 4;
pub const NEAR_MAX_DISTANCE_METERS: f64 = 10_000.0;
pub const NEAR_LIMIT: i64 = 10;
pub const SEARCH_LIMIT: i64 = 5;
pub const TOP_LIMIT: i64 = 10;

pub const NOT_OWNER: &str = "You must own a store in order to edit it.";

/// Form fields after trimming and validation
#[derive(Debug, Clone, PartialEq)]
struct StoreInput {
    name: String,
    description: String,
    tags: Vec<String>,
    location: Location,
}

pub fn coordinates_in_range(lng: f64, lat: f64) -> bool {
    lng.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)
}

fn validate(form: &StoreForm) -> AppResult<StoreInput> {
    let name = require(&form.name, "Please enter a store name")?;
    let address = require(&form.address, "You must supply an address")?;

    let (Some(lng), Some(lat)) = (form.lng, form.lat) else {
        return Err(AppError::Validation("You must supply coordinates".to_string()));
    };
    if !coordinates_in_range(lng, lat) {
        return Err(AppError::Validation("Coordinates are out of range".to_string()));
    }

    // Tags behave as a set; first occurrence wins the position
    let mut tags: Vec<String> = Vec::new();
    for tag in form.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }

    Ok(StoreInput {
        name,
        description: form.description.trim().to_string(),
        tags,
        location: Location::point(lng, lat, address),
    })
}

fn user_id(user: &User) -> AppResult<ObjectId> {
    user.id
        .ok_or_else(|| AppError::Internal("User has no id".to_string()))
}

/// Field validation alone, so callers can reject a form before doing
/// anything expensive with it
pub fn check_form(form: &StoreForm) -> AppResult<()> {
    validate(form).map(|_| ())
}

pub async fn create_store(
    stores: &dyn StoreRepository,
    author: &User,
    form: &StoreForm,
    now: DateTime<Utc>,
) -> AppResult<Store> {
    let input = validate(form)?;
    let slug = assign_slug(stores, &input.name, None).await?;

    let store = stores
        .insert_store(Store {
            id: None,
            name: input.name,
            slug,
            description: input.description,
            tags: input.tags,
            created: bson_datetime(now),
            location: input.location,
            photo: form.photo.clone(),
            author: user_id(author)?,
        })
        .await?;

    log::info!("🏪 Store created: {} ({})", store.slug, store.id_hex());
    Ok(store)
}

pub fn confirm_owner(store: &Store, user: &User) -> AppResult<()> {
    if Some(store.author) != user.id {
        log::warn!("🚫 {} tried to edit store {}", user.email, store.slug);
        return Err(AppError::Forbidden(NOT_OWNER.to_string()));
    }
    Ok(())
}

/// The store, provided `user` is its author
pub async fn find_editable(
    stores: &dyn StoreRepository,
    id: &ObjectId,
    user: &User,
) -> AppResult<Store> {
    let store = stores
        .find_store(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {}", id)))?;
    confirm_owner(&store, user)?;
    Ok(store)
}

/// Applies the form to an existing store. The slug only changes when the
/// name does; a missing photo keeps the current one.
pub async fn update_store(
    stores: &dyn StoreRepository,
    id: &ObjectId,
    user: &User,
    form: &StoreForm,
) -> AppResult<Store> {
    let existing = find_editable(stores, id, user).await?;
    let input = validate(form)?;

    let slug = if input.name != existing.name {
        assign_slug(stores, &input.name, Some(*id)).await?
    } else {
        existing.slug.clone()
    };

    let updated = Store {
        id: Some(*id),
        name: input.name,
        slug,
        description: input.description,
        tags: input.tags,
        created: existing.created,
        location: input.location,
        photo: form.photo.clone().or(existing.photo),
        author: existing.author,
    };

    let store = stores
        .replace_store(&updated)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {}", id)))?;

    log::info!("✏️  Store updated: {} ({})", store.slug, id);
    Ok(store)
}

/// Related documents to load alongside a store
#[derive(Debug, Clone, Copy, Default)]
pub struct Populate {
    pub author: bool,
    pub reviews: bool,
}

impl Populate {
    pub fn all() -> Self {
        Populate { author: true, reviews: true }
    }
}

#[derive(Debug, Clone)]
pub struct StoreDetails {
    pub store: Store,
    pub author: Option<User>,
    pub reviews: Option<Vec<Review>>,
}

pub async fn get_by_slug(
    stores: &dyn StoreRepository,
    users: &dyn UserRepository,
    reviews: &dyn ReviewRepository,
    slug: &str,
    populate: Populate,
) -> AppResult<StoreDetails> {
    let store = stores
        .find_store_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store '{}'", slug)))?;

    let author = if populate.author {
        users.find_user(&store.author).await?
    } else {
        None
    };

    let reviews = match (populate.reviews, store.id) {
        (true, Some(id)) => Some(reviews.find_reviews_for_store(&id).await?),
        (true, None) => Some(Vec::new()),
        (false, _) => None,
    };

    Ok(StoreDetails { store, author, reviews })
}

#[derive(Debug, Clone)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub page: u64,
    pub pages: u64,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub enum PageResult {
    Page(StorePage),
    /// Requested page is past the end; `last` is where to send the user
    Redirect { requested: u64, last: u64 },
}

/// Page numbers start at 1; zero and garbage fall back to the first page
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

pub fn page_count(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE)
}

/// Newest first, `PAGE_SIZE` per page
pub async fn list_page(stores: &dyn StoreRepository, page: u64) -> AppResult<PageResult> {
    let page = page.max(1);

    // Anything Mongo can't skip to is past the end anyway
    let Some(skip) = (page - 1)
        .checked_mul(PAGE_SIZE)
        .filter(|skip| *skip <= i64::MAX as u64)
    else {
        let pages = page_count(stores.count_stores().await?);
        log::info!("📄 Page {} requested but only {} exist", page, pages);
        return Ok(PageResult::Redirect { requested: page, last: pages.max(1) });
    };

    let (list, count) = futures::try_join!(
        stores.list_stores(skip, PAGE_SIZE as i64),
        stores.count_stores()
    )?;
    let pages = page_count(count);

    if list.is_empty() && skip > 0 {
        log::info!("📄 Page {} requested but only {} exist", page, pages);
        return Ok(PageResult::Redirect { requested: page, last: pages.max(1) });
    }

    Ok(PageResult::Page(StorePage { stores: list, page, pages, count }))
}

pub fn missing_page_notice(requested: u64, last: u64) -> String {
    format!(
        "Hey! You asked for page {}, but that doesn't exist. I put you on page {}",
        requested, last
    )
}

#[derive(Debug, Clone)]
pub struct TagPage {
    pub tag: Option<String>,
    pub tags: Vec<TagCount>,
    pub stores: Vec<Store>,
}

/// Tag popularity plus the stores carrying `tag` (or every tagged store)
pub async fn by_tag(stores: &dyn StoreRepository, tag: Option<&str>) -> AppResult<TagPage> {
    let tag = tag.map(str::trim).filter(|t| !t.is_empty());

    let (tags, tagged) = futures::try_join!(stores.tag_counts(), stores.find_stores_by_tag(tag))?;

    Ok(TagPage {
        tag: tag.map(str::to_string),
        tags,
        stores: tagged,
    })
}

pub async fn search(stores: &dyn StoreRepository, query: &str) -> AppResult<Vec<Store>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    stores.search_stores(query, SEARCH_LIMIT).await
}

pub async fn near(
    stores: &dyn StoreRepository,
    lng: f64,
    lat: f64,
) -> AppResult<Vec<StoreSummary>> {
    if !coordinates_in_range(lng, lat) {
        return Err(AppError::InvalidRequest(format!(
            "Coordinates out of range: lng={}, lat={}",
            lng, lat
        )));
    }
    stores
        .find_near(lng, lat, NEAR_MAX_DISTANCE_METERS, NEAR_LIMIT)
        .await
}

pub async fn top(stores: &dyn StoreRepository) -> AppResult<Vec<RankedStore>> {
    stores.top_rated(TOP_LIMIT).await
}

pub async fn hearted(stores: &dyn StoreRepository, user: &User) -> AppResult<Vec<Store>> {
    stores.find_stores_by_ids(&user.hearts).await
}
