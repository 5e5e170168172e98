use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::{Review, ReviewView, UserView};

/// GeoJSON Point plus the human readable address it was geocoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    /// [lng, lat]
    pub coordinates: Vec<f64>,
    pub address: String,
}

impl Location {
    pub fn point(lng: f64, lat: f64, address: impl Into<String>) -> Self {
        Location {
            kind: "Point".to_string(),
            coordinates: vec![lng, lat],
            address: address.into(),
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates.first().copied().unwrap_or_default()
    }

    pub fn lat(&self) -> f64 {
        self.coordinates.get(1).copied().unwrap_or_default()
    }
}

/// Store (armazenado no MongoDB, collection `stores`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: BsonDateTime,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub author: ObjectId,
}

impl Store {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// Projection returned by the proximity query: only what the map needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSummary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&Store> for StoreSummary {
    fn from(s: &Store) -> Self {
        StoreSummary {
            id: s.id,
            slug: s.slug.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
            location: s.location.clone(),
            photo: s.photo.clone(),
        }
    }
}

/// One row of the tag popularity aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TagCount {
    #[serde(alias = "_id")]
    pub tag: String,
    pub count: i64,
}

/// Store annotated with the mean of its review ratings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStore {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub average_rating: f64,
}

/// Form payload for creating or editing a store (parsed from multipart)
#[derive(Debug, Clone, Default)]
pub struct StoreForm {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub photo: Option<String>,
}

// ==================== RESPONSES ====================

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StoreView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub tags: Vec<String>,
    /// RFC 3339
    pub created: String,
    pub location: Location,
    pub photo: Option<String>,
    pub author: String,
}

impl From<&Store> for StoreView {
    fn from(s: &Store) -> Self {
        StoreView {
            id: s.id_hex(),
            name: s.name.clone(),
            slug: s.slug.clone(),
            description: s.description.clone(),
            tags: s.tags.clone(),
            created: rfc3339(s.created),
            location: s.location.clone(),
            photo: s.photo.clone(),
            author: s.author.to_hex(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StoreSummaryView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
}

impl From<StoreSummary> for StoreSummaryView {
    fn from(s: StoreSummary) -> Self {
        StoreSummaryView {
            id: s.id.map(|id| id.to_hex()).unwrap_or_default(),
            slug: s.slug,
            name: s.name,
            description: s.description,
            location: s.location,
            photo: s.photo,
        }
    }
}

/// Store page payload; author and reviews are only present when requested
#[derive(Debug, Serialize)]
pub struct StoreDetailView {
    #[serde(flatten)]
    pub store: StoreView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_profile: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewView>>,
}

#[derive(Debug, Serialize)]
pub struct RankedStoreView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub photo: Option<String>,
    pub review_count: usize,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

impl From<RankedStore> for RankedStoreView {
    fn from(r: RankedStore) -> Self {
        RankedStoreView {
            id: r.id.to_hex(),
            name: r.name,
            slug: r.slug,
            photo: r.photo,
            review_count: r.reviews.len(),
            average_rating: r.average_rating,
        }
    }
}

pub fn rfc3339(dt: BsonDateTime) -> String {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
        .map(|d| d.to_rfc3339())
        .unwrap_or_default()
}

pub fn bson_datetime(dt: chrono::DateTime<chrono::Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}
