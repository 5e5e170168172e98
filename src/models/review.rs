use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::rfc3339;

/// Review de uma store (collection `reviews`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub author: ObjectId,
    pub store: ObjectId,
    pub text: String,
    /// 1..=5
    pub rating: i32,
    pub created: BsonDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub text: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: String,
    pub author: String,
    pub store: String,
    pub text: String,
    pub rating: i32,
    pub created: String,
}

impl From<&Review> for ReviewView {
    fn from(r: &Review) -> Self {
        ReviewView {
            id: r.id.map(|id| id.to_hex()).unwrap_or_default(),
            author: r.author.to_hex(),
            store: r.store.to_hex(),
            text: r.text.clone(),
            rating: r.rating,
            created: rfc3339(r.created),
        }
    }
}
