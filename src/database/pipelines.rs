//! Query documents and aggregation pipelines for the `stores` collection.

use mongodb::bson::{doc, oid::ObjectId, Document};

use super::REVIEWS;
use crate::services::slug_service::collision_pattern;

/// `{slug: /^(base)((-[0-9]*$)?)$/i}`, optionally skipping one store
pub fn slug_collision_filter(base: &str, exclude: Option<ObjectId>) -> Document {
    let mut filter = doc! {
        "slug": { "$regex": collision_pattern(base), "$options": "i" }
    };
    if let Some(id) = exclude {
        filter.insert("_id", doc! { "$ne": id });
    }
    filter
}

pub fn tag_filter(tag: Option<&str>) -> Document {
    match tag {
        Some(tag) => doc! { "tags": tag },
        None => doc! { "tags": { "$exists": true, "$ne": [] } },
    }
}

/// unwind → group by tag → most popular first
pub fn tag_counts_pipeline() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$tags" },
        doc! { "$group": { "_id": "$tags", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ]
}

/// lookup reviews → keep stores with a second review → average → sort → limit
pub fn top_stores_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": REVIEWS,
                "localField": "_id",
                "foreignField": "store",
                "as": "reviews"
            }
        },
        // "reviews.1" only exists when there are at least two reviews
        doc! { "$match": { "reviews.1": { "$exists": true } } },
        doc! {
            "$project": {
                "photo": "$$ROOT.photo",
                "name": "$$ROOT.name",
                "slug": "$$ROOT.slug",
                "reviews": "$$ROOT.reviews",
                "average_rating": { "$avg": "$reviews.rating" }
            }
        },
        doc! { "$sort": { "average_rating": -1 } },
        doc! { "$limit": limit },
    ]
}

pub fn near_filter(lng: f64, lat: f64, max_distance: f64) -> Document {
    doc! {
        "location": {
            "$near": {
                "$geometry": { "type": "Point", "coordinates": [lng, lat] },
                "$maxDistance": max_distance
            }
        }
    }
}

pub fn near_projection() -> Document {
    doc! { "slug": 1, "name": 1, "description": 1, "location": 1, "photo": 1 }
}

pub fn text_search_filter(query: &str) -> Document {
    doc! { "$text": { "$search": query } }
}

pub fn text_score() -> Document {
    doc! { "score": { "$meta": "textScore" } }
}
