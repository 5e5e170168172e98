use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

use super::{MongoDB, ReviewRepository, REVIEWS};
use crate::models::Review;
use crate::utils::AppResult;

#[async_trait::async_trait]
impl ReviewRepository for MongoDB {
    async fn insert_review(&self, mut review: Review) -> AppResult<Review> {
        let result = self
            .collection::<Review>(REVIEWS)
            .insert_one(&review)
            .await?;
        review.id = result.inserted_id.as_object_id();
        Ok(review)
    }

    async fn find_reviews_for_store(&self, store: &ObjectId) -> AppResult<Vec<Review>> {
        let cursor = self
            .collection::<Review>(REVIEWS)
            .find(doc! { "store": *store })
            .sort(doc! { "created": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
