use futures::stream::TryStreamExt;
use mongodb::bson::{doc, from_document, oid::ObjectId, Document};

use super::{pipelines, MongoDB, StoreRepository, STORES};
use crate::models::{RankedStore, Store, StoreSummary, TagCount};
use crate::utils::{AppError, AppResult};

#[async_trait::async_trait]
impl StoreRepository for MongoDB {
    async fn insert_store(&self, mut store: Store) -> AppResult<Store> {
        let result = self.collection::<Store>(STORES).insert_one(&store).await?;
        store.id = result.inserted_id.as_object_id();
        if store.id.is_none() {
            return Err(AppError::DatabaseError(
                "Inserted store has no ObjectId".to_string(),
            ));
        }
        Ok(store)
    }

    async fn replace_store(&self, store: &Store) -> AppResult<Option<Store>> {
        let id = store
            .id
            .ok_or_else(|| AppError::InvalidRequest("Store has no id".to_string()))?;

        let result = self
            .collection::<Store>(STORES)
            .replace_one(doc! { "_id": id }, store)
            .await?;

        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(store.clone()))
    }

    async fn find_store(&self, id: &ObjectId) -> AppResult<Option<Store>> {
        Ok(self
            .collection::<Store>(STORES)
            .find_one(doc! { "_id": *id })
            .await?)
    }

    async fn find_store_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        Ok(self
            .collection::<Store>(STORES)
            .find_one(doc! { "slug": slug })
            .await?)
    }

    async fn find_stores_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Store>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection::<Store>(STORES)
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_slug_collisions(
        &self,
        base: &str,
        exclude: Option<ObjectId>,
    ) -> AppResult<u64> {
        Ok(self
            .collection::<Document>(STORES)
            .count_documents(pipelines::slug_collision_filter(base, exclude))
            .await?)
    }

    async fn list_stores(&self, skip: u64, limit: i64) -> AppResult<Vec<Store>> {
        let cursor = self
            .collection::<Store>(STORES)
            .find(doc! {})
            .sort(doc! { "created": -1 })
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_stores(&self) -> AppResult<u64> {
        Ok(self
            .collection::<Document>(STORES)
            .count_documents(doc! {})
            .await?)
    }

    async fn find_stores_by_tag(&self, tag: Option<&str>) -> AppResult<Vec<Store>> {
        let cursor = self
            .collection::<Store>(STORES)
            .find(pipelines::tag_filter(tag))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn tag_counts(&self) -> AppResult<Vec<TagCount>> {
        let docs: Vec<Document> = self
            .collection::<Document>(STORES)
            .aggregate(pipelines::tag_counts_pipeline())
            .await?
            .try_collect()
            .await?;

        docs.into_iter()
            .map(|d| from_document::<TagCount>(d).map_err(AppError::from))
            .collect()
    }

    async fn top_rated(&self, limit: i64) -> AppResult<Vec<RankedStore>> {
        let docs: Vec<Document> = self
            .collection::<Document>(STORES)
            .aggregate(pipelines::top_stores_pipeline(limit))
            .await?
            .try_collect()
            .await?;

        docs.into_iter()
            .map(|d| from_document::<RankedStore>(d).map_err(AppError::from))
            .collect()
    }

    async fn find_near(
        &self,
        lng: f64,
        lat: f64,
        max_distance: f64,
        limit: i64,
    ) -> AppResult<Vec<StoreSummary>> {
        let cursor = self
            .collection::<StoreSummary>(STORES)
            .find(pipelines::near_filter(lng, lat, max_distance))
            .projection(pipelines::near_projection())
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_stores(&self, query: &str, limit: i64) -> AppResult<Vec<Store>> {
        let cursor = self
            .collection::<Store>(STORES)
            .find(pipelines::text_search_filter(query))
            .projection(pipelines::text_score())
            .sort(pipelines::text_score())
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
