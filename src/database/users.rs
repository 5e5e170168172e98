use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;

use super::repository::DUPLICATE_EMAIL;
use super::{is_duplicate_key, MongoDB, UserRepository, USERS};
use crate::models::{bson_datetime, User};
use crate::utils::{AppError, AppResult};

impl MongoDB {
    async fn update_user(&self, id: &ObjectId, update: Document) -> AppResult<Option<User>> {
        self.collection::<User>(USERS)
            .find_one_and_update(doc! { "_id": *id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Validation(DUPLICATE_EMAIL.to_string())
                } else {
                    AppError::from(e)
                }
            })
    }
}

#[async_trait::async_trait]
impl UserRepository for MongoDB {
    async fn insert_user(&self, mut user: User) -> AppResult<User> {
        let result = self
            .collection::<User>(USERS)
            .insert_one(&user)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Validation(DUPLICATE_EMAIL.to_string())
                } else {
                    AppError::from(e)
                }
            })?;

        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "_id": *id })
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "email": email })
            .await?)
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        name: &str,
        email: &str,
    ) -> AppResult<Option<User>> {
        self.update_user(id, doc! { "$set": { "name": name, "email": email } })
            .await
    }

    async fn set_reset_token(
        &self,
        id: &ObjectId,
        token: &str,
        expires: DateTime<Utc>,
    ) -> AppResult<()> {
        self.collection::<User>(USERS)
            .update_one(
                doc! { "_id": *id },
                doc! {
                    "$set": {
                        "reset_password_token": token,
                        "reset_password_expires": bson_datetime(expires),
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn find_user_by_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! {
                "reset_password_token": token,
                "reset_password_expires": { "$gt": bson_datetime(now) },
            })
            .await?)
    }

    async fn complete_password_reset(
        &self,
        id: &ObjectId,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        self.update_user(
            id,
            doc! {
                "$set": { "password_hash": password_hash },
                "$unset": { "reset_password_token": "", "reset_password_expires": "" },
            },
        )
        .await
    }

    async fn add_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>> {
        self.update_user(id, doc! { "$addToSet": { "hearts": *store } })
            .await
    }

    async fn remove_heart(&self, id: &ObjectId, store: &ObjectId) -> AppResult<Option<User>> {
        self.update_user(id, doc! { "$pull": { "hearts": *store } })
            .await
    }
}
