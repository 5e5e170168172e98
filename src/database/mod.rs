pub mod pipelines;
pub mod repository;
mod reviews;
mod stores;
mod users;

#[cfg(test)]
pub mod memory;

pub use repository::{ReviewRepository, StoreRepository, UserRepository};

use mongodb::{Client, Collection, Database};
use std::error::Error;

pub const STORES: &str = "stores";
pub const USERS: &str = "users";
pub const REVIEWS: &str = "reviews";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("stores");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the queries rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::{doc, Document};
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let stores = self.collection::<Document>(STORES);

        // Full-text search over name + description
        let text_index = IndexModel::builder()
            .keys(doc! { "name": "text", "description": "text" })
            .build();

        match stores.create_index(text_index).await {
            Ok(_) => log::info!("   ✅ Index created: stores(name, description) text"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Nearest-neighbour queries on location
        let geo_index = IndexModel::builder()
            .keys(doc! { "location": "2dsphere" })
            .build();

        match stores.create_index(geo_index).await {
            Ok(_) => log::info!("   ✅ Index created: stores(location) 2dsphere"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Slug lookups; uniqueness comes from suffix disambiguation, not the index
        let slug_index = IndexModel::builder().keys(doc! { "slug": 1 }).build();

        match stores.create_index(slug_index).await {
            Ok(_) => log::info!("   ✅ Index created: stores(slug)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let users = self.collection::<Document>(USERS);

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let reviews = self.collection::<Document>(REVIEWS);

        let review_store_index = IndexModel::builder().keys(doc! { "store": 1 }).build();

        match reviews.create_index(review_store_index).await {
            Ok(_) => log::info!("   ✅ Index created: reviews(store)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Check if the connection is healthy
    pub async fn ping(&self) -> bool {
        self.db
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await
            .is_ok()
    }
}

/// Mongo reports duplicate keys (e.g. the unique email index) as code 11000
pub(crate) fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(w)) => w.code == 11000,
        ErrorKind::Command(c) => c.code == 11000,
        _ => false,
    }
}
