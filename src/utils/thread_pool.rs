//! Worker runtime for photo uploads.
//!
//! `resize_and_store` decodes and resizes on the blocking threads of this
//! runtime and awaits the result, so a large upload never ties up an actix
//! worker.

use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    /// Every thread it spawns is named `image-worker`
    pub static ref IMAGE_POOL: Arc<Runtime> = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("image-worker")
            .enable_all()
            .build()
            .expect("Failed to create image thread pool")
    );
}

/// Runs `f` on `IMAGE_POOL` and waits for it
pub async fn spawn_image_blocking<F, R>(f: F) -> Result<R, tokio::task::JoinError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    IMAGE_POOL.spawn_blocking(f).await
}
