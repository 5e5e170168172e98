//! Store photo uploads: type check, resize to a fixed width, write to disk.

use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;
use uuid::Uuid;

use crate::utils::thread_pool::spawn_image_blocking;
use crate::utils::{AppError, AppResult};

pub const PHOTO_WIDTH: u32 = 800;
pub const INVALID_FILE_TYPE: &str = "Invalid file type";

/// Extension for a declared MIME type, e.g. `image/jpeg` → `jpeg`.
/// Anything outside `image/*` is rejected.
pub fn photo_extension(content_type: &str) -> AppResult<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => Ok(subtype.to_string()),
        _ => {
            log::warn!("🚫 Rejected upload with content type '{}'", content_type);
            Err(AppError::Upload(INVALID_FILE_TYPE.to_string()))
        }
    }
}

fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let height = ((img.height() as f64) * (width as f64) / (img.width().max(1) as f64))
        .round()
        .max(1.0) as u32;
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Decodes `bytes`, resizes to `PHOTO_WIDTH` keeping the aspect ratio and
/// writes `<uuid>.<extension>` into `upload_dir`. Returns the file name.
pub async fn resize_and_store(
    bytes: Vec<u8>,
    extension: String,
    upload_dir: &str,
) -> AppResult<String> {
    let format = ImageFormat::from_extension(&extension)
        .ok_or_else(|| AppError::Upload(INVALID_FILE_TYPE.to_string()))?;
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = Path::new(upload_dir).join(&file_name);
    let dir = upload_dir.to_string();

    spawn_image_blocking(move || -> AppResult<()> {
        let img = image::load_from_memory(&bytes)?;
        let resized = resize_to_width(&img, PHOTO_WIDTH);

        // JPEG has no alpha channel
        let resized = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };

        std::fs::create_dir_all(&dir)?;
        resized.save_with_format(&path, format)?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Image worker failed: {}", e)))??;

    log::info!("📸 Photo stored: {}", file_name);
    Ok(file_name)
}

/// Removes a stored photo whose store was never saved
pub fn discard_photo(upload_dir: &str, file_name: &str) {
    let path = Path::new(upload_dir).join(file_name);
    match std::fs::remove_file(&path) {
        Ok(()) => log::info!("🗑️  Discarded photo: {}", file_name),
        Err(e) => log::warn!("⚠️  Could not discard photo {}: {}", path.display(), e),
    }
}
