pub mod auth;
pub mod health;
pub mod reviews;
pub mod store_api;
pub mod stores;
pub mod swagger;

use actix_web::{web, HttpRequest, HttpResponse};
use mongodb::bson::oid::ObjectId;

use crate::config::AppConfig;
use crate::utils::flash::{self, Flash};
use crate::utils::{AppError, AppResult};

/// Form validation failures go back to `location` as a flash message;
/// everything else is rendered by `AppError`.
pub(crate) fn flash_back(err: AppError, location: &str) -> AppResult<HttpResponse> {
    match err {
        AppError::Validation(msg) | AppError::Upload(msg) => {
            log::warn!("⚠️  Rejected form input: {}", msg);
            Ok(flash::redirect(location, vec![Flash::error(msg)]))
        }
        other => Err(other),
    }
}

pub(crate) fn parse_object_id(raw: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("No store with id '{}'", raw)))
}

/// Scheme and host links in outgoing mail should point at
pub(crate) fn base_url(req: &HttpRequest, config: &AppConfig) -> String {
    match &config.public_url {
        Some(url) => url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // ==================== STORES ====================
        .route("/", web::get().to(stores::index))
        .route("/stores", web::get().to(stores::index))
        .route("/stores/page/{page}", web::get().to(stores::list_page))
        .route("/add", web::get().to(stores::add_form))
        .route("/add", web::post().to(stores::create))
        .route("/add/{id}", web::post().to(stores::update))
        .route("/stores/{id}/edit", web::get().to(stores::edit_form))
        .route("/store/{slug}", web::get().to(stores::show))
        .route("/stores/{slug}", web::get().to(stores::show))
        .route("/tags", web::get().to(stores::tags))
        .route("/tags/{tag}", web::get().to(stores::tags))
        .route("/top", web::get().to(stores::top))
        .route("/hearts", web::get().to(stores::hearts))
        .route("/reviews/{id}", web::post().to(reviews::create))
        // ==================== ACCOUNTS ====================
        .route("/login", web::get().to(auth::login_form))
        .route("/login", web::post().to(auth::login))
        .route("/register", web::get().to(auth::register_form))
        .route("/register", web::post().to(auth::register))
        .route("/logout", web::get().to(auth::logout))
        .route("/account", web::get().to(auth::account))
        .route("/account", web::post().to(auth::update_account))
        .route("/account/forgot", web::post().to(auth::forgot))
        .route("/account/reset/{token}", web::get().to(auth::reset_form))
        .route("/account/reset/{token}", web::post().to(auth::reset))
        // ==================== JSON API ====================
        .service(
            web::scope("/api")
                .route("/search", web::get().to(store_api::search))
                .route("/stores/near", web::get().to(store_api::near))
                .route("/stores/{id}/heart", web::post().to(store_api::heart)),
        );
}
