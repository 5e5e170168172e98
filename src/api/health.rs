use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    /// `connected`, `disconnected` or `in-memory`
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = match &state.mongo {
        Some(db) if db.ping().await => "connected",
        Some(_) => "disconnected",
        None => "in-memory",
    };

    let body = HealthResponse {
        status: if database == "disconnected" { "degraded" } else { "healthy" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        database: database.to_string(),
    };

    if database == "disconnected" {
        log::error!("❌ Health check: MongoDB is not answering");
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}
