mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
mod utils;

#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::state::AppState;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    log::error!("❌ {}", e);
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

fn cors_for(config: &AppConfig) -> Cors {
    let cors = match &config.cors_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .supports_credentials(),
        // Sem origem configurada: só leitura de qualquer lugar
        None => Cors::default().allow_any_origin(),
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(startup_error)?;

    log::info!("🚀 Starting Store Directory...");
    log::info!("📊 Database: {}", config.database_url);

    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| startup_error(format!("Failed to connect to MongoDB: {}", e)))?;

    log::info!("✅ MongoDB connected successfully");

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(db, config).map_err(startup_error)?;
    let state_data = web::Data::new(state);

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    let openapi = api::swagger::ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(middleware::SessionMiddleware)
            .wrap(cors_for(&state_data.config))
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
