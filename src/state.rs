//! Application state shared across handlers

use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{MongoDB, ReviewRepository, StoreRepository, UserRepository};
use crate::services::{JwtSessionStore, LogMailer, Mailer, SessionStore, SmtpMailer};
use crate::utils::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub stores: Arc<dyn StoreRepository>,
    pub users: Arc<dyn UserRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
    /// Only present when running against a real server (health checks ping it)
    pub mongo: Option<MongoDB>,
}

impl AppState {
    pub fn new(db: MongoDB, config: AppConfig) -> AppResult<Self> {
        let shared = Arc::new(db.clone());
        let mailer = mailer_for(&config)?;
        let sessions = Arc::new(JwtSessionStore::new(
            shared.clone(),
            &config.session_secret,
            config.session_ttl_hours,
        ));

        Ok(AppState {
            stores: shared.clone(),
            users: shared.clone(),
            reviews: shared,
            sessions,
            mailer,
            config: Arc::new(config),
            mongo: Some(db),
        })
    }
}

fn mailer_for(config: &AppConfig) -> AppResult<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => {
            log::info!("📧 SMTP relay: {}:{}", smtp.host, smtp.port);
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            log::warn!("⚠️  SMTP_HOST not set, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn in_memory(
        db: Arc<crate::database::memory::MemoryDatabase>,
        mailer: Arc<dyn Mailer>,
        config: AppConfig,
    ) -> Self {
        let sessions = Arc::new(JwtSessionStore::new(
            db.clone(),
            &config.session_secret,
            config.session_ttl_hours,
        ));

        AppState {
            stores: db.clone(),
            users: db.clone(),
            reviews: db,
            sessions,
            mailer,
            config: Arc::new(config),
            mongo: None,
        }
    }
}
