#[cfg(test)]
pub mod aggregation;
pub mod auth_service;
pub mod mail_service;
pub mod password_reset_service;
pub mod review_service;
pub mod session_service;
pub mod slug_service;
pub mod store_service;
pub mod upload_service;
pub mod user_service;

pub use mail_service::{LogMailer, Mailer, SmtpMailer};
pub use session_service::{JwtSessionStore, SessionStore};
