pub mod auth;
pub mod security_headers;

pub use auth::{CurrentUser, SessionMiddleware, SESSION_COOKIE};
pub use security_headers::SecurityHeaders;
