use std::env;
use std::fmt;

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: String,
    /// Base for links in outgoing mail; falls back to the request Host
    pub public_url: Option<String>,
    pub cors_origin: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug)]
pub struct ConfigError(String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

const DEV_SESSION_SECRET: &str = "dev-session-secret-change-me";

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = optional("DATABASE_URL")
            .ok_or_else(|| ConfigError("DATABASE_URL must be set".to_string()))?;

        let session_secret = match optional("SESSION_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                log::warn!("⚠️  SESSION_SECRET not set, using development default");
                DEV_SESSION_SECRET.to_string()
            }
            None => return Err(ConfigError("SESSION_SECRET must be set".to_string())),
        };

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: var_or("SMTP_USERNAME", ""),
                password: var_or("SMTP_PASSWORD", ""),
                from_address: var_or("MAIL_FROM", "Stores <noreply@localhost>"),
            }),
            None => None,
        };

        Ok(AppConfig {
            host: var_or("HOST", "0.0.0.0"),
            port: parsed("PORT", 7777)?,
            database_url,
            session_secret,
            session_ttl_hours: parsed("SESSION_TTL_HOURS", 24 * 14)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            upload_dir: var_or("UPLOAD_DIR", "./public/uploads"),
            public_url: optional("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string()),
            cors_origin: optional("CORS_ORIGIN"),
            smtp,
        })
    }

    /// Config for tests: no database URL needed, cheap bcrypt cost
    #[cfg(test)]
    pub fn for_tests() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "mongodb://localhost:27017/stores_test".to_string(),
            session_secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            bcrypt_cost: 4,
            upload_dir: std::env::temp_dir()
                .join(format!("store-uploads-{}", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            public_url: None,
            cors_origin: None,
            smtp: None,
        }
    }
}
