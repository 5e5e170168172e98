//! Input validation utilities

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{AppError, AppResult};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex");
}

/// Emails are stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email syntax, returning the normalized address
pub fn validate_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err(AppError::Validation("Please supply an email address".to_string()));
    }

    if email.len() > 254 || !EMAIL_REGEX.is_match(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(email)
}

/// Trimmed value of a required text field, or `message` when blank
pub fn require(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(value.to_string())
}

/// Password and confirmation must match exactly
pub fn confirm_passwords(password: &str, confirm: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be blank".to_string()));
    }
    if password != confirm {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email("  Wes@Example.COM ").unwrap(),
            "wes@example.com"
        );
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_require_trims() {
        assert_eq!(require("  Cafe  ", "msg").unwrap(), "Cafe");
        match require("   ", "Please enter a store name") {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Please enter a store name"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_confirm_passwords_is_exact() {
        assert!(confirm_passwords("secret", "secret").is_ok());
        assert!(confirm_passwords("secret", "Secret").is_err());
        assert!(confirm_passwords("secret", "secret ").is_err());
        assert!(confirm_passwords("", "").is_err());
    }
}
