use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Bytes of entropy in a password reset token (hex encoded: 40 chars)
const RESET_TOKEN_BYTES: usize = 20;

/// Gera um token de reset imprevisível a partir do RNG do sistema operacional
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Gravatar accepts SHA-256 hashes of the trimmed, lowercased address
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://gravatar.com/avatar/{}?s=200", hex::encode(digest))
}
