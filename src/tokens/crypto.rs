//! Token generation and hashing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Smallest accepted entropy, in bytes.
pub const MIN_ENTROPY_BYTES: usize = 16;

/// Generates `entropy_bytes` random bytes from the OS and encodes them as
/// URL-safe base64 without padding.
pub fn generate_token(entropy_bytes: usize) -> String {
    let mut bytes = vec![0u8; entropy_bytes.max(MIN_ENTROPY_BYTES)];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a raw token, URL-safe base64. Only this value is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_token(32);
        let b = generate_token(32);
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_entropy_has_a_floor() {
        assert_eq!(generate_token(1).len(), generate_token(MIN_ENTROPY_BYTES).len());
    }

    #[test]
    fn test_hash_is_stable_and_differs_from_token() {
        let token = generate_token(32);
        let hash = hash_token(&token);
        assert_ne!(token, hash);
        assert_eq!(hash, hash_token(&token));
    }
}
