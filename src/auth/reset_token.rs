//! Password reset token generation
//!
//! Tokens are 256-bit random values, hex-encoded for the reset link.
//! Only the SHA-256 of a token is stored; the raw value exists in the
//! email alone.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw token length in bytes (256 bits)
const TOKEN_BYTES: usize = 32;

/// Generate a fresh reset token, hex-encoded
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token for storage and lookup
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_hex_encoded_256_bits() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let token = generate_reset_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }
}
