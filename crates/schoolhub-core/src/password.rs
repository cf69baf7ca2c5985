//! One-way hashing for secrets.
//!
//! Passwords and per-role school join codes share the same bcrypt primitive.
//! Join codes are hashed once when the school is created and only ever
//! compared through [`verify_code`]; the plaintext is never persisted.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Hashes a school join code before it is stored.
pub fn hash_code(code: &str) -> Result<String, AppError> {
    hash(code.trim(), DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash join code: {}", e)))
}

/// Compares a submitted join code against the stored hash.
///
/// A stored value that is not a bcrypt hash is an error, never a match.
pub fn verify_code(code: &str, hash: &str) -> Result<bool, AppError> {
    verify(code.trim(), hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify join code: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_hash_is_not_plaintext() {
        let hash = hash_code("TCH-2024").unwrap();
        assert_ne!(hash, "TCH-2024");
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_code_trims_whitespace() {
        let hash = hash_code("ABC123").unwrap();
        assert!(verify_code("  ABC123 ", &hash).unwrap());
    }

    #[test]
    fn test_verify_code_rejects_wrong_code() {
        let hash = hash_code("ABC123").unwrap();
        assert!(!verify_code("abc123", &hash).unwrap());
    }

    #[test]
    fn test_verify_code_with_corrupt_hash_errors() {
        assert!(verify_code("ABC123", "ABC123").is_err());
    }
}
