//! API key generation
//!
//! Generates opaque, fixed-length keys from the operating system's
//! cryptographically secure random source.

use rand::rngs::OsRng;
use rand::RngCore;

/// Minimum entropy for a generated key
pub const MIN_KEY_BYTES: usize = 16;

/// Generator for opaque API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    /// Number of random bytes per key (hex doubles this in characters)
    key_bytes: usize,
}

impl ApiKeyGenerator {
    /// Create a generator producing keys from `key_bytes` random bytes.
    ///
    /// Values below [`MIN_KEY_BYTES`] are raised to the minimum.
    pub fn new(key_bytes: usize) -> Self {
        Self {
            key_bytes: key_bytes.max(MIN_KEY_BYTES),
        }
    }

    /// Generate a new hex-encoded key
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.key_bytes];
        OsRng.fill_bytes(&mut random_bytes);
        hex::encode(random_bytes)
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(MIN_KEY_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_fixed_length_hex() {
        let generator = ApiKeyGenerator::default();
        let key = generator.generate();

        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_minimum_entropy_enforced() {
        let generator = ApiKeyGenerator::new(4);
        assert_eq!(generator.generate().len(), MIN_KEY_BYTES * 2);
    }

    #[test]
    fn test_custom_key_bytes() {
        let generator = ApiKeyGenerator::new(32);
        assert_eq!(generator.generate().len(), 64);
    }

    #[test]
    fn test_key_uniqueness() {
        let generator = ApiKeyGenerator::default();
        let keys: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
