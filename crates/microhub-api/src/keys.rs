//! Access key minting and hashing. Raw keys are returned once and never stored.

use rand::Rng;
use sha2::{Digest, Sha256};

const KEY_SPACE: u32 = 1_000_000;

/// A fresh six-digit key, zero padded.
pub fn mint_key() -> String {
    let value = rand::rng().random_range(0..KEY_SPACE);
    format!("{value:06}")
}

pub fn hash_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.trim().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_key(raw_key: &str, key_hash: &str) -> bool {
    hash_key(raw_key) == key_hash
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn minted_keys_are_six_digits() {
        for _ in 0..64 {
            let key = mint_key();
            assert_eq!(key.len(), 6);
            assert!(key.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hash_is_hex_sha256_of_trimmed_key() {
        assert_eq!(
            hash_key("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
        assert_eq!(hash_key(" 123456\n"), hash_key("123456"));
    }

    #[test]
    fn verify_rejects_other_keys() {
        let stored = hash_key("004211");
        assert!(verify_key("004211", &stored));
        assert!(!verify_key("4211", &stored));
        assert!(!verify_key("", &stored));
    }
}
