//! Credential hashing.
//!
//! Passwords are stored as `sha256(salt || password)` with a random 16-byte
//! salt per account. Verification compares digests in constant time.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// A salted password digest ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    /// Hex-encoded digest
    pub hash: String,
    /// Hex-encoded salt
    pub salt: String,
}

/// Hashes `password` under a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> PasswordHash {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = to_hex(&salt);
    PasswordHash {
        hash: digest(&salt, password),
        salt,
    }
}

/// Checks `password` against a stored hash and salt.
#[must_use]
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    constant_time_eq(digest(salt, password).as_bytes(), hash.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// Digests have a fixed length, so only the contents need hiding.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
