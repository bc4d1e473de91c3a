//! Password hashing for client accounts and the admin login.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SEPARATOR: char = '$';

pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password as `salt$digest` with a random salt
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", salt, SEPARATOR, salted_digest(&salt, password))
}

/// Check a password against a stored `salt$digest`
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    constant_time_eq(salted_digest(salt, password).as_bytes(), digest.as_bytes())
}

/// Check the admin password against the configured SHA-256 hex digest
pub fn verify_admin_password(password: &str, expected_sha256: &str) -> bool {
    let expected = expected_sha256.trim().to_ascii_lowercase();
    if expected.is_empty() {
        return false;
    }
    constant_time_eq(sha256_hex(password).as_bytes(), expected.as_bytes())
}

/// Random password handed out for accounts created from the back-office
pub fn generate_password() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
