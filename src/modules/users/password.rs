// Salted password hashing for stored credentials.
//
// Stored form is `<salt hex>$<sha256 hex>`; the salt is random per account
// so equal passwords never share a digest.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_BYTES: usize = 16;

pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), digest_with_salt(&salt, password))
}

pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_with_salt(&salt, password) == digest
}

fn digest_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
