//! Salted password digests: `base64(salt) $ hex(blake3(salt || password))`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;

use crate::Error;

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    format!("{}${}", BASE64.encode(salt), digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, Error> {
    let (salt_b64, expected) = stored
        .split_once('$')
        .ok_or_else(|| Error::Parse("malformed password hash".into()))?;
    let salt = BASE64
        .decode(salt_b64)
        .map_err(|e| Error::Parse(format!("malformed password salt: {}", e)))?;
    Ok(digest(&salt, password) == expected)
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}
