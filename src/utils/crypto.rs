use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hex digest binding a site name to a password digest; used for edit links.
pub fn site_token(site_name: &str, password_digest: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(site_name.as_bytes());
    hasher.update(password_digest.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison for secrets supplied by clients.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into()
}
