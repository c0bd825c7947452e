//! Credential checks guarding the login route.
//!
//! There are no users or sessions, the login route only answers whether the
//! submitted password is the configured one.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::config::Auth;
use crate::{ErrorKind, Result};

pub trait CredentialCheck: Send + Sync {
    fn verify(&self, password: &str) -> bool;
}

/// Compares against a password kept in plaintext.
#[derive(Clone, Debug)]
pub struct PlainPassword(pub String);

impl CredentialCheck for PlainPassword {
    fn verify(&self, password: &str) -> bool {
        self.0 == password
    }
}

/// Verifies against an argon2 hash in PHC string format.
#[derive(Clone, Debug)]
pub struct HashedPassword(pub String);

impl CredentialCheck for HashedPassword {
    fn verify(&self, password: &str) -> bool {
        match validate_password(password.as_bytes(), &self.0) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("password rejected: {e}");
                false
            }
        }
    }
}

/// Picks the check described by the auth config. A configured hash wins over
/// the plaintext password.
pub fn from_config(auth: &Auth) -> Box<dyn CredentialCheck> {
    match &auth.password_hash {
        Some(hash) if !hash.is_empty() => Box::new(HashedPassword(hash.clone())),
        _ => Box::new(PlainPassword(auth.password.clone())),
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default().verify_password(password, &expected_password_hash)?;
    Ok(())
}
