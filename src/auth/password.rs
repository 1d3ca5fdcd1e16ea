/// Password Hashing and Verification
///
/// One-way salted hashing with bcrypt. The salt is randomized per call, so
/// hashing the same plaintext twice yields different strings; the output is
/// a self-describing modular-crypt string carrying algorithm, cost, and salt,
/// so verification needs no external salt storage.

use bcrypt::{hash, verify};

use std::fmt;

/// bcrypt work factor used when none is configured. Raising it is the
/// intended knob against offline brute force.
pub const DEFAULT_HASH_COST: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    EmptyPassword,
    Hashing(String),
    /// The stored hash could not be parsed. Signals a data-integrity problem
    /// with the credential record rather than a wrong password.
    MalformedHash,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::EmptyPassword => write!(f, "password must not be empty"),
            PasswordError::Hashing(msg) => write!(f, "password hashing failed: {}", msg),
            PasswordError::MalformedHash => write!(f, "stored password hash is malformed"),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Hash a plaintext password with a per-call random salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }

    hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a plaintext password against a stored hash.
///
/// Never panics on a malformed stored value; that case surfaces as
/// [`PasswordError::MalformedHash`] so the caller can treat it as an
/// integrity fault instead of a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    verify(password, stored_hash).map_err(|_| PasswordError::MalformedHash)
}
