/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid password hash format: {0}")]
    Format(String),
}

/// Hash a password using Argon2id with a random 16-byte salt
///
/// Returns a PHC-formatted string safe for database storage. Strength rules
/// are not checked here; callers validate input before hashing.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against a stored PHC hash
///
/// `Ok(false)` means the password does not match; `Err` means the stored
/// hash itself is unusable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| PasswordError::Format(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let hash = hash_password("Password123").expect("should hash password");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Password123", &hash).expect("should verify"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("Password123").expect("should hash password");
        assert!(!verify_password("Password124", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("Password123").unwrap();
        let hash2 = hash_password("Password123").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_malformed_hash() {
        let result = verify_password("Password123", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::Format(_))));
    }
}
