//! Salted password hashing

use argon2::password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Number of random bytes in a user's salt
pub const SALT_LEN: usize = 16;

/// Generate a fresh salt from the operating system's CSPRNG
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash a password with the given salt
///
/// The stored form is `hex(salt || sha512(salt || password))`.
pub fn hash_password(password: &str, salt: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut stored = Vec::with_capacity(salt.len() + digest.len());
    stored.extend_from_slice(salt);
    stored.extend_from_slice(&digest);
    hex::encode(stored)
}

/// Verify a password against its stored hash in constant time
pub fn verify_password(password: &str, stored_hash: &str, salt: &[u8]) -> bool {
    let candidate = hash_password(password, salt);
    candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [3; SALT_LEN];

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password("secret123", &SALT), hash_password("secret123", &SALT));
    }

    #[test]
    fn test_hash_depends_on_password_and_salt() {
        let base = hash_password("secret123", &SALT);
        assert_ne!(base, hash_password("secret124", &SALT));

        let mut other_salt = SALT;
        other_salt[0] ^= 1;
        assert_ne!(base, hash_password("secret123", &other_salt));
    }

    #[test]
    fn test_stored_form_is_salt_then_digest() {
        let stored = hash_password("pw", &SALT);
        // 16 salt bytes + 64 digest bytes, hex encoded
        assert_eq!(stored.len(), (SALT_LEN + 64) * 2);
        assert!(stored.starts_with(&hex::encode(SALT)));
    }

    #[test]
    fn test_verify_password() {
        let stored = hash_password("secret123", &SALT);
        assert!(verify_password("secret123", &stored, &SALT));
        assert!(!verify_password("wrong", &stored, &SALT));
        assert!(!verify_password("secret123", &stored[..10], &SALT));
    }

    #[test]
    fn test_generated_salts_differ() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_LEN);
        assert_ne!(a, b);
    }
}
