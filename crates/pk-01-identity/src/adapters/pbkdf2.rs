//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt-hex>$<hash-hex>`.
//! Output is one SHA-256 block, so only the first PBKDF2 block is derived.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::PasswordHasher;
use pickup_types::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "pbkdf2-sha256";

/// Default work factor.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2Hasher {
    iterations: u32,
}

impl Pbkdf2Hasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> CoreResult<[u8; 32]> {
    let prf = || {
        HmacSha256::new_from_slice(password)
            .map_err(|e| CoreError::Internal(format!("hmac key: {}", e)))
    };

    let mut mac = prf()?;
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u = mac.finalize().into_bytes();

    let mut out = [0u8; 32];
    out.copy_from_slice(&u);

    for _ in 1..iterations {
        let mut mac = prf()?;
        mac.update(&u);
        u = mac.finalize().into_bytes();
        for (o, b) in out.iter_mut().zip(u.iter()) {
            *o ^= b;
        }
    }
    Ok(out)
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, password: &str) -> CoreResult<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = derive(password.as_bytes(), &salt, self.iterations)?;
        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(hash)
        ))
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut parts = encoded.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
            return false;
        };

        match derive(password.as_bytes(), &salt, iterations) {
            Ok(actual) => actual.as_slice().ct_eq(expected.as_slice()).into(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Pbkdf2Hasher::new(1_000);
        let encoded = hasher.hash("hunter2").unwrap();
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(hasher.verify("hunter2", &encoded));
        assert!(!hasher.verify("hunter3", &encoded));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = Pbkdf2Hasher::new(10);
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_iterations_read_from_encoding() {
        let encoded = Pbkdf2Hasher::new(50).hash("pw").unwrap();
        assert!(Pbkdf2Hasher::new(5_000).verify("pw", &encoded));
    }

    #[test]
    fn test_rfc7914_vector() {
        // PBKDF2-HMAC-SHA256("passwd", "salt", 1) from RFC 7914 section 11.
        let out = derive(b"passwd", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_malformed_encodings_rejected() {
        let hasher = Pbkdf2Hasher::new(10);
        assert!(!hasher.verify("pw", ""));
        assert!(!hasher.verify("pw", "bcrypt$10$aa$bb"));
        assert!(!hasher.verify("pw", "pbkdf2-sha256$x$aa$bb"));
        assert!(!hasher.verify("pw", "pbkdf2-sha256$10$zz$bb"));
        assert!(!hasher.verify("pw", "pbkdf2-sha256$10$aa$bb$cc"));
    }
}
