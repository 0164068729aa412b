//! Six-digit one-time login codes.
//!
//! Only the SHA-256 digest of a code is ever stored.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// A freshly issued code, with the digest to persist.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    /// Plain code sent to the user.
    pub code: String,
    /// Hex SHA-256 digest of the code.
    pub code_hash: String,
    /// Instant after which the code is refused.
    pub expires_at: DateTime<Utc>,
}

/// Generates a zero-padded six-digit code valid for `ttl_secs`.
#[must_use]
pub fn generate_code(ttl_secs: i64) -> OneTimeCode {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    let code = format!("{n:06}");
    let code_hash = hash_code(&code);
    OneTimeCode {
        code,
        code_hash,
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
    }
}

/// Hashes a code for storage or lookup.
#[must_use]
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a submitted code against a stored digest and expiry.
#[must_use]
pub fn verify_code(submitted: &str, stored_hash: &str, expires_at: DateTime<Utc>) -> bool {
    expires_at > Utc::now() && hash_code(submitted) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_code(300);
            assert_eq!(otp.code.len(), 6);
            assert!(otp.code.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(otp.code_hash, hash_code(&otp.code));
        }
    }

    #[test]
    fn test_verify_code() {
        let otp = generate_code(300);
        assert!(verify_code(&otp.code, &otp.code_hash, otp.expires_at));
        assert!(verify_code(
            &format!(" {} ", otp.code),
            &otp.code_hash,
            otp.expires_at
        ));
        assert!(!verify_code("abcdef", &otp.code_hash, otp.expires_at));
    }

    #[test]
    fn test_expired_code_refused() {
        let otp = generate_code(-1);
        assert!(!verify_code(&otp.code, &otp.code_hash, otp.expires_at));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let digest = hash_code("123456");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
