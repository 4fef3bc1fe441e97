//! Digests for OTP storage.
//!
//! Neither the parent's phone number nor the issued code is ever stored in
//! the clear: challenges are keyed by [`phone_key`] and hold [`otp_hash`].

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Storage key for a normalized (`+91...`) phone number.
pub fn phone_key(normalized_phone: &str) -> String {
    sha256_hex(normalized_phone.as_bytes())
}

/// Digest of a code as typed by the parent; surrounding whitespace is ignored.
pub fn otp_hash(code: &str) -> String {
    sha256_hex(code.trim().as_bytes())
}
