//! Random subject names and serial numbers
//!
//! Collisions between independently generated certificates are accepted as
//! negligible and are neither detected nor retried.

use crate::error::{CertificateError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use std::str::FromStr;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

/// Random bytes behind each subject name
pub const SUBJECT_RANDOM_LEN: usize = 16;

/// Serial number length in bytes
pub const SERIAL_LEN: usize = 8;

/// Fresh subject name: `CN=` followed by 16 random bytes in lower-case hex.
///
/// # Errors
///
/// Returns `CertificateError::ProviderFailure` if the random source fails or the
/// name cannot be built.
pub fn random_subject() -> Result<Name> {
    let mut random = [0u8; SUBJECT_RANDOM_LEN];
    OsRng
        .try_fill_bytes(&mut random)
        .map_err(|e| CertificateError::provider(format!("random subject generation failed: {e}")))?;

    Name::from_str(&format!("CN={}", hex::encode(random)))
        .map_err(|e| CertificateError::provider(format!("subject name construction failed: {e}")))
}

/// Fresh positive serial number
///
/// # Errors
///
/// Returns `CertificateError::ProviderFailure` if the random source fails.
pub fn random_serial() -> Result<SerialNumber> {
    let mut serial = [0u8; SERIAL_LEN];
    OsRng
        .try_fill_bytes(&mut serial)
        .map_err(|e| CertificateError::provider(format!("serial generation failed: {e}")))?;

    // Keep the INTEGER positive and minimally encoded: top bit clear, next bit set.
    serial[0] = (serial[0] & 0x7f) | 0x40;

    SerialNumber::new(&serial)
        .map_err(|e| CertificateError::provider(format!("serial encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_is_prefixed_hex() {
        let subject = random_subject().expect("subject").to_string();
        let hex_part = subject.strip_prefix("CN=").expect("CN prefix");
        assert_eq!(hex_part.len(), SUBJECT_RANDOM_LEN * 2);
        assert!(hex_part
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_serial_is_positive_and_full_length() {
        for _ in 0..64 {
            let serial = random_serial().expect("serial");
            let bytes = serial.as_bytes();
            assert_eq!(bytes.len(), SERIAL_LEN);
            assert_eq!(bytes[0] & 0xc0, 0x40);
        }
    }
}
