//! Structured logging for certificate generation, transfer and teardown
//!
//! Backed by `env_logger` and the `log` facade. Key material is never logged;
//! certificates are identified by a short SHA-256 tag of their DER bytes.

use crate::algorithm::Algorithm;
use crate::error::CertificateError;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Logging infrastructure using `env_logger`
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging (call once at application startup)
    ///
    /// Levels come from `RUST_LOG`, e.g. `RUST_LOG=peercert=debug`.
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; later calls are ignored.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log the start of a generation request
    pub fn log_generation_started(algorithm: &Algorithm, lifetime: Duration) {
        debug!("Certificate generation started: {algorithm} (lifetime: {lifetime:?})");
    }

    /// Log a completed generation
    pub fn log_generation_succeeded(algorithm: &Algorithm, der: &[u8], elapsed: Duration) {
        let tag = Self::certificate_tag(der);
        info!(
            "Certificate generated: {algorithm} (cert: {tag}, elapsed_ms: {})",
            elapsed.as_millis()
        );
    }

    /// Log a failed generation with its failure kind
    pub fn log_generation_failed(algorithm: &Algorithm, error: &CertificateError) {
        warn!(
            "Certificate generation failed: {algorithm} (kind: {:?}) - {error}",
            error.kind()
        );
    }

    /// Log a codec operation
    pub fn log_codec(operation: &str, blob_len: usize, error: Option<&CertificateError>) {
        match error {
            None => debug!("Codec: {operation} succeeded ({blob_len} bytes)"),
            Some(error) => warn!("Codec: {operation} failed ({blob_len} bytes) - {error}"),
        }
    }

    /// Log disposal of a handle's material
    pub fn log_disposal(der: &[u8]) {
        debug!("Certificate handle disposed (cert: {})", Self::certificate_tag(der));
    }

    /// Short identifying tag for a certificate: `#` and 12 hex chars of its SHA-256
    #[must_use]
    pub fn certificate_tag(der: &[u8]) -> String {
        let hash = Sha256::digest(der);
        let hex_hash = format!("{hash:x}");
        format!("#{}", &hex_hash[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_tag_is_stable_and_short() {
        LoggingTransformer::init_test();

        let tag = LoggingTransformer::certificate_tag(b"certificate");
        assert_eq!(tag.len(), 13);
        assert!(tag.starts_with('#'));
        assert_eq!(tag, LoggingTransformer::certificate_tag(b"certificate"));
        assert_ne!(tag, LoggingTransformer::certificate_tag(b"other"));
    }
}
