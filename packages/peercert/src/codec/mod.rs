//! Versioned binary transfer format for certificate handles
//!
//! The blob is a sequence of 64-bit little-endian words. A "pair" word holds
//! two 32-bit values, the first in the high half.
//!
//! | record      | contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | header      | pair(format version, auth type tag)                        |
//! | expiry      | pair(high word, low word) of signed Unix microseconds      |
//! | private key | pair(UTF-16 unit count, 0), JWK JSON as UTF-16LE, padding  |
//! | certificate | pair(byte count, 0), DER bytes, padding                    |
//!
//! Padding brings each variable record to the next 8-byte boundary. Decoding
//! is all-or-nothing: any malformed record fails the whole blob.

mod reader;
mod writer;

use crate::algorithm::AuthType;
use crate::certificate::Certificate;
use crate::error::{CertificateError, Result};
use crate::handle::CertificateHandle;
use crate::jwk::Jwk;
use crate::key_pair::KeyPair;
use crate::logging::LoggingTransformer;
use chrono::DateTime;
use reader::BlobReader;
use writer::BlobWriter;

/// Current (and only accepted) format version
pub const FORMAT_VERSION: u32 = 1;

/// Split signed microseconds into (high, low) words
#[must_use]
pub const fn split_micros(micros: i64) -> (u32, u32) {
    let bits = micros as u64;
    ((bits >> 32) as u32, bits as u32)
}

/// Inverse of [`split_micros`]
#[must_use]
pub const fn join_micros(high: u32, low: u32) -> i64 {
    (((high as u64) << 32) | low as u64) as i64
}

/// Serialize a handle, private key included.
///
/// # Errors
///
/// Returns `CertificateError::EncodeFailure` if the handle is disposed or the
/// key cannot be exported.
pub fn encode(handle: &CertificateHandle) -> Result<Vec<u8>> {
    let outcome = encode_live(handle);
    LoggingTransformer::log_codec(
        "encode",
        outcome.as_ref().map_or(0, Vec::len),
        outcome.as_ref().err(),
    );
    outcome
}

fn encode_live(handle: &CertificateHandle) -> Result<Vec<u8>> {
    if handle.is_disposed() {
        return Err(CertificateError::encode("cannot encode a disposed certificate handle"));
    }
    let as_encode = |e: CertificateError| match e {
        CertificateError::EncodeFailure(_) => e,
        other => CertificateError::encode(other.to_string()),
    };
    let key_pair = handle.key_pair().map_err(as_encode)?;
    let certificate = handle.certificate().map_err(as_encode)?;
    let auth_type = handle.auth_type().map_err(as_encode)?;
    let expires = handle.expires().map_err(as_encode)?;

    let jwk = key_pair.to_jwk()?.to_json()?;

    let mut writer = BlobWriter::new();
    writer.write_pair(FORMAT_VERSION, auth_type.tag());
    let (high, low) = split_micros(expires.timestamp_micros());
    writer.write_pair(high, low);
    writer.write_utf16("private key", &jwk)?;
    writer.write_bytes("certificate", certificate.der())?;
    Ok(writer.into_bytes())
}

/// Reconstruct a handle from a blob produced by [`encode`].
///
/// # Errors
///
/// Returns `CertificateError::DecodeFailure` on a version mismatch, truncation,
/// an unreadable key or certificate, or a key that does not belong to the
/// certificate.
pub fn decode(blob: &[u8]) -> Result<CertificateHandle> {
    let outcome = decode_records(blob);
    LoggingTransformer::log_codec("decode", blob.len(), outcome.as_ref().err());
    outcome
}

fn decode_records(blob: &[u8]) -> Result<CertificateHandle> {
    let mut reader = BlobReader::new(blob);

    let (version, tag) = reader.read_pair("header")?;
    if version != FORMAT_VERSION {
        return Err(CertificateError::decode(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        )));
    }
    let auth_type = AuthType::from_tag(tag)
        .ok_or_else(|| CertificateError::decode(format!("unknown auth type tag {tag}")))?;

    let (high, low) = reader.read_pair("expiry")?;
    let expires = DateTime::from_timestamp_micros(join_micros(high, low))
        .ok_or_else(|| CertificateError::decode("expiry out of range"))?;

    let jwk = Jwk::from_json(&reader.read_utf16("private key")?)?;
    let key_pair = KeyPair::from_jwk(&jwk)?;

    let der = reader.read_bytes("certificate")?;
    let certificate = Certificate::from_der(der)?;
    reader.finish()?;

    if key_pair.auth_type() != auth_type {
        return Err(CertificateError::decode(format!(
            "auth type {auth_type:?} does not match the {:?} key",
            key_pair.auth_type()
        )));
    }
    CertificateHandle::new(key_pair, certificate, expires)
        .map_err(|e| CertificateError::decode(e.to_string()))
}
