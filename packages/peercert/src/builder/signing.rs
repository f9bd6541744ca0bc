//! Certificate signing operations
//!
//! Two pure steps: assemble the to-be-signed body from its parts, then sign the
//! DER body with the matching private key.

use chrono::{DateTime, Utc};
use der::asn1::{BitString, GeneralizedTime, UtcTime};
use der::{Decode, Encode};
use spki::SubjectPublicKeyInfoOwned;
use std::time::{Duration, SystemTime};
use x509_cert::certificate::Version;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;
use x509_cert::TbsCertificate;

use crate::algorithm::{AuthType, SignatureAlgorithm};
use crate::certificate::Certificate;
use crate::error::{CertificateError, Result};
use crate::key_pair::KeyPair;

/// Validity window of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    /// Start of the window
    pub not_before: DateTime<Utc>,
    /// End of the window; also the handle's expiry
    pub not_after: DateTime<Utc>,
}

impl Validity {
    /// Window `[issued - backdate, issued + lifetime]`, at microsecond precision.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if either bound falls outside
    /// the representable time range.
    pub fn around(issued: DateTime<Utc>, backdate: Duration, lifetime: Duration) -> Result<Self> {
        let out_of_range = || CertificateError::provider("validity window out of range");
        let issued = issued.timestamp_micros();
        let backdate = i64::try_from(backdate.as_micros()).map_err(|_| out_of_range())?;
        let lifetime = i64::try_from(lifetime.as_micros()).map_err(|_| out_of_range())?;

        let not_before = issued
            .checked_sub(backdate)
            .and_then(DateTime::from_timestamp_micros)
            .ok_or_else(out_of_range)?;
        let not_after = issued
            .checked_add(lifetime)
            .and_then(DateTime::from_timestamp_micros)
            .ok_or_else(out_of_range)?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    fn to_x509(self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: x509_time(self.not_before)?,
            not_after: x509_time(self.not_after)?,
        })
    }
}

/// UTCTime through 2049, GeneralizedTime after, as RFC 5280 requires.
fn x509_time(at: DateTime<Utc>) -> Result<Time> {
    let system = SystemTime::from(at);
    UtcTime::from_system_time(system)
        .map(Time::UtcTime)
        .or_else(|_| GeneralizedTime::from_system_time(system).map(Time::GeneralTime))
        .map_err(|e| CertificateError::provider(format!("unencodable certificate time: {e}")))
}

/// Certificate body awaiting its signature
#[derive(Debug, Clone)]
pub struct UnsignedCertificate {
    tbs: TbsCertificate,
    auth_type: AuthType,
}

impl UnsignedCertificate {
    /// Assemble a v3 self-issued body; the issuer is the subject.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if the public key or validity
    /// window cannot be encoded.
    pub fn new(
        subject: Name,
        serial_number: SerialNumber,
        validity: Validity,
        public_key_der: &[u8],
        auth_type: AuthType,
    ) -> Result<Self> {
        let subject_public_key_info = SubjectPublicKeyInfoOwned::from_der(public_key_der)
            .map_err(|e| CertificateError::provider(format!("invalid subject public key: {e}")))?;

        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number,
            signature: auth_type.signature_algorithm().identifier(),
            issuer: subject.clone(),
            validity: validity.to_x509()?,
            subject,
            subject_public_key_info,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        };
        Ok(Self { tbs, auth_type })
    }

    /// Signature algorithm the body declares
    #[must_use]
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.auth_type.signature_algorithm()
    }

    /// DER encoding of the to-be-signed body
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if encoding fails.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.tbs
            .to_der()
            .map_err(|e| CertificateError::provider(format!("certificate body encoding failed: {e}")))
    }
}

/// Sign `unsigned` with `key_pair`, producing the final DER certificate.
///
/// # Errors
///
/// Returns `CertificateError::ProviderFailure` if the key family does not match
/// the body's signature algorithm or the signing primitive fails.
pub fn sign(unsigned: UnsignedCertificate, key_pair: &KeyPair) -> Result<Certificate> {
    if key_pair.auth_type() != unsigned.auth_type {
        return Err(CertificateError::provider(format!(
            "key family {:?} cannot sign a {:?} certificate",
            key_pair.auth_type(),
            unsigned.auth_type
        )));
    }

    let body = unsigned.to_der()?;
    let signature = key_pair.sign(&body)?;
    let signature_algorithm = unsigned.signature_algorithm().identifier();

    let parsed = x509_cert::Certificate {
        tbs_certificate: unsigned.tbs,
        signature_algorithm,
        signature: BitString::from_bytes(&signature)
            .map_err(|e| CertificateError::provider(format!("signature encoding failed: {e}")))?,
    };
    let der = parsed
        .to_der()
        .map_err(|e| CertificateError::provider(format!("certificate encoding failed: {e}")))?;

    Ok(Certificate::from_parts(der, parsed))
}
