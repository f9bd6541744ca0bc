//! Signed certificate wrapper
//!
//! Keeps the exact DER bytes that were signed (or imported) next to the parsed
//! structure, so re-encoding never changes what peers see.

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CertificateError, Result};
use chrono::{DateTime, Utc};
use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use std::fmt;
use x509_cert::time::Time;

/// A DER-encoded X.509 certificate
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    parsed: x509_cert::Certificate,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl Certificate {
    /// Parse a DER certificate
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::DecodeFailure` if the bytes are empty or not a
    /// well-formed X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        if der.is_empty() {
            return Err(CertificateError::decode("certificate is empty"));
        }
        let parsed = x509_cert::Certificate::from_der(der)
            .map_err(|e| CertificateError::decode(format!("certificate import failed: {e}")))?;
        Ok(Self {
            der: der.to_vec(),
            parsed,
        })
    }

    pub(crate) fn from_parts(der: Vec<u8>, parsed: x509_cert::Certificate) -> Self {
        Self { der, parsed }
    }

    /// Raw DER bytes
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Parsed structure
    #[must_use]
    pub fn x509(&self) -> &x509_cert::Certificate {
        &self.parsed
    }

    /// Serial number as big-endian bytes
    #[must_use]
    pub fn serial_number(&self) -> &[u8] {
        self.parsed.tbs_certificate.serial_number.as_bytes()
    }

    /// Subject name in RFC 4514 form, e.g. `CN=0a1b...`
    #[must_use]
    pub fn subject(&self) -> String {
        self.parsed.tbs_certificate.subject.to_string()
    }

    /// Start of the validity window
    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        to_chrono(&self.parsed.tbs_certificate.validity.not_before)
    }

    /// End of the validity window
    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        to_chrono(&self.parsed.tbs_certificate.validity.not_after)
    }

    /// Subject public key as DER `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::DecodeFailure` if the embedded key cannot be re-encoded.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        self.parsed
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| CertificateError::decode(format!("public key re-encoding failed: {e}")))
    }

    /// SHA-256 fingerprint over the DER bytes, upper-case colon-separated hex
    #[must_use]
    pub fn fingerprint(&self) -> String {
        Sha256::digest(&self.der)
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Signature algorithm recorded in the certificate, if it is one we produce
    #[must_use]
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        [
            SignatureAlgorithm::Sha1WithRsa,
            SignatureAlgorithm::EcdsaWithSha256,
        ]
        .into_iter()
        .find(|alg| alg.identifier().oid == self.parsed.signature_algorithm.oid)
    }

    /// Whether the outer signature verifies under the certificate's own key
    ///
    /// Only meaningful for certificates this crate produces; anything else
    /// verifies as `false`.
    #[must_use]
    pub fn verify_self_signature(&self) -> bool {
        let Ok(tbs) = self.parsed.tbs_certificate.to_der() else {
            return false;
        };
        let Some(signature) = self.parsed.signature.as_bytes() else {
            return false;
        };
        let Ok(spki) = self.public_key_der() else {
            return false;
        };
        match self.signature_algorithm() {
            Some(SignatureAlgorithm::Sha1WithRsa) => verify::rsa_sha1(&spki, &tbs, signature),
            Some(SignatureAlgorithm::EcdsaWithSha256) => {
                verify::ecdsa_sha256(&spki, &tbs, signature)
            }
            None => false,
        }
    }
}

fn to_chrono(time: &Time) -> DateTime<Utc> {
    DateTime::<Utc>::from(time.to_system_time())
}

mod verify {
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use rsa::pkcs8::DecodePublicKey;
    use rsa::{Pkcs1v15Sign, RsaPublicKey};
    use sha1::Sha1;
    use sha2::{Digest, Sha256};

    pub(super) fn rsa_sha1(spki: &[u8], message: &[u8], signature: &[u8]) -> bool {
        RsaPublicKey::from_public_key_der(spki).is_ok_and(|key| {
            key.verify(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(message), signature)
                .is_ok()
        })
    }

    pub(super) fn ecdsa_sha256(spki: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(message);
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(spki) {
            return p256::ecdsa::Signature::from_der(signature)
                .and_then(|sig| key.verify_prehash(&digest, &sig))
                .is_ok();
        }
        if let Ok(key) = p384::ecdsa::VerifyingKey::from_public_key_der(spki) {
            return p384::ecdsa::Signature::from_der(signature)
                .and_then(|sig| key.verify_prehash(&digest, &sig))
                .is_ok();
        }
        false
    }
}
