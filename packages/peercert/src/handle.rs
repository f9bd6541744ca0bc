//! Certificate handle and the transport identities derived from it
//!
//! A handle owns one key pair together with the certificate it signed. The
//! material is held as a unit, so a handle is either fully usable or disposed.
//!
//! A [`TransportIdentity`] borrows its handle. Disposing the handle needs
//! `&mut self`, so every identity must be gone first:
//!
//! ```compile_fail
//! # async fn demo() -> peercert::Result<()> {
//! use peercert::{generate_certificate, Algorithm, CertificateOptions, NamedCurve};
//!
//! let mut handle = generate_certificate(
//!     Algorithm::ecdsa(NamedCurve::P256),
//!     CertificateOptions::default(),
//! )
//! .await?;
//! let identity = handle.create_transport_identity()?;
//! handle.dispose();
//! identity.sign(b"handshake")?;
//! # Ok(())
//! # }
//! ```

use crate::algorithm::AuthType;
use crate::certificate::Certificate;
use crate::error::{CertificateError, Result};
use crate::key_pair::KeyPair;
use crate::logging::LoggingTransformer;
use chrono::{DateTime, Utc};
use std::fmt;
use std::marker::PhantomData;

/// Key, certificate and metadata; present together or not at all
struct CertificateMaterial {
    key_pair: KeyPair,
    certificate: Certificate,
    auth_type: AuthType,
    expires: DateTime<Utc>,
}

/// Self-signed certificate with its private key
pub struct CertificateHandle {
    material: Option<CertificateMaterial>,
}

impl fmt::Debug for CertificateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.material {
            Some(material) => f
                .debug_struct("CertificateHandle")
                .field("auth_type", &material.auth_type)
                .field("expires", &material.expires)
                .field("certificate", &material.certificate)
                .finish_non_exhaustive(),
            None => f.write_str("CertificateHandle(disposed)"),
        }
    }
}

impl CertificateHandle {
    /// Assemble a handle from a key pair and the certificate it signed.
    ///
    /// The auth type is derived from the key family.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if the certificate's public
    /// key is not the key pair's public key.
    pub fn new(key_pair: KeyPair, certificate: Certificate, expires: DateTime<Utc>) -> Result<Self> {
        if key_pair.public_key_der()? != certificate.public_key_der()? {
            return Err(CertificateError::provider(
                "certificate public key does not match the private key",
            ));
        }
        Ok(Self {
            material: Some(CertificateMaterial {
                auth_type: key_pair.auth_type(),
                key_pair,
                certificate,
                expires,
            }),
        })
    }

    fn material(&self, operation: &str) -> Result<&CertificateMaterial> {
        self.material
            .as_ref()
            .ok_or_else(|| CertificateError::disposed(operation))
    }

    /// The signed certificate
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn certificate(&self) -> Result<&Certificate> {
        Ok(&self.material("certificate")?.certificate)
    }

    /// The private key
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn key_pair(&self) -> Result<&KeyPair> {
        Ok(&self.material("key_pair")?.key_pair)
    }

    /// Key exchange family
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn auth_type(&self) -> Result<AuthType> {
        Ok(self.material("auth_type")?.auth_type)
    }

    /// Absolute expiry, microsecond precision
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn expires(&self) -> Result<DateTime<Utc>> {
        Ok(self.material("expires")?.expires)
    }

    /// Whether the expiry has passed
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn is_expired(&self) -> Result<bool> {
        Ok(self.expires()? <= Utc::now())
    }

    /// Whether [`dispose`](Self::dispose) has run
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.material.is_none()
    }

    /// Duplicate the key and certificate for one transport session.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::LifecycleMisuse` after disposal.
    pub fn create_transport_identity(&self) -> Result<TransportIdentity<'_>> {
        let material = self.material("create_transport_identity")?;
        Ok(TransportIdentity {
            key_pair: material.key_pair.clone(),
            certificate: material.certificate.clone(),
            auth_type: material.auth_type,
            _parent: PhantomData,
        })
    }

    /// Release the key and certificate. Calling again is a no-op.
    pub fn dispose(&mut self) {
        if let Some(material) = self.material.take() {
            LoggingTransformer::log_disposal(material.certificate.der());
        }
    }
}

/// Session-scoped copy of a handle's key and certificate
///
/// Cannot outlive the handle it was derived from.
pub struct TransportIdentity<'a> {
    key_pair: KeyPair,
    certificate: Certificate,
    auth_type: AuthType,
    _parent: PhantomData<&'a CertificateHandle>,
}

impl fmt::Debug for TransportIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportIdentity")
            .field("auth_type", &self.auth_type)
            .field("certificate", &self.certificate)
            .finish_non_exhaustive()
    }
}

impl TransportIdentity<'_> {
    /// Sign handshake data with the session key
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if signing fails.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.key_pair.sign(message)
    }

    /// Certificate presented to the peer
    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Key exchange family for cipher suite selection
    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    /// SHA-256 fingerprint of the certificate
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.certificate.fingerprint()
    }
}
