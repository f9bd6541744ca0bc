//! Algorithm descriptors and the tags derived from them
//!
//! The caller picks an [`Algorithm`]; everything else (transport auth type,
//! certificate signature algorithm) is derived and not caller-selectable.

use crate::error::{CertificateError, Result};
use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, SHA_1_WITH_RSA_ENCRYPTION};
use der::asn1::Any;
use serde_json::Value;
use spki::AlgorithmIdentifierOwned;
use std::fmt;

/// Smallest RSA modulus ever accepted
pub const MIN_RSA_MODULUS_BITS: u32 = 1024;

/// Elliptic curves accepted for ECDSA certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
}

impl NamedCurve {
    /// Curve name as used in JWK `crv` and WebCrypto `namedCurve`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }

    /// Look a curve up by its JWK/WebCrypto name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "P-256" => Some(Self::P256),
            "P-384" => Some(Self::P384),
            _ => None,
        }
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key algorithm requested for a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// RSA with the given modulus size
    Rsa {
        /// Modulus length in bits
        modulus_bits: u32,
    },
    /// ECDSA over a named curve
    Ecdsa {
        /// Curve to generate the key on
        curve: NamedCurve,
    },
}

impl Algorithm {
    /// RSA descriptor
    #[must_use]
    pub const fn rsa(modulus_bits: u32) -> Self {
        Self::Rsa { modulus_bits }
    }

    /// ECDSA descriptor
    #[must_use]
    pub const fn ecdsa(curve: NamedCurve) -> Self {
        Self::Ecdsa { curve }
    }

    /// Check the descriptor before any key material is generated
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::UnsupportedAlgorithm` if an RSA modulus is
    /// below `min_rsa_modulus_bits` (which itself never drops below 1024).
    pub fn validate(&self, min_rsa_modulus_bits: u32) -> Result<()> {
        let floor = min_rsa_modulus_bits.max(MIN_RSA_MODULUS_BITS);
        match *self {
            Self::Rsa { modulus_bits } if modulus_bits < floor => {
                Err(CertificateError::unsupported(format!(
                    "RSA modulus of {modulus_bits} bits is below the {floor}-bit minimum"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Transport auth type this algorithm yields
    #[must_use]
    pub const fn auth_type(&self) -> AuthType {
        match self {
            Self::Rsa { .. } => AuthType::Rsa,
            Self::Ecdsa { .. } => AuthType::Ecdh,
        }
    }

    /// Parse a WebCrypto-style descriptor.
    ///
    /// Accepts either a bare algorithm name or an object with `name`,
    /// `modulusLength` (RSA) and `namedCurve` (ECDSA).
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::UnsupportedAlgorithm` for unknown names,
    /// missing parameters, or unknown curves.
    pub fn from_value(value: &Value) -> Result<Self> {
        let (name, params) = match value {
            Value::String(name) => (name.as_str(), None),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str).ok_or_else(|| {
                    CertificateError::unsupported("algorithm descriptor has no name")
                })?;
                (name, Some(map))
            }
            _ => {
                return Err(CertificateError::unsupported(
                    "algorithm descriptor must be a string or an object",
                ))
            }
        };

        if name.eq_ignore_ascii_case("RSASSA-PKCS1-v1_5") || name.eq_ignore_ascii_case("RSA-OAEP")
        {
            let modulus_bits = params
                .and_then(|p| p.get("modulusLength"))
                .and_then(Value::as_u64)
                .and_then(|bits| u32::try_from(bits).ok())
                .ok_or_else(|| {
                    CertificateError::unsupported(format!("{name} requires a modulusLength"))
                })?;
            Ok(Self::Rsa { modulus_bits })
        } else if name.eq_ignore_ascii_case("ECDSA") {
            let curve_name = params
                .and_then(|p| p.get("namedCurve"))
                .and_then(Value::as_str)
                .ok_or_else(|| CertificateError::unsupported("ECDSA requires a namedCurve"))?;
            let curve = NamedCurve::from_name(curve_name).ok_or_else(|| {
                CertificateError::unsupported(format!("unsupported curve {curve_name}"))
            })?;
            Ok(Self::Ecdsa { curve })
        } else {
            Err(CertificateError::unsupported(format!(
                "unrecognized algorithm {name}"
            )))
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa { modulus_bits } => write!(f, "RSA-{modulus_bits}"),
            Self::Ecdsa { curve } => write!(f, "ECDSA-{curve}"),
        }
    }
}

/// Key exchange family of a certificate, used to pick a transport cipher suite
///
/// Discriminants are the wire tags written by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AuthType {
    /// RSA key exchange / authentication
    Rsa = 1,
    /// Elliptic-curve Diffie-Hellman with ECDSA authentication
    Ecdh = 4,
}

impl AuthType {
    /// Wire tag
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Parse a wire tag
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Rsa),
            4 => Some(Self::Ecdh),
            _ => None,
        }
    }

    /// Signature algorithm certificates of this family are signed with
    #[must_use]
    pub const fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            Self::Rsa => SignatureAlgorithm::Sha1WithRsa,
            Self::Ecdh => SignatureAlgorithm::EcdsaWithSha256,
        }
    }
}

/// Certificate signature algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-1
    Sha1WithRsa,
    /// ECDSA with SHA-256
    EcdsaWithSha256,
}

impl SignatureAlgorithm {
    /// X.509 `AlgorithmIdentifier` for this algorithm
    #[must_use]
    pub fn identifier(self) -> AlgorithmIdentifierOwned {
        match self {
            // RSA PKCS#1 identifiers carry an explicit NULL parameter.
            Self::Sha1WithRsa => AlgorithmIdentifierOwned {
                oid: SHA_1_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::null()),
            },
            Self::EcdsaWithSha256 => AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_256,
                parameters: None,
            },
        }
    }
}
