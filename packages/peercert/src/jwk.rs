//! Private JSON Web Key documents (RFC 7517 / RFC 7518)

use crate::error::{CertificateError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Private JWK; only the members used by RSA and EC keys are modelled
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Jwk {
    /// Key type, `RSA` or `EC`
    pub kty: String,
    /// Curve name for EC keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// EC public x coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC public y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// RSA modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Private exponent (RSA) or private scalar (EC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// RSA first prime factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    /// RSA second prime factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// RSA first factor CRT exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    /// RSA second factor CRT exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    /// RSA first CRT coefficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    /// Whether the key may be exported again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .finish_non_exhaustive()
    }
}

impl Jwk {
    /// Serialize to compact JSON
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::EncodeFailure` if serialization fails.
    pub fn to_json(&self) -> Result<Zeroizing<String>> {
        serde_json::to_string(self)
            .map(Zeroizing::new)
            .map_err(|e| CertificateError::encode(format!("JWK serialization failed: {e}")))
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::DecodeFailure` if the text is not a JWK object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CertificateError::decode(format!("invalid JWK document: {e}")))
    }

    /// Decode a required base64url member
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::DecodeFailure` if the member is absent or not base64url.
    pub fn member(&self, name: &str, value: Option<&String>) -> Result<Zeroizing<Vec<u8>>> {
        let encoded = value
            .ok_or_else(|| CertificateError::decode(format!("JWK is missing \"{name}\"")))?;
        URL_SAFE_NO_PAD
            .decode(encoded)
            .map(Zeroizing::new)
            .map_err(|e| CertificateError::decode(format!("JWK member \"{name}\": {e}")))
    }
}

/// base64url without padding, as JWK members are written
pub(crate) fn encode_member(bytes: &[u8]) -> Option<String> {
    Some(URL_SAFE_NO_PAD.encode(bytes))
}
