//! Asymmetric key pairs backing certificates
//!
//! Private material lives inside the RustCrypto key types, which wipe it on
//! drop. `Clone` is the only duplication path.

use crate::algorithm::{Algorithm, AuthType, NamedCurve};
use crate::error::{CertificateError, Result};
use crate::jwk::{encode_member, Jwk};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Key pair for one of the supported algorithm families
#[derive(Clone)]
pub enum KeyPair {
    /// RSA key
    Rsa(RsaPrivateKey),
    /// ECDSA key on P-256
    P256(p256::ecdsa::SigningKey),
    /// ECDSA key on P-384
    P384(p384::ecdsa::SigningKey),
}

// Never print key material.
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa(key) => write!(f, "KeyPair::Rsa({} bits)", key.size() * 8),
            Self::P256(_) => f.write_str("KeyPair::P256"),
            Self::P384(_) => f.write_str("KeyPair::P384"),
        }
    }
}

impl KeyPair {
    /// Generate a fresh key pair.
    ///
    /// Does not apply policy checks; see [`Algorithm::validate`].
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if key generation fails.
    pub fn generate(algorithm: &Algorithm) -> Result<Self> {
        match *algorithm {
            Algorithm::Rsa { modulus_bits } => {
                let bits = usize::try_from(modulus_bits)
                    .map_err(|_| CertificateError::provider("RSA modulus size out of range"))?;
                let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| {
                    CertificateError::provider(format!("RSA key generation failed: {e}"))
                })?;
                Ok(Self::Rsa(key))
            }
            Algorithm::Ecdsa {
                curve: NamedCurve::P256,
            } => Ok(Self::P256(p256::ecdsa::SigningKey::random(&mut OsRng))),
            Algorithm::Ecdsa {
                curve: NamedCurve::P384,
            } => Ok(Self::P384(p384::ecdsa::SigningKey::random(&mut OsRng))),
        }
    }

    /// Auth type matching this key family
    #[must_use]
    pub const fn auth_type(&self) -> AuthType {
        match self {
            Self::Rsa(_) => AuthType::Rsa,
            Self::P256(_) | Self::P384(_) => AuthType::Ecdh,
        }
    }

    /// Public key as DER `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if the key cannot be encoded.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            Self::Rsa(key) => RsaPublicKey::from(key).to_public_key_der(),
            Self::P256(key) => key.verifying_key().to_public_key_der(),
            Self::P384(key) => key.verifying_key().to_public_key_der(),
        }
        .map_err(|e| CertificateError::provider(format!("public key encoding failed: {e}")))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Sign `message` with the algorithm fixed for this key family:
    /// RSASSA-PKCS1-v1_5 over SHA-1, or ECDSA over SHA-256 (DER signature).
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` if the signing primitive fails.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let failed = |e: &dyn fmt::Display| CertificateError::provider(format!("signing failed: {e}"));
        match self {
            Self::Rsa(key) => {
                let digest = Sha1::digest(message);
                key.sign_with_rng(&mut rand::thread_rng(), Pkcs1v15Sign::new::<Sha1>(), &digest)
                    .map_err(|e| failed(&e))
            }
            Self::P256(key) => {
                let digest = Sha256::digest(message);
                let signature: p256::ecdsa::Signature =
                    key.sign_prehash(&digest).map_err(|e| failed(&e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::P384(key) => {
                let digest = Sha256::digest(message);
                let signature: p384::ecdsa::Signature =
                    key.sign_prehash(&digest).map_err(|e| failed(&e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }

    /// Check a signature produced by [`KeyPair::sign`]
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rsa(key) => RsaPublicKey::from(key)
                .verify(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(message), signature)
                .is_ok(),
            Self::P256(key) => p256::ecdsa::Signature::from_der(signature)
                .and_then(|sig| key.verifying_key().verify_prehash(&Sha256::digest(message), &sig))
                .is_ok(),
            Self::P384(key) => p384::ecdsa::Signature::from_der(signature)
                .and_then(|sig| key.verifying_key().verify_prehash(&Sha256::digest(message), &sig))
                .is_ok(),
        }
    }

    /// Export the private key as a JWK
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::EncodeFailure` for RSA keys that are not
    /// two-prime or lack CRT parameters.
    pub fn to_jwk(&self) -> Result<Jwk> {
        match self {
            Self::Rsa(key) => rsa_to_jwk(key),
            Self::P256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                ec_to_jwk(
                    NamedCurve::P256,
                    point.x().map(|x| x.as_slice()),
                    point.y().map(|y| y.as_slice()),
                    &Zeroizing::new(key.to_bytes().to_vec()),
                )
            }
            Self::P384(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                ec_to_jwk(
                    NamedCurve::P384,
                    point.x().map(|x| x.as_slice()),
                    point.y().map(|y| y.as_slice()),
                    &Zeroizing::new(key.to_bytes().to_vec()),
                )
            }
        }
    }

    /// Import a private key from a JWK
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::DecodeFailure` if members are missing,
    /// malformed, or do not describe a consistent key.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        match jwk.kty.as_str() {
            "RSA" => rsa_from_jwk(jwk),
            "EC" => ec_from_jwk(jwk),
            other => Err(CertificateError::decode(format!(
                "unsupported JWK key type {other:?}"
            ))),
        }
    }
}

fn rsa_to_jwk(key: &RsaPrivateKey) -> Result<Jwk> {
    let [p, q] = key.primes() else {
        return Err(CertificateError::encode("only two-prime RSA keys can be exported"));
    };
    let missing = || CertificateError::encode("RSA key lacks CRT parameters");
    let dp = key.dp().ok_or_else(missing)?;
    let dq = key.dq().ok_or_else(missing)?;
    let qi = key.crt_coefficient().ok_or_else(missing)?;

    let member = |n: &BigUint| encode_member(&Zeroizing::new(n.to_bytes_be()));
    Ok(Jwk {
        kty: "RSA".to_string(),
        crv: None,
        x: None,
        y: None,
        n: member(key.n()),
        e: member(key.e()),
        d: member(key.d()),
        p: member(p),
        q: member(q),
        dp: member(dp),
        dq: member(dq),
        qi: member(&qi),
        ext: Some(true),
    })
}

fn rsa_from_jwk(jwk: &Jwk) -> Result<KeyPair> {
    let component = |name: &str, value: Option<&String>| -> Result<BigUint> {
        Ok(BigUint::from_bytes_be(&jwk.member(name, value)?))
    };
    let n = component("n", jwk.n.as_ref())?;
    let e = component("e", jwk.e.as_ref())?;
    let d = component("d", jwk.d.as_ref())?;
    let p = component("p", jwk.p.as_ref())?;
    let q = component("q", jwk.q.as_ref())?;

    let mut key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
        .map_err(|e| CertificateError::decode(format!("invalid RSA JWK: {e}")))?;
    key.validate()
        .map_err(|e| CertificateError::decode(format!("inconsistent RSA JWK: {e}")))?;
    key.precompute()
        .map_err(|e| CertificateError::decode(format!("RSA JWK precomputation failed: {e}")))?;
    Ok(KeyPair::Rsa(key))
}

fn ec_to_jwk(curve: NamedCurve, x: Option<&[u8]>, y: Option<&[u8]>, d: &[u8]) -> Result<Jwk> {
    let (Some(x), Some(y)) = (x, y) else {
        return Err(CertificateError::encode("EC public key is the identity point"));
    };
    Ok(Jwk {
        kty: "EC".to_string(),
        crv: Some(curve.name().to_string()),
        x: encode_member(x),
        y: encode_member(y),
        n: None,
        e: None,
        d: encode_member(d),
        p: None,
        q: None,
        dp: None,
        dq: None,
        qi: None,
        ext: Some(true),
    })
}

fn ec_from_jwk(jwk: &Jwk) -> Result<KeyPair> {
    let curve_name = jwk
        .crv
        .as_deref()
        .ok_or_else(|| CertificateError::decode("EC JWK is missing \"crv\""))?;
    let curve = NamedCurve::from_name(curve_name)
        .ok_or_else(|| CertificateError::decode(format!("unsupported JWK curve {curve_name}")))?;
    let d = jwk.member("d", jwk.d.as_ref())?;
    let x = jwk.member("x", jwk.x.as_ref())?;
    let y = jwk.member("y", jwk.y.as_ref())?;

    let invalid = |e: &dyn fmt::Display| CertificateError::decode(format!("invalid EC JWK: {e}"));
    let key_pair = match curve {
        NamedCurve::P256 => {
            KeyPair::P256(p256::ecdsa::SigningKey::from_slice(&d).map_err(|e| invalid(&e))?)
        }
        NamedCurve::P384 => {
            KeyPair::P384(p384::ecdsa::SigningKey::from_slice(&d).map_err(|e| invalid(&e))?)
        }
    };

    // The public coordinates must belong to the private scalar.
    let exported = key_pair.to_jwk().map_err(|e| invalid(&e))?;
    let expected_x = jwk.x.as_deref().map(str::to_owned);
    let expected_y = jwk.y.as_deref().map(str::to_owned);
    if exported.x != expected_x || exported.y != expected_y || x.is_empty() || y.is_empty() {
        return Err(CertificateError::decode(
            "EC JWK public coordinates do not match the private key",
        ));
    }
    Ok(key_pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ec_jwk_import_rejects_foreign_public_point() {
        let a = KeyPair::generate(&Algorithm::ecdsa(NamedCurve::P256)).expect("keygen");
        let b = KeyPair::generate(&Algorithm::ecdsa(NamedCurve::P256)).expect("keygen");
        let mut jwk = a.to_jwk().expect("export");
        jwk.x = b.to_jwk().expect("export").x.clone();

        let err = KeyPair::from_jwk(&jwk).expect_err("mismatched point");
        assert_eq!(err.kind(), crate::ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_jwk_rejects_unknown_key_type() {
        let mut jwk = Jwk::default();
        jwk.kty = "oct".to_string();
        assert!(KeyPair::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_material() {
        let key = KeyPair::generate(&Algorithm::ecdsa(NamedCurve::P384)).expect("keygen");
        assert_eq!(format!("{key:?}"), "KeyPair::P384");
    }
}
