//! # peercert
//!
//! Self-signed X.509 certificates for authenticating peer-to-peer transport
//! sessions.
//!
//! - [`generate_certificate`] creates an RSA or ECDSA key pair off the calling
//!   thread, builds a v3 certificate with a random subject and serial, signs it,
//!   and resolves to a [`CertificateHandle`].
//! - A handle hands out borrowed [`TransportIdentity`] copies for live sessions
//!   and can be disposed explicitly.
//! - [`codec::encode`] and [`codec::decode`] move a handle, private key
//!   included, across isolated contexts in a versioned binary format.
//!
//! ```no_run
//! use peercert::{generate_certificate, Algorithm, CertificateOptions, NamedCurve};
//!
//! # async fn demo() -> peercert::Result<()> {
//! let handle = generate_certificate(
//!     Algorithm::ecdsa(NamedCurve::P256),
//!     CertificateOptions::default(),
//! )
//! .await?;
//!
//! let identity = handle.create_transport_identity()?;
//! println!("fingerprint: {}", identity.fingerprint());
//!
//! let blob = peercert::codec::encode(&handle)?;
//! let restored = peercert::codec::decode(&blob)?;
//! assert_eq!(restored.certificate()?.der(), handle.certificate()?.der());
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod builder;
pub mod certificate;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod jwk;
pub mod key_pair;
pub mod logging;
pub mod task;

pub use algorithm::{Algorithm, AuthType, NamedCurve, SignatureAlgorithm, MIN_RSA_MODULUS_BITS};
pub use certificate::Certificate;
pub use config::{CertificateOptions, GeneratorConfig, DEFAULT_LIFETIME, ONE_DAY};
pub use error::{CertificateError, ErrorKind, Result};
pub use handle::{CertificateHandle, TransportIdentity};
pub use jwk::Jwk;
pub use key_pair::KeyPair;
pub use logging::LoggingTransformer;
pub use task::{
    generate_certificate, generate_certificate_from_value, CertificateGenerator,
    CertificateResult, CertificateResultWithHandler, CertificateTask,
};
