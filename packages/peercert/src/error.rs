//! Error handling for certificate generation, lifecycle and transfer

use thiserror::Error;

/// Failure kinds a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Requested algorithm or key size is not permitted
    UnsupportedAlgorithm,
    /// The underlying crypto provider failed
    ProviderFailure,
    /// A serialized certificate could not be read
    DecodeFailure,
    /// A certificate could not be serialized
    EncodeFailure,
    /// A handle was used after disposal
    LifecycleMisuse,
}

/// Certificate-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    /// Algorithm family or parameters not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key generation, certificate construction or signing failed
    #[error("Crypto provider failure: {0}")]
    ProviderFailure(String),

    /// Malformed, truncated or version-mismatched blob
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Attempt to encode an incomplete or disposed handle
    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    /// Handle used after it was disposed
    #[error("Lifecycle misuse: {0}")]
    LifecycleMisuse(String),
}

impl CertificateError {
    /// Kind of this failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::ProviderFailure(_) => ErrorKind::ProviderFailure,
            Self::DecodeFailure(_) => ErrorKind::DecodeFailure,
            Self::EncodeFailure(_) => ErrorKind::EncodeFailure,
            Self::LifecycleMisuse(_) => ErrorKind::LifecycleMisuse,
        }
    }

    /// Create an unsupported algorithm error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(msg.into())
    }

    /// Create a provider failure
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderFailure(msg.into())
    }

    /// Create a decode failure
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }

    /// Create an encode failure
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeFailure(msg.into())
    }

    /// Create a lifecycle misuse error
    pub fn disposed(operation: &str) -> Self {
        Self::LifecycleMisuse(format!("{operation} on a disposed certificate handle"))
    }
}

impl From<async_task::TaskError> for CertificateError {
    fn from(e: async_task::TaskError) -> Self {
        Self::ProviderFailure(format!("certificate task did not complete: {e}"))
    }
}

/// Result type for certificate operations
pub type Result<T> = std::result::Result<T, CertificateError>;
