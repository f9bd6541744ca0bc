//! Certificate generation pipeline
//!
//! A [`CertificateTask`] runs key generation, body construction, signing and
//! handle assembly in order on a worker thread. The caller receives a
//! [`CertificateResult`] that resolves exactly once.

use crate::algorithm::Algorithm;
use crate::builder::{random_serial, random_subject, sign, UnsignedCertificate, Validity};
use crate::config::{CertificateOptions, GeneratorConfig};
use crate::error::{CertificateError, Result};
use crate::handle::CertificateHandle;
use crate::key_pair::KeyPair;
use crate::logging::LoggingTransformer;
use async_task::Deferred;
use chrono::Utc;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// One generation request, consumed by [`run`](Self::run)
#[derive(Debug, Clone)]
pub struct CertificateTask {
    algorithm: Algorithm,
    lifetime: Duration,
    backdate: Duration,
}

impl CertificateTask {
    /// Create a task; the algorithm is assumed to be validated already
    #[must_use]
    pub fn new(algorithm: Algorithm, lifetime: Duration, backdate: Duration) -> Self {
        Self {
            algorithm,
            lifetime,
            backdate,
        }
    }

    /// Run every step on the current thread.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::ProviderFailure` from whichever step failed;
    /// no partial handle is produced.
    pub fn run(self) -> Result<CertificateHandle> {
        let started = Instant::now();
        LoggingTransformer::log_generation_started(&self.algorithm, self.lifetime);

        let outcome = self.build();
        match &outcome {
            Ok(handle) => {
                if let Ok(certificate) = handle.certificate() {
                    LoggingTransformer::log_generation_succeeded(
                        &self.algorithm,
                        certificate.der(),
                        started.elapsed(),
                    );
                }
            }
            Err(e) => LoggingTransformer::log_generation_failed(&self.algorithm, e),
        }
        outcome
    }

    fn build(&self) -> Result<CertificateHandle> {
        let key_pair = KeyPair::generate(&self.algorithm)?;

        let validity = Validity::around(Utc::now(), self.backdate, self.lifetime)?;
        let unsigned = UnsignedCertificate::new(
            random_subject()?,
            random_serial()?,
            validity,
            &key_pair.public_key_der()?,
            self.algorithm.auth_type(),
        )?;
        let certificate = sign(unsigned, &key_pair)?;

        CertificateHandle::new(key_pair, certificate, validity.not_after)
    }
}

/// Produces certificates under one configuration
#[derive(Debug, Clone, Default)]
pub struct CertificateGenerator {
    config: GeneratorConfig,
}

impl CertificateGenerator {
    /// Generator with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration after applying its invariants
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::UnsupportedAlgorithm` if the configuration is
    /// rejected by [`GeneratorConfig::normalized`].
    pub fn with_config(mut self, config: GeneratorConfig) -> Result<Self> {
        self.config = config.normalized()?;
        Ok(self)
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Start generating a certificate.
    ///
    /// Rejected algorithms fail without generating any key material.
    pub fn generate(&self, algorithm: Algorithm, options: CertificateOptions) -> CertificateResult {
        if let Err(e) = algorithm.validate(self.config.min_rsa_modulus_bits) {
            LoggingTransformer::log_generation_failed(&algorithm, &e);
            return CertificateResult::error(e);
        }

        let task = CertificateTask::new(
            algorithm,
            self.config.lifetime_for(&options),
            self.config.backdate,
        );
        CertificateResult::new(async_task::spawn_blocking(move || task.run()))
    }

    /// Start generating from a loosely typed descriptor that names the
    /// algorithm and may carry an `expires` field.
    pub fn generate_from_value(&self, descriptor: &Value) -> CertificateResult {
        match Algorithm::from_value(descriptor) {
            Ok(algorithm) => self.generate(algorithm, CertificateOptions::from_value(descriptor)),
            Err(e) => CertificateResult::error(e),
        }
    }
}

/// Generate a certificate with the default configuration
pub fn generate_certificate(algorithm: Algorithm, options: CertificateOptions) -> CertificateResult {
    CertificateGenerator::new().generate(algorithm, options)
}

/// Generate a certificate from a WebCrypto-style descriptor with the default configuration
pub fn generate_certificate_from_value(descriptor: &Value) -> CertificateResult {
    CertificateGenerator::new().generate_from_value(descriptor)
}

/// Pending certificate generation
pub struct CertificateResult {
    inner: Deferred<Result<CertificateHandle>>,
}

/// Pending certificate generation with a user-defined result handler
pub struct CertificateResultWithHandler<F> {
    inner: Deferred<Result<CertificateHandle>>,
    handler: Option<F>,
    completed: bool,
}

impl CertificateResult {
    fn new(inner: Deferred<Result<CertificateHandle>>) -> Self {
        Self { inner }
    }

    /// Create a `CertificateResult` that's already completed
    #[must_use]
    pub fn ready(result: Result<CertificateHandle>) -> Self {
        Self::new(Deferred::ready(result))
    }

    /// Create a `CertificateResult` that yields an error
    #[must_use]
    pub fn error(error: CertificateError) -> Self {
        Self::ready(Err(error))
    }

    /// Add a handler that receives the final result
    pub fn on_result<F, T>(self, handler: F) -> CertificateResultWithHandler<F>
    where
        F: FnOnce(Result<CertificateHandle>) -> T,
    {
        CertificateResultWithHandler {
            inner: self.inner,
            handler: Some(handler),
            completed: false,
        }
    }
}

impl Future for CertificateResult {
    type Output = Result<CertificateHandle>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<F, T> Future for CertificateResultWithHandler<F>
where
    F: FnOnce(Result<CertificateHandle>) -> T + Unpin,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        // Already delivered
        if this.completed {
            return Poll::Pending;
        }

        let result = match Pin::new(&mut this.inner).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(e)) => Err(e.into()),
            Poll::Pending => return Poll::Pending,
        };

        match this.handler.take() {
            Some(handler) => {
                this.completed = true;
                Poll::Ready(handler(result))
            }
            None => Poll::Pending,
        }
    }
}
