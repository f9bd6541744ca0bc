//! `CertificateResult` Future behavior - single delivery, no panics

use peercert::{
    Algorithm, CertificateError, CertificateHandle, CertificateOptions, CertificateResult,
    ErrorKind, NamedCurve,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

struct TestWaker;

impl std::task::Wake for TestWaker {
    fn wake(self: Arc<Self>) {}
}

fn create_test_waker() -> Waker {
    Arc::new(TestWaker).into()
}

#[tokio::test]
async fn test_ready_error_is_delivered() {
    let result = CertificateResult::error(CertificateError::provider("keygen slot unavailable"));
    let err = result.await.expect_err("error result");
    assert_eq!(err.kind(), ErrorKind::ProviderFailure);
}

#[tokio::test]
async fn test_handler_multiple_polls_after_completion() {
    let handler = |result: Result<CertificateHandle, CertificateError>| match result {
        Ok(_) => "generated".to_string(),
        Err(e) => format!("error: {e}"),
    };
    let mut future = CertificateResult::error(CertificateError::unsupported("RSA-512"))
        .on_result(handler);

    let waker = create_test_waker();
    let mut cx = Context::from_waker(&waker);

    // First poll should complete with the handler's value
    match Pin::new(&mut future).poll(&mut cx) {
        Poll::Ready(message) => assert!(message.starts_with("error: Unsupported algorithm")),
        Poll::Pending => panic!("ready result should resolve on first poll"),
    }

    // Further polls return Pending instead of panicking
    assert!(matches!(Pin::new(&mut future).poll(&mut cx), Poll::Pending));
    assert!(matches!(Pin::new(&mut future).poll(&mut cx), Poll::Pending));
}

#[tokio::test]
async fn test_handler_receives_generated_handle() {
    let subject = peercert::generate_certificate(
        Algorithm::ecdsa(NamedCurve::P256),
        CertificateOptions::default(),
    )
    .on_result(|result| match result {
        Ok(handle) => handle.certificate().map(|c| c.subject()).unwrap_or_default(),
        Err(_) => String::new(),
    })
    .await;

    assert!(subject.starts_with("CN="));
}

#[tokio::test]
async fn test_validation_failure_goes_through_handler() {
    let kind = peercert::generate_certificate(Algorithm::rsa(768), CertificateOptions::default())
        .on_result(|result| result.err().map(|e| e.kind()))
        .await;
    assert_eq!(kind, Some(ErrorKind::UnsupportedAlgorithm));
}
