//! Handle disposal and derived transport identities

use peercert::{
    generate_certificate, Algorithm, CertificateOptions, ErrorKind, NamedCurve,
};

#[tokio::test]
async fn test_transport_identity_mirrors_handle() {
    let handle = generate_certificate(Algorithm::ecdsa(NamedCurve::P256), CertificateOptions::default())
        .await
        .expect("generation");
    let identity = handle.create_transport_identity().expect("identity");

    let certificate = handle.certificate().expect("live");
    assert_eq!(identity.certificate().der(), certificate.der());
    assert_eq!(identity.auth_type(), handle.auth_type().expect("live"));
    assert_eq!(identity.fingerprint(), certificate.fingerprint());

    let signature = identity.sign(b"client hello").expect("sign");
    assert!(handle
        .key_pair()
        .expect("live")
        .verify(b"client hello", &signature));
}

#[tokio::test]
async fn test_identities_are_independent_copies() {
    let handle = generate_certificate(Algorithm::rsa(1024), CertificateOptions::default())
        .await
        .expect("generation");

    let first = handle.create_transport_identity().expect("identity");
    let second = handle.create_transport_identity().expect("identity");
    assert_eq!(first.certificate(), second.certificate());
    drop(first);

    // Dropping one identity leaves the other and the handle usable.
    assert!(second.sign(b"data").is_ok());
    assert!(handle.create_transport_identity().is_ok());
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let mut handle = generate_certificate(Algorithm::ecdsa(NamedCurve::P256), CertificateOptions::default())
        .await
        .expect("generation");
    assert!(!handle.is_disposed());

    handle.dispose();
    assert!(handle.is_disposed());
    handle.dispose();
    assert!(handle.is_disposed());
}

#[tokio::test]
async fn test_disposed_handle_reports_lifecycle_misuse() {
    let mut handle = generate_certificate(Algorithm::ecdsa(NamedCurve::P256), CertificateOptions::default())
        .await
        .expect("generation");

    {
        let identity = handle.create_transport_identity().expect("identity");
        assert!(identity.sign(b"before disposal").is_ok());
    }
    handle.dispose();

    let err = handle.create_transport_identity().expect_err("disposed");
    assert_eq!(err.kind(), ErrorKind::LifecycleMisuse);
    assert_eq!(handle.certificate().expect_err("disposed").kind(), ErrorKind::LifecycleMisuse);
    assert_eq!(handle.key_pair().expect_err("disposed").kind(), ErrorKind::LifecycleMisuse);
    assert_eq!(handle.auth_type().expect_err("disposed").kind(), ErrorKind::LifecycleMisuse);
    assert_eq!(handle.expires().expect_err("disposed").kind(), ErrorKind::LifecycleMisuse);
    assert_eq!(handle.is_expired().expect_err("disposed").kind(), ErrorKind::LifecycleMisuse);
}

#[tokio::test]
async fn test_debug_output_hides_key_material() {
    let mut handle = generate_certificate(Algorithm::ecdsa(NamedCurve::P256), CertificateOptions::default())
        .await
        .expect("generation");

    let rendered = format!("{handle:?}");
    assert!(rendered.contains("CertificateHandle"));
    assert!(!rendered.contains("KeyPair"));

    handle.dispose();
    assert_eq!(format!("{handle:?}"), "CertificateHandle(disposed)");
}
