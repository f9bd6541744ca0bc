//! Transfer format round trips and rejection of damaged blobs

use hex_literal::hex;
use peercert::codec::{decode, encode, join_micros, split_micros, FORMAT_VERSION};
use peercert::{
    generate_certificate, Algorithm, CertificateHandle, CertificateOptions, ErrorKind, KeyPair,
    LoggingTransformer, NamedCurve,
};
use proptest::prelude::*;

async fn generated(algorithm: Algorithm) -> CertificateHandle {
    generate_certificate(algorithm, CertificateOptions::default())
        .await
        .expect("generation")
}

fn assert_decode_failure(blob: &[u8]) {
    let err = decode(blob).expect_err("damaged blob must not decode");
    assert_eq!(err.kind(), ErrorKind::DecodeFailure, "{err}");
}

#[tokio::test]
async fn test_round_trip_preserves_handle() {
    LoggingTransformer::init_test();

    for algorithm in [
        Algorithm::rsa(1024),
        Algorithm::ecdsa(NamedCurve::P256),
        Algorithm::ecdsa(NamedCurve::P384),
    ] {
        let original = generated(algorithm).await;
        let blob = encode(&original).expect("encode");
        let restored = decode(&blob).expect("decode");

        assert_eq!(restored.auth_type().expect("live"), original.auth_type().expect("live"));
        assert_eq!(restored.expires().expect("live"), original.expires().expect("live"));
        assert_eq!(
            restored.certificate().expect("live").der(),
            original.certificate().expect("live").der()
        );

        // The restored key signs for the original certificate.
        let signature = restored.key_pair().expect("live").sign(b"payload").expect("sign");
        assert!(original.key_pair().expect("live").verify(b"payload", &signature));

        // Encoding is deterministic for RSA and ECDSA keys alike.
        assert_eq!(encode(&restored).expect("re-encode"), blob);
    }
}

#[tokio::test]
async fn test_header_layout() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let blob = encode(&handle).expect("encode");

    // pair(version 1, tag 4), little-endian: low word first.
    assert_eq!(blob[..8], hex!("04000000 01000000"));
    assert_eq!(blob.len() % 8, 0);

    let micros = handle.expires().expect("live").timestamp_micros();
    let (high, low) = split_micros(micros);
    let mut expiry = [0u8; 8];
    expiry.copy_from_slice(&blob[8..16]);
    assert_eq!(u64::from_le_bytes(expiry), (u64::from(high) << 32) | u64::from(low));
}

#[tokio::test]
async fn test_altered_version_fails() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let mut blob = encode(&handle).expect("encode");

    for version in [0u32, FORMAT_VERSION + 1, u32::MAX] {
        blob[4..8].copy_from_slice(&version.to_le_bytes());
        assert_decode_failure(&blob);
    }
}

#[tokio::test]
async fn test_unknown_auth_tag_fails() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let mut blob = encode(&handle).expect("encode");
    blob[0..4].copy_from_slice(&2u32.to_le_bytes());
    assert_decode_failure(&blob);
}

#[tokio::test]
async fn test_mismatched_auth_tag_fails() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let mut blob = encode(&handle).expect("encode");
    blob[0..4].copy_from_slice(&1u32.to_le_bytes());
    assert_decode_failure(&blob);
}

#[tokio::test]
async fn test_truncated_blobs_fail() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let blob = encode(&handle).expect("encode");
    let der_len = handle.certificate().expect("live").der().len();

    // Mid-certificate, just after the certificate length word, and mid-header.
    for cut in [blob.len() - der_len / 2, blob.len() - der_len - 1, 12, 0] {
        assert_decode_failure(&blob[..cut]);
    }
    assert_decode_failure(&blob[..blob.len() - 1]);
}

#[tokio::test]
async fn test_trailing_bytes_fail() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let mut blob = encode(&handle).expect("encode");
    blob.extend_from_slice(&[0u8; 8]);
    assert_decode_failure(&blob);
}

#[tokio::test]
async fn test_corrupted_certificate_fails() {
    let handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let mut blob = encode(&handle).expect("encode");
    let der_len = handle.certificate().expect("live").der().len();
    let padded = der_len.next_multiple_of(8);
    let start = blob.len() - padded;

    // Clobber the outer SEQUENCE tag.
    blob[start] = 0x00;
    assert_decode_failure(&blob);
}

#[tokio::test]
async fn test_foreign_key_fails() {
    let first = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    let second = generated(Algorithm::ecdsa(NamedCurve::P256)).await;

    // First handle's key with the second handle's certificate.
    let first_blob = encode(&first).expect("encode");
    let second_blob = encode(&second).expect("encode");
    let cert_record = |handle: &CertificateHandle, blob: &[u8]| {
        let padded = handle.certificate().expect("live").der().len().next_multiple_of(8);
        blob.len() - padded - 8
    };
    let mut spliced = first_blob[..cert_record(&first, &first_blob)].to_vec();
    spliced.extend_from_slice(&second_blob[cert_record(&second, &second_blob)..]);

    assert_decode_failure(&spliced);
}

#[tokio::test]
async fn test_disposed_handle_cannot_be_encoded() {
    let mut handle = generated(Algorithm::ecdsa(NamedCurve::P256)).await;
    handle.dispose();

    let err = encode(&handle).expect_err("disposed");
    assert_eq!(err.kind(), ErrorKind::EncodeFailure);
}

#[tokio::test]
async fn test_jwk_round_trip_through_text() {
    let handle = generated(Algorithm::rsa(1024)).await;
    let key_pair = handle.key_pair().expect("live");

    let json = key_pair.to_jwk().expect("export").to_json().expect("json");
    let jwk = peercert::Jwk::from_json(&json).expect("parse");
    assert_eq!(jwk.kty, "RSA");
    assert_eq!(jwk.ext, Some(true));

    let imported = KeyPair::from_jwk(&jwk).expect("import");
    assert_eq!(
        imported.public_key_der().expect("spki"),
        key_pair.public_key_der().expect("spki")
    );
}

proptest! {
    #[test]
    fn prop_expiry_words_round_trip(micros in any::<i64>()) {
        let (high, low) = split_micros(micros);
        prop_assert_eq!(join_micros(high, low), micros);
    }
}
