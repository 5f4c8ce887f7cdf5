mod common;

use common::{adata_for, seal, seal_with_adata};
use httpmock::prelude::*;
use pbdecrypt::cipher::{authenticated_data, open};
use pbdecrypt::kdf::derive_key;
use pbdecrypt::spec::extract_record;
use pbdecrypt::{
    decrypt_response, DecryptionError, FetchConfig, HttpFetcher, PasteClient, PasteReference,
};
use serde_json::json;

const KEY: [u8; 32] = [
    0x3a, 0x91, 0x0c, 0x55, 0xe2, 0x17, 0x48, 0xbb, 0x09, 0x6d, 0xf0, 0x21, 0x84, 0x3e, 0xc7,
    0x12, 0x5f, 0xa8, 0x33, 0x9e, 0x01, 0x74, 0xd6, 0x2b, 0x8c, 0x40, 0xe9, 0x1d, 0x66, 0xb5,
    0x07, 0xfa,
];

const BODY: &str = "Mirrors:\n\
    https://fuckingfast.co/abc123\n\
    https://gofile.io/d/xyz <- backup\n\
    done";

fn reference(key_token: &str) -> PasteReference {
    PasteReference::parse(&format!("https://paste.example/?abc#{key_token}")).unwrap()
}

#[test]
fn flat_and_indexed_responses_decrypt_alike() {
    let sealed = seal(BODY, &KEY, "zlib");
    let reference = reference(&sealed.key_token);

    let flat = decrypt_response(&reference, &sealed.flat_response()).unwrap();
    let indexed = decrypt_response(&reference, &sealed.indexed_response()).unwrap();

    assert_eq!(flat.text, BODY);
    assert_eq!(
        flat.urls,
        vec!["https://fuckingfast.co/abc123", "https://gofile.io/d/xyz"]
    );
    assert_eq!(flat, indexed);
}

#[test]
fn uncompressed_pastes_decrypt() {
    let sealed = seal(BODY, &KEY, "none");
    let paste = decrypt_response(&reference(&sealed.key_token), &sealed.flat_response()).unwrap();
    assert_eq!(paste.text, BODY);
    assert_eq!(paste.urls.len(), 2);
}

#[test]
fn json_bodies_yield_links_from_every_field() {
    let text = json!({
        "paste": "mirror https://a.example/1",
        "attachment_name": "https://b.example/2"
    })
    .to_string();
    let sealed = seal(&text, &KEY, "zlib");
    let paste = decrypt_response(&reference(&sealed.key_token), &sealed.flat_response()).unwrap();
    assert_eq!(paste.text, text);
    assert_eq!(paste.urls, vec!["https://a.example/1", "https://b.example/2"]);
}

#[test]
fn decrypting_twice_gives_the_same_result() {
    let sealed = seal(BODY, &KEY, "zlib");
    let reference = reference(&sealed.key_token);
    let response = sealed.flat_response();
    assert_eq!(
        decrypt_response(&reference, &response).unwrap(),
        decrypt_response(&reference, &response).unwrap()
    );
}

#[test]
fn short_keys_are_left_padded() {
    let sealed = seal(BODY, &KEY[..20], "zlib");
    let paste = decrypt_response(&reference(&sealed.key_token), &sealed.flat_response()).unwrap();
    assert_eq!(paste.text, BODY);
}

#[test]
fn long_keys_are_truncated() {
    let mut long = KEY.to_vec();
    long.extend_from_slice(&[0xee; 8]);
    let sealed = seal(BODY, &long, "zlib");
    let paste = decrypt_response(&reference(&sealed.key_token), &sealed.flat_response()).unwrap();
    assert_eq!(paste.text, BODY);
}

#[test]
fn wrong_key_fails_integrity_check() {
    let sealed = seal(BODY, &KEY, "zlib");
    let mut other = KEY;
    other[0] ^= 1;
    let token = bs58::encode(other).into_string();
    let err = decrypt_response(&reference(&token), &sealed.flat_response()).unwrap_err();
    assert!(matches!(err, DecryptionError::IntegrityCheckFailed));
}

#[test]
fn iv_must_stay_base64_text() {
    let sealed = seal(BODY, &KEY, "zlib");
    let mut response = sealed.flat_response();
    response["adata"][0][0] = json!(common::IV.to_vec());
    let err = decrypt_response(&reference(&sealed.key_token), &response).unwrap_err();
    assert!(matches!(err, DecryptionError::UnrecognizedFormat(_)));
}

#[test]
fn authenticated_metadata_is_bound_to_the_tag() {
    let sealed = seal(BODY, &KEY, "zlib");
    let mut response = sealed.flat_response();
    response["adata"][1] = json!("markdown");
    let err = decrypt_response(&reference(&sealed.key_token), &response).unwrap_err();
    assert!(matches!(err, DecryptionError::IntegrityCheckFailed));
}

#[test]
fn decoded_iv_and_salt_do_not_authenticate() {
    let sealed = seal(BODY, &KEY, "zlib");
    let record = extract_record(&sealed.flat_response()).unwrap();
    let key = derive_key(&sealed.key_token, &record.spec).unwrap();

    let aad = authenticated_data(&record.adata).unwrap();
    assert!(open(key.as_bytes(), &record.spec.iv.decoded, &aad, &record.ciphertext, &record.tag).is_ok());

    let mut decoded = record.adata.clone();
    decoded[0][0] = json!(String::from_utf8_lossy(&record.spec.iv.decoded));
    decoded[0][1] = json!(String::from_utf8_lossy(&record.spec.salt.decoded));
    let aad = authenticated_data(&decoded).unwrap();
    let err = open(key.as_bytes(), &record.spec.iv.decoded, &aad, &record.ciphertext, &record.tag)
        .unwrap_err();
    assert!(matches!(err, DecryptionError::IntegrityCheckFailed));
}

#[test]
fn tampered_ciphertext_fails_integrity_check() {
    let sealed = seal(BODY, &KEY, "zlib");
    let mut response = sealed.flat_response();
    let mut bytes = base64_decode(&sealed.ct);
    bytes[0] ^= 0x80;
    response["ct"] = json!(base64_encode(&bytes));
    let err = decrypt_response(&reference(&sealed.key_token), &response).unwrap_err();
    assert!(matches!(err, DecryptionError::IntegrityCheckFailed));
}

#[test]
fn unsupported_compression_is_rejected_before_key_work() {
    let sealed = seal_with_adata(BODY, &KEY, adata_for("gzip"));
    // An invalid key token proves the spec was checked first.
    let err = decrypt_response(&reference("0OIl"), &sealed.flat_response()).unwrap_err();
    assert!(matches!(err, DecryptionError::UnsupportedSpec(_)));
}

#[test]
fn ciphertext_shorter_than_tag_is_truncated() {
    let sealed = seal(BODY, &KEY, "zlib");
    let mut response = sealed.flat_response();
    response["ct"] = json!(base64_encode(&[1, 2, 3, 4, 5]));
    let err = decrypt_response(&reference(&sealed.key_token), &response).unwrap_err();
    assert!(matches!(
        err,
        DecryptionError::TruncatedCiphertext {
            required: 16,
            actual: 5
        }
    ));
}

#[test]
fn non_base58_key_is_rejected() {
    let sealed = seal(BODY, &KEY, "zlib");
    let err = decrypt_response(&reference("not+base58"), &sealed.flat_response()).unwrap_err();
    assert!(matches!(err, DecryptionError::InvalidKeyEncoding));
}

#[test]
fn client_fetches_and_decrypts_over_http() {
    let sealed = seal(BODY, &KEY, "zlib");
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/")
            .query_param("pasteid", "abc")
            .header("x-requested-with", "JSONHttpRequest");
        then.status(200).json_body(sealed.flat_response());
    });

    let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
    let urls = PasteClient::new(fetcher)
        .decrypt(&sealed.link(&server.base_url()))
        .unwrap();

    assert_eq!(
        urls,
        vec!["https://fuckingfast.co/abc123", "https://gofile.io/d/xyz"]
    );
    mock.assert();
}

#[test]
fn client_decrypts_indexed_response_over_http() {
    let sealed = seal(BODY, &KEY, "zlib");
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/").query_param("pasteid", "abc");
        then.status(200).json_body(sealed.indexed_response());
    });

    let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
    let client = PasteClient::new(&fetcher);
    let paste = client.open(&sealed.link(&server.base_url())).unwrap();
    assert_eq!(paste.text, BODY);
    mock.assert_hits(1);
}

fn base64_decode(text: &str) -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(text).unwrap()
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
