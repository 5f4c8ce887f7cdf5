#![allow(dead_code)]

use std::io::Write;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use flate2::write::DeflateEncoder;
use hmac::Hmac;
use serde_json::{json, Value};
use sha2::Sha256;

pub const IV: [u8; 16] = [7; 16];
pub const SALT: [u8; 8] = *b"pastesal";
pub const ITERATIONS: u32 = 1_000;

/// A paste as the web client would upload it: the server record plus the
/// fragment the link carries.
pub struct SealedPaste {
    pub ct: String,
    pub adata: Value,
    pub key_token: String,
}

impl SealedPaste {
    pub fn flat_response(&self) -> Value {
        json!({
            "status": 0,
            "id": "abc",
            "url": "/?abc",
            "ct": self.ct,
            "adata": self.adata,
            "meta": {}
        })
    }

    pub fn indexed_response(&self) -> Value {
        json!({
            "status": 0,
            "data": [self.ct, self.adata]
        })
    }

    pub fn link(&self, base: &str) -> String {
        format!("{base}/?abc#{}", self.key_token)
    }
}

pub fn adata_for(compression: &str) -> Value {
    json!([
        [
            BASE64_STANDARD.encode(IV),
            BASE64_STANDARD.encode(SALT),
            ITERATIONS,
            256,
            128,
            "aes",
            "gcm",
            compression
        ],
        "plaintext",
        0,
        0
    ])
}

/// Encrypt `text` under `raw_key` the way the browser client does.
pub fn seal(text: &str, raw_key: &[u8], compression: &str) -> SealedPaste {
    seal_with_adata(text, raw_key, adata_for(compression))
}

pub fn seal_with_adata(text: &str, raw_key: &[u8], adata: Value) -> SealedPaste {
    let compression = adata[0][7].as_str().unwrap_or("none");
    let mut buffer = if compression == "zlib" {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    } else {
        text.as_bytes().to_vec()
    };

    let mut padded = [0u8; 32];
    if raw_key.len() >= 32 {
        padded.copy_from_slice(&raw_key[..32]);
    } else {
        padded[32 - raw_key.len()..].copy_from_slice(raw_key);
    }
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(&padded, &SALT, ITERATIONS, &mut key).unwrap();

    let aad = serde_json::to_vec(&adata).unwrap();
    let cipher = AesGcm::<Aes256, U16>::new_from_slice(&key).unwrap();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&IV), &aad, &mut buffer)
        .unwrap();
    buffer.extend_from_slice(&tag);

    SealedPaste {
        ct: BASE64_STANDARD.encode(&buffer),
        adata,
        key_token: bs58::encode(raw_key).into_string(),
    }
}
