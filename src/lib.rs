//! Client for PrivateBin-style zero-knowledge pastes.
//!
//! A paste link `https://host/?<id>#<base58 key>` is split into the part that
//! is fetched and the key that stays local. The fetched record is decrypted
//! the way the PrivateBin web client does it:
//!
//! ```text
//! link → reference → fetch → spec + ciphertext → PBKDF2 key → AES-GCM open
//!      → raw inflate → UTF-8 text → links
//! ```

use thiserror::Error;

pub mod cipher;
pub mod fetch;
pub mod kdf;
pub mod links;
pub mod payload;
pub mod pipeline;
pub mod reference;
pub mod server;
pub mod spec;

pub use fetch::{FetchConfig, FetchError, Fetcher, HttpFetcher};
pub use links::{extract_links, filter_links};
pub use pipeline::{decrypt_response, DecryptedPaste, PasteClient};
pub use reference::PasteReference;
pub use spec::{Compression, EncryptedRecord, EncryptionSpec};

#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("paste link has no #key fragment")]
    MalformedReference,
    #[error("failed to fetch paste: {0}")]
    FetchFailed(String),
    #[error("paste server reported an error: {0}")]
    RemoteError(String),
    #[error("unrecognized paste response: {0}")]
    UnrecognizedFormat(String),
    #[error("unsupported encryption parameters: {0}")]
    UnsupportedSpec(String),
    #[error("ciphertext too short: {actual} bytes, tag needs {required}")]
    TruncatedCiphertext { required: usize, actual: usize },
    #[error("paste key is not valid base58")]
    InvalidKeyEncoding,
    #[error("decryption failed")]
    IntegrityCheckFailed,
    #[error("failed to decompress paste: {0}")]
    DecompressionFailed(String),
    #[error("paste text is not valid UTF-8")]
    InvalidEncoding,
}

impl DecryptionError {
    /// Stable identifier for the failing stage, safe to show to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            DecryptionError::MalformedReference => "malformed_reference",
            DecryptionError::FetchFailed(_) => "fetch_failed",
            DecryptionError::RemoteError(_) => "remote_error",
            DecryptionError::UnrecognizedFormat(_) => "unrecognized_format",
            DecryptionError::UnsupportedSpec(_) => "unsupported_spec",
            DecryptionError::TruncatedCiphertext { .. } => "truncated_ciphertext",
            DecryptionError::InvalidKeyEncoding => "invalid_key_encoding",
            DecryptionError::IntegrityCheckFailed => "integrity_check_failed",
            DecryptionError::DecompressionFailed(_) => "decompression_failed",
            DecryptionError::InvalidEncoding => "invalid_encoding",
        }
    }
}

/// Fetch and decrypt `paste_url` with the default HTTP fetcher, returning
/// the links found in the paste.
pub fn decrypt(paste_url: &str) -> Result<Vec<String>, DecryptionError> {
    // Parse first so a link without a key never reaches the network.
    PasteReference::parse(paste_url.trim())?;
    PasteClient::from_env()?.decrypt(paste_url)
}
