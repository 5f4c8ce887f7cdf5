use serde::{Deserialize, Serialize};

use crate::DecryptionError;

const DECRYPT_FAILED: &str = "Failed to decrypt paste. The key might be invalid.";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecryptPasteResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub count: usize,
}

impl DecryptPasteResponse {
    pub fn success(urls: Vec<String>) -> Self {
        Self {
            success: true,
            count: urls.len(),
            data: Some(urls),
            error: None,
            kind: None,
        }
    }

    pub fn failure(error: &DecryptionError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(public_message(error).to_string()),
            kind: Some(error.kind().to_string()),
            count: 0,
        }
    }
}

pub fn public_message(error: &DecryptionError) -> &'static str {
    match error {
        DecryptionError::MalformedReference => "Paste URL must contain encryption key (#key)",
        DecryptionError::FetchFailed(_) => "Failed to fetch paste. Please check your connection.",
        DecryptionError::RemoteError(_) => {
            "The paste server reported an error. The paste may not exist anymore."
        }
        DecryptionError::UnrecognizedFormat(_)
        | DecryptionError::UnsupportedSpec(_)
        | DecryptionError::TruncatedCiphertext { .. } => "The paste uses an unsupported format.",
        DecryptionError::InvalidKeyEncoding | DecryptionError::IntegrityCheckFailed => {
            DECRYPT_FAILED
        }
        DecryptionError::DecompressionFailed(_) | DecryptionError::InvalidEncoding => {
            "The decrypted paste could not be decoded."
        }
    }
}
