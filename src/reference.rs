use urlencoding::encode;

use crate::DecryptionError;

/// A shareable paste link split into the part that is fetched and the key
/// that never leaves the client.
#[derive(Clone, PartialEq, Eq)]
pub struct PasteReference {
    pub base_url: String,
    pub paste_id: String,
    pub key_token: String,
}

impl PasteReference {
    pub fn parse(paste_url: &str) -> Result<Self, DecryptionError> {
        let (base_url, key_token) = paste_url
            .split_once('#')
            .ok_or(DecryptionError::MalformedReference)?;

        let paste_id = base_url
            .rsplit_once('?')
            .map(|(_, id)| id)
            .unwrap_or_default();

        Ok(Self {
            base_url: base_url.to_string(),
            paste_id: paste_id.to_string(),
            key_token: key_token.to_string(),
        })
    }

    /// JSON endpoint for this paste: the base address without its query,
    /// queried with `pasteid=<id>`.
    pub fn api_url(&self) -> String {
        let endpoint = self
            .base_url
            .split_once('?')
            .map(|(head, _)| head)
            .unwrap_or(&self.base_url);
        format!("{}?pasteid={}", endpoint, encode(&self.paste_id))
    }
}

// The key token is secret; keep it out of debug output.
impl std::fmt::Debug for PasteReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasteReference")
            .field("base_url", &self.base_url)
            .field("paste_id", &self.paste_id)
            .field("key_token", &"<redacted>")
            .finish()
    }
}
