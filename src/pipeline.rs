use serde_json::Value;

use crate::cipher::decrypt_record;
use crate::fetch::{FetchError, Fetcher, HttpFetcher};
use crate::kdf::derive_key;
use crate::links::extract_links;
use crate::payload::{decompress_payload, searchable_text};
use crate::reference::PasteReference;
use crate::spec::extract_record;
use crate::DecryptionError;

#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedPaste {
    pub text: String,
    pub urls: Vec<String>,
}

impl std::fmt::Debug for DecryptedPaste {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedPaste")
            .field("text", &format_args!("<{} chars>", self.text.chars().count()))
            .field("urls", &self.urls.len())
            .finish()
    }
}

impl From<FetchError> for DecryptionError {
    fn from(error: FetchError) -> Self {
        DecryptionError::FetchFailed(error.to_string())
    }
}

/// Decrypt an already fetched API response using the key from `reference`.
pub fn decrypt_response(
    reference: &PasteReference,
    response: &Value,
) -> Result<DecryptedPaste, DecryptionError> {
    let record = extract_record(response)?;
    let key = derive_key(&reference.key_token, &record.spec)?;
    let plaintext = decrypt_record(&key, &record)?;
    drop(key);

    let text = decompress_payload(&plaintext, record.spec.compression)?;
    let urls = extract_links(&searchable_text(&text));
    Ok(DecryptedPaste { text, urls })
}

/// Runs the whole pipeline against pastes fetched through `F`.
pub struct PasteClient<F> {
    fetcher: F,
}

impl PasteClient<HttpFetcher> {
    pub fn from_env() -> Result<Self, DecryptionError> {
        Ok(Self::new(HttpFetcher::from_env()?))
    }
}

impl<F: Fetcher> PasteClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn open(&self, paste_url: &str) -> Result<DecryptedPaste, DecryptionError> {
        let reference = PasteReference::parse(paste_url.trim())?;
        let api_url = reference.api_url();
        log::info!("fetching paste {} from {}", reference.paste_id, api_url);

        let response = self.fetcher.fetch_json(&api_url)?;
        let paste = decrypt_response(&reference, &response)?;
        log::info!(
            "decrypted paste {}: {} links",
            reference.paste_id,
            paste.urls.len()
        );
        Ok(paste)
    }

    /// The links found in the paste behind `paste_url`, in order.
    pub fn decrypt(&self, paste_url: &str) -> Result<Vec<String>, DecryptionError> {
        self.open(paste_url).map(|paste| paste.urls)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch_json(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch_json(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch_json(url)
    }
}
