use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::DecryptionError;

const SPEC_FIELDS: usize = 8;
const SUPPORTED_KEY_SIZES: [u32; 3] = [128, 192, 256];
const SUPPORTED_TAG_SIZE: u32 = 128;
const SUPPORTED_IV_LENGTHS: [usize; 2] = [12, 16];
const MAX_ITERATIONS: u32 = 10_000_000;

/// A base64 field as the server sent it, next to its decoded bytes.
///
/// The text form feeds the authenticated data, the bytes feed the cipher.
/// The two must never be collapsed into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub original: String,
    pub decoded: Vec<u8>,
}

impl Encoded {
    fn from_base64(field: &str, text: &str) -> Result<Self, DecryptionError> {
        let decoded = BASE64_STANDARD.decode(text).map_err(|e| {
            DecryptionError::UnrecognizedFormat(format!("{field} is not valid base64: {e}"))
        })?;
        Ok(Self {
            original: text.to_string(),
            decoded,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    RawDeflate,
}

impl Compression {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Compression::None),
            "zlib" => Some(Compression::RawDeflate),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::RawDeflate => "zlib",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionSpec {
    pub iv: Encoded,
    pub salt: Encoded,
    pub iterations: u32,
    pub key_size_bits: u32,
    pub tag_size_bits: u32,
    pub cipher_algorithm: String,
    pub cipher_mode: String,
    pub compression: Compression,
}

impl EncryptionSpec {
    pub fn key_len(&self) -> usize {
        (self.key_size_bits / 8) as usize
    }

    pub fn tag_len(&self) -> usize {
        (self.tag_size_bits / 8) as usize
    }
}

#[derive(Debug, Clone)]
pub struct EncryptedRecord {
    pub spec: EncryptionSpec,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    /// The `adata` value exactly as received; serialized as-is for the AAD.
    pub adata: Value,
}

/// Validate a paste API response and pull out the encryption parameters,
/// ciphertext and tag.
pub fn extract_record(response: &Value) -> Result<EncryptedRecord, DecryptionError> {
    check_status(response)?;

    let (ct, adata) = locate_payload(response)?;
    let ct = ct.as_str().ok_or_else(|| {
        DecryptionError::UnrecognizedFormat("ciphertext is not a string".to_string())
    })?;

    let spec = parse_spec(adata)?;
    log::debug!(
        "paste spec: {}-{} key={} tag={} iterations={} compression={}",
        spec.cipher_algorithm,
        spec.cipher_mode,
        spec.key_size_bits,
        spec.tag_size_bits,
        spec.iterations,
        spec.compression.token()
    );

    let mut ciphertext = BASE64_STANDARD.decode(ct).map_err(|e| {
        DecryptionError::UnrecognizedFormat(format!("ciphertext is not valid base64: {e}"))
    })?;

    let tag_len = spec.tag_len();
    if ciphertext.len() < tag_len {
        return Err(DecryptionError::TruncatedCiphertext {
            required: tag_len,
            actual: ciphertext.len(),
        });
    }
    let tag = ciphertext.split_off(ciphertext.len() - tag_len);

    Ok(EncryptedRecord {
        spec,
        ciphertext,
        tag,
        adata: adata.clone(),
    })
}

fn check_status(response: &Value) -> Result<(), DecryptionError> {
    match response.get("status").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        Some(status) => {
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            Err(DecryptionError::RemoteError(format!(
                "status {status}: {message}"
            )))
        }
        None => Err(DecryptionError::RemoteError(
            "response carries no status".to_string(),
        )),
    }
}

fn locate_payload(response: &Value) -> Result<(&Value, &Value), DecryptionError> {
    if let (Some(ct), Some(adata)) = (response.get("ct"), response.get("adata")) {
        return Ok((ct, adata));
    }

    if let Some(data) = response.get("data").and_then(Value::as_array) {
        if let [ct, adata] = data.as_slice() {
            return Ok((ct, adata));
        }
    }

    let keys = response
        .as_object()
        .map(|object| object.keys().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default();
    Err(DecryptionError::UnrecognizedFormat(format!(
        "expected ct/adata or data[0..2], got keys [{keys}]"
    )))
}

fn parse_spec(adata: &Value) -> Result<EncryptionSpec, DecryptionError> {
    let fields = adata
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DecryptionError::UnrecognizedFormat("adata[0] is not an array".to_string())
        })?;

    if fields.len() != SPEC_FIELDS {
        return Err(DecryptionError::UnrecognizedFormat(format!(
            "adata[0] has {} fields, expected {SPEC_FIELDS}",
            fields.len()
        )));
    }

    let iv = Encoded::from_base64("iv", string_field(fields, 0, "iv")?)?;
    let salt = Encoded::from_base64("salt", string_field(fields, 1, "salt")?)?;
    let iterations = positive_field(fields, 2, "iterations")?;
    let key_size_bits = positive_field(fields, 3, "key size")?;
    let tag_size_bits = positive_field(fields, 4, "tag size")?;
    let cipher_algorithm = string_field(fields, 5, "algorithm")?.to_string();
    let cipher_mode = string_field(fields, 6, "mode")?.to_string();
    let compression_token = string_field(fields, 7, "compression")?;

    let compression = Compression::from_token(compression_token).ok_or_else(|| {
        DecryptionError::UnsupportedSpec(format!("compression '{compression_token}'"))
    })?;

    if !cipher_algorithm.eq_ignore_ascii_case("aes") {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "algorithm '{cipher_algorithm}'"
        )));
    }
    if !cipher_mode.eq_ignore_ascii_case("gcm") {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "mode '{cipher_mode}'"
        )));
    }
    if iterations > MAX_ITERATIONS {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "{iterations} iterations, at most {MAX_ITERATIONS} allowed"
        )));
    }
    if !SUPPORTED_KEY_SIZES.contains(&key_size_bits) {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "key size {key_size_bits} bits"
        )));
    }
    if tag_size_bits != SUPPORTED_TAG_SIZE {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "tag size {tag_size_bits} bits"
        )));
    }
    if !SUPPORTED_IV_LENGTHS.contains(&iv.decoded.len()) {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "iv length {} bytes",
            iv.decoded.len()
        )));
    }

    Ok(EncryptionSpec {
        iv,
        salt,
        iterations,
        key_size_bits,
        tag_size_bits,
        cipher_algorithm,
        cipher_mode,
        compression,
    })
}

fn string_field<'a>(
    fields: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str, DecryptionError> {
    fields[index]
        .as_str()
        .ok_or_else(|| DecryptionError::UnrecognizedFormat(format!("{name} is not a string")))
}

fn positive_field(fields: &[Value], index: usize, name: &str) -> Result<u32, DecryptionError> {
    let value = &fields[index];
    if !value.is_number() {
        return Err(DecryptionError::UnrecognizedFormat(format!(
            "{name} is not a number"
        )));
    }
    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| DecryptionError::UnsupportedSpec(format!("{name} {value} out of range")))
}
