use std::io::Read;

use flate2::read::DeflateDecoder;
use serde_json::Value;

use crate::spec::Compression;
use crate::DecryptionError;

/// Upper bound on inflated paste size.
pub const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

/// Undo the paste's compression and decode the result as UTF-8.
pub fn decompress_payload(plaintext: &[u8], compression: Compression) -> Result<String, DecryptionError> {
    let bytes = match compression {
        Compression::None => plaintext.to_vec(),
        Compression::RawDeflate => inflate_raw(plaintext)?,
    };

    String::from_utf8(bytes).map_err(|_| DecryptionError::InvalidEncoding)
}

/// Inflate a headerless DEFLATE stream (no zlib or gzip framing).
pub fn inflate_raw(data: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    let mut inflated = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| DecryptionError::DecompressionFailed(e.to_string()))?;

    if inflated.len() as u64 > MAX_INFLATED_BYTES {
        return Err(DecryptionError::DecompressionFailed(format!(
            "inflated payload exceeds {MAX_INFLATED_BYTES} bytes"
        )));
    }
    Ok(inflated)
}

/// The human-readable part of a decrypted paste.
///
/// Current clients encrypt a JSON document such as `{"paste": "..."}`;
/// older ones encrypt the text itself.
pub fn message_body(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => match document.get("paste") {
            Some(Value::String(paste)) => paste.clone(),
            _ => text.to_string(),
        },
        _ => text.to_string(),
    }
}

/// Text to search for links. JSON documents are unescaped into their string
/// values, in document order, so every field is covered.
pub fn searchable_text(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(document @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => {
            let mut strings = Vec::new();
            collect_strings(&document, &mut strings);
            strings.join("\n")
        }
        _ => text.to_string(),
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(fields) => fields.values().for_each(|field| collect_strings(field, out)),
        _ => {}
    }
}
