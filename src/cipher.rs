use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::kdf::SymmetricKey;
use crate::spec::EncryptedRecord;
use crate::DecryptionError;

/// Additional authenticated data for a paste: the compact JSON text of the
/// `adata` value as received, base64 fields and all.
pub fn authenticated_data(adata: &Value) -> Result<Vec<u8>, DecryptionError> {
    serde_json::to_vec(adata)
        .map_err(|e| DecryptionError::UnrecognizedFormat(format!("adata not serializable: {e}")))
}

/// Verify the tag and decrypt the record. Plaintext is only returned when
/// the tag checks out.
pub fn decrypt_record(
    key: &SymmetricKey,
    record: &EncryptedRecord,
) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    let aad = authenticated_data(&record.adata)?;
    open(
        key.as_bytes(),
        &record.spec.iv.decoded,
        &aad,
        &record.ciphertext,
        &record.tag,
    )
}

/// AES-GCM verify-and-decrypt with a detached tag. The AES variant follows
/// the key length and the nonce size follows the iv length.
pub fn open(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    match (key.len(), iv.len()) {
        (16, 12) => open_with::<AesGcm<Aes128, U12>>(key, iv, aad, ciphertext, tag),
        (16, 16) => open_with::<AesGcm<Aes128, U16>>(key, iv, aad, ciphertext, tag),
        (24, 12) => open_with::<AesGcm<Aes192, U12>>(key, iv, aad, ciphertext, tag),
        (24, 16) => open_with::<AesGcm<Aes192, U16>>(key, iv, aad, ciphertext, tag),
        (32, 12) => open_with::<AesGcm<Aes256, U12>>(key, iv, aad, ciphertext, tag),
        (32, 16) => open_with::<AesGcm<Aes256, U16>>(key, iv, aad, ciphertext, tag),
        (key_len, iv_len) => Err(DecryptionError::UnsupportedSpec(format!(
            "AES-GCM with {key_len} byte key and {iv_len} byte iv"
        ))),
    }
}

fn open_with<C>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>, DecryptionError>
where
    C: KeyInit + AeadInPlace,
{
    if tag.len() != <C::TagSize as Unsigned>::USIZE {
        return Err(DecryptionError::UnsupportedSpec(format!(
            "tag length {} bytes",
            tag.len()
        )));
    }

    let cipher = C::new_from_slice(key)
        .map_err(|_| DecryptionError::UnsupportedSpec(format!("key length {}", key.len())))?;
    let nonce = GenericArray::from_slice(iv);
    let tag = GenericArray::from_slice(tag);

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(nonce, aad, buffer.as_mut_slice(), tag)
        .map_err(|_| DecryptionError::IntegrityCheckFailed)?;
    Ok(buffer)
}
