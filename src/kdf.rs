use hmac::Hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::spec::EncryptionSpec;
use crate::DecryptionError;

pub const NORMALIZED_KEY_LEN: usize = 32;

/// Symmetric key derived for a single decryption. Wiped on drop.
pub struct SymmetricKey(Zeroizing<Vec<u8>>);

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.0.len())
    }
}

pub fn decode_key_token(token: &str) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
    bs58::decode(token)
        .into_vec()
        .map(Zeroizing::new)
        .map_err(|_| DecryptionError::InvalidKeyEncoding)
}

/// Left-pad with zero bytes up to 32 bytes, or keep only the first 32.
pub fn normalize_key(raw: &[u8]) -> Zeroizing<[u8; NORMALIZED_KEY_LEN]> {
    let mut normalized = Zeroizing::new([0u8; NORMALIZED_KEY_LEN]);
    if raw.len() >= NORMALIZED_KEY_LEN {
        normalized.copy_from_slice(&raw[..NORMALIZED_KEY_LEN]);
    } else {
        normalized[NORMALIZED_KEY_LEN - raw.len()..].copy_from_slice(raw);
    }
    normalized
}

pub fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    len: usize,
) -> Result<SymmetricKey, DecryptionError> {
    let mut derived = Zeroizing::new(vec![0u8; len]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut derived)
        .map_err(|_| DecryptionError::UnsupportedSpec("key derivation rejected input".into()))?;
    Ok(SymmetricKey(derived))
}

/// Turn the key token from the link fragment into the cipher key described
/// by `spec`.
pub fn derive_key(key_token: &str, spec: &EncryptionSpec) -> Result<SymmetricKey, DecryptionError> {
    let raw = decode_key_token(key_token)?;
    if raw.len() != NORMALIZED_KEY_LEN {
        log::debug!(
            "key token decoded to {} bytes, normalizing to {}",
            raw.len(),
            NORMALIZED_KEY_LEN
        );
    }
    let normalized = normalize_key(&raw);

    pbkdf2_sha256(
        normalized.as_slice(),
        &spec.salt.decoded,
        spec.iterations,
        spec.key_len(),
    )
}
