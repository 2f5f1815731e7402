//! [`FieldKeys`]: the immutable key and IV material used by the field codec.

use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-CTR initialization vector (one 128-bit block).
pub const IV_LEN: usize = 16;

/// Configuration errors for the key material. Fatal at startup.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The variable was not set or is blank.
    #[error("{0} is required and must not be empty")]
    Missing(&'static str),

    /// The variable is not valid hex.
    #[error("{name} is not valid hex: {source}")]
    InvalidHex {
        name: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    /// The decoded material has the wrong length.
    #[error("{name} has invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Fixed-size key and IV buffers, validated once and never mutated.
///
/// Memory is overwritten with zeroes on drop.
#[derive(Clone)]
pub struct FieldKeys {
    key: Box<[u8; KEY_LEN]>,
    iv: [u8; IV_LEN],
}

impl FieldKeys {
    /// Build from raw bytes.
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self {
            key: Box::new(key),
            iv,
        }
    }

    /// Parse the hex-encoded key and IV as supplied through configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if either value is blank, not hex, or the wrong length.
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, KeyError> {
        let key = decode_fixed::<KEY_LEN>(key_hex, "SECRET_KEY")?;
        let iv = decode_fixed::<IV_LEN>(iv_hex, "IV")?;
        Ok(Self::new(key, iv))
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// The process-wide IV written into every envelope under [`IvPolicy::Fixed`].
    ///
    /// [`IvPolicy::Fixed`]: super::IvPolicy::Fixed
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

fn decode_fixed<const N: usize>(value: &str, name: &'static str) -> Result<[u8; N], KeyError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(KeyError::Missing(name));
    }
    let bytes = hex::decode(value).map_err(|source| KeyError::InvalidHex { name, source })?;
    bytes.try_into().map_err(|b: Vec<u8>| KeyError::InvalidLength {
        name,
        expected: N,
        actual: b.len(),
    })
}

impl Drop for FieldKeys {
    fn drop(&mut self) {
        self.key.iter_mut().for_each(|b| *b = 0);
        self.iv.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for FieldKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldKeys([REDACTED])")
    }
}
