//! Encryption and decryption of individual text fields.
//!
//! **Algorithm:** AES-256 in counter mode with a 128-bit big-endian counter
//! spanning the whole IV, byte-compatible with OpenSSL's `aes-256-ctr`.
//!
//! CTR provides no integrity. Tampering is only detected when it breaks the hex
//! encoding, the IV length, or the UTF-8 validity of the recovered text.
//!
//! Under [`IvPolicy::Fixed`] every envelope reuses the configured IV, so two
//! ciphertexts of equal length XOR to the XOR of their plaintexts. Prefer
//! [`IvPolicy::Random`] for new deployments; both policies decrypt each other's
//! envelopes because the IV always travels inside the envelope.

use std::sync::Arc;

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::keys::{FieldKeys, IV_LEN};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// How the IV written into a new envelope is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IvPolicy {
    /// Use the configured process-wide IV for every envelope.
    #[default]
    Fixed,
    /// Draw a fresh IV from the OS CSPRNG for every envelope.
    Random,
}

/// Errors produced when a value shaped like an envelope cannot be decrypted.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// The envelope `iv` is not valid hex.
    #[error("envelope iv is not valid hex: {0}")]
    IvHex(#[source] hex::FromHexError),

    /// The envelope `iv` decodes to the wrong number of bytes.
    #[error("envelope iv has invalid length: expected {IV_LEN} bytes, got {0}")]
    IvLength(usize),

    /// The envelope `content` is not valid hex.
    #[error("envelope content is not valid hex: {0}")]
    ContentHex(#[source] hex::FromHexError),

    /// The deciphered bytes are not valid UTF-8 (wrong key or altered ciphertext).
    #[error("decrypted content is not valid UTF-8: {0}")]
    Utf8(#[source] std::string::FromUtf8Error),
}

/// The stored form of one encrypted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Lowercase hex of the IV.
    pub iv: String,
    /// Lowercase hex of the ciphertext.
    pub content: String,
}

impl Envelope {
    fn seal(iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Self {
        Self {
            iv: hex::encode(iv),
            content: hex::encode(ciphertext),
        }
    }

    /// Parse `s` only if it is exactly a well-formed envelope: a JSON object with
    /// `iv` and `content` string members and nothing else, `iv` being hex of
    /// [`IV_LEN`] bytes and `content` non-empty hex.
    pub fn parse(s: &str) -> Option<Self> {
        let env: Envelope = serde_json::from_str(s).ok()?;
        let iv_ok = env.iv.len() == IV_LEN * 2 && is_hex(&env.iv);
        let content_ok = !env.content.is_empty() && env.content.len() % 2 == 0 && is_hex(&env.content);
        (iv_ok && content_ok).then_some(env)
    }

    /// Canonical stored representation: `{"iv":"…","content":"…"}`.
    pub fn to_json(&self) -> String {
        // Both members are hex, which needs no JSON escaping.
        format!(r#"{{"iv":"{}","content":"{}"}}"#, self.iv, self.content)
    }
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encrypts and decrypts text fields with immutable, injected key material.
///
/// Cheap to clone; the keys are shared behind an `Arc` and never mutated.
#[derive(Clone, Debug)]
pub struct FieldCodec {
    keys: Arc<FieldKeys>,
    iv_policy: IvPolicy,
}

impl FieldCodec {
    pub fn new(keys: FieldKeys, iv_policy: IvPolicy) -> Self {
        Self {
            keys: Arc::new(keys),
            iv_policy,
        }
    }

    pub fn iv_policy(&self) -> IvPolicy {
        self.iv_policy
    }

    /// Encrypt `plaintext` into its envelope string.
    ///
    /// Empty input and input that already is an envelope are returned unchanged,
    /// so encrypting twice never double-wraps.
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() || Envelope::parse(plaintext).is_some() {
            return plaintext.to_owned();
        }

        let iv = match self.iv_policy {
            IvPolicy::Fixed => *self.keys.iv(),
            IvPolicy::Random => {
                let mut iv = [0u8; IV_LEN];
                OsRng.fill_bytes(&mut iv);
                iv
            }
        };

        let mut buf = plaintext.as_bytes().to_vec();
        self.apply_keystream(&iv, &mut buf);
        debug!(bytes = buf.len(), policy = ?self.iv_policy, "field encrypted");
        Envelope::seal(&iv, &buf).to_json()
    }

    /// [`encrypt`](Self::encrypt) for a field that may be absent.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Option<String> {
        plaintext.map(|p| self.encrypt(p))
    }

    /// Decrypt a stored value back to plaintext.
    ///
    /// Values that are not JSON, or JSON without non-empty `iv` and `content`
    /// strings, are legacy plaintext and are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] if the value has both members but their hex,
    /// the IV length, or the UTF-8 of the deciphered bytes is invalid.
    pub fn decrypt(&self, stored: &str) -> Result<String, DecryptionError> {
        let Some((iv_hex, content_hex)) = envelope_members(stored) else {
            return Ok(stored.to_owned());
        };

        let iv: [u8; IV_LEN] = hex::decode(&iv_hex)
            .map_err(DecryptionError::IvHex)?
            .try_into()
            .map_err(|b: Vec<u8>| DecryptionError::IvLength(b.len()))?;
        let mut buf = hex::decode(&content_hex).map_err(DecryptionError::ContentHex)?;

        self.apply_keystream(&iv, &mut buf);
        String::from_utf8(buf).map_err(DecryptionError::Utf8)
    }

    /// [`decrypt`](Self::decrypt) for a field that may be absent.
    pub fn decrypt_opt(&self, stored: Option<&str>) -> Result<Option<String>, DecryptionError> {
        stored.map(|s| self.decrypt(s)).transpose()
    }

    /// Decrypt a batch of independent values, failing on the first error.
    pub fn decrypt_many<'a, I>(&self, stored: I) -> Result<Vec<String>, DecryptionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        stored.into_iter().map(|s| self.decrypt(s)).collect()
    }

    fn apply_keystream(&self, iv: &[u8; IV_LEN], buf: &mut [u8]) {
        let mut cipher = Aes256Ctr::new(self.keys.key().into(), iv.into());
        cipher.apply_keystream(buf);
    }
}

/// Extract the `iv` and `content` members if `stored` is a JSON object carrying
/// both as non-empty strings.
fn envelope_members(stored: &str) -> Option<(String, String)> {
    let value: serde_json::Value = match serde_json::from_str(stored) {
        Ok(v) => v,
        Err(_) => {
            debug!("stored field is not JSON; passing through");
            return None;
        }
    };

    let member = |name: &str| {
        value
            .get(name)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    match (member("iv"), member("content")) {
        (Some(iv), Some(content)) => Some((iv, content)),
        _ => {
            debug!("stored field lacks iv or content; passing through");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KEY_LEN;

    const ZERO_IV_HEX: &str = "00000000000000000000000000000000";

    fn zero_codec() -> FieldCodec {
        FieldCodec::new(FieldKeys::new([0u8; KEY_LEN], [0u8; IV_LEN]), IvPolicy::Fixed)
    }

    fn codec_with(key: u8, policy: IvPolicy) -> FieldCodec {
        FieldCodec::new(FieldKeys::new([key; KEY_LEN], [0x5Au8; IV_LEN]), policy)
    }

    #[test]
    fn known_vector_with_zero_key_and_iv() {
        let codec = zero_codec();
        let stored = codec.encrypt("hello");
        assert_eq!(
            stored,
            format!(r#"{{"iv":"{ZERO_IV_HEX}","content":"b4f0ac14cd"}}"#)
        );
        assert_eq!(codec.decrypt(&stored).unwrap(), "hello");
    }

    #[test]
    fn envelope_is_json_with_exactly_two_keys() {
        let stored = codec_with(7, IvPolicy::Fixed).encrypt("some post body");
        let v: serde_json::Value = serde_json::from_str(&stored).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["iv"].as_str().unwrap(), hex::encode([0x5Au8; IV_LEN]));
        assert!(obj["content"].as_str().unwrap().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn round_trip_preserves_text() {
        let codec = codec_with(1, IvPolicy::Fixed);
        for text in ["a", "hello world", "ünïcødé 🎉", "{\"iv\": broken", "{\"foo\":\"bar\"}"] {
            assert_eq!(codec.decrypt(&codec.encrypt(text)).unwrap(), text);
        }
    }

    #[test]
    fn encrypt_is_idempotent() {
        let codec = codec_with(2, IvPolicy::Fixed);
        let once = codec.encrypt("idempotent");
        assert_eq!(codec.encrypt(&once), once);
    }

    #[test]
    fn encrypt_is_idempotent_under_random_iv() {
        let codec = codec_with(2, IvPolicy::Random);
        let once = codec.encrypt("idempotent");
        assert_eq!(codec.encrypt(&once), once);
    }

    #[test]
    fn plaintext_resembling_envelope_prefix_is_encrypted() {
        let codec = codec_with(3, IvPolicy::Fixed);
        let sneaky = r#"{"iv": "this is just a comment"}"#;
        let stored = codec.encrypt(sneaky);
        assert_ne!(stored, sneaky);
        assert_eq!(codec.decrypt(&stored).unwrap(), sneaky);
    }

    #[test]
    fn envelope_with_extra_keys_is_not_treated_as_encrypted() {
        let codec = codec_with(3, IvPolicy::Fixed);
        let input = format!(r#"{{"iv":"{ZERO_IV_HEX}","content":"00","extra":1}}"#);
        assert!(Envelope::parse(&input).is_none());
        assert_ne!(codec.encrypt(&input), input);
    }

    #[test]
    fn empty_and_absent_pass_through() {
        let codec = zero_codec();
        assert_eq!(codec.encrypt(""), "");
        assert_eq!(codec.encrypt_opt(None), None);
        assert_eq!(codec.decrypt("").unwrap(), "");
        assert_eq!(codec.decrypt_opt(None).unwrap(), None);
    }

    #[test]
    fn legacy_plaintext_passes_through() {
        assert_eq!(zero_codec().decrypt("hello world").unwrap(), "hello world");
    }

    #[test]
    fn json_without_envelope_members_passes_through() {
        let codec = zero_codec();
        for input in [r#"{"foo":"bar"}"#, r#"{"iv":"00"}"#, r#"{"iv":"","content":"ab"}"#, "42", "[1,2]"] {
            assert_eq!(codec.decrypt(input).unwrap(), input);
        }
    }

    #[test]
    fn non_hex_content_is_a_decryption_error() {
        let codec = zero_codec();
        let stored = codec.encrypt("hello");
        let tampered = stored.replace("b4f0ac14cd", "b4f0ac14cz");
        assert!(matches!(
            codec.decrypt(&tampered),
            Err(DecryptionError::ContentHex(_))
        ));
    }

    #[test]
    fn tampering_into_invalid_utf8_is_a_decryption_error() {
        let codec = zero_codec();
        // Flips the high bit of the first plaintext byte: 'h' (0x68) becomes 0xE8,
        // a three-byte UTF-8 lead followed by ASCII.
        let tampered = format!(r#"{{"iv":"{ZERO_IV_HEX}","content":"34f0ac14cd"}}"#);
        assert!(matches!(codec.decrypt(&tampered), Err(DecryptionError::Utf8(_))));
    }

    #[test]
    fn wrong_iv_length_is_a_decryption_error() {
        let tampered = r#"{"iv":"0000","content":"b4f0ac14cd"}"#;
        assert!(matches!(
            zero_codec().decrypt(tampered),
            Err(DecryptionError::IvLength(2))
        ));
    }

    #[test]
    fn decrypt_uses_iv_from_envelope() {
        let fixed = codec_with(9, IvPolicy::Fixed);
        let random = codec_with(9, IvPolicy::Random);
        let a = random.encrypt("same text");
        let b = random.encrypt("same text");
        assert_ne!(a, b, "random policy should vary the IV");
        assert_eq!(fixed.decrypt(&a).unwrap(), "same text");
        assert_eq!(fixed.decrypt(&b).unwrap(), "same text");
    }

    #[test]
    fn fixed_policy_is_deterministic() {
        let codec = codec_with(4, IvPolicy::Fixed);
        assert_eq!(codec.encrypt("same"), codec.encrypt("same"));
    }

    #[test]
    fn decrypt_many_collects_in_order() {
        let codec = codec_with(5, IvPolicy::Fixed);
        let stored = [codec.encrypt("one"), "legacy".to_owned(), codec.encrypt("three")];
        let plain = codec.decrypt_many(stored.iter().map(String::as_str)).unwrap();
        assert_eq!(plain, ["one", "legacy", "three"]);
    }

    #[test]
    fn decrypt_many_fails_on_first_bad_value() {
        let codec = zero_codec();
        let bad = format!(r#"{{"iv":"{ZERO_IV_HEX}","content":"xx"}}"#);
        assert!(codec.decrypt_many(["fine", bad.as_str()]).is_err());
    }

    #[test]
    fn iv_policy_deserialises_lowercase() {
        let p: IvPolicy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(p, IvPolicy::Random);
        assert_eq!(IvPolicy::default(), IvPolicy::Fixed);
    }
}
