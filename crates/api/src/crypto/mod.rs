//! AES-256-CTR field encryption for user-generated text.
//!
//! This module is free of HTTP and storage dependencies. Handlers call
//! [`FieldCodec::encrypt`] before every write of post or comment content and
//! [`FieldCodec::decrypt`] after every read.
//!
//! # Ciphertext format
//!
//! ```text
//! {"iv":"<lowercase hex, 16 bytes>","content":"<lowercase hex ciphertext>"}
//! ```
//!
//! The envelope is stored as a plain string in the document store. Values that
//! are not envelopes (records written before encryption was enabled) are passed
//! through unchanged on read.

pub mod codec;
pub mod keys;

pub use codec::{DecryptionError, Envelope, FieldCodec, IvPolicy};
pub use keys::{FieldKeys, KeyError, IV_LEN, KEY_LEN};
