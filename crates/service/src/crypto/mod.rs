//! Field-level authenticated encryption primitives.
//!
//! This module is intentionally free of HTTP and storage dependencies.
//!
//! # Ciphertext format
//!
//! ```text
//! 0xBE 0xEF | key_version (1) | nonce (24) | ciphertext+tag
//! ```
//!
//! The version byte enables key rotation without breaking existing
//! ciphertext: new values are sealed under the current key while old values
//! keep decrypting under the version recorded in their envelope.

pub mod cipher;
pub mod envelope;
pub mod record;

pub use cipher::{KeyMap, KeyVersion, KeyedCipher, KEY_LEN};
pub use record::{Encryptable, FieldEncryptor};
