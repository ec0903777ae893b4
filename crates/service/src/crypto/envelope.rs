//! Self-describing binary container for one ciphertext value.
//!
//! An envelope is comprised of four parts:
//!
//! ```text
//!   magic bytes  version           nonce                  ciphertext+tag
//! |-------------|-------|-------------------------|---------------------------|
//!       2           1              24                       variable
//! ```
//!
//! The magic prefix is the sole in-band signal distinguishing encrypted bytes
//! from plaintext. It is a coarse classifier only; the AEAD tag inside the
//! ciphertext is the real authenticator.

use thiserror::Error;

/// Two-byte marker at the start of every envelope.
pub const MAGIC: [u8; 2] = [0xBE, 0xEF];

/// Byte length of an XChaCha20-Poly1305 nonce (24 bytes = 192 bits).
pub const NONCE_LEN: usize = 24;

/// Offset of the key-version byte.
const VERSION_INDEX: usize = MAGIC.len();

/// Offset of the first nonce byte.
const NONCE_START: usize = VERSION_INDEX + 1;

/// Offset of the first ciphertext byte; also the minimum parseable length.
pub const HEADER_LEN: usize = NONCE_START + NONCE_LEN;

/// Errors produced when parsing envelope bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The input is shorter than the fixed envelope header.
    #[error("envelope truncated: {0} bytes is shorter than the {HEADER_LEN}-byte header")]
    TooShort(usize),

    /// The input does not begin with the magic prefix.
    #[error("value does not begin with the envelope magic prefix")]
    NotEncrypted,
}

/// A validated, borrowed view over envelope bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    bytes: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Validate `bytes` as an envelope and return an accessor view over it.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::TooShort`] if `bytes` cannot hold the fixed
    /// header, and [`EnvelopeError::NotEncrypted`] if the magic prefix is
    /// absent.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() < HEADER_LEN {
            return Err(EnvelopeError::TooShort(bytes.len()));
        }
        if bytes[..MAGIC.len()] != MAGIC {
            return Err(EnvelopeError::NotEncrypted);
        }
        Ok(Self { bytes })
    }

    /// The version of the key that sealed this envelope.
    pub fn key_version(&self) -> u8 {
        self.bytes[VERSION_INDEX]
    }

    /// The 24-byte nonce the ciphertext was sealed with.
    pub fn nonce(&self) -> &'a [u8] {
        &self.bytes[NONCE_START..HEADER_LEN]
    }

    /// The ciphertext body, including the trailing 16-byte AEAD tag.
    pub fn ciphertext(&self) -> &'a [u8] {
        &self.bytes[HEADER_LEN..]
    }
}

/// Assemble envelope bytes from their constituent parts.
///
/// The result is exactly `HEADER_LEN + ciphertext.len()` bytes.
pub fn build(version: u8, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(&MAGIC);
    out.push(version);
    out.extend_from_slice(nonce);
    out.extend_from_slice(ciphertext);
    out
}

/// True iff `bytes` holds at least a full header and begins with the magic
/// prefix.
///
/// The length guard is required so that a short buffer is never classified as
/// encrypted and handed to the accessors.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && bytes[..MAGIC.len()] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_round_trip() {
        let nonce = [7u8; NONCE_LEN];
        let bytes = build(3, &nonce, b"ciphertext");
        assert_eq!(bytes.len(), HEADER_LEN + 10);

        let env = Envelope::parse(&bytes).unwrap();
        assert_eq!(env.key_version(), 3);
        assert_eq!(env.nonce(), &nonce);
        assert_eq!(env.ciphertext(), b"ciphertext");
    }

    #[test]
    fn build_with_empty_ciphertext() {
        let bytes = build(1, &[0u8; NONCE_LEN], b"");
        assert_eq!(bytes.len(), HEADER_LEN);
        let env = Envelope::parse(&bytes).unwrap();
        assert!(env.ciphertext().is_empty());
    }

    #[test]
    fn parse_rejects_short_input() {
        let bytes = build(1, &[0u8; NONCE_LEN], b"");
        let err = Envelope::parse(&bytes[..HEADER_LEN - 1]).unwrap_err();
        assert_eq!(err, EnvelopeError::TooShort(HEADER_LEN - 1));
    }

    #[test]
    fn parse_rejects_missing_magic() {
        let mut bytes = build(1, &[0u8; NONCE_LEN], b"payload");
        bytes[0] = 0x00;
        assert_eq!(Envelope::parse(&bytes).unwrap_err(), EnvelopeError::NotEncrypted);
    }

    #[test]
    fn is_encrypted_requires_full_header() {
        // Magic prefix alone is not enough; the buffer must hold a full header.
        let mut short = vec![0u8; HEADER_LEN - 1];
        short[0] = MAGIC[0];
        short[1] = MAGIC[1];
        assert!(!is_encrypted(&short));

        let exact = build(1, &[0u8; NONCE_LEN], b"");
        assert!(is_encrypted(&exact));
    }

    #[test]
    fn is_encrypted_requires_magic() {
        assert!(!is_encrypted(&[0u8; HEADER_LEN + 4]));
        assert!(!is_encrypted(b"plaintext that is comfortably longer than the header"));
    }
}
