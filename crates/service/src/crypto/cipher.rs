//! Versioned XChaCha20-Poly1305 encryption and decryption of field values.
//!
//! [`KeyedCipher`] holds one AEAD instance per key version plus a designated
//! current version. Encryption always seals under the current version;
//! decryption dispatches on the version byte embedded in the envelope, so
//! ciphertexts produced under older keys keep decrypting for as long as their
//! version stays in the catalog.
//!
//! **Nonces are random and per-call.** A fresh 24-byte nonce is drawn from the
//! OS CSPRNG for every encryption. Reusing a nonce under the same key breaks
//! both confidentiality and authentication for this AEAD.

use std::collections::HashMap;

use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    XChaCha20Poly1305, XNonce,
};
use thiserror::Error;

use super::envelope::{self, Envelope, EnvelopeError, NONCE_LEN};

/// Byte length of an XChaCha20-Poly1305 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// One-byte identifier selecting a key in the catalog.
pub type KeyVersion = u8;

/// Operator-managed key catalog: version to 32-byte key material.
pub type KeyMap = HashMap<KeyVersion, Vec<u8>>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The designated current version has no entry in the key map.
    #[error("no key provided for current version {0}")]
    CurrentKeyMissing(KeyVersion),

    /// A key in the map is not [`KEY_LEN`] bytes.
    #[error("invalid key length for version {version}: expected {KEY_LEN} bytes, got {len}")]
    InvalidKeyLength { version: KeyVersion, len: usize },

    /// The OS random source failed while drawing a nonce.
    #[error("failed to generate nonce")]
    NonceGeneration,

    /// The plaintext already parses as an envelope.
    #[error("value is already encrypted")]
    AlreadyEncrypted,

    /// The AEAD seal operation failed (unreachable with a valid key and nonce).
    #[error("aead operation failed")]
    AeadFailure,

    /// The envelope names a key version with no entry in the catalog.
    #[error("unknown key version {0} during decryption")]
    UnknownKeyVersion(KeyVersion),

    /// The AEAD rejected the ciphertext: tag mismatch or corruption.
    #[error("failed to decrypt or authenticate value")]
    AuthenticationFailed,

    /// The input is not a well-formed envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Authenticated encryption with version-selectable keys.
///
/// Immutable after construction and safe to share across threads; the AEAD
/// instances are read-only at use time and no internal locking is performed.
pub struct KeyedCipher {
    aeads: HashMap<KeyVersion, XChaCha20Poly1305>,
    current: KeyVersion,
}

impl std::fmt::Debug for KeyedCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedCipher")
            .field("versions", &self.aeads.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .finish()
    }
}

impl KeyedCipher {
    /// Build a cipher from a key catalog and the version to seal new values
    /// under.
    ///
    /// Every key is eagerly turned into an AEAD instance; the raw key material
    /// is not retained beyond what those instances hold.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::CurrentKeyMissing`] if `current` has no entry in
    /// `keys`, and [`CipherError::InvalidKeyLength`] if any key is not
    /// [`KEY_LEN`] bytes.
    pub fn new(current: KeyVersion, keys: &KeyMap) -> Result<Self, CipherError> {
        if !keys.contains_key(&current) {
            return Err(CipherError::CurrentKeyMissing(current));
        }

        let mut aeads = HashMap::with_capacity(keys.len());
        for (&version, key) in keys {
            let aead = XChaCha20Poly1305::new_from_slice(key).map_err(|_| {
                CipherError::InvalidKeyLength {
                    version,
                    len: key.len(),
                }
            })?;
            aeads.insert(version, aead);
        }

        Ok(Self { aeads, current })
    }

    /// The version new ciphertexts are sealed under.
    pub fn current_version(&self) -> KeyVersion {
        self.current
    }

    /// Number of key versions in the catalog.
    pub fn key_versions(&self) -> usize {
        self.aeads.len()
    }

    /// Seal `plaintext` under the current key version, returning envelope
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::AlreadyEncrypted`] if `plaintext` itself parses
    /// as an envelope, and [`CipherError::NonceGeneration`] if the OS random
    /// source fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if envelope::is_encrypted(plaintext) {
            return Err(CipherError::AlreadyEncrypted);
        }

        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| CipherError::NonceGeneration)?;

        let aead = self
            .aeads
            .get(&self.current)
            .ok_or(CipherError::CurrentKeyMissing(self.current))?;
        let ciphertext = aead
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| CipherError::AeadFailure)?;

        Ok(envelope::build(self.current, &nonce, &ciphertext))
    }

    /// Open envelope bytes, dispatching on the embedded key version.
    ///
    /// # Errors
    ///
    /// Propagates [`EnvelopeError`] from parsing; returns
    /// [`CipherError::UnknownKeyVersion`] if the embedded version is not in
    /// the catalog, and [`CipherError::AuthenticationFailed`] on tag mismatch
    /// or ciphertext corruption.
    pub fn decrypt(&self, bytes: &[u8]) -> Result<Vec<u8>, CipherError> {
        let env = Envelope::parse(bytes)?;

        let aead = self
            .aeads
            .get(&env.key_version())
            .ok_or_else(|| CipherError::UnknownKeyVersion(env.key_version()))?;

        aead.decrypt(XNonce::from_slice(env.nonce()), env.ciphertext())
            .map_err(|_| CipherError::AuthenticationFailed)
    }

    /// Re-seal an envelope under the current key version.
    ///
    /// The recovered plaintext never leaves this call; useful for rotation
    /// sweeps over stored ciphertexts.
    pub fn reencrypt(&self, bytes: &[u8]) -> Result<Vec<u8>, CipherError> {
        let plaintext = self.decrypt(bytes)?;
        self.encrypt(&plaintext)
    }
}
