//! Declarative encryption and decryption of marked record fields.
//!
//! A record type opts in by implementing [`Encryptable`], which hands out
//! mutable byte-string views of every field marked for encryption. The
//! [`encrypted_fields!`] macro generates that impl from a plain field list, so
//! marking a field reads like metadata:
//!
//! ```ignore
//! struct Account {
//!     id: i64,
//!     name: Vec<u8>,
//!     email: Vec<u8>,
//! }
//!
//! encrypted_fields!(Account { name, email });
//! ```
//!
//! Listing a field that is not a byte string fails to compile, so field-type
//! mistakes never reach runtime.

use std::sync::Arc;

use thiserror::Error;

use super::cipher::{CipherError, KeyedCipher};

/// Errors produced by record-level operations.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The record declares no encryptable fields.
    #[error("record declares no encryptable fields")]
    NoEncryptedFields,

    /// A per-field cipher operation failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Implemented by record types whose byte-string fields are marked for
/// encryption.
///
/// Usually generated with [`encrypted_fields!`] rather than written by hand.
pub trait Encryptable {
    /// Mutable views of every marked field, in declaration order.
    fn encrypted_fields(&mut self) -> Vec<&mut Vec<u8>>;
}

/// Marks the listed byte-string fields of a record type as encrypted.
///
/// Expands to an [`Encryptable`] impl returning the fields in the order
/// given.
#[macro_export]
macro_rules! encrypted_fields {
    ($record:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::crypto::record::Encryptable for $record {
            fn encrypted_fields(&mut self) -> ::std::vec::Vec<&mut ::std::vec::Vec<u8>> {
                ::std::vec![$(&mut self.$field),+]
            }
        }
    };
}

/// Applies a [`KeyedCipher`] to every marked field of a record, in place.
///
/// Each field is sealed with its own fresh nonce; no nonce is ever shared
/// across fields. A per-field failure aborts the walk, so fields already
/// visited may remain transformed — callers that need atomicity snapshot the
/// record first and restore on error.
#[derive(Clone)]
pub struct FieldEncryptor {
    cipher: Arc<KeyedCipher>,
}

impl FieldEncryptor {
    /// Wrap a shared [`KeyedCipher`].
    pub fn new(cipher: Arc<KeyedCipher>) -> Self {
        Self { cipher }
    }

    /// Encrypt every marked field of `record` in place.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NoEncryptedFields`] if the record declares no
    /// marked fields, and propagates the first per-field [`CipherError`] —
    /// including [`CipherError::AlreadyEncrypted`] when a field already holds
    /// an envelope.
    pub fn encrypt_record<R: Encryptable>(&self, record: &mut R) -> Result<(), FieldError> {
        self.apply(record, KeyedCipher::encrypt)
    }

    /// Decrypt every marked field of `record` in place.
    pub fn decrypt_record<R: Encryptable>(&self, record: &mut R) -> Result<(), FieldError> {
        self.apply(record, KeyedCipher::decrypt)
    }

    /// Re-seal every marked field of `record` under the current key version.
    pub fn reencrypt_record<R: Encryptable>(&self, record: &mut R) -> Result<(), FieldError> {
        self.apply(record, KeyedCipher::reencrypt)
    }

    fn apply<R: Encryptable>(
        &self,
        record: &mut R,
        op: fn(&KeyedCipher, &[u8]) -> Result<Vec<u8>, CipherError>,
    ) -> Result<(), FieldError> {
        let fields = record.encrypted_fields();
        if fields.is_empty() {
            return Err(FieldError::NoEncryptedFields);
        }

        for field in fields {
            *field = op(&self.cipher, field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::{KeyMap, KEY_LEN};
    use crate::crypto::envelope::{self, Envelope};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Account {
        unaffected: String,
        value1: Vec<u8>,
        value2: Vec<u8>,
    }

    encrypted_fields!(Account { value1, value2 });

    struct Bare;

    impl Encryptable for Bare {
        fn encrypted_fields(&mut self) -> Vec<&mut Vec<u8>> {
            Vec::new()
        }
    }

    fn encryptor_with_versions(current: u8) -> FieldEncryptor {
        let keys = KeyMap::from([(1, vec![0x11u8; KEY_LEN]), (2, vec![0x22u8; KEY_LEN])]);
        FieldEncryptor::new(Arc::new(KeyedCipher::new(current, &keys).unwrap()))
    }

    fn sample_account() -> Account {
        Account {
            unaffected: "u".into(),
            value1: b"a".to_vec(),
            value2: b"b".to_vec(),
        }
    }

    #[test]
    fn encrypt_record_walks_marked_fields_only() {
        let encryptor = encryptor_with_versions(1);
        let mut account = sample_account();
        encryptor.encrypt_record(&mut account).unwrap();

        assert_eq!(account.unaffected, "u");
        assert!(envelope::is_encrypted(&account.value1));
        assert!(envelope::is_encrypted(&account.value2));
    }

    #[test]
    fn fields_get_distinct_nonces() {
        let encryptor = encryptor_with_versions(1);
        let mut account = sample_account();
        account.value2 = account.value1.clone();
        encryptor.encrypt_record(&mut account).unwrap();

        let n1 = Envelope::parse(&account.value1).unwrap().nonce().to_vec();
        let n2 = Envelope::parse(&account.value2).unwrap().nonce().to_vec();
        assert_ne!(n1, n2);
    }

    #[test]
    fn decrypt_record_restores_original() {
        let encryptor = encryptor_with_versions(1);
        let original = sample_account();
        let mut account = original.clone();

        encryptor.encrypt_record(&mut account).unwrap();
        encryptor.decrypt_record(&mut account).unwrap();
        assert_eq!(account, original);
    }

    #[test]
    fn double_encrypt_rejected() {
        let encryptor = encryptor_with_versions(1);
        let mut account = sample_account();
        encryptor.encrypt_record(&mut account).unwrap();

        let err = encryptor.encrypt_record(&mut account).unwrap_err();
        assert!(matches!(
            err,
            FieldError::Cipher(CipherError::AlreadyEncrypted)
        ));
    }

    #[test]
    fn record_without_marked_fields_rejected() {
        let encryptor = encryptor_with_versions(1);
        let err = encryptor.encrypt_record(&mut Bare).unwrap_err();
        assert!(matches!(err, FieldError::NoEncryptedFields));
    }

    #[test]
    fn reencrypt_record_bumps_key_version() {
        let mut account = sample_account();
        encryptor_with_versions(1).encrypt_record(&mut account).unwrap();
        assert_eq!(Envelope::parse(&account.value1).unwrap().key_version(), 1);

        let rotated = encryptor_with_versions(2);
        rotated.reencrypt_record(&mut account).unwrap();
        assert_eq!(Envelope::parse(&account.value1).unwrap().key_version(), 2);
        assert_eq!(Envelope::parse(&account.value2).unwrap().key_version(), 2);

        rotated.decrypt_record(&mut account).unwrap();
        assert_eq!(account, sample_account());
    }
}
