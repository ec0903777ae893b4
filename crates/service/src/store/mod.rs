//! In-memory record store with transparent field encryption.
//!
//! The store owns a [`FieldEncryptor`] and applies it at the storage
//! boundary: marked fields are encrypted before a row is written and
//! decrypted after a row is read, so rows at rest always hold envelopes and
//! callers only ever see plaintext.
//!
//! Wraps an `Arc<RwLock<_>>` so that many concurrent readers (request
//! handlers) can fetch rows simultaneously while writers get exclusive
//! access for inserts, updates, and rotation sweeps.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::crypto::record::FieldError;
use crate::crypto::FieldEncryptor;

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row exists for the requested id.
    #[error("no record with id {0}")]
    NotFound(i64),

    /// A field-level encrypt or decrypt failed.
    #[error(transparent)]
    Crypto(#[from] FieldError),
}

/// A stored record. `name` and `email` are encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub name: Vec<u8>,
    pub email: Vec<u8>,
}

crate::encrypted_fields!(Record { name, email });

struct Rows {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// Thread-safe record store keyed by id.
#[derive(Clone)]
pub struct RecordStore {
    encryptor: FieldEncryptor,
    inner: Arc<RwLock<Rows>>,
}

impl RecordStore {
    /// Create an empty store that encrypts rows with `encryptor`.
    pub fn new(encryptor: FieldEncryptor) -> Self {
        Self {
            encryptor,
            inner: Arc::new(RwLock::new(Rows {
                next_id: 1,
                rows: BTreeMap::new(),
            })),
        }
    }

    /// Number of rows currently stored.
    pub async fn count(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    /// Insert a new record, assigning the next id.
    ///
    /// The record is encrypted in place before the row is written; the
    /// returned record has been decrypted again and carries the assigned id.
    pub async fn create(&self, mut record: Record) -> Result<Record, StoreError> {
        self.encryptor.encrypt_record(&mut record)?;

        {
            let mut guard = self.inner.write().await;
            record.id = guard.next_id;
            guard.next_id += 1;
            guard.rows.insert(record.id, record.clone());
        }

        self.encryptor.decrypt_record(&mut record)?;
        Ok(record)
    }

    /// Fetch one record by id, decrypted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row exists for `id`.
    pub async fn get(&self, id: i64) -> Result<Record, StoreError> {
        let mut record = {
            let guard = self.inner.read().await;
            guard.rows.get(&id).cloned().ok_or(StoreError::NotFound(id))?
        };
        self.encryptor.decrypt_record(&mut record)?;
        Ok(record)
    }

    /// Fetch a page of records in id order, decrypted.
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Record>, StoreError> {
        let mut page: Vec<Record> = {
            let guard = self.inner.read().await;
            guard.rows.values().skip(offset).take(limit).cloned().collect()
        };
        for record in &mut page {
            self.encryptor.decrypt_record(record)?;
        }
        Ok(page)
    }

    /// Replace the row for `record.id` with freshly encrypted field values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row exists for `record.id`.
    pub async fn update(&self, mut record: Record) -> Result<Record, StoreError> {
        self.encryptor.encrypt_record(&mut record)?;

        {
            let mut guard = self.inner.write().await;
            if !guard.rows.contains_key(&record.id) {
                return Err(StoreError::NotFound(record.id));
            }
            guard.rows.insert(record.id, record.clone());
        }

        self.encryptor.decrypt_record(&mut record)?;
        Ok(record)
    }

    /// Remove the row for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row exists for `id`.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    /// Rotation sweep: re-seal every stored row's fields under the current
    /// key version, holding the write lock for the duration so no reader
    /// observes a half-rotated row.
    ///
    /// Returns the number of rows re-sealed.
    pub async fn reencrypt_all(&self) -> Result<usize, StoreError> {
        let mut guard = self.inner.write().await;
        let mut count = 0;
        for record in guard.rows.values_mut() {
            self.encryptor.reencrypt_record(record)?;
            count += 1;
        }
        Ok(count)
    }
}
