//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::crypto::KeyedCipher;
use crate::store::RecordStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe store of encrypted records.
    pub store: RecordStore,
    /// The versioned cipher; consulted by the health endpoint for key facts.
    pub cipher: Arc<KeyedCipher>,
}

impl AppState {
    /// Create a new [`AppState`] from the store and cipher built at startup.
    pub fn new(store: RecordStore, cipher: Arc<KeyedCipher>) -> Self {
        Self { store, cipher }
    }
}
