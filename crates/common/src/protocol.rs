//! Request and response types for the public HTTP API.
//!
//! All types are serialised as JSON. Protected record fields travel as UTF-8
//! strings on the wire; they only become ciphertext inside the store.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Record endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /records` and `PUT /records/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Record holder's name. Encrypted at rest.
    pub name: String,
    /// Record holder's email address. Encrypted at rest.
    pub email: String,
}

/// A record as returned by the API, fields decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordBody {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Rotation sweep
// ---------------------------------------------------------------------------

/// Response body for `POST /rotate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateResponse {
    /// Number of records re-sealed under the current key version.
    pub reencrypted: usize,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
    /// Key version new ciphertexts are sealed under.
    pub current_key_version: u8,
    /// Number of key versions available for decryption.
    pub key_versions: usize,
    /// Number of records currently stored.
    pub records_stored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_payload_round_trip() {
        let payload = RecordPayload {
            name: "Alice".into(),
            email: "alice@example.com".into(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let decoded: RecordPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.name, "Alice");
        assert_eq!(decoded.email, "alice@example.com");
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("not_found", "no record with id 7");
        assert_eq!(e.code, "not_found");
        assert!(e.message.contains("id 7"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            current_key_version: 2,
            key_versions: 2,
            records_stored: 5,
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.current_key_version, 2);
        assert_eq!(decoded.records_stored, 5);
    }
}
