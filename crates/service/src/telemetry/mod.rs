//! Structured logging setup for the service.
//!
//! # Telemetry invariants
//!
//! - **No key material or protected field values** must appear in any span
//!   attribute or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init_telemetry;
