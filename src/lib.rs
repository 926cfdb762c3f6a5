//! Caller-facing bridge over the [`media_gallery`] library.
//!
//! Hosts (a platform shell, a test harness) hand each incoming call to
//! [`handle`] as an operation name plus a flat JSON argument record and get
//! back either a JSON payload or a structured (code, message) failure. One
//! call maps to one awaited task; a [`media_gallery::CancellationToken`]
//! abandons it.

pub mod bridge;
pub mod error;

pub use bridge::handle;
pub use error::{BridgeError, ErrorCode};

/// Initialize logging for bridge hosts. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
