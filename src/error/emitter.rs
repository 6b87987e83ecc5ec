// Emitter error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::error;
use std::fmt;

/// Emitter error code constants exposed to Dart via FFI
///
/// Error code range: 3001-3006
#[frb(unignore)]
pub struct EmitterErrorCodes {}

#[frb]
impl EmitterErrorCodes {
    /// Listener went away before the session ended
    pub const SINK_CLOSED: i32 = 3001;

    /// Mutex guarding emitter or channel state was poisoned
    pub const LOCK_POISONED: i32 = 3002;

    /// Channel has no stream handler registered
    pub const NO_STREAM_HANDLER: i32 = 3003;

    /// Host was not created (or already destroyed)
    pub const HOST_NOT_CREATED: i32 = 3004;

    /// Tokio runtime could not be created or found
    pub const RUNTIME_UNAVAILABLE: i32 = 3005;

    /// Listen/cancel arguments could not be interpreted
    pub const INVALID_ARGUMENTS: i32 = 3006;

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn sink_closed() -> i32 {
        Self::SINK_CLOSED
    }

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn lock_poisoned() -> i32 {
        Self::LOCK_POISONED
    }

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn no_stream_handler() -> i32 {
        Self::NO_STREAM_HANDLER
    }

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn host_not_created() -> i32 {
        Self::HOST_NOT_CREATED
    }

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn runtime_unavailable() -> i32 {
        Self::RUNTIME_UNAVAILABLE
    }

    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn invalid_arguments() -> i32 {
        Self::INVALID_ARGUMENTS
    }
}

/// Log an emitter error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_emitter_error(err: &EmitterError, context: &str) {
    error!(
        "Emitter error in {}: code={}, component=ProgressEmitter, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the emitter, its sinks, the event channel and the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitterError {
    /// The receiving side of a sink was dropped
    SinkClosed,

    /// Mutex was poisoned by a panicking holder
    LockPoisoned { component: String },

    /// `listen`/`cancel` called on a channel with no handler
    NoStreamHandler { channel: String },

    /// Api call made before `create_host` or after `destroy_host`
    HostNotCreated,

    /// Runtime could not be built or no runtime is current
    RuntimeUnavailable { details: String },

    /// Arguments passed through the channel were malformed
    InvalidArguments { reason: String },
}

impl ErrorCode for EmitterError {
    fn code(&self) -> i32 {
        match self {
            EmitterError::SinkClosed => EmitterErrorCodes::SINK_CLOSED,
            EmitterError::LockPoisoned { .. } => EmitterErrorCodes::LOCK_POISONED,
            EmitterError::NoStreamHandler { .. } => EmitterErrorCodes::NO_STREAM_HANDLER,
            EmitterError::HostNotCreated => EmitterErrorCodes::HOST_NOT_CREATED,
            EmitterError::RuntimeUnavailable { .. } => EmitterErrorCodes::RUNTIME_UNAVAILABLE,
            EmitterError::InvalidArguments { .. } => EmitterErrorCodes::INVALID_ARGUMENTS,
        }
    }

    fn message(&self) -> String {
        match self {
            EmitterError::SinkClosed => "Progress listener is closed".to_string(),
            EmitterError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            EmitterError::NoStreamHandler { channel } => {
                format!("No stream handler registered on channel {}", channel)
            }
            EmitterError::HostNotCreated => {
                "Emitter host not created. Call create_host() first.".to_string()
            }
            EmitterError::RuntimeUnavailable { details } => {
                format!("Tokio runtime unavailable: {}", details)
            }
            EmitterError::InvalidArguments { reason } => {
                format!("Invalid channel arguments: {}", reason)
            }
        }
    }
}

impl fmt::Display for EmitterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EmitterError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EmitterError {}

impl From<std::io::Error> for EmitterError {
    fn from(err: std::io::Error) -> Self {
        EmitterError::RuntimeUnavailable {
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EmitterError {
    fn from(err: serde_json::Error) -> Self {
        EmitterError::InvalidArguments {
            reason: err.to_string(),
        }
    }
}
