// Error types for the progress channel core
//
// This module defines the emitter error type and its numeric codes,
// providing structured error handling suitable for FFI communication.

mod emitter;

pub use emitter::{log_emitter_error, EmitterError, EmitterErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
