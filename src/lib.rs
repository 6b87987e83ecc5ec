// Progress Channel Core - Rust side of the event channel demo
// Host-side timer streaming 0-100% progress to the UI runtime

// Module declarations
pub mod api;
pub mod channel;
pub mod config;
pub mod emitter;
pub mod error;
pub mod host;
pub mod logging;
pub mod sink;
pub mod telemetry;

// Re-exports for convenience
pub use channel::{EventChannel, ListenArgs, StreamHandler};
pub use emitter::{EmitterPhase, EmitterStatus, ProgressEmitter, TICK_INTERVAL, TOTAL_COUNT};
pub use error::EmitterError;
pub use host::EmitterHost;
pub use sink::{
    progress_channel, CallbackSink, ChannelSink, ProgressEvent, ProgressSink, ProgressStream,
};
