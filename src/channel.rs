//! Named event channel between the host and the UI runtime.
//!
//! The UI side calls `listen`/`cancel`; the channel forwards them to whatever
//! [`StreamHandler`] the host registered.

use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::error::EmitterError;
use crate::sink::{progress_channel, ProgressSink, ProgressStream};

/// Opaque arguments passed along with listen/cancel requests.
pub type ListenArgs = Option<serde_json::Value>;

/// Host-side callbacks invoked when the UI starts or stops listening.
pub trait StreamHandler: Send + Sync {
    fn on_listen(&self, args: ListenArgs, sink: Box<dyn ProgressSink>)
        -> Result<(), EmitterError>;
    fn on_cancel(&self, args: ListenArgs);
}

pub struct EventChannel {
    name: String,
    handler: Mutex<Option<Arc<dyn StreamHandler>>>,
}

impl EventChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_stream_handler(&self, handler: Arc<dyn StreamHandler>) -> Result<(), EmitterError> {
        let mut slot = self.handler.lock().map_err(|_| EmitterError::LockPoisoned {
            component: format!("EventChannel({})", self.name),
        })?;
        if slot.replace(handler).is_some() {
            warn!("Replacing stream handler on {}", self.name);
        }
        Ok(())
    }

    pub fn clear_stream_handler(&self) {
        let mut slot = self
            .handler
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        *slot = None;
    }

    pub fn has_stream_handler(&self) -> bool {
        self.handler
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn current_handler(&self) -> Result<Arc<dyn StreamHandler>, EmitterError> {
        let slot = self.handler.lock().map_err(|_| EmitterError::LockPoisoned {
            component: format!("EventChannel({})", self.name),
        })?;
        slot.clone().ok_or_else(|| EmitterError::NoStreamHandler {
            channel: self.name.clone(),
        })
    }

    /// Open a stream on this channel and hand its sink to the handler.
    pub fn listen(&self, args: ListenArgs) -> Result<ProgressStream, EmitterError> {
        let (sink, stream) = progress_channel();
        self.listen_with(args, sink)?;
        Ok(stream)
    }

    /// Hand a caller-supplied sink to the handler, e.g. one wrapping the UI
    /// bridge's own stream sink.
    pub fn listen_with<S: ProgressSink>(
        &self,
        args: ListenArgs,
        sink: S,
    ) -> Result<(), EmitterError> {
        let handler = self.current_handler()?;
        info!("Listen requested on {}", self.name);
        handler.on_listen(args, Box::new(sink))
    }

    pub fn cancel(&self, args: ListenArgs) -> Result<(), EmitterError> {
        let handler = self.current_handler()?;
        info!("Cancel requested on {}", self.name);
        handler.on_cancel(args);
        Ok(())
    }
}
