//! Listener side of the event channel.
//!
//! A [`ProgressSink`] receives progress values and the terminal end-of-stream
//! signal from the emitter. [`progress_channel`] pairs a tokio-backed sink with
//! a [`ProgressStream`] that the UI layer (or the CLI) consumes.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::EmitterError;

/// Event delivered across the channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress { value: f64 },
    EndOfStream,
}

/// Consumer of emitted progress.
///
/// Implementations are invoked while the emitter holds its state lock and
/// must not call back into the emitter. Returning `Err(SinkClosed)` ends the
/// session.
pub trait ProgressSink: Send + 'static {
    fn success(&self, progress: f64) -> Result<(), EmitterError>;
    fn end_of_stream(&self) -> Result<(), EmitterError>;
}

impl ProgressSink for Box<dyn ProgressSink> {
    fn success(&self, progress: f64) -> Result<(), EmitterError> {
        (**self).success(progress)
    }

    fn end_of_stream(&self) -> Result<(), EmitterError> {
        (**self).end_of_stream()
    }
}

/// Sink forwarding events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    fn send(&self, event: ProgressEvent) -> Result<(), EmitterError> {
        self.tx.send(event).map_err(|_| EmitterError::SinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ProgressSink for ChannelSink {
    fn success(&self, progress: f64) -> Result<(), EmitterError> {
        self.send(ProgressEvent::Progress { value: progress })
    }

    fn end_of_stream(&self) -> Result<(), EmitterError> {
        self.send(ProgressEvent::EndOfStream)
    }
}

/// Sink forwarding each event to a callback.
///
/// This is the shape of a UI bridge's stream sink: `add` returns an error once
/// the UI side has gone away, which ends the session.
pub struct CallbackSink<F> {
    forward: F,
}

impl<F, E> CallbackSink<F>
where
    F: Fn(ProgressEvent) -> Result<(), E> + Send + 'static,
    E: Display,
{
    pub fn new(forward: F) -> Self {
        Self { forward }
    }

    fn send(&self, event: ProgressEvent) -> Result<(), EmitterError> {
        (self.forward)(event).map_err(|err| {
            debug!("Callback sink rejected {:?}: {}", event, err);
            EmitterError::SinkClosed
        })
    }
}

impl<F, E> ProgressSink for CallbackSink<F>
where
    F: Fn(ProgressEvent) -> Result<(), E> + Send + 'static,
    E: Display,
{
    fn success(&self, progress: f64) -> Result<(), EmitterError> {
        self.send(ProgressEvent::Progress { value: progress })
    }

    fn end_of_stream(&self) -> Result<(), EmitterError> {
        self.send(ProgressEvent::EndOfStream)
    }
}

/// Stream of progress events; ends once the emitter releases its sink.
pub struct ProgressStream {
    inner: UnboundedReceiverStream<ProgressEvent>,
}

impl ProgressStream {
    /// Close the receiving side; the emitter sees `SinkClosed` on its next tick.
    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Create a connected sink/stream pair.
pub fn progress_channel() -> (ChannelSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChannelSink { tx },
        ProgressStream {
            inner: UnboundedReceiverStream::new(rx),
        },
    )
}
