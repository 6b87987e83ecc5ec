// Public API for flutter_rust_bridge integration
// This module provides FFI functions for Flutter to drive the progress channel

#![allow(dead_code)] // FFI functions are called from Dart, not detected by Rust analyzer

use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use futures::Stream;
use once_cell::sync::{Lazy, OnceCell};
use tokio::runtime::{Builder, Runtime};

use crate::channel::ListenArgs;
use crate::config::AppConfig;
use crate::error::{log_emitter_error, EmitterError};
use crate::host::EmitterHost;
use crate::logging::init_logging;
use crate::sink::{ProgressSink, ProgressStream};
use crate::telemetry::LifecycleEvent;

// Re-export error code constants for FFI exposure
pub use crate::error::EmitterErrorCodes;

/// Dedicated runtime for the emitter timer.
///
/// A single worker thread keeps every tick on one thread, which is the
/// scheduling model the UI side expects. The Flutter Rust Bridge may call in
/// from threads without a Tokio runtime, so the emitter never relies on one.
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Global host instance, present between `create_host` and `destroy_host`.
static HOST: Lazy<Mutex<Option<EmitterHost>>> = Lazy::new(|| Mutex::new(None));

fn runtime() -> Result<&'static Runtime, EmitterError> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("progress-emitter")
            .enable_time()
            .build()
            .map_err(EmitterError::from)
    })
}

fn host_slot() -> MutexGuard<'static, Option<EmitterHost>> {
    HOST.lock().unwrap_or_else(|err| err.into_inner())
}

fn parse_args(args: Option<String>) -> Result<ListenArgs, EmitterError> {
    match args {
        Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
        _ => Ok(None),
    }
}

/// Get the version of the progress channel core
#[flutter_rust_bridge::frb(sync)]
pub fn get_version() -> Result<String> {
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

/// Create the host: initialize logging, load config and register the
/// stream handler. Calling it again while a host exists is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn create_host() -> Result<(), EmitterError> {
    let mut slot = host_slot();
    if slot.is_some() {
        return Ok(());
    }

    let config = AppConfig::load();
    init_logging(&config.logging);
    let handle = runtime()?.handle().clone();
    *slot = Some(EmitterHost::on_create(&config, handle)?);
    Ok(())
}

/// Name of the channel the host is listening on.
#[flutter_rust_bridge::frb(sync)]
pub fn stream_channel_name() -> Result<String, EmitterError> {
    host_slot()
        .as_ref()
        .map(|host| host.channel().name().to_string())
        .ok_or(EmitterError::HostNotCreated)
}

/// Start listening for progress (onListen).
///
/// `args` is an optional JSON document forwarded to the stream handler.
/// The returned stream yields 100 progress values at 200ms intervals,
/// then an end-of-stream event, then closes.
#[flutter_rust_bridge::frb(ignore)]
pub fn progress_stream(args: Option<String>) -> Result<ProgressStream, EmitterError> {
    let args = parse_args(args)?;
    let slot = host_slot();
    let host = slot.as_ref().ok_or(EmitterError::HostNotCreated)?;
    host.channel().listen(args).inspect_err(|err| {
        log_emitter_error(err, "progress_stream");
    })
}

/// Start listening with a caller-owned sink (onListen).
///
/// Used by the bridge layer to feed its generated stream sink directly,
/// wrapped in a [`CallbackSink`](crate::sink::CallbackSink). Values stop as
/// soon as the sink reports an error.
#[flutter_rust_bridge::frb(ignore)]
pub fn listen_progress<S: ProgressSink>(
    args: Option<String>,
    sink: S,
) -> Result<(), EmitterError> {
    let args = parse_args(args)?;
    let slot = host_slot();
    let host = slot.as_ref().ok_or(EmitterError::HostNotCreated)?;
    host.channel().listen_with(args, sink).inspect_err(|err| {
        log_emitter_error(err, "listen_progress");
    })
}

/// Stop listening (onCancel). Safe to call when nothing is listening.
#[flutter_rust_bridge::frb]
pub fn cancel_progress_stream(args: Option<String>) -> Result<(), EmitterError> {
    let args = parse_args(args)?;
    let slot = host_slot();
    let host = slot.as_ref().ok_or(EmitterError::HostNotCreated)?;
    host.channel().cancel(args)
}

/// Session lifecycle events for debug instrumentation.
#[flutter_rust_bridge::frb(ignore)]
pub fn lifecycle_stream() -> Result<impl Stream<Item = LifecycleEvent>, EmitterError> {
    let slot = host_slot();
    let host = slot.as_ref().ok_or(EmitterError::HostNotCreated)?;
    Ok(host.emitter().lifecycle_stream())
}

/// Tear the host down (onDestroy). Safe to call when no host exists.
#[flutter_rust_bridge::frb(sync)]
pub fn destroy_host() {
    if let Some(host) = host_slot().take() {
        host.on_destroy();
    }
}

#[cfg(test)]
mod tests;
