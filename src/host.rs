//! EmitterHost: owns the emitter and wires it onto the event channel.
//!
//! Mirrors the lifecycle of the host activity: `on_create` registers the
//! stream handler, `on_destroy` unregisters it and stops any session.

use std::sync::Arc;

use log::info;
use tokio::runtime::Handle;

use crate::channel::EventChannel;
use crate::config::AppConfig;
use crate::emitter::ProgressEmitter;
use crate::error::EmitterError;

pub struct EmitterHost {
    channel: EventChannel,
    emitter: Arc<ProgressEmitter>,
}

impl EmitterHost {
    pub fn on_create(config: &AppConfig, runtime: Handle) -> Result<Self, EmitterError> {
        Self::register(config, ProgressEmitter::new(runtime))
    }

    /// Like [`on_create`](Self::on_create), with the timer on the runtime the
    /// caller is running in. Fails with `RuntimeUnavailable` outside one.
    pub fn on_create_current(config: &AppConfig) -> Result<Self, EmitterError> {
        Self::register(config, ProgressEmitter::current()?)
    }

    fn register(config: &AppConfig, emitter: ProgressEmitter) -> Result<Self, EmitterError> {
        let channel = EventChannel::new(config.channel.name.clone());
        let emitter = Arc::new(emitter);
        channel.set_stream_handler(emitter.clone())?;
        info!("Stream handler registered on {}", channel.name());
        Ok(Self { channel, emitter })
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    pub fn emitter(&self) -> &ProgressEmitter {
        &self.emitter
    }

    /// Safe to call more than once.
    pub fn on_destroy(&self) {
        self.channel.clear_stream_handler();
        self.emitter.shutdown();
        info!("Host destroyed; channel {} closed", self.channel.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::EmitterPhase;
    use crate::sink::ProgressEvent;
    use futures::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn host_routes_listen_and_cancel_to_emitter() {
        let host = EmitterHost::on_create(&AppConfig::default(), Handle::current()).unwrap();

        let mut stream = host.channel().listen(None).unwrap();
        assert_eq!(
            stream.next().await,
            Some(ProgressEvent::Progress { value: 0.01 })
        );
        assert_eq!(host.emitter().status().phase, EmitterPhase::Running);

        host.channel().cancel(None).unwrap();
        assert_eq!(host.emitter().status().phase, EmitterPhase::Idle);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_stops_session_and_unregisters_handler() {
        let host = EmitterHost::on_create(&AppConfig::default(), Handle::current()).unwrap();
        let mut stream = host.channel().listen(None).unwrap();
        assert!(stream.next().await.is_some());

        host.on_destroy();
        host.on_destroy();

        assert_eq!(stream.next().await, None);
        assert!(!host.emitter().is_running());
        assert!(matches!(
            host.channel().listen(None),
            Err(EmitterError::NoStreamHandler { .. })
        ));
    }

    #[test]
    fn create_current_outside_runtime_fails() {
        assert!(matches!(
            EmitterHost::on_create_current(&AppConfig::default()),
            Err(EmitterError::RuntimeUnavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn create_current_uses_calling_runtime() {
        let host = EmitterHost::on_create_current(&AppConfig::default()).unwrap();
        let mut stream = host.channel().listen(None).unwrap();
        assert_eq!(
            stream.next().await,
            Some(ProgressEvent::Progress { value: 0.01 })
        );
        assert_eq!(
            stream.next().await,
            Some(ProgressEvent::Progress { value: 0.02 })
        );
        host.on_destroy();
    }
}
