//! Platform logging setup.
//!
//! Library code logs through the `log` facade; this module routes those
//! records into a `tracing` subscriber (stderr on desktop, logcat on Android).
//! Stdout is left to the CLI's JSON-lines output.

use std::sync::Once;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the global subscriber once. Later calls are no-ops, and an
/// already-installed subscriber (e.g. from a test harness) is left in place.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| install(config));
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        fn install(config: &LoggingConfig) {
            use tracing_subscriber::layer::SubscriberExt;
            use tracing_subscriber::util::SubscriberInitExt;

            let level = tracing_subscriber::filter::LevelFilter::from_level(config.max_level());
            match tracing_android::layer(&config.tag) {
                Ok(layer) => {
                    if tracing_subscriber::registry()
                        .with(layer)
                        .with(level)
                        .try_init()
                        .is_err()
                    {
                        log::debug!("Global subscriber already installed");
                    }
                }
                Err(err) => eprintln!("Failed to create Android log layer: {}", err),
            }
        }
    } else {
        fn install(config: &LoggingConfig) {
            if tracing_subscriber::fmt()
                .with_max_level(config.max_level())
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .is_err()
            {
                log::debug!("Global subscriber already installed");
            }
        }
    }
}
