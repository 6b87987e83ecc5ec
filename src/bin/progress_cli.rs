use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use progress_channel::config::AppConfig;
use progress_channel::logging::init_logging;
use progress_channel::telemetry::LifecycleEvent;
use progress_channel::{EmitterHost, ProgressEvent};
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(
    name = "progress_cli",
    about = "Drive the progress event channel from the desktop"
)]
struct Cli {
    /// JSON config file (defaults to assets/progress_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Listen on the channel and print each event as a JSON line
    Listen {
        /// Cancel the stream after this many progress values
        #[arg(long)]
        cancel_after: Option<u32>,
        /// Also print session lifecycle events
        #[arg(long)]
        lifecycle: bool,
        /// JSON arguments forwarded to the stream handler
        #[arg(long)]
        args: Option<String>,
    },
    /// Print the configured channel name
    Channel,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    init_logging(&config.logging);

    match cli.command {
        Commands::Listen {
            cancel_after,
            lifecycle,
            args,
        } => run_listen(&config, cancel_after, lifecycle, args),
        Commands::Channel => {
            println!("{}", config.channel.name);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_listen(
    config: &AppConfig,
    cancel_after: Option<u32>,
    print_lifecycle: bool,
    raw_args: Option<String>,
) -> Result<ExitCode> {
    let args = raw_args
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .context("parsing --args as JSON")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building tokio runtime")?;
    let host = {
        let _guard = runtime.enter();
        EmitterHost::on_create_current(config)?
    };

    let result = runtime.block_on(async {
        let mut lifecycle = host.emitter().subscribe_lifecycle();
        let mut stream = host.channel().listen(args)?;
        let mut received = 0u32;

        loop {
            tokio::select! {
                event = stream.next() => {
                    let Some(event) = event else { break };
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, ProgressEvent::Progress { .. }) {
                        received += 1;
                        if cancel_after == Some(received) {
                            host.channel().cancel(None)?;
                        }
                    }
                }
                Ok(event) = lifecycle.recv(), if print_lifecycle => {
                    emit_lifecycle(&event)?;
                }
            }
        }

        if print_lifecycle {
            drain_lifecycle(&mut lifecycle)?;
        }
        anyhow::Ok(())
    });

    host.on_destroy();
    result?;
    Ok(ExitCode::from(0))
}

fn emit_lifecycle(event: &LifecycleEvent) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({ "lifecycle": event }))?
    );
    Ok(())
}

fn drain_lifecycle(rx: &mut broadcast::Receiver<LifecycleEvent>) -> Result<()> {
    while let Ok(event) = rx.try_recv() {
        emit_lifecycle(&event)?;
    }
    Ok(())
}
