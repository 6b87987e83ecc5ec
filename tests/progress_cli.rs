use std::io::Write;
use std::process::Command;

use progress_channel::config::DEFAULT_CHANNEL_NAME;
use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_progress_cli"));
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

#[test]
fn listen_cancel_after_prints_exact_prefix() {
    let output = cli()
        .args(["listen", "--cancel-after", "3"])
        .output()
        .expect("failed to run progress_cli listen");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"type":"progress","payload":{"value":0.01}}"#,
            r#"{"type":"progress","payload":{"value":0.02}}"#,
            r#"{"type":"progress","payload":{"value":0.03}}"#,
        ]
    );
    assert!(
        !stdout.contains("end_of_stream"),
        "cancelled stream must not end normally, got {stdout}"
    );
}

#[test]
fn listen_with_lifecycle_reports_cancellation() {
    let output = cli()
        .args(["listen", "--cancel-after", "1", "--lifecycle"])
        .output()
        .expect("failed to run progress_cli listen --lifecycle");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let kinds: Vec<String> = stdout
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).expect("JSON line"))
        .filter_map(|json| json["lifecycle"]["kind"].as_str().map(str::to_string))
        .collect();
    assert_eq!(kinds.first().map(String::as_str), Some("session_started"));
    assert!(
        kinds.iter().any(|kind| kind == "session_cancelled"),
        "expected a cancellation event, got {kinds:?}"
    );
}

#[test]
fn listen_rejects_invalid_args_json() {
    let output = cli()
        .args(["listen", "--args", "{"])
        .output()
        .expect("failed to run progress_cli listen --args");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("--args"),
        "expected argument error in stderr, got {stderr}"
    );
}

#[test]
fn channel_prints_default_name() {
    let output = cli()
        .arg("channel")
        .output()
        .expect("failed to run progress_cli channel");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert_eq!(stdout.trim(), DEFAULT_CHANNEL_NAME);
}

#[test]
fn config_flag_is_accepted_after_subcommand() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    write!(file, r#"{{"channel":{{"name":"demo/cli"}}}}"#).expect("write config");
    let path = file.path().to_string_lossy().into_owned();

    for args in [
        vec!["channel", "--config", path.as_str()],
        vec!["--config", path.as_str(), "channel"],
    ] {
        let output = cli()
            .args(&args)
            .output()
            .expect("failed to run progress_cli channel --config");
        assert!(
            output.status.success(),
            "CLI exited with {:?} for {args:?}",
            output.status.code()
        );
        let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
        assert_eq!(stdout.trim(), "demo/cli");
    }
}
