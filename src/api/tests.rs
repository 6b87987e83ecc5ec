use super::*;
use crate::sink::{CallbackSink, ProgressEvent};
use futures::StreamExt;

#[test]
fn test_get_version() {
    let result = get_version().unwrap();
    assert_eq!(result, "0.1.0");
}

#[test]
fn test_parse_args() {
    assert_eq!(parse_args(None).unwrap(), None);
    assert_eq!(parse_args(Some("  ".to_string())).unwrap(), None);
    assert_eq!(
        parse_args(Some(r#"{"id":3}"#.to_string())).unwrap(),
        Some(serde_json::json!({"id": 3}))
    );
    assert!(matches!(
        parse_args(Some("{".to_string())),
        Err(EmitterError::InvalidArguments { .. })
    ));
}

// The host is process-wide, so the whole lifecycle lives in one test.
#[tokio::test]
async fn test_host_lifecycle() {
    destroy_host();
    assert!(matches!(
        progress_stream(None),
        Err(EmitterError::HostNotCreated)
    ));
    assert!(matches!(
        cancel_progress_stream(None),
        Err(EmitterError::HostNotCreated)
    ));
    assert!(matches!(
        listen_progress(None, CallbackSink::new(|_| Ok::<(), String>(()))),
        Err(EmitterError::HostNotCreated)
    ));

    create_host().unwrap();
    create_host().unwrap();
    assert_eq!(
        stream_channel_name().unwrap(),
        crate::config::DEFAULT_CHANNEL_NAME
    );

    let mut stream = progress_stream(Some(r#"{"source":"test"}"#.to_string())).unwrap();
    assert_eq!(
        stream.next().await,
        Some(ProgressEvent::Progress { value: 0.01 })
    );
    assert_eq!(
        stream.next().await,
        Some(ProgressEvent::Progress { value: 0.02 })
    );

    cancel_progress_stream(None).unwrap();
    cancel_progress_stream(None).unwrap();
    assert_eq!(stream.next().await, None);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    listen_progress(None, CallbackSink::new(move |event| tx.send(event))).unwrap();
    assert_eq!(rx.recv().await, Some(ProgressEvent::Progress { value: 0.01 }));
    assert_eq!(rx.recv().await, Some(ProgressEvent::Progress { value: 0.02 }));
    cancel_progress_stream(None).unwrap();
    assert_eq!(rx.recv().await, None);

    destroy_host();
    destroy_host();
    assert!(matches!(
        stream_channel_name(),
        Err(EmitterError::HostNotCreated)
    ));
}
