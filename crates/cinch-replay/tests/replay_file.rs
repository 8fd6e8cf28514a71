//! Replays transcripts read from disk, the way the binary does.

use std::fs::File;
use std::io::{BufReader, Write};
use std::time::Duration;

use cinch_replay::{ReplayConfig, replay};

fn transcript_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn compaction_retry_burst_settles() {
    let file = transcript_file(&[
        r#"{"type": "agent_start"}"#,
        r#"{"type": "auto_compaction_start", "reason": "threshold"}"#,
        r#"{"type": "auto_compaction_end", "willRetry": true}"#,
        r#"{"type": "auto_compaction_end", "willRetry": true}"#,
        r#"{"type": "agent_end"}"#,
        r#"{"type": "tool_execution_start", "toolName": "exec", "toolCallId": "e1", "args": {"command": "ls -la", "workdir": "/repo"}}"#,
        r#"{"type": "tool_execution_update", "toolName": "exec", "toolCallId": "e1"}"#,
        r#"{"type": "tool_execution_end", "toolName": "exec", "toolCallId": "e1", "isError": false, "result": "ok"}"#,
        r#"{"type": "agent_end"}"#,
    ]);

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let config = ReplayConfig::new("run-file").with_wait_timeout(Duration::from_millis(500));
    let report = replay(reader, &config).await.unwrap();

    assert_eq!(report.events, 9);
    assert!(report.settled);
    assert_eq!(report.pending_compaction_retries, 0);
    assert_eq!(report.summaries.len(), 1);
    let text = &report.summaries[0].text;
    assert!(text.contains("exec"));
    assert!(text.contains("ls -la"));
    assert!(text.contains("/repo"));
}

#[tokio::test]
async fn unknown_event_types_pass_through_quietly() {
    let file = transcript_file(&[
        r#"{"type": "turn_start"}"#,
        r#"{"type": "message_update", "delta": "hi"}"#,
        r#"{"type": "message_end", "message": {"role": "user", "content": "hello"}}"#,
    ]);

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let report = replay(reader, &ReplayConfig::default()).await.unwrap();

    assert_eq!(report.events, 3);
    assert!(report.skipped_lines.is_empty());
    assert!(report.summaries.is_empty());
    assert!(report.replies.is_empty());
    assert!(report.settled);
}
