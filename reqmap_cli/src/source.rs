//! Replay event source
//!
//! Stands in for the browser's interception facility: reads lifecycle
//! events from a JSONL file and forwards them to the capture engine.
//! With `follow`, keeps tailing the file for newly appended lines.

use anyhow::{Context, Result};
use reqmap_common::LifecycleEvent;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Open the event file, failing on a missing or unreadable path. Called
/// by the CLI before the terminal goes into raw mode so a bad `--events`
/// argument surfaces as an error instead of an empty map.
pub async fn open_events(path: &Path) -> Result<File> {
    File::open(path)
        .await
        .with_context(|| format!("Failed to open event file {}", path.display()))
}

/// Read events from `path` and send them to the engine. Malformed lines
/// are skipped with a warning; a closed receiver ends the task.
pub async fn replay_events(
    path: PathBuf,
    events: mpsc::Sender<LifecycleEvent>,
    follow: bool,
) -> Result<()> {
    let file = open_events(&path).await?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();
    let mut sent = 0usize;

    loop {
        let read = reader.read_line(&mut buf).await?;
        if read == 0 {
            if follow {
                // At EOF; wait for the file to grow
                tokio::time::sleep(FOLLOW_POLL_INTERVAL).await;
                continue;
            }
            break;
        }
        // A tailed write can land mid-line; hold the partial buffer
        // until the terminating newline arrives
        if follow && !buf.ends_with('\n') {
            tokio::time::sleep(FOLLOW_POLL_INTERVAL).await;
            continue;
        }

        let line = buf.trim();
        if !line.is_empty() {
            match LifecycleEvent::from_json(line) {
                Ok(event) => {
                    if events.send(event).await.is_err() {
                        return Ok(());
                    }
                    sent += 1;
                }
                Err(err) => warn!("Skipping malformed event line: {}", err),
            }
        }
        buf.clear();
    }

    debug!(sent, "Event replay finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_replays_events_and_skips_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "{}",
            r#"{"type":"started","request_id":"1","tab_id":5,"url":"http://a.com/x","method":"GET","time_stamp":"2026-03-14T09:26:53Z"}"#
        )
        .unwrap();
        writeln!(file, "this is not json").unwrap();
        writeln!(
            file,
            "{}",
            r#"{"type":"completed","request_id":"1","tab_id":5,"url":"http://a.com/x","method":"GET","time_stamp":"2026-03-14T09:26:54Z","status_code":200}"#
        )
        .unwrap();
        file.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        replay_events(file.path().to_path_buf(), tx, false)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, LifecycleEvent::Started(_)));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, LifecycleEvent::Completed(_)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let (tx, _rx) = mpsc::channel(16);
        let result = replay_events(PathBuf::from("/nonexistent/events.jsonl"), tx, false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_events_reports_missing_path() {
        assert!(open_events(Path::new("/nonexistent/events.jsonl"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_follow_holds_partial_line_until_complete() {
        let full = r#"{"type":"started","request_id":"1","tab_id":5,"url":"http://a.com/x","method":"GET","time_stamp":"2026-03-14T09:26:53Z"}"#;
        let (head, tail) = full.split_at(40);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", head).unwrap();
        file.flush().unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let replay = tokio::spawn(replay_events(file.path().to_path_buf(), tx, true));

        // Let the tail loop hit EOF mid-line, then finish the write
        tokio::time::sleep(Duration::from_millis(700)).await;
        writeln!(file, "{}", tail).unwrap();
        file.flush().unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event written in two chunks never arrived")
            .unwrap();
        assert!(matches!(event, LifecycleEvent::Started(_)));
        replay.abort();
    }
}
