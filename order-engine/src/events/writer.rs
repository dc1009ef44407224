use log::{debug, warn};
use oms_api::EventRecord;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;

/// Drains the sink channel into an append-only JSONL file, one record per
/// line. Ends once every sender is gone; returns how many lines it wrote.
pub async fn run_event_writer(
    mut rx: UnboundedReceiver<EventRecord>,
    path: PathBuf,
) -> std::io::Result<u64> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    let mut written = 0u64;
    while let Some(record) = rx.recv().await {
        match serde_json::to_string(&record) {
            Ok(mut line) => {
                line.push('\n');
                file.write_all(line.as_bytes()).await?;
                written += 1;
            }
            Err(e) => warn!("skipping unserializable event record {}: {e}", record.seq),
        }
    }
    file.flush().await?;
    debug!("event writer finished after {written} record(s)");
    Ok(written)
}
