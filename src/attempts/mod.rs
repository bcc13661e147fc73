pub mod reader;
pub mod record;

use chrono::NaiveDate;
use record::AttemptRecord;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const ATTEMPT_CHANNEL_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("attempt queue is full")]
    Full,
    #[error("attempt writer has stopped")]
    Closed,
}

/// Destination for attempt records.
///
/// `append` must not block: it is called from SSH callbacks and the shell
/// loop. Callers log and swallow the error.
pub trait LogSink: Send + Sync {
    fn append(&self, record: AttemptRecord) -> Result<(), SinkError>;
}

/// Asynchronous JSON-lines attempt store
pub struct AttemptLogger {
    sender: mpsc::Sender<AttemptRecord>,
    dropped_count: AtomicU64,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl AttemptLogger {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn new(log_dir: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel(ATTEMPT_CHANNEL_CAPACITY);
        let writer = tokio::spawn(attempt_writer_task(receiver, log_dir));

        Self {
            sender,
            dropped_count: AtomicU64::new(0),
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Number of records dropped because the queue was full or closed
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Stop accepting records and wait until everything queued is on disk.
    pub async fn close(self) {
        let writer = match self.writer.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(self.sender);
        if let Some(handle) = writer {
            if let Err(e) = handle.await {
                error!(error = %e, "Attempt writer task failed");
            }
        }
    }

    fn record_drop(&self) {
        let dropped = self.dropped_count.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped % 100 == 1 {
            warn!(
                total_dropped = dropped,
                "Attempt records being dropped due to channel overflow"
            );
        }
    }
}

impl LogSink for AttemptLogger {
    fn append(&self, record: AttemptRecord) -> Result<(), SinkError> {
        match self.sender.try_send(record) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.record_drop();
                Err(SinkError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.record_drop();
                Err(SinkError::Closed)
            }
        }
    }
}

/// In-memory sink, handy for tests and for embedding the emulator.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<AttemptRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        match self.records.lock() {
            Ok(r) => r.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for MemorySink {
    fn append(&self, record: AttemptRecord) -> Result<(), SinkError> {
        match self.records.lock() {
            Ok(mut r) => r.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}

/// Path of the daily file holding records stamped on `date` (UTC).
pub fn daily_log_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
}

async fn open_daily(log_dir: &Path, date: NaiveDate) -> Option<tokio::fs::File> {
    if let Err(e) = tokio::fs::create_dir_all(log_dir).await {
        error!(path = %log_dir.display(), error = %e, "Failed to create log directory");
        return None;
    }
    let path = daily_log_path(log_dir, date);
    match tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
    {
        Ok(f) => Some(f),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to open attempt log");
            None
        }
    }
}

async fn attempt_writer_task(mut receiver: mpsc::Receiver<AttemptRecord>, log_dir: PathBuf) {
    let mut current: Option<(NaiveDate, tokio::fs::File)> = None;

    while let Some(record) = receiver.recv().await {
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize attempt record");
                continue;
            }
        };
        debug!(record = %json, "Attempt record");

        // Roll over to a new file when the UTC date changes
        let date = record.timestamp().date_naive();
        if current.as_ref().map(|(d, _)| *d) != Some(date) {
            current = open_daily(&log_dir, date).await.map(|f| (date, f));
        }
        let Some((_, file)) = current.as_mut() else {
            continue;
        };

        let line = format!("{}\n", json);
        if let Err(e) = file.write_all(line.as_bytes()).await {
            error!(error = %e, "Failed to write attempt log");
            current = None;
            continue;
        }
        if let Err(e) = file.flush().await {
            error!(error = %e, "Failed to flush attempt log");
        }
    }
}
