use crate::storage::{LogEntry, RunLogger, StorageError, StorageResult};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Queue depth between fetch workers and the log writer
const SINK_CAPACITY: usize = 64;

type Request = (LogEntry, oneshot::Sender<StorageResult<()>>);

/// Handle to the single task that writes the run log
///
/// Clones share one writer, so rows from concurrent workers never
/// interleave. [`LogSink::append`] resolves once the row is on disk.
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::Sender<Request>,
}

impl LogSink {
    /// Spawns the writer task
    ///
    /// The task ends when every handle has been dropped and hands the logger
    /// back through the returned join handle.
    pub fn spawn(mut logger: RunLogger) -> (Self, JoinHandle<RunLogger>) {
        let (tx, mut rx) = mpsc::channel::<Request>(SINK_CAPACITY);

        let task = tokio::spawn(async move {
            while let Some((entry, ack)) = rx.recv().await {
                let result = logger.append(&entry);
                if let Err(e) = &result {
                    tracing::error!("Failed to append run log row for {}: {}", entry.url, e);
                }
                let _ = ack.send(result);
            }
            logger
        });

        (Self { tx }, task)
    }

    /// Queues `entry` and waits until the writer has appended it
    pub async fn append(&self, entry: LogEntry) -> StorageResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((entry, ack_tx))
            .await
            .map_err(|_| StorageError::SinkClosed)?;
        ack_rx.await.map_err(|_| StorageError::SinkClosed)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_is_durable_when_it_returns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run_log.csv");
        let (sink, task) = LogSink::spawn(RunLogger::open(&path).unwrap());

        sink.append(LogEntry::now("http://a.test/1")).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("http://a.test/1"));

        drop(sink);
        let logger = task.await.unwrap();
        assert_eq!(logger.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_concurrent_appends_produce_whole_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run_log.csv");
        let (sink, task) = LogSink::spawn(RunLogger::open(&path).unwrap());

        let mut writers = Vec::new();
        for i in 0..20 {
            let sink = sink.clone();
            writers.push(tokio::spawn(async move {
                sink.append(LogEntry::now(format!("http://a.test/{}", i)))
                    .await
            }));
        }
        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        drop(sink);
        task.await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|r| r.len() == 7));
    }

    #[tokio::test]
    async fn test_closed_sink_reports_error() {
        let dir = TempDir::new().unwrap();
        let (sink, task) = LogSink::spawn(RunLogger::open(dir.path().join("log.csv")).unwrap());
        task.abort();
        let _ = task.await;

        let result = sink.append(LogEntry::now("http://a.test/late")).await;
        assert!(matches!(result, Err(StorageError::SinkClosed)));
    }
}
