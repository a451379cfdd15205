use bytes::Bytes;
use futures::{Stream, stream};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

/// Receives upload progress as a fraction in `[0, 1]`.
///
/// Called inline while the request body is being polled, so implementations
/// must only record the value and return.
pub trait ProgressSink: Send + Sync {
    fn begin(&self) {}

    fn report(&self, fraction: f64);

    fn finish(&self) {}
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) {}
}

/// Keeps every reported fraction. Useful for tests and for polling UIs.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    reports: Mutex<Vec<f64>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<f64> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<f64> {
        self.reports().last().copied()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, fraction: f64) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(fraction);
        }
    }
}

/// Counts bytes handed to the connection and forwards `sent / total`.
pub(crate) struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, sink: Arc<dyn ProgressSink>) -> Arc<Self> {
        Arc::new(Self {
            total,
            sent: AtomicU64::new(0),
            sink,
        })
    }

    pub(crate) fn advance(&self, bytes: usize) {
        let sent = self.sent.fetch_add(bytes as u64, Ordering::SeqCst) + bytes as u64;
        self.sink.report(self.fraction(sent));
    }

    pub(crate) fn complete(&self) {
        self.sink.report(1.0);
    }

    fn fraction(&self, sent: u64) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (sent as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Splits `payload` into `chunk_size` slices that advance `tracker` as they
/// are pulled.
pub(crate) fn counted_chunks(
    payload: Bytes,
    chunk_size: usize,
    tracker: Arc<ProgressTracker>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..payload.len())
        .step_by(chunk_size)
        .map(|start| payload.slice(start..(start + chunk_size).min(payload.len())))
        .collect();

    stream::iter(chunks.into_iter().map(move |chunk| {
        tracker.advance(chunk.len());
        Ok(chunk)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_chunks_report_non_decreasing_fractions() {
        let sink = Arc::new(RecordingProgress::new());
        let tracker = ProgressTracker::new(10, sink.clone());

        let chunks: Vec<_> = counted_chunks(Bytes::from_static(b"0123456789"), 4, tracker)
            .collect()
            .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(sink.reports(), vec![0.4, 0.8, 1.0]);
    }

    #[test]
    fn test_empty_total_reports_complete() {
        let sink = Arc::new(RecordingProgress::new());
        let tracker = ProgressTracker::new(0, sink.clone());

        tracker.advance(0);

        assert_eq!(sink.last(), Some(1.0));
    }

    #[test]
    fn test_fraction_is_clamped() {
        let sink = Arc::new(RecordingProgress::new());
        let tracker = ProgressTracker::new(2, sink.clone());

        tracker.advance(5);

        assert_eq!(sink.last(), Some(1.0));
    }
}
