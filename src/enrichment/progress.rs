//! Typed progress reporting for enrichment runs

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Lifecycle of one enrichment run, in emission order:
/// `Started`, one `BatchEmbedded` per batch, `ChainsDetected`, one
/// `BatchScored` per batch, `Finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        total: usize,
        batches: usize,
    },
    /// Missing embeddings of one batch were resolved
    BatchEmbedded {
        batch: usize,
        generated: usize,
        failed: usize,
    },
    ChainsDetected {
        chains: usize,
        skipped: usize,
    },
    BatchScored {
        batch: usize,
        batches: usize,
        processed: usize,
        total: usize,
    },
    Finished {
        enriched: usize,
        degraded: usize,
    },
}

/// Receiver of progress events. Reporting must not fail the run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // A dropped receiver just means nobody is listening
        let _ = self.send(event);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}
