// Debounced re-analysis after live DOM mutations

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// A mutation notification from the host. The payload is informational; any
/// mutation leads to a full re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub description: String,
}

impl MutationEvent {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
        }
    }
}

/// Collapses bursts of mutations into one re-analysis request.
pub struct MutationDebouncer {
    quiet_period: Duration,
}

impl MutationDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period }
    }

    /// Wait for a mutation, then absorb more until none arrives for the quiet
    /// period. Returns how many were absorbed, or `None` once the channel is
    /// closed with nothing pending.
    pub async fn next_batch(&self, rx: &mut mpsc::Receiver<MutationEvent>) -> Option<usize> {
        let first = rx.recv().await?;
        debug!("Mutation observed: {}", first.description);
        let mut count = 1;

        loop {
            match timeout(self.quiet_period, rx.recv()).await {
                Ok(Some(event)) => {
                    debug!("Mutation observed: {}", event.description);
                    count += 1;
                }
                Ok(None) | Err(_) => break,
            }
        }

        debug!("Mutation batch of {} ready for re-analysis", count);
        Some(count)
    }
}
