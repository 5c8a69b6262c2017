//! One-shot wake-ups for voting deadlines.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delivers a round-tagged message back to its owner when a deadline passes.
///
/// At most one wake-up is pending: arming again replaces the previous one.
/// The timer only holds a weak sender, so it never keeps its owner's channel
/// open on its own.
pub struct DeadlineTimer<T: Send + 'static> {
    target: mpsc::WeakSender<T>,
    wrap: fn(u64) -> T,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> DeadlineTimer<T> {
    /// `wrap` turns the armed round into the message to deliver.
    pub fn new(target: mpsc::WeakSender<T>, wrap: fn(u64) -> T) -> Self {
        Self {
            target,
            wrap,
            pending: None,
        }
    }

    /// Schedules a wake-up at `at` for `round`. A deadline already in the
    /// past fires on the next scheduler turn.
    pub fn arm(&mut self, at: DateTime<Utc>, round: u64) {
        self.cancel();

        let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let target = self.target.clone();
        let message = (self.wrap)(round);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = target.upgrade() {
                let _ = sender.send(message).await;
            }
        });
        self.pending = Some(handle);
    }

    /// Drops the pending wake-up. A message already handed to the channel
    /// is still delivered.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T: Send + 'static> Drop for DeadlineTimer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
