//! Install status reporting and cancellation
//!
//! The pipeline publishes into a single slot; a reader only ever sees the
//! most recent status. Intermediate values may be overwritten before they
//! are observed.

use crate::{Error, Result};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::watch;

pub use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A status snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub message: String,
    pub current: u64,
    pub total: u64,
    /// Incremented on every publish; 0 means nothing was published yet
    pub seq: u64,
}

impl Status {
    /// Completed share in `0.0..=1.0`, or 0 when no total is known
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Create a connected sender/receiver pair
pub fn channel() -> (StatusSender, StatusReceiver) {
    let (tx, rx) = watch::channel(Status::default());
    (StatusSender { tx: Arc::new(tx) }, StatusReceiver { rx })
}

#[derive(Clone)]
pub struct StatusSender {
    tx: Arc<watch::Sender<Status>>,
}

impl StatusSender {
    /// Replace the status message, keeping the current progress
    pub fn message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|status| status.message = message);
    }

    /// Update progress, keeping the current message
    pub fn progress(&self, current: u64, total: u64) {
        self.update(|status| {
            status.current = current;
            status.total = total;
        });
    }

    // send_modify publishes even after every receiver is gone
    fn update<F: FnOnce(&mut Status)>(&self, apply: F) {
        self.tx.send_modify(|status| {
            apply(status);
            status.seq += 1;
        });
    }
}

#[derive(Clone)]
pub struct StatusReceiver {
    rx: watch::Receiver<Status>,
}

impl StatusReceiver {
    pub fn latest(&self) -> Status {
        self.rx.borrow().clone()
    }

    /// Block until a status newer than `seen` is published or `timeout`
    /// elapses. Returns `None` on timeout.
    pub fn wait_newer(&self, seen: u64, timeout: Duration) -> Option<Status> {
        let deadline = Instant::now() + timeout;

        loop {
            {
                let status = self.rx.borrow();
                if status.seq > seen {
                    return Some(status.clone());
                }
            }

            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            thread::sleep(remaining.min(POLL_INTERVAL));
        }
    }
}

/// `Err(Error::Cancelled)` once `cancel_token` has been cancelled
pub fn check_cancelled(cancel_token: &CancellationToken) -> Result<()> {
    if cancel_token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
