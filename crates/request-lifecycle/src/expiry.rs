//! Expiry scheduler
//!
//! One tokio sleep task per connected request. When it fires it sends the
//! request id on an mpsc channel; the owner of the manager drains that channel
//! and calls `expire`. Timers run on wall-clock time and ignore the
//! simulation speed-up.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Timer {
    handle: AbortHandle,
    deadline: Instant,
}

#[derive(Debug)]
pub struct ExpiryScheduler {
    tx: mpsc::UnboundedSender<String>,
    timers: HashMap<String, Timer>,
}

impl ExpiryScheduler {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            tx,
            timers: HashMap::new(),
        }
    }

    /// Scheduler plus the receiving end of its expiry events
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Arm a timer for `id`, replacing any existing one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, id: &str, after: Duration) {
        self.cancel(id);

        let deadline = Instant::now() + after;
        let tx = self.tx.clone();
        let key = id.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // receiver gone means the simulation shut down
            let _ = tx.send(key);
        });

        debug!("Expiry armed for {} in {:?}", id, after);
        self.timers.insert(
            id.to_string(),
            Timer {
                handle: task.abort_handle(),
                deadline,
            },
        );
    }

    /// Disarm the timer for `id`. Returns whether one existed.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.timers.remove(id) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    /// Time left before `id` fires, floored at zero
    pub fn remaining(&self, id: &str) -> Option<Duration> {
        self.timers
            .get(id)
            .map(|t| t.deadline.saturating_duration_since(Instant::now()))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_deadline() {
        let (mut scheduler, mut rx) = ExpiryScheduler::channel();
        scheduler.schedule("req_a", Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(99)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.remaining("req_a"), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(rx.recv().await.as_deref(), Some("req_a"));

        tokio::time::advance(Duration::from_secs(500)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (mut scheduler, mut rx) = ExpiryScheduler::channel();
        scheduler.schedule("req_b", Duration::from_secs(10));
        assert!(scheduler.is_scheduled("req_b"));
        assert!(scheduler.cancel("req_b"));
        assert!(!scheduler.is_scheduled("req_b"));
        assert!(!scheduler.cancel("req_b"));

        tokio::time::advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_timer() {
        let (mut scheduler, mut rx) = ExpiryScheduler::channel();
        scheduler.schedule("req_c", Duration::from_secs(5));
        scheduler.schedule("req_c", Duration::from_secs(50));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.is_scheduled("req_c"));
        assert!(!scheduler.is_scheduled("req_d"));

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(41)).await;
        assert_eq!(rx.recv().await.as_deref(), Some("req_c"));
    }
}
