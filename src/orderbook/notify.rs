//! Per-market update wakeups.
//!
//! [`UpdateNotifier`] lets consumers block until the next verified book
//! update for one market. Signals are edge-triggered: a signal wakes every
//! task currently waiting on that market and is then gone - a task that
//! starts waiting afterwards sees nothing until the next signal.
//!
//! The registry of per-market handles is explicit. Handles are created
//! under the registry write lock (`entry().or_insert_with`), so two tasks
//! touching a market for the first time concurrently still end up sharing
//! one handle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;

/// Registry of per-market update signals.
///
/// Built on [`tokio::sync::Notify`], whose `notify_waiters` has exactly
/// the edge-triggered semantics the feed needs: wake everyone currently
/// parked, store nothing.
#[derive(Debug, Default)]
pub struct UpdateNotifier {
    notifiers: RwLock<FxHashMap<String, Arc<Notify>>>,
}

impl UpdateNotifier {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the signal handle for `market` ahead of time.
    ///
    /// Waiting also creates the handle on demand; registering at subscribe
    /// time just keeps the wait path allocation-free.
    pub fn register(&self, market: &str) {
        self.handle(market);
    }

    /// Wake every task currently waiting on `market`.
    ///
    /// No-op when no handle exists yet, since then nobody can be waiting.
    pub fn signal(&self, market: &str) {
        let notifiers = self.notifiers.read();
        if let Some(notify) = notifiers.get(market) {
            notify.notify_waiters();
        }
    }

    /// Wait for the next signal on `market`.
    ///
    /// Returns `true` if signaled, `false` if `timeout` elapsed first; a
    /// timeout is a normal return, not an error. `None` waits
    /// indefinitely. The caller should consult the store's timestamp to
    /// distinguish "no data yet" from "no fresh data".
    pub async fn wait_for(&self, market: &str, timeout: Option<Duration>) -> bool {
        let notify = self.handle(market);
        let notified = notify.notified();
        match timeout {
            Some(duration) => tokio::time::timeout(duration, notified).await.is_ok(),
            None => {
                notified.await;
                true
            }
        }
    }

    /// Get or create the shared handle for `market`
    fn handle(&self, market: &str) -> Arc<Notify> {
        if let Some(notify) = self.notifiers.read().get(market) {
            return Arc::clone(notify);
        }
        let mut notifiers = self.notifiers.write();
        Arc::clone(
            notifiers
                .entry(market.to_string())
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }
}
