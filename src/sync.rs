use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::Booking;
use crate::realtime::{Invalidation, Topic};

/// Where a synchronized list gets its data. Implementations wrap one REST
/// list endpoint; the container re-derives its whole state from `fetch` on
/// every load, explicit or invalidation-triggered.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<T>, ClientError>;
}

/// Point-in-time view of a synchronized list. `loading` is true only
/// during explicit loads (spinner semantics); background refetches are
/// silent. Errors degrade to a user message, never a panic.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            last_error: None,
        }
    }
}

/// Screen-local synchronized list: fetch on demand, refetch silently on
/// invalidation, reconcile by overwrite.
///
/// No ordering is enforced between concurrent fetches — the last-started
/// fetch wins via a generation counter, and completions from older fetches
/// (or from after [`shutdown`](Self::shutdown)) are dropped. That makes
/// unmount races and event/refetch races harmless: state is always
/// re-derived from the server.
pub struct Synced<T> {
    source: Arc<dyn ListSource<T>>,
    state: Arc<Mutex<Snapshot<T>>>,
    generation: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl<T> Clone for Synced<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Synced<T> {
    pub fn new(source: Arc<dyn ListSource<T>>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(Snapshot {
                items: Vec::new(),
                loading: false,
                last_error: None,
            })),
            generation: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Explicit fetch with the loading flag raised while it runs.
    pub async fn load(&self) {
        self.run_fetch(true).await;
    }

    /// Silent background refetch, used for invalidation signals and
    /// post-action reconciliation.
    pub async fn refresh(&self) {
        self.run_fetch(false).await;
    }

    /// Mutate the current items in place, for optimistic updates layered
    /// on top of the fetch cycle. The next winning fetch overwrites
    /// whatever this changes.
    pub fn update_items<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| f(&mut state.items))
    }

    /// After shutdown every in-flight completion and every further signal
    /// is a no-op. This is the uniform unmount guard.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Refetch whenever an invalidation for `topic` arrives. A lagged
    /// receiver also refetches: missed signals still mean stale state.
    pub fn bind_invalidations(
        &self,
        mut rx: broadcast::Receiver<Invalidation>,
        topic: Topic,
    ) -> JoinHandle<()> {
        let list = self.clone();
        tokio::spawn(async move {
            loop {
                let relevant = match rx.recv().await {
                    Ok(invalidation) => invalidation.topic == topic,
                    Err(broadcast::error::RecvError::Lagged(_)) => true,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if list.closed.load(Ordering::SeqCst) {
                    break;
                }
                if relevant {
                    list.refresh().await;
                }
            }
        })
    }

    async fn run_fetch(&self, show_loading: bool) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if show_loading {
            if let Ok(mut state) = self.state.lock() {
                state.loading = true;
            }
        }

        let result = self.source.fetch().await;

        let Ok(mut state) = self.state.lock() else {
            return;
        };
        // A newer fetch started (or shutdown bumped the counter) while this
        // one was in flight: drop the stale result.
        if self.generation.load(Ordering::SeqCst) != generation
            || self.closed.load(Ordering::SeqCst)
        {
            return;
        }

        state.loading = false;
        match result {
            Ok(items) => {
                state.items = items;
                state.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "list fetch failed");
                state.last_error = Some(e.user_message().to_string());
            }
        }
    }
}

// ── Booking sources ──

pub struct ProviderBookingSource {
    pub client: Arc<ApiClient>,
}

#[async_trait]
impl ListSource<Booking> for ProviderBookingSource {
    async fn fetch(&self) -> Result<Vec<Booking>, ClientError> {
        let resp = self.client.provider_bookings().await?;
        if let Some(err) = resp.err() {
            return Err(err);
        }
        resp.data
            .ok_or_else(|| ClientError::Malformed("missing bookings payload".to_string()))
    }
}

pub struct CustomerBookingSource {
    pub client: Arc<ApiClient>,
}

#[async_trait]
impl ListSource<Booking> for CustomerBookingSource {
    async fn fetch(&self) -> Result<Vec<Booking>, ClientError> {
        let resp = self.client.customer_bookings().await?;
        if let Some(err) = resp.err() {
            return Err(err);
        }
        resp.data
            .ok_or_else(|| ClientError::Malformed("missing bookings payload".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Source that serves scripted responses, each after its own delay.
    struct ScriptedSource {
        responses: Vec<(Duration, Result<Vec<String>, ClientError>)>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<(Duration, Result<Vec<String>, ClientError>)>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ListSource<String> for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<String>, ClientError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = &self.responses[idx.min(self.responses.len() - 1)];
            tokio::time::sleep(*delay).await;
            match result {
                Ok(items) => Ok(items.clone()),
                Err(_) => Err(ClientError::Malformed("scripted failure".to_string())),
            }
        }
    }

    fn ok(items: &[&str]) -> Result<Vec<String>, ClientError> {
        Ok(items.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_populates_and_clears_loading() {
        let source = ScriptedSource::new(vec![(Duration::from_millis(10), ok(&["a", "b"]))]);
        let list = Synced::new(source);

        list.load().await;
        let snap = list.snapshot();
        assert_eq!(snap.items, vec!["a", "b"]);
        assert!(!snap.loading);
        assert!(snap.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_captured_not_fatal() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(10), ok(&["a"])),
            (
                Duration::from_millis(10),
                Err(ClientError::Malformed("x".to_string())),
            ),
        ]);
        let list = Synced::new(source);

        list.load().await;
        list.refresh().await;

        let snap = list.snapshot();
        // Items survive a failed refetch; only the error message updates.
        assert_eq!(snap.items, vec!["a"]);
        assert!(snap.last_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_started_fetch_wins() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(100), ok(&["stale"])),
            (Duration::from_millis(10), ok(&["fresh"])),
        ]);
        let list = Synced::new(source);

        let slow = {
            let list = list.clone();
            tokio::spawn(async move { list.load().await })
        };
        tokio::task::yield_now().await;
        let fast = {
            let list = list.clone();
            tokio::spawn(async move { list.refresh().await })
        };

        slow.await.unwrap();
        fast.await.unwrap();

        assert_eq!(list.snapshot().items, vec!["fresh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_inflight_completion() {
        let source = ScriptedSource::new(vec![(Duration::from_millis(50), ok(&["late"]))]);
        let list = Synced::new(source);

        let inflight = {
            let list = list.clone();
            tokio::spawn(async move { list.load().await })
        };
        tokio::task::yield_now().await;
        list.shutdown();
        inflight.await.unwrap();

        assert!(list.snapshot().items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_triggers_silent_refetch() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(1), ok(&["v1"])),
            (Duration::from_millis(1), ok(&["v2"])),
        ]);
        let list = Synced::new(source);
        list.load().await;

        let (tx, rx) = broadcast::channel(8);
        let task = list.bind_invalidations(rx, Topic::Bookings);

        tx.send(Invalidation {
            topic: Topic::Bookings,
        })
        .unwrap();
        // Let the listener run its refetch.
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(list.snapshot().items, vec!["v2"]);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_topic_is_ignored() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(1), ok(&["v1"])),
            (Duration::from_millis(1), ok(&["v2"])),
        ]);
        let list = Synced::new(source);
        list.load().await;

        let (tx, rx) = broadcast::channel(8);
        let task = list.bind_invalidations(rx, Topic::Bookings);

        tx.send(Invalidation {
            topic: Topic::Earnings,
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(list.snapshot().items, vec!["v1"]);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_after_shutdown_do_nothing() {
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(1), ok(&["v1"])),
            (Duration::from_millis(1), ok(&["v2"])),
        ]);
        let list = Synced::new(source);
        list.load().await;

        let (tx, rx) = broadcast::channel(8);
        let task = list.bind_invalidations(rx, Topic::Bookings);
        list.shutdown();

        tx.send(Invalidation {
            topic: Topic::Bookings,
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(list.snapshot().items, vec!["v1"]);
        task.abort();
    }
}
