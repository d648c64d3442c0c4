use std::sync::{Arc, Mutex};
use std::time::Duration;

use roster_types::Document;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::tiered::TieredStore;

/// Receives the document each poll cycle settles on, whichever tier it
/// came from.
pub trait Subscriber: Send + Sync + 'static {
    fn on_refresh(&self, doc: &Document);
}

impl<F> Subscriber for F
where
    F: Fn(&Document) + Send + Sync + 'static,
{
    fn on_refresh(&self, doc: &Document) {
        self(doc)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
}

struct Running {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Periodic forced refresh of a [`TieredStore`].
///
/// The first cycle runs as soon as the poller starts; each following cycle
/// starts one interval after the previous one finished. Must be started from
/// within a Tokio runtime. Dropping the poller stops it.
pub struct Poller {
    store: Arc<TieredStore>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl Poller {
    /// Poll at the store's refresh interval.
    pub fn new(store: Arc<TieredStore>) -> Self {
        let interval = store.refresh_interval();
        Self::with_interval(store, interval)
    }

    pub fn with_interval(store: Arc<TieredStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        match self.running.lock().expect("lock poisoned").as_ref() {
            Some(r) if !r.task.is_finished() => PollerState::Running,
            _ => PollerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    /// Start polling. Returns `false` and does nothing if already running.
    pub fn start(&self, subscriber: impl Subscriber) -> bool {
        let mut running = self.running.lock().expect("lock poisoned");
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            debug!("poller already running");
            return false;
        }
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            self.store.clone(),
            self.interval,
            Arc::new(subscriber),
            stop_rx,
        ));
        info!(interval_ms = self.interval.as_millis() as u64, "poller started");
        *running = Some(Running { stop, task });
        true
    }

    /// Stop polling. An in-flight cycle finishes its fetch but does not
    /// notify the subscriber. Returns `false` if the poller was idle.
    pub fn stop(&self) -> bool {
        let Some(running) = self.running.lock().expect("lock poisoned").take() else {
            return false;
        };
        let _ = running.stop.send(true);
        info!("poller stopped");
        true
    }

    /// Stop polling and wait for the background task to exit.
    pub async fn shutdown(&self) {
        let running = self.running.lock().expect("lock poisoned").take();
        if let Some(running) = running {
            let _ = running.stop.send(true);
            if let Err(e) = running.task.await {
                warn!(error = %e, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}

async fn run(
    store: Arc<TieredStore>,
    interval: Duration,
    subscriber: Arc<dyn Subscriber>,
    mut stop: watch::Receiver<bool>,
) {
    let mut cycle: u64 = 0;
    loop {
        if *stop.borrow() {
            break;
        }
        cycle += 1;
        let fetched = store.fetch(true).await;
        if *stop.borrow() {
            debug!(cycle, "stopped mid-cycle; dropping refresh");
            break;
        }
        if fetched.source.is_remote() {
            debug!(cycle, source = %fetched.source, accounts = fetched.document.len(), "refreshed");
        } else {
            warn!(cycle, source = %fetched.source, "refresh did not reach a remote tier");
        }
        subscriber.on_refresh(&fetched.document);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop.changed() => {
                // Sender gone means the poller itself was dropped.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!(cycles = cycle, "poller loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, ScriptedRemote};
    use roster_remote::RemoteError;
    use roster_store::{DocumentCache, InMemorySlots, LocalCache};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn store(remote: Arc<ScriptedRemote>) -> Arc<TieredStore> {
        let cache = Arc::new(DocumentCache::new(Arc::new(InMemorySlots::new())));
        Arc::new(
            TieredStore::new(cache)
                .with_remote(remote)
                .with_refresh_interval(INTERVAL),
        )
    }

    fn counter() -> (Arc<AtomicUsize>, impl Subscriber) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        (hits, move |_: &Document| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately_then_on_interval() {
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        let poller = Poller::new(store(remote.clone()));
        let (hits, sub) = counter();

        assert!(poller.start(sub));
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(remote.reads(), 3);
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_noop() {
        let remote = Arc::new(ScriptedRemote::empty());
        let poller = Poller::new(store(remote));
        let (_, a) = counter();
        let (_, b) = counter();
        assert!(poller.start(a));
        assert!(!poller.start(b));
        poller.shutdown().await;
        assert_eq!(poller.state(), PollerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn no_callbacks_after_stop() {
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        let poller = Poller::new(store(remote));
        let (hits, sub) = counter();

        poller.start(sub);
        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;
        let before = hits.load(Ordering::SeqCst);
        assert!(before >= 3);

        assert!(poller.stop());
        assert!(!poller.stop());
        tokio::time::sleep(INTERVAL * 5).await;
        assert!(hits.load(Ordering::SeqCst) <= before + 1);
        assert_eq!(poller.state(), PollerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_cycles_deliver_cached_copy() {
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        remote.fail_with(Some(RemoteError::Unavailable("offline".into())));
        let store = store(remote.clone());
        store.cache().write(&doc("abc", "Local"));
        let poller = Poller::new(store);
        let seen: Arc<Mutex<Vec<Document>>> = Arc::default();
        let sink = seen.clone();

        poller.start(move |d: &Document| sink.lock().unwrap().push(d.clone()));
        tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;
        assert_eq!(remote.reads(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![doc("abc", "Local"); 2]);

        remote.fail_with(None);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(seen.lock().unwrap().last(), Some(&doc("abc", "Foo")));
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn offline_with_no_cache_delivers_empty() {
        let remote = Arc::new(ScriptedRemote::empty());
        remote.fail_with(Some(RemoteError::Unavailable("offline".into())));
        let poller = Poller::new(store(remote));
        let seen: Arc<Mutex<Vec<Document>>> = Arc::default();
        let sink = seen.clone();

        poller.start(move |d: &Document| sink.lock().unwrap().push(d.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Document::new()]);
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn next_cycle_waits_for_slow_read() {
        const LATENCY: Duration = Duration::from_millis(1500);
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        remote.set_latency(LATENCY);
        let poller = Poller::new(store(remote.clone()));
        let (_, sub) = counter();

        poller.start(sub);
        tokio::time::sleep(INTERVAL * 2 + LATENCY * 3 + Duration::from_millis(10)).await;
        poller.shutdown().await;

        let starts = remote.read_starts();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= INTERVAL + LATENCY, "cycles {gap:?} apart");
            assert!(gap < INTERVAL + LATENCY + Duration::from_millis(10), "cycles {gap:?} apart");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        let poller = Poller::new(store(remote));
        let (hits, sub) = counter();
        let (_, again) = counter();

        poller.start(sub);
        poller.shutdown().await;
        assert!(poller.start(again));
        assert!(poller.is_running());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(hits.load(Ordering::SeqCst) <= 1);
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_poller_ends_loop() {
        let remote = Arc::new(ScriptedRemote::holding(doc("abc", "Foo")));
        let (hits, sub) = counter();
        {
            let poller = Poller::new(store(remote));
            poller.start(sub);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let after_drop = hits.load(Ordering::SeqCst);
        tokio::time::sleep(INTERVAL * 4).await;
        assert!(hits.load(Ordering::SeqCst) <= after_drop + 1);
    }
}
