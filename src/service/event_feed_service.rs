//! Shared source of truth for the latest known event collection.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use log::debug;
use log::error;
use log::info;
use log::warn;
use tracing::instrument;

use crate::entity::EventRecord;
use crate::entity::EventSourceKind;
use crate::event::CycleTrigger;
use crate::event::FeedSnapshot;
use crate::event::event_bus;
use crate::event::event_bus::EventBus;
use crate::event::event_bus::Subscription;
use crate::feed::EventSource;
use crate::feed::error::FeedError;
use crate::feed::filter_by_source;
use crate::feed::mock_source::MockEventSource;
use crate::subscriber::Subscriber;
use crate::task::feed_publisher::FeedPublisher;

/// Interval between timer-driven scrape cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);

static INSTANCE: OnceLock<Arc<EventFeedService>> = OnceLock::new();

/// Generates the event feed, keeps subscribers up to date on a timer, and
/// serves manual refreshes and per-source pulls.
///
/// Scrape cycles never overlap: manual cycles wait for the one in flight,
/// timer ticks that find one in flight are skipped. Snapshots are therefore
/// broadcast in the order they were produced.
pub struct EventFeedService {
    source: Arc<dyn EventSource>,
    poll_interval: Duration,
    event_bus: EventBus<FeedSnapshot>,
    cycle_lock: tokio::sync::Mutex<()>,
    sequence: AtomicU64,
    latest: RwLock<Option<FeedSnapshot>>,
    publisher: Mutex<Option<FeedPublisher>>,
    next_epoch: AtomicU64,
}

impl EventFeedService {
    pub fn new(source: Arc<dyn EventSource>, poll_interval: Duration) -> Arc<Self> {
        info!(
            "Initializing EventFeedService with source `{}` and poll interval {:?}",
            source.name(),
            poll_interval
        );
        Arc::new(Self {
            source,
            poll_interval,
            event_bus: EventBus::new(),
            cycle_lock: tokio::sync::Mutex::new(()),
            sequence: AtomicU64::new(0),
            latest: RwLock::new(None),
            publisher: Mutex::new(None),
            next_epoch: AtomicU64::new(1),
        })
    }

    /// Process-wide default service backed by the mock source, built on first
    /// access. Applications that wire their own service through `new` do not
    /// need this.
    pub fn instance() -> Arc<Self> {
        INSTANCE
            .get_or_init(|| Self::new(Arc::new(MockEventSource::new()), DEFAULT_POLL_INTERVAL))
            .clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Arms the repeating timer, then runs one cycle right away.
    ///
    /// Any timer already armed is cancelled first, so calling this twice
    /// leaves exactly one timer running. The timer is armed before the
    /// initial cycle, so a `stop_auto_update` issued while that cycle runs
    /// (including from a subscriber callback) disarms it for good.
    ///
    /// Inside a subscriber callback the initial cycle is skipped; the timer
    /// still fires one interval later.
    pub async fn start_auto_update(self: &Arc<Self>) {
        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst);
        let publisher = FeedPublisher::spawn(Arc::downgrade(self), self.poll_interval, epoch);
        let replaced = self.lock_publisher().replace(publisher);
        if let Some(old) = replaced {
            old.stop();
        }

        match self.scrape_and_notify(CycleTrigger::Initial).await {
            Ok(_) => {}
            Err(FeedError::ReentrantCycle) => {
                warn!("Auto update started from a subscriber, skipping initial cycle.");
            }
            Err(e) => error!("Error scraping events: {e}"),
        }
    }

    /// Cancels the repeating timer. No-op when none is armed.
    pub fn stop_auto_update(&self) {
        let publisher = self.lock_publisher().take();
        if let Some(publisher) = publisher {
            publisher.stop();
        }
    }

    pub fn is_auto_updating(&self) -> bool {
        self.lock_publisher().is_some()
    }

    /// Registers `callback` for every future broadcast. The current snapshot
    /// is not replayed.
    pub fn subscribe<F, Fut>(&self, callback: F) -> Subscription
    where
        F: Fn(FeedSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let subscription = self.event_bus.register_callback(callback);
        debug!("Registered feed subscriber #{}.", subscription.id());
        subscription
    }

    pub fn register_subscriber<S>(&self, subscriber: Arc<S>) -> Subscription
    where
        S: Subscriber<FeedSnapshot> + Send + Sync + 'static,
    {
        let subscription = self.event_bus.register_subscriber(subscriber);
        debug!("Registered feed subscriber #{}.", subscription.id());
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_bus.subscriber_count()
    }

    /// Runs a cycle outside the timer schedule, broadcasts it, and returns
    /// the same snapshot. The timer schedule is left untouched.
    ///
    /// Returns [`FeedError::ReentrantCycle`] when called from a subscriber
    /// callback. That check only sees the publishing task: a callback that
    /// spawns a task calling this and then awaits it deadlocks on the cycle
    /// lock. Spawn without awaiting instead.
    pub async fn refresh_events(&self) -> Result<FeedSnapshot, FeedError> {
        info!("Manual refresh requested...");
        self.scrape_and_notify(CycleTrigger::Manual).await
    }

    /// Freshly generates the feed and keeps only records from `source`.
    /// Nothing is broadcast and the latest snapshot is not replaced.
    pub async fn scrape_from_source(
        &self,
        source: EventSourceKind,
    ) -> Result<Vec<EventRecord>, FeedError> {
        if event_bus::is_publishing() {
            return Err(FeedError::ReentrantCycle);
        }
        let _cycle = self.cycle_lock.lock().await;

        debug!("Scraping events from {source} only.");
        let events = self.source.scrape().await?;
        Ok(filter_by_source(&events, source))
    }

    /// Last broadcast snapshot, if any cycle has completed.
    pub fn latest(&self) -> Option<FeedSnapshot> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Records from `source` in the last broadcast snapshot.
    pub fn latest_from_source(&self, source: EventSourceKind) -> Vec<EventRecord> {
        self.latest()
            .map(|snapshot| filter_by_source(&snapshot.events, source))
            .unwrap_or_default()
    }

    pub(crate) async fn run_timer_cycle(&self, epoch: u64) {
        let Ok(_cycle) = self.cycle_lock.try_lock() else {
            debug!("Previous scrape cycle still running, skipping tick.");
            return;
        };
        let armed = self
            .lock_publisher()
            .as_ref()
            .is_some_and(|publisher| publisher.epoch() == epoch);
        if !armed {
            debug!("FeedPublisher #{epoch} is no longer armed, skipping tick.");
            return;
        }

        if let Err(e) = self.run_cycle(CycleTrigger::Timer).await {
            error!("Error scraping events: {e}");
        }
    }

    async fn scrape_and_notify(&self, trigger: CycleTrigger) -> Result<FeedSnapshot, FeedError> {
        if event_bus::is_publishing() {
            return Err(FeedError::ReentrantCycle);
        }
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle(trigger).await
    }

    /// Generates and broadcasts one snapshot. Callers hold `cycle_lock`.
    #[instrument(skip_all, fields(trigger = %trigger))]
    async fn run_cycle(&self, trigger: CycleTrigger) -> Result<FeedSnapshot, FeedError> {
        info!(
            "Scraping events from `{}` ({trigger} cycle)...",
            self.source.name()
        );
        let events = self.source.scrape().await?;

        let snapshot = FeedSnapshot {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            trigger,
            generated_at: Utc::now(),
            events: Arc::from(events),
        };
        info!(
            "Found {} events, broadcasting snapshot #{}.",
            snapshot.len(),
            snapshot.sequence
        );

        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());

        let report = self.event_bus.publish(snapshot.clone()).await;
        debug!(
            "Snapshot #{} delivered to {} subscribers ({} failed).",
            snapshot.sequence, report.delivered, report.failed
        );

        Ok(snapshot)
    }

    fn lock_publisher(&self) -> std::sync::MutexGuard<'_, Option<FeedPublisher>> {
        self.publisher.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for EventFeedService {
    fn drop(&mut self) {
        self.stop_auto_update();
    }
}
