//! Common test utilities and mock implementations.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use masjid_feed::entity::EventRecord;
use masjid_feed::event::FeedSnapshot;
use masjid_feed::event::event_bus::Subscription;
use masjid_feed::feed::EventSource;
use masjid_feed::feed::error::FeedError;
use masjid_feed::feed::mock_source::MockEventSource;
use masjid_feed::service::event_feed_service::EventFeedService;

pub const TEST_INTERVAL: Duration = Duration::from_secs(60);

/// Service over the fixed mock generator with a short test interval.
pub fn mock_service() -> Arc<EventFeedService> {
    EventFeedService::new(Arc::new(MockEventSource::new()), TEST_INTERVAL)
}

/// Every snapshot a subscriber received, in delivery order.
pub type Received = Arc<Mutex<Vec<FeedSnapshot>>>;

/// Subscribes a callback that records each snapshot it receives.
pub fn record_snapshots(service: &EventFeedService) -> (Subscription, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    let subscription = service.subscribe(move |snapshot| {
        received_clone.lock().unwrap().push(snapshot);
        async { Ok::<(), anyhow::Error>(()) }
    });
    (subscription, received)
}

pub fn count(received: &Received) -> usize {
    received.lock().unwrap().len()
}

// SLOW SOURCE

/// Mock source whose scrape takes a configurable (tokio) time and which
/// tracks how many scrapes ran concurrently.
pub struct SlowSource {
    inner: MockEventSource,
    delay_ms: AtomicU64,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SlowSource {
    pub fn new() -> Self {
        Self {
            inner: MockEventSource::new(),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventSource for SlowSource {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn scrape(&self) -> Result<Vec<EventRecord>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.inner.generate_at(Local::now()))
    }
}
