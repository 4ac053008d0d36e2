//! Integration tests for generation and subscriber failures.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use masjid_feed::entity::EventRecord;
use masjid_feed::entity::EventSourceKind;
use masjid_feed::feed::EventSource;
use masjid_feed::feed::error::FeedError;
use masjid_feed::feed::mock_source::MockEventSource;
use masjid_feed::service::event_feed_service::EventFeedService;
use mockall::mock;
use tokio::time::sleep;

mod common;

use common::TEST_INTERVAL;

mock! {
    pub Source {}

    #[async_trait]
    impl EventSource for Source {
        fn name(&self) -> &'static str;
        async fn scrape(&self) -> Result<Vec<EventRecord>, FeedError>;
    }
}

fn scrape_error() -> FeedError {
    FeedError::ScrapeFailed(Box::new(std::io::Error::other("masjid website unreachable")))
}

fn fixed_events() -> Vec<EventRecord> {
    MockEventSource::new().generate_at(Local::now())
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_does_not_stop_timer() {
    let mut source = MockSource::new();
    let calls = AtomicUsize::new(0);
    source.expect_name().return_const("flaky");
    source.expect_scrape().times(2..).returning(move || {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(scrape_error())
        } else {
            Ok(fixed_events())
        }
    });

    let service = EventFeedService::new(Arc::new(source), TEST_INTERVAL);
    let (_sub, received) = common::record_snapshots(&service);

    service.start_auto_update().await;
    assert_eq!(common::count(&received), 0);
    assert!(service.is_auto_updating());
    assert!(service.latest().is_none());

    sleep(TEST_INTERVAL + Duration::from_millis(1)).await;
    assert_eq!(common::count(&received), 1);

    service.stop_auto_update();
}

#[tokio::test]
async fn test_refresh_surfaces_scrape_error_without_broadcast() {
    let mut source = MockSource::new();
    source.expect_name().return_const("down");
    source.expect_scrape().returning(|| Err(scrape_error()));

    let service = EventFeedService::new(Arc::new(source), TEST_INTERVAL);
    let (_sub, received) = common::record_snapshots(&service);

    let result = service.refresh_events().await;

    assert!(matches!(result, Err(FeedError::ScrapeFailed(_))));
    assert_eq!(common::count(&received), 0);

    let result = service.scrape_from_source(EventSourceKind::Website).await;
    assert!(matches!(result, Err(FeedError::ScrapeFailed(_))));
}

#[tokio::test]
async fn test_failing_subscriber_does_not_block_others() {
    let service = common::mock_service();

    service.subscribe(|_| async { Err::<(), _>(anyhow::anyhow!("render failed")) });
    service.subscribe(|snapshot| async move {
        if !snapshot.is_empty() {
            panic!("subscriber bug");
        }
        Ok::<(), anyhow::Error>(())
    });
    let (_sub, received) = common::record_snapshots(&service);

    let returned = service.refresh_events().await.expect("Refresh failed");

    assert_eq!(common::count(&received), 1);
    assert_eq!(received.lock().unwrap()[0], returned);

    service.refresh_events().await.expect("Refresh failed");
    assert_eq!(common::count(&received), 2);
}
