use std::sync::Weak;
use std::time::Duration;

use log::debug;
use log::info;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::service::event_feed_service::EventFeedService;

/// Repeating timer that runs a scrape cycle on the feed service every
/// `poll_interval`, starting one interval after it is spawned.
///
/// Holds only a weak reference to the service, so the loop ends on its own
/// once the service is dropped.
pub struct FeedPublisher {
    epoch: u64,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl FeedPublisher {
    /// Spawns the check loop. Must be called from within a tokio runtime.
    pub fn spawn(service: Weak<EventFeedService>, poll_interval: Duration, epoch: u64) -> Self {
        info!(
            "Starting FeedPublisher #{} with poll interval {:?}",
            epoch, poll_interval
        );
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(Self::check_loop(service, poll_interval, epoch, stop_rx));

        Self {
            epoch,
            stop_tx: Some(stop_tx),
            handle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the loop to exit. A cycle already running is left to finish.
    pub fn stop(mut self) {
        info!("Stopping FeedPublisher #{}.", self.epoch);
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    async fn check_loop(
        service: Weak<EventFeedService>,
        poll_interval: Duration,
        epoch: u64,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = interval.tick() => {}
            }

            let Some(service) = service.upgrade() else {
                debug!("Feed service dropped, ending FeedPublisher #{epoch}.");
                break;
            };
            service.run_timer_cycle(epoch).await;
        }

        debug!("FeedPublisher #{epoch} check loop ended.");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::feed::mock_source::MockEventSource;

    #[tokio::test(start_paused = true)]
    async fn test_loop_ends_when_service_dropped() {
        let service = EventFeedService::new(
            Arc::new(MockEventSource::new()),
            Duration::from_secs(60),
        );
        let publisher = FeedPublisher::spawn(Arc::downgrade(&service), Duration::from_secs(60), 1);
        drop(service);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(publisher.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_loop() {
        let service = EventFeedService::new(
            Arc::new(MockEventSource::new()),
            Duration::from_secs(60),
        );
        let publisher = FeedPublisher::spawn(Arc::downgrade(&service), Duration::from_secs(60), 1);
        let loop_handle = publisher.handle.abort_handle();

        publisher.stop();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(loop_handle.is_finished());
    }
}
