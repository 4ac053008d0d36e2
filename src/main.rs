//! Application entry point for masjid-feed.
//!
//! Wires the feed service, logs every broadcast and keeps refreshing until
//! Ctrl+C.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use masjid_feed::config::Config;
use masjid_feed::feed::mock_source::MockEventSource;
use masjid_feed::filter::EventFilter;
use masjid_feed::logging::setup_logging;
use masjid_feed::service::event_feed_service::EventFeedService;
use masjid_feed::subscriber::log_subscriber::LogSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;
    let _log_guard = setup_logging(&config)?;
    debug!("Loaded configuration: {config:?}");
    info!("Starting masjid-feed...");

    let service = setup_service(&config);
    setup_subscribers(&service);

    info!("Starting auto update...");
    service.start_auto_update().await;

    run(&service, init_start).await
}

fn load_config() -> Result<Config> {
    let mut config = Config::new();
    config.load()?;
    Ok(config)
}

fn setup_service(config: &Config) -> Arc<EventFeedService> {
    debug!("Setting up EventFeedService...");
    EventFeedService::new(Arc::new(MockEventSource::new()), config.poll_interval)
}

fn setup_subscribers(service: &EventFeedService) {
    debug!("Setting up Subscribers...");
    let log_subscriber = Arc::new(LogSubscriber::new(EventFilter::default()));
    service.register_subscriber(log_subscriber);
}

async fn run(service: &EventFeedService, init_start: Instant) -> Result<()> {
    info!(
        "masjid-feed is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");
    service.stop_auto_update();

    Ok(())
}
