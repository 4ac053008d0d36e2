//! Prints one generated snapshot as JSON.
//!
//! Usage: `feed_preview [website|instagram|facebook]`

use std::sync::Arc;

use anyhow::Result;
use masjid_feed::feed::mock_source::MockEventSource;
use masjid_feed::feed::parse_source;
use masjid_feed::service::event_feed_service::DEFAULT_POLL_INTERVAL;
use masjid_feed::service::event_feed_service::EventFeedService;

#[tokio::main]
async fn main() -> Result<()> {
    let service = EventFeedService::new(Arc::new(MockEventSource::new()), DEFAULT_POLL_INTERVAL);

    let events = match std::env::args().nth(1) {
        Some(name) => service.scrape_from_source(parse_source(&name)?).await?,
        None => service.refresh_events().await?.events.to_vec(),
    };

    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
