#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FeedError {
    #[error("Scraping events failed: {0}")]
    ScrapeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("The source `{name}` is not supported.")]
    UnknownSource { name: String },

    #[error("A scrape cycle cannot be started from inside a subscriber callback.")]
    ReentrantCycle,
}
