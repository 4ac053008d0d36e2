//! Services owned by the application's composition root.

pub mod event_feed_service;
