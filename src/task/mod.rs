//! Background tasks for feed polling.

pub mod feed_publisher;
