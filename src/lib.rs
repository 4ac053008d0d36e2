//! masjid-feed - Community event feed for masjids.
//!
//! This crate provides:
//! - A fixed event generator standing in for masjid website and social media scraping
//! - [`service::event_feed_service::EventFeedService`], which broadcasts full
//!   snapshots to subscribers on a timer and on demand
//! - Consumer-side filtering of received snapshots

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod service;
pub mod subscriber;
pub mod task;
