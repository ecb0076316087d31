//! Article fetching over a single shared HTTP session.
//!
//! This crate provides:
//! - [`Fetcher`]: visits links one at a time and keeps the pages that
//!   extract to enough readable text
//! - [`FetchProgress`]: per-page progress callback for the caller's UI

pub mod fetcher;

pub use fetcher::{FetchOutcome, FetchProgress, Fetcher, SilentFetchProgress};
