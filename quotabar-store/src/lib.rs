// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # quotabar Store
//!
//! Configuration, report cache and aggregation for `quotabar`.
//!
//! This crate provides:
//!
//! - **Config**: JSON configuration with defaults and clamping
//! - **Cache**: TTL cache of the last aggregated report
//! - **Aggregator**: Concurrent fan-out over the provider registry
//! - **Persistence**: Atomic JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use quotabar_fetch::FetchContext;
//! use quotabar_store::{AggregateRequest, Aggregator, Cache, CacheMode, Config};
//!
//! let config = Config::load()?;
//! let cache = config.cache_settings();
//! let aggregator = Aggregator::new(
//!     FetchContext::with_settings(config.fetch_settings()),
//!     Cache::new(cache.path),
//! );
//!
//! let request = AggregateRequest::all().with_cache(CacheMode::UseIfFresh { ttl: cache.ttl });
//! let report = aggregator.run(&request).await;
//! println!("{}", report.to_json_pretty()?);
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;

pub use aggregator::{AggregateRequest, Aggregator, CacheMode};
pub use cache::{Cache, CacheEntry};
pub use config::{CacheSettings, Config, Level, Thresholds};
pub use error::StoreError;
pub use persistence::{
    cache_file, default_cache_dir, default_config_dir, default_config_path, load_json, save_json,
};

#[cfg(test)]
mod persistence_tests;
