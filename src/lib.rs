//! # Arcdex - where is this item used?
//!
//! Arcdex downloads the ARC Raiders item, hideout module, project and quest
//! datasets, validates them, and answers two questions: which items match a
//! search, and where each item is consumed (module upgrades, project phases,
//! quest hand-ins) and in what quantity.
//!
//! ## Features
//!
//! - **Resilient downloads**: exponential backoff on server and transport
//!   errors, fail-fast on client errors.
//! - **TTL cache**: datasets are reused for five minutes by default; cache
//!   storage failures never fail a load.
//! - **Boundary validation**: malformed records are dropped with a warning,
//!   wrong-shaped payloads fail the load.
//! - **Reverse index**: per-item count, total quantity and per-source
//!   breakdown.
//! - **Two-tier search**: name matches first, then items required by a
//!   matching module, project or quest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arcdex::catalog::{Catalog, DatasetLoader};
//! use arcdex::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let loader = DatasetLoader::from_config(&config);
//!     let catalog = Catalog::new(loader.load_all().await?, config.search.matcher());
//!
//!     for item in catalog.search("gear") {
//!         println!("{}", item.name.en());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`] - data model, dataset loading, reference index and search
//! - [`fetch`] - HTTP transport seam, retry policy and the resilient fetcher
//! - [`storage`] - TTL cache store and its backends
//! - [`validation`] - per-record dataset validation
//! - [`config`] - configuration loading and defaults
//! - [`metrics`] - process-wide load counters
//! - [`logutil`] - single-line log escaping
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Query Matcher  │ ← per query, no I/O
//! │ Reference Index │ ← once per load
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    Validator    │ ← per record, drop + warn
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Cache Store   │ ← TTL, best-effort backend
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │     Fetcher     │ ← retry / backoff
//! └─────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod logutil;
pub mod metrics;
pub mod storage;
pub mod validation;

pub use catalog::{build_reference_index, search};
