//! # Item catalog
//!
//! Loads the four datasets (items, hideout modules, projects, quests) through
//! the cache and fetcher, validates them, and derives the reverse reference
//! index used to answer "where is this item used?".
//!
//! ```rust,no_run
//! use arcdex::catalog::{Catalog, DatasetLoader};
//! use arcdex::config::Config;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load("config.toml").await?;
//! let loader = DatasetLoader::from_config(&config);
//! let catalog = Catalog::new(loader.load_all().await?, config.search.matcher());
//! for item in catalog.search("battery") {
//!     println!("{} used {} times", item.name.en(), catalog.references().count_for(&item.id));
//! }
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod references;
pub mod search;
pub mod types;

pub use errors::{CacheIoError, CatalogError};
pub use references::{build_reference_index, ReferenceDetails, ReferenceIndex};
pub use search::{search, MatchKind, MatchMode, QueryMatcher, SearchHit};
pub use types::{
    HideoutModule, HideoutModuleLevel, Item, LocalizedText, PhaseText, Project, ProjectPhase, Quest,
    RequirementItem,
};

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::fetch::{Fetcher, HttpTransport};
use crate::logutil::escape_log;
use crate::metrics;
use crate::storage::CacheStore;
use crate::validation::{validate, DatasetRecord};

/// The four upstream resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Items,
    HideoutModules,
    Projects,
    Quests,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Items,
        Dataset::HideoutModules,
        Dataset::Projects,
        Dataset::Quests,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Items => "items",
            Dataset::HideoutModules => "hideoutModules",
            Dataset::Projects => "projects",
            Dataset::Quests => "quests",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Items => "items.json",
            Dataset::HideoutModules => "hideoutModules.json",
            Dataset::Projects => "projects.json",
            Dataset::Quests => "quests.json",
        }
    }

    pub fn cache_key(self) -> String {
        format!("arcdex:{}", self.name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append `file` to `base`, with exactly one `/` between them.
pub fn join_url(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim().trim_end_matches('/'), file.trim_start_matches('/'))
}

/// All four validated datasets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Datasets {
    pub items: Vec<Item>,
    pub hideout_modules: Vec<HideoutModule>,
    pub projects: Vec<Project>,
    pub quests: Vec<Quest>,
}

/// Fetches datasets through the cache.
pub struct DatasetLoader<T> {
    fetcher: Fetcher<T>,
    cache: CacheStore,
    base_url: String,
    ttl: Duration,
}

#[cfg(feature = "http")]
impl DatasetLoader<crate::fetch::ReqwestTransport> {
    /// Loader wired from `[source]`, `[retry]` and `[cache]`.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let transport = crate::fetch::ReqwestTransport::from_config(&config.source);
        DatasetLoader::new(
            Fetcher::new(transport, config.retry.policy()),
            CacheStore::from_config(&config.cache),
            &config.source.base_url,
            config.cache.ttl(),
        )
    }
}

impl<T: HttpTransport> DatasetLoader<T> {
    pub fn new(fetcher: Fetcher<T>, cache: CacheStore, base_url: &str, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.to_string(),
            ttl,
        }
    }

    pub fn url_for(&self, dataset: Dataset) -> String {
        join_url(&self.base_url, dataset.file_name())
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    /// Load one dataset: cache hit, or fetch + validate + store.
    pub async fn load<R>(&self, dataset: Dataset) -> Result<Vec<R>, CatalogError>
    where
        R: DatasetRecord + Serialize,
    {
        let url = self.url_for(dataset);
        let url = url.as_str();
        let fetcher = &self.fetcher;
        let result = self
            .cache
            .get_or_fetch(&dataset.cache_key(), self.ttl, move || async move {
                let raw = fetcher.fetch(url).await?;
                let validated = validate::<R>(dataset.name(), raw)?;
                metrics::add_records_rejected(validated.rejected.len());
                Ok(validated.records)
            })
            .await;

        match &result {
            Ok(records) => {
                metrics::record_dataset_loaded(dataset.name(), records.len());
                debug!("{}: {} records ready", dataset, records.len());
            }
            Err(e) => {
                metrics::record_dataset_failed(dataset.name());
                warn!("{}: load failed: {}", dataset, e);
            }
        }
        result
    }

    /// Load all four datasets concurrently. Any single failure fails the
    /// whole load; there is no partial result.
    pub async fn load_all(&self) -> Result<Datasets, CatalogError> {
        let (items, hideout_modules, projects, quests) = tokio::try_join!(
            self.load::<Item>(Dataset::Items),
            self.load::<HideoutModule>(Dataset::HideoutModules),
            self.load::<Project>(Dataset::Projects),
            self.load::<Quest>(Dataset::Quests),
        )?;
        info!(
            "Loaded {} items, {} hideout modules, {} projects, {} quests",
            items.len(),
            hideout_modules.len(),
            projects.len(),
            quests.len()
        );
        Ok(Datasets {
            items,
            hideout_modules,
            projects,
            quests,
        })
    }

    /// Forget every cached dataset so the next load hits the network.
    pub fn invalidate_all(&self) {
        for dataset in Dataset::ALL {
            self.cache.invalidate(&dataset.cache_key());
        }
    }
}

/// Loaded datasets plus the index derived from them.
#[derive(Debug, Clone)]
pub struct Catalog {
    datasets: Datasets,
    references: ReferenceIndex,
    matcher: QueryMatcher,
}

impl Catalog {
    pub fn new(datasets: Datasets, matcher: QueryMatcher) -> Self {
        let references = build_reference_index(
            &datasets.hideout_modules,
            &datasets.projects,
            &datasets.quests,
        );
        debug!("reference index covers {} items", references.len());
        Self {
            datasets,
            references,
            matcher,
        }
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    pub fn items(&self) -> &[Item] {
        &self.datasets.items
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.datasets.items.iter().find(|item| item.id == id)
    }

    pub fn references_for(&self, id: &str) -> Option<&ReferenceDetails> {
        self.references.get(id)
    }

    /// Ordered matches for `query` against every loaded dataset.
    pub fn search(&self, query: &str) -> Vec<&Item> {
        self.search_hits(query).into_iter().map(|hit| hit.item).collect()
    }

    pub fn search_hits(&self, query: &str) -> Vec<SearchHit<'_>> {
        let hits = self.matcher.hits(
            &self.datasets.items,
            query,
            Some(self.datasets.hideout_modules.as_slice()),
            Some(self.datasets.projects.as_slice()),
            Some(self.datasets.quests.as_slice()),
        );
        debug!("search '{}' -> {} results", escape_log(query), hits.len());
        hits
    }
}
