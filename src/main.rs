//! Binary entrypoint for the arcdex CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `search <query>` - list matching items with where they are used
//! - `refs <item-id>` - every module/project/quest requiring an item
//! - `show <item-id>` - item details plus a usage summary
//! - `clear-cache` - drop cached datasets
//! - `status` - dataset sizes, cache age and load counters
//!
//! See the library crate docs for module-level details: `arcdex::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use arcdex::catalog::{Catalog, Dataset, MatchKind, MatchMode};
use arcdex::config::Config;
use arcdex::storage::CacheStore;

#[derive(Parser)]
#[command(name = "arcdex")]
#[command(about = "Look up ARC Raiders items and where they are used")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Search items by name, or by the modules/projects/quests that need them
    Search {
        /// Free-text query (empty lists every item)
        #[arg(default_value = "")]
        query: String,
        /// Maximum results to print (0 = unlimited)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Match mode: name or name-and-description
        #[arg(short, long)]
        mode: Option<MatchMode>,
    },
    /// Show every requirement that consumes an item
    Refs {
        item_id: String,
        /// Print the reference details as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show an item and a summary of where it is used
    Show { item_id: String },
    /// Remove cached datasets so the next command downloads fresh copies
    ClearCache,
    /// Show dataset sizes, cache ages and load counters
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match Config::load(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} (run `arcdex init` to create one; using defaults)", e);
            Config::default()
        }
    };
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Search { query, limit, mode } => {
            let mut search_config = config.search.clone();
            if let Some(mode) = mode {
                search_config.mode = mode;
            }
            let catalog = load_catalog(&config, search_config.matcher()).await?;
            let limit = limit.unwrap_or(search_config.limit);
            let hits = catalog.search_hits(&query);
            if hits.is_empty() {
                println!("No items match '{}'.", query);
                return Ok(());
            }
            let shown = if limit == 0 { hits.len() } else { hits.len().min(limit) };
            for hit in hits.iter().take(shown) {
                let uses = catalog.references().count_for(&hit.item.id);
                let name = hit.item.name.get_or_en(&search_config.language);
                match hit.kind {
                    MatchKind::Indirect => println!(
                        "{:<32} {:>3} uses  (needed by {})",
                        name,
                        uses,
                        hit.via.join(", ")
                    ),
                    _ => println!("{:<32} {:>3} uses", name, uses),
                }
            }
            if shown < hits.len() {
                println!("... {} more (use --limit 0 to list all)", hits.len() - shown);
            }
        }
        Commands::Refs { item_id, json } => {
            let catalog = load_catalog(&config, config.search.matcher()).await?;
            let details = catalog.references_for(&item_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&details)?);
                return Ok(());
            }
            match details {
                None => println!("'{}' is not required by any module, project or quest.", item_id),
                Some(details) => {
                    println!(
                        "{}: required {} times, {} in total",
                        item_id, details.count, details.total_quantity
                    );
                    for (label, quantity) in details.by_source() {
                        println!("  {:<48} x{}", label, quantity);
                    }
                }
            }
        }
        Commands::Show { item_id } => {
            let catalog = load_catalog(&config, config.search.matcher()).await?;
            let item = catalog
                .item(&item_id)
                .ok_or_else(|| anyhow!("no item with id '{}'", item_id))?;
            let language = &config.search.language;
            println!("{} [{}]", item.name.get_or_en(language), item.id);
            if !item.item_type.is_empty() || !item.rarity.is_empty() {
                println!("  {} / {}", item.item_type, item.rarity);
            }
            let description = item.description.get_or_en(language);
            if !description.is_empty() {
                println!("  {}", description);
            }
            println!(
                "  value {}  weight {} kg  stack {}",
                item.value, item.weight_kg, item.stack_size
            );
            if let Some(recipe) = &item.recipe {
                let parts: Vec<String> = recipe.iter().map(|(id, qty)| format!("{} x{}", id, qty)).collect();
                println!("  crafted from: {}", parts.join(", "));
            }
            if let Some(recycles) = &item.recycles_into {
                let parts: Vec<String> = recycles.iter().map(|(id, qty)| format!("{} x{}", id, qty)).collect();
                println!("  recycles into: {}", parts.join(", "));
            }
            match catalog.references_for(&item.id) {
                None => println!("  not required anywhere"),
                Some(details) => {
                    let kinds = details.source_kinds();
                    println!(
                        "  required {} times ({} total): {} module levels, {} project phases, {} quests",
                        details.count, details.total_quantity, kinds.modules, kinds.projects, kinds.quests
                    );
                }
            }
        }
        Commands::ClearCache => {
            let cache = CacheStore::from_config(&config.cache);
            cache.clear();
            info!("Cleared cached datasets");
        }
        Commands::Status => {
            let cache = CacheStore::from_config(&config.cache);
            let now = chrono::Utc::now().timestamp_millis();
            println!("Source: {}", config.source.base_url);
            for dataset in Dataset::ALL {
                match cache.fetched_at(&dataset.cache_key()) {
                    Some(at) => println!(
                        "  {:<16} cached {:.1} min ago",
                        dataset.name(),
                        (now - at).max(0) as f64 / 60_000.0
                    ),
                    None => println!("  {:<16} not cached", dataset.name()),
                }
            }
            match load_catalog(&config, config.search.matcher()).await {
                Ok(catalog) => {
                    let data = catalog.datasets();
                    println!(
                        "Loaded: {} items, {} modules, {} projects, {} quests; {} items referenced",
                        data.items.len(),
                        data.hideout_modules.len(),
                        data.projects.len(),
                        data.quests.len(),
                        catalog.references().len()
                    );
                }
                Err(e) => println!("Load failed: {}", e),
            }
            let counters = arcdex::metrics::dataset_counters_snapshot();
            for dataset in Dataset::ALL {
                if let Some(counter) = counters.get(dataset.name()) {
                    println!(
                        "  {:<16} loads {} failures {} last {} records",
                        dataset.name(),
                        counter.loads,
                        counter.failures,
                        counter.last_record_count
                    );
                }
            }
            let m = arcdex::metrics::snapshot();
            println!(
                "HTTP: {} attempts, {} retries, {} failures | cache: {} hits, {} misses, {} expired, {} io errors | {} records rejected",
                m.http_attempts,
                m.http_retries,
                m.http_failures,
                m.cache_hits,
                m.cache_misses,
                m.cache_expired,
                m.cache_io_errors,
                m.records_rejected
            );
        }
    }

    Ok(())
}

#[cfg(feature = "http")]
async fn load_catalog(config: &Config, matcher: arcdex::catalog::QueryMatcher) -> Result<Catalog> {
    use arcdex::catalog::DatasetLoader;
    let loader = DatasetLoader::from_config(config);
    match loader.load_all().await {
        Ok(datasets) => Ok(Catalog::new(datasets, matcher)),
        Err(e) => {
            error!("Failed to load datasets: {}", e);
            if e.is_retryable_load() {
                warn!("The data source looks unavailable; try again shortly.");
            }
            Err(e.into())
        }
    }
}

#[cfg(not(feature = "http"))]
async fn load_catalog(_config: &Config, _matcher: arcdex::catalog::QueryMatcher) -> Result<Catalog> {
    error!("Loading datasets requires the 'http' feature");
    Err(anyhow!("built without the 'http' feature"))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|cfg| cfg.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(file));
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
