use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cache::{
    FeedStore, FileBackedFeedStore, LocalFeedLoader, SqliteFeedStore,
};
use crate::config::{CacheBackend, Config};
use crate::error::{Error, Result};
use crate::loader::{FeedLoader, FeedLoaderCacheDecorator, FeedLoaderWithFallback};
use crate::remote::{http_client, RemoteFeedLoader};

#[derive(Parser)]
#[command(name = "feedvault")]
#[command(about = "Image feed fetcher with a durable offline cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FEEDVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Remote feed URL
        feed_url: String,
    },

    /// Fetch the feed, falling back to the local cache when offline
    Fetch,

    /// Show whatever the local cache currently holds
    Show,

    /// Evict the cached feed if it is stale or unreadable
    Validate,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.debug, self.verbose);

        match self.command {
            Commands::Init { feed_url } => init(feed_url, self.config),
            Commands::Fetch => fetch(load_config(self.config)?).await,
            Commands::Show => show(load_config(self.config)?).await,
            Commands::Validate => validate(load_config(self.config)?).await,
        }
    }
}

fn init_logging(debug: bool, verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn config_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => {
            let base = dirs::config_dir()
                .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?;
            Ok(base.join("feedvault").join("config.toml"))
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load_with_env(config_path(path)?)
}

fn init(feed_url: String, path: Option<PathBuf>) -> Result<()> {
    let config = Config::new(&feed_url);
    config.validate()?;

    let path = config_path(path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(&path)?;

    println!("Wrote {}", path.display());
    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn FeedStore>> {
    std::fs::create_dir_all(&config.cache.directory)?;

    Ok(match config.cache.backend {
        CacheBackend::File => Arc::new(FileBackedFeedStore::new(config.snapshot_path())),
        CacheBackend::Sqlite => Arc::new(SqliteFeedStore::open(config.database_path())?),
    })
}

fn local_loader(config: &Config) -> Result<Arc<LocalFeedLoader<Arc<dyn FeedStore>>>> {
    Ok(Arc::new(LocalFeedLoader::new(open_store(config)?)))
}

async fn fetch(config: Config) -> Result<()> {
    let local = local_loader(&config)?;
    let client = http_client(config.timeout(), &config.remote.user_agent)?;
    let remote = RemoteFeedLoader::new(client, config.feed_url()?);

    let loader = FeedLoaderWithFallback::new(
        FeedLoaderCacheDecorator::new(remote, Arc::clone(&local)),
        Arc::clone(&local),
    );

    let feed = loader.load().await?;
    info!(images = feed.len(), "feed loaded");
    print_feed(&feed);

    // The cache write behind a successful remote load is detached; give it
    // a moment to land before the runtime shuts down.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

async fn show(config: Config) -> Result<()> {
    let feed = local_loader(&config)?.load().await?;
    print_feed(&feed);
    Ok(())
}

async fn validate(config: Config) -> Result<()> {
    local_loader(&config)?.validate_cache().await;
    Ok(())
}

fn print_feed(feed: &[crate::feed::FeedImage]) {
    if feed.is_empty() {
        println!("(no images)");
        return;
    }

    for image in feed {
        let description = image.description.as_deref().unwrap_or("-");
        let location = image.location.as_deref().unwrap_or("-");
        println!("{}  {}  {}  {}", image.id, description, location, image.url);
    }
}
