//! tonearm CLI Entry Point
//!
//! Looks up or searches the catalog and prints the result as pretty JSON.
//! Configuration comes from `TONEARM_*` environment variables, with a few
//! command-line overrides.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tonearm_client::telemetry::{init_tracing, TelemetryConfig};
use tonearm_client::{
    build_catalog, Catalog, CatalogConfig, CatalogError, CatalogResult, RequestContext,
    SearchReleaseGroupRequest, SearchReleaseRequest,
};

#[derive(Debug, Parser)]
#[command(name = "tonearm", version, about = "Read-through client for the music catalog")]
struct Cli {
    /// Enable the filesystem cache in this directory.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Disable the in-memory cache.
    #[arg(long, global = true)]
    no_memory_cache: bool,

    /// Per-request transport timeout.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up an artist by id.
    Artist { id: String },
    /// Look up a release by id.
    Release { id: String },
    /// Look up a release group by id.
    ReleaseGroup { id: String },
    /// Search releases.
    SearchRelease(SearchReleaseArgs),
    /// Search release groups.
    SearchReleaseGroup(SearchReleaseGroupArgs),
}

#[derive(Debug, Args)]
struct SearchReleaseArgs {
    #[arg(long, default_value_t)]
    artist: String,
    #[arg(long, default_value_t)]
    title: String,
    #[arg(long, default_value_t)]
    date: String,
    #[arg(long, default_value_t)]
    format: String,
    #[arg(long, default_value_t)]
    catno: String,
    #[arg(long, default_value_t)]
    tracks: u32,
    /// Query fragment passed through verbatim.
    #[arg(long, default_value_t)]
    raw: String,
    #[arg(long, default_value_t)]
    reid: String,
    #[arg(long, default_value_t)]
    rgid: String,
}

impl From<SearchReleaseArgs> for SearchReleaseRequest {
    fn from(args: SearchReleaseArgs) -> Self {
        Self {
            raw: args.raw,
            artist_name: args.artist,
            release_name: args.title,
            release_date: args.date,
            format: args.format,
            catalog_number: args.catno,
            tracks: args.tracks,
            reid: args.reid,
            rgid: args.rgid,
        }
    }
}

#[derive(Debug, Args)]
struct SearchReleaseGroupArgs {
    #[arg(long, default_value_t)]
    artist: String,
    #[arg(long, default_value_t)]
    title: String,
    /// First release date.
    #[arg(long, default_value_t)]
    date: String,
    #[arg(long, default_value_t)]
    raw: String,
    #[arg(long, default_value_t)]
    rgid: String,
}

impl From<SearchReleaseGroupArgs> for SearchReleaseGroupRequest {
    fn from(args: SearchReleaseGroupArgs) -> Self {
        Self {
            raw: args.raw,
            artist_name: args.artist,
            release_name: args.title,
            first_release_date: args.date,
            rgid: args.rgid,
        }
    }
}

impl Cli {
    fn config(&self, mut config: CatalogConfig) -> CatalogConfig {
        if let Some(dir) = &self.cache_dir {
            config = config.with_fs_cache(dir.clone());
        }
        if self.no_memory_cache {
            config.memory_cache.capacity = 0;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn to_json<T: Serialize>(value: &T) -> CatalogResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CatalogError::client(format!("Failed to encode output: {}", e)))
}

async fn run(catalog: &dyn Catalog, ctx: &RequestContext, command: Command) -> CatalogResult<String> {
    match command {
        Command::Artist { id } => to_json(&catalog.artist(ctx, &id).await?),
        Command::Release { id } => to_json(&catalog.release(ctx, &id).await?),
        Command::ReleaseGroup { id } => to_json(&catalog.release_group(ctx, &id).await?),
        Command::SearchRelease(args) => {
            to_json(&catalog.search_release(ctx, &args.into()).await?)
        }
        Command::SearchReleaseGroup(args) => {
            to_json(&catalog.search_release_group(ctx, &args.into()).await?)
        }
    }
}

#[tokio::main]
async fn main() -> CatalogResult<()> {
    init_tracing(&TelemetryConfig::from_env())?;

    let cli = Cli::parse();
    let config = cli.config(CatalogConfig::from_env());
    let catalog = build_catalog(&config)?;

    let ctx = RequestContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling request");
            canceller.cancel();
        }
    });

    let output = run(catalog.as_ref(), &ctx, cli.command).await?;
    println!("{}", output);
    Ok(())
}
