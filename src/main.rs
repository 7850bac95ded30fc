//! scrape-pipeline command line.
//!
//! ```text
//! scrape-pipeline [--config pipeline.toml] <command>
//!
//!   extract <url> --select <css> [--attr <name>] [--method GET] [--body <text>]
//!       fetch a page through the configured backend and print the matches as JSON
//!   cache init | validate | get <key> | set <key> <value> [--ttl <secs>] | delete <key>
//!       manage the SQLite response cache
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use scrape_pipeline::backend::Method;
use scrape_pipeline::cache::{Cache, SqliteCache};
use scrape_pipeline::config::{load_config, PipelineConfig};
use scrape_pipeline::dispatch::{Ctx, Dispatcher};
use scrape_pipeline::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "scrape-pipeline")]
#[command(about = "Declarative HTML extraction pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page and print the selected nodes
    Extract {
        url: String,

        /// CSS selector evaluated below the document root
        #[arg(short, long)]
        select: String,

        /// Print this attribute instead of the node's own text
        #[arg(short, long)]
        attr: Option<String>,

        #[arg(short, long, default_value = "GET")]
        method: String,

        #[arg(short, long)]
        body: Option<String>,
    },
    /// Manage the response cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Recreate the store with the expected schema
    Init,
    /// Check the store's schema
    Validate,
    Get {
        key: String,
    },
    Set {
        key: String,
        value: String,
        /// Seconds to live; 0 never expires
        #[arg(long, default_value_t = 0)]
        ttl: u64,
    },
    Delete {
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    match cli.command {
        Commands::Extract {
            url,
            select,
            attr,
            method,
            body,
        } => extract(&config, &url, select, attr, &method, body).await,
        Commands::Cache(cmd) => run_cache(&config, cmd),
    }
}

async fn extract(
    config: &PipelineConfig,
    url: &str,
    select: String,
    attr: Option<String>,
    method: &str,
    body: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let method: Method = method.parse()?;
    let dispatcher = Dispatcher::<Vec<String>>::from_config(config)?;

    dispatcher.handle(".*", move |_d, ctx, node| {
        let select = select.clone();
        let attr = attr.clone();
        Box::pin(async move {
            for hit in node.find(&select)?.iter() {
                let value = match &attr {
                    Some(name) => hit.attr(name).unwrap_or_default().to_string(),
                    None => hit.own_text(),
                };
                ctx.state.push(value);
            }
            Ok(())
        })
    })?;

    let mut ctx = Ctx::new(Vec::new());
    dispatcher.fetch_and_dispatch(method, url, &mut ctx, body).await?;

    tracing::info!(url = %url, matches = ctx.state.len(), "Extraction complete");
    println!("{}", serde_json::to_string_pretty(&ctx.state)?);
    Ok(())
}

fn run_cache(config: &PipelineConfig, cmd: CacheCommand) -> Result<(), Box<dyn Error>> {
    let path = &config.cache.path;
    let cache = match cmd {
        CacheCommand::Init | CacheCommand::Validate => SqliteCache::open(path)?,
        _ => SqliteCache::open_checked(path)?,
    };

    match cmd {
        CacheCommand::Init => {
            cache.setup()?;
            println!("initialized {}", config.cache.path.display());
        }
        CacheCommand::Validate => {
            cache.validate()?;
            println!("ok");
        }
        CacheCommand::Get { key } => match cache.get(&key) {
            Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
            Err(e) if e.is_not_found() => {
                eprintln!("{e}");
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        CacheCommand::Set { key, value, ttl } => {
            cache.set(&key, value.as_bytes(), Duration::from_secs(ttl))?;
        }
        CacheCommand::Delete { key } => {
            cache.delete(&key)?;
        }
    }

    Ok(())
}
