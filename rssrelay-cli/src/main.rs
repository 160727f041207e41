//! rssrelay CLI
//!
//! Runs the feed relay server and offers one-shot relay and parse commands.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rssrelay_api::{ApiConfig, ApiServer, AppState, CorsPolicy};
use rssrelay_feed::XmlFeedNormalizer;

/// rssrelay - read-through cache for RSS and Atom feeds
#[derive(Parser)]
#[command(name = "rssrelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on [default: PORT or 3000]
        #[arg(short, long)]
        port: Option<u16>,
        /// Bind address [default: BIND or 0.0.0.0]
        #[arg(short, long)]
        bind: Option<IpAddr>,
    },

    /// Relay one feed through the configured store and print the response
    Fetch {
        /// Feed URL
        url: String,
        /// Number of items [default: DEFAULT_COUNT or 25]
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Normalize a local feed file and print its items
    Parse {
        /// Path to an RSS, RDF or Atom document
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, bind).await,
        Commands::Fetch { url, count } => cmd_fetch(&url, count).await,
        Commands::Parse { file } => cmd_parse(&file),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "rssrelay=debug,info"
    } else {
        "rssrelay=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Run API server
async fn cmd_serve(port: Option<u16>, bind: Option<IpAddr>) -> Result<()> {
    let mut config = ApiConfig::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let addr = config.listen_addr();

    println!("{}", "🚀 Starting rssrelay...".cyan().bold());
    println!(
        "   {} {}",
        "Store:".dimmed(),
        if config.redis.is_some() { "redis" } else { "in-memory" }
    );
    println!(
        "   {} {}",
        "API key:".dimmed(),
        if config.api_key.is_some() { "required" } else { "not required" }
    );
    match &config.cors {
        CorsPolicy::Disabled => {}
        CorsPolicy::AllowAll => println!("   {} any origin", "CORS:".dimmed()),
        CorsPolicy::AllowList(origins) => {
            println!("   {} {}", "CORS:".dimmed(), origins.join(", "))
        }
    }

    let server = ApiServer::from_config(config)
        .await
        .context("Failed to start relay")?;

    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    server.run(addr).await.context("Server error")?;

    Ok(())
}

/// Relay a single feed
async fn cmd_fetch(url: &str, count: Option<usize>) -> Result<()> {
    let config = ApiConfig::from_env();
    let state = AppState::from_config(config)
        .await
        .context("Failed to set up relay")?;

    let response = state
        .relay
        .relay_url(url, count)
        .await
        .with_context(|| format!("Failed to relay {}", url))?;

    debug!(items = response.items.len(), cached = response.from_cache, "Relay finished");
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Parse a local feed file
fn cmd_parse(path: &Path) -> Result<()> {
    let raw = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let feed = XmlFeedNormalizer::new()
        .parse(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    println!(
        "{} {} ({} items)",
        "📰 Dialect:".cyan().bold(),
        feed.dialect,
        feed.items.len()
    );

    if feed.items.is_empty() {
        println!("\n{}", "No items in feed.".yellow());
        return Ok(());
    }

    for (idx, item) in feed.items.iter().enumerate() {
        println!("\n{} {}", format!("{:>3}.", idx + 1).dimmed(), item.title.bold());
        println!("     {} {}", "Link:".dimmed(), item.link);
        match &item.published {
            Some(published) => println!("     {} {}", "Published:".dimmed(), published),
            None => println!("     {} {}", "Published:".dimmed(), "unknown".yellow()),
        }
    }

    Ok(())
}
