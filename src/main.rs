use anyhow::{Context, Result};
use clap::Parser;
use curio_feed::config::Config;
use curio_feed::feed::{FeedMeta, FeedMetadataResolver, ResolveError, ResolverOptions};
use std::path::PathBuf;
use std::time::Duration;

/// Get the default config file path (~/.config/curio/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("curio")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "curio-feed",
    version,
    about = "Preview the title and description of RSS/Atom feeds"
)]
struct Args {
    /// Feed URLs to resolve
    #[arg(required = true, value_name = "URL")]
    urls: Vec<String>,

    /// Config file (defaults to ~/.config/curio/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides config; 0 disables)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Reject localhost and private IP addresses
    #[arg(long)]
    block_private_hosts: bool,

    /// Maximum number of feeds fetched at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Print one JSON object per URL instead of plain text
    #[arg(long)]
    json: bool,
}

/// Applies command-line flags on top of the config file's options.
///
/// `--timeout 0` clears any configured timeout. `--block-private-hosts`
/// can only turn blocking on.
fn apply_overrides(args: &Args, mut options: ResolverOptions) -> ResolverOptions {
    if let Some(secs) = args.timeout {
        options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if args.block_private_hosts {
        options.block_private_hosts = true;
    }
    options
}

fn print_result(url: &str, result: &Result<FeedMeta, ResolveError>, json: bool) -> Result<()> {
    if json {
        let line = match result {
            Ok(meta) => serde_json::json!({ "url": url, "feed": meta }),
            Err(e) => serde_json::json!({ "url": url, "error": e.to_string() }),
        };
        println!("{}", serde_json::to_string(&line).context("Failed to encode JSON")?);
        return Ok(());
    }

    match result {
        Ok(meta) => {
            println!("{url}");
            println!("  title:       {}", meta.title);
            if let Some(description) = &meta.description {
                println!("  description: {description}");
            }
        }
        Err(e) => eprintln!("{url}: {e}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let options = apply_overrides(&args, config.resolver_options());

    let client = config
        .build_client(&options)
        .context("Failed to build HTTP client")?;
    let resolver = FeedMetadataResolver::with_options(client, options);

    let results = resolver.resolve_many(&args.urls, args.concurrency).await;

    let mut failures = 0usize;
    for (url, result) in args.urls.iter().zip(&results) {
        if let Err(e) = result {
            failures += 1;
            tracing::warn!(url = %url, error = %e, "Failed to resolve feed");
        }
        print_result(url, result, args.json)?;
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
