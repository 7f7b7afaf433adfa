//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site mapper.

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use sitemapper::config::{effective_config_hash, load_config_with_hash, Config};
use sitemapper::output::{renderer_for, CrawlStatistics};
use sitemapper::storage::{open_storage, Storage};
use sitemapper::{Crawler, OutputFormat, Sitemap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sitemapper: a breadth-first site mapper
///
/// Sitemapper starts at a root URL, follows links within the site breadth
/// first, and writes a sitemap with page titles and summaries as an HTML
/// list, plain text, a collapsible tree, or an XML link graph.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "A breadth-first site mapper", long_about = None)]
struct Cli {
    /// Root URL to start from
    #[arg(value_name = "ROOT_URL")]
    root_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum link depth from the root (default: unlimited)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Output format: html, text, js, or xml
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Write output to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum summary length in characters
    #[arg(long, value_name = "CHARS")]
    summary_length: Option<usize>,

    /// Request timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Proxy URL for all requests
    #[arg(long, value_name = "URL", conflicts_with = "no_proxy")]
    proxy: Option<String>,

    /// Ignore proxy settings, including environment variables
    #[arg(long)]
    no_proxy: bool,

    /// Username for HTTP basic authentication
    #[arg(short, long)]
    user: Option<String>,

    /// Password for HTTP basic authentication
    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Maximum simultaneous requests
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Minimum delay between requests to the same host, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Retries for transient failures
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Stop issuing requests after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Do not fetch or obey robots.txt
    #[arg(long)]
    no_robots: bool,

    /// User-Agent header to send
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Save the finished sitemap to this SQLite database
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Render the latest sitemap stored in this database instead of crawling
    #[arg(long, value_name = "FILE", conflicts_with = "database")]
    from_db: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    let sitemap = match &cli.from_db {
        Some(path) => load_stored(path)?,
        None => {
            if config.crawler.root_url.is_none() {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "a root URL is required (as ROOT_URL or root-url in the config file)",
                    )
                    .exit();
            }
            handle_crawl(&config).await?
        }
    };

    write_output(&config, &sitemap)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the rendered sitemap.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=warn,warn"),
            1 => EnvFilter::new("sitemapper=info,warn"),
            2 => EnvFilter::new("sitemapper=debug,info"),
            _ => EnvFilter::new("sitemapper=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges the config file (if any) with command-line flags
///
/// Flags win over file values.
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::debug!("Loaded {} (hash: {})", path.display(), hash);
            config
        }
        None => Config::default(),
    };

    let crawler = &mut config.crawler;
    if let Some(root) = &cli.root_url {
        crawler.root_url = Some(root.clone());
    }
    if let Some(depth) = cli.depth {
        crawler.max_depth = Some(depth);
    }
    if let Some(length) = cli.summary_length {
        crawler.summary_length = length;
    }
    if let Some(concurrency) = cli.concurrency {
        crawler.max_concurrent_fetches = concurrency;
    }
    if let Some(delay) = cli.delay {
        crawler.politeness_delay_ms = delay;
    }
    if let Some(retries) = cli.retries {
        crawler.max_retries = retries;
    }
    if let Some(deadline) = cli.deadline {
        crawler.deadline_secs = Some(deadline);
    }
    if cli.no_robots {
        crawler.respect_robots = false;
    }

    let http = &mut config.http;
    if let Some(timeout) = cli.timeout {
        http.timeout_ms = timeout;
    }
    if let Some(proxy) = &cli.proxy {
        http.proxy = Some(proxy.clone());
        http.no_proxy = false;
    }
    if cli.no_proxy {
        http.no_proxy = true;
    }
    if let Some(user) = &cli.user {
        http.username = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        http.password = Some(password.clone());
    }
    if let Some(agent) = &cli.user_agent {
        http.user_agent = agent.clone();
    }

    let output = &mut config.output;
    if let Some(format) = cli.format {
        output.format = format;
    }
    if let Some(path) = &cli.output {
        output.path = Some(path.display().to_string());
    }
    if let Some(path) = &cli.database {
        output.database_path = Some(path.display().to_string());
    }

    Ok(config)
}

/// Crawls, logs statistics, and optionally persists the result
async fn handle_crawl(config: &Config) -> anyhow::Result<Sitemap> {
    let config_hash = effective_config_hash(config);
    let mut crawler = Crawler::new(config.clone()).context("Failed to start crawl")?;

    // Ctrl-C stops new requests; the partial sitemap is still written
    let token = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            token.cancel();
        }
    });

    let sitemap = crawler.run().await.context("Crawl failed")?;
    CrawlStatistics::from_sitemap(&sitemap).log();

    if let Some(path) = &config.output.database_path {
        let mut storage = open_storage(Path::new(path))
            .with_context(|| format!("Failed to open database {}", path))?;
        storage
            .save_sitemap(&sitemap, &config_hash)
            .with_context(|| format!("Failed to save sitemap to {}", path))?;
    }

    Ok(sitemap)
}

/// Loads the latest sitemap stored in a database
fn load_stored(path: &Path) -> anyhow::Result<Sitemap> {
    let storage =
        open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))?;
    let sitemap = storage
        .load_latest_sitemap()
        .with_context(|| format!("Failed to load sitemap from {}", path.display()))?;
    tracing::info!("Loaded sitemap of {} from {}", sitemap.root().url, path.display());
    Ok(sitemap)
}

/// Renders the sitemap to the output file or stdout
fn write_output(config: &Config, sitemap: &Sitemap) -> anyhow::Result<()> {
    let renderer = renderer_for(config.output.format);

    match &config.output.path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
            let mut writer = BufWriter::new(file);
            renderer
                .render(sitemap, &mut writer)
                .with_context(|| format!("Failed to write {}", path))?;
            writer.flush().with_context(|| format!("Failed to write {}", path))?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            renderer
                .render(sitemap, &mut writer)
                .context("Failed to write to stdout")?;
            writer.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
