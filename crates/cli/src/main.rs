use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gleaner_core::{
    ExtractConfig, FetchConfig, Fetcher, HarvestConfig, Table, crawl_index, extract_article, fetch_file, fetch_stdin,
    fill_bodies,
};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the `extract` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Harvest article listings and bodies into a resumable CSV table
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version, about = "Harvest article listings and bodies into a CSV table", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Hide progress bars and status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect the index and fill missing article bodies
    Harvest(HarvestArgs),
    /// Extract the body of a single article page
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct HarvestArgs {
    /// CSV file to read and update
    #[arg(long, default_value = "articles.csv", value_name = "FILE")]
    csv: PathBuf,

    /// Skip index collection and only use rows already in the CSV
    #[arg(long)]
    no_index: bool,

    /// Only collect the index; do not fill bodies
    #[arg(long)]
    only_index: bool,

    /// Number of listing pages to scan
    #[arg(long, default_value = "117", value_name = "NUM", value_parser = clap::value_parser!(u64).range(1..))]
    pages: u64,

    /// Fill at most this many empty-body rows
    #[arg(long, value_name = "NUM")]
    limit: Option<usize>,

    /// Save the CSV after every N processed rows
    #[arg(long, value_name = "NUM", value_parser = clap::value_parser!(u64).range(1..))]
    checkpoint_every: Option<u64>,

    /// Listing root URL
    #[arg(long, default_value = "https://aps-repo.bvs.br/aps", value_name = "URL", value_parser = parse_http_url)]
    base_url: String,

    /// Pause after each fetched page, in milliseconds
    #[arg(long, default_value = "200", value_name = "MS")]
    delay_ms: u64,

    #[command(flatten)]
    http: HttpArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// URL the page came from (used when the page has no canonical link)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    http: HttpArgs,
}

#[derive(Args, Debug)]
struct HttpArgs {
    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Extra attempts per page after the first one fails
    #[arg(long, default_value = "2", value_name = "NUM")]
    retries: u32,
}

impl HttpArgs {
    fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone().unwrap_or_else(|| defaults.user_agent.clone()),
            retries: self.retries,
            ..defaults
        }
    }
}

fn parse_http_url(s: &str) -> Result<String, String> {
    let url = url::Url::parse(s).map_err(|e| format!("invalid URL '{}': {}", s, e))?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "info,gleaner_core=debug,gleaner=debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

async fn run_harvest(args: HarvestArgs, quiet: bool) -> anyhow::Result<()> {
    let total_steps = 2 + usize::from(!args.no_index) + usize::from(!args.only_index);
    let mut step = 1;

    if !quiet {
        echo::print_step(step, total_steps, &format!("Loading {}", args.csv.display().bright_white()));
    }
    let mut table =
        Table::load(&args.csv).with_context(|| format!("Failed to read table: {}", args.csv.display()))?;
    if !quiet {
        echo::print_info(&format!("{} rows loaded, {} without body", table.len(), table.pending().len()));
    }

    let config = HarvestConfig {
        list_root: args.base_url.clone(),
        pages: args.pages as usize,
        limit: args.limit,
        checkpoint_every: args.checkpoint_every.map(|n| n as usize),
        delay: Duration::from_millis(args.delay_ms),
        ..Default::default()
    };
    debug!(root = %config.list_root, pages = config.pages, limit = ?config.limit, "harvest settings");
    let fetcher = Fetcher::new(args.http.fetch_config()).context("Failed to build HTTP client")?;

    if !args.no_index {
        step += 1;
        if !quiet {
            echo::print_step(step, total_steps, &format!("Collecting index ({} pages)", config.pages));
        }
        let entries = crawl_index(&fetcher, &config, &progress_bar(quiet)?).await;
        let stats = table.merge(&entries);
        if !quiet {
            echo::print_info(&format!(
                "{} entries found, {} new rows, {} titles filled",
                entries.len(),
                stats.added,
                stats.titles_filled
            ));
        }
    }

    if !args.only_index {
        step += 1;
        if !quiet {
            echo::print_step(step, total_steps, "Filling missing bodies");
        }
        let stats = fill_bodies(&fetcher, &mut table, &config, Some(args.csv.as_path()), &progress_bar(quiet)?).await;
        if !quiet {
            echo::print_fill_summary(&stats);
        }
    }

    step += 1;
    if !quiet {
        echo::print_step(step, total_steps, "Saving table");
    }
    table.normalize();
    let rows = table
        .save(&args.csv)
        .with_context(|| format!("Failed to write table: {}", args.csv.display()))?;

    echo::print_success(&format!("CSV saved: {} ({} rows)", args.csv.display().bright_white(), rows));
    Ok(())
}

async fn run_extract(args: ExtractArgs, verbose: bool) -> anyhow::Result<()> {
    let (html, source_url) = if args.input == "-" {
        (fetch_stdin().context("Failed to read from stdin")?, args.url.clone().unwrap_or_default())
    } else if is_url(&args.input) {
        if verbose {
            echo::print_info(&format!("Fetching {}", args.input.bright_white().underline()));
        }
        let fetcher = Fetcher::new(args.http.fetch_config()).context("Failed to build HTTP client")?;
        let html = fetcher.fetch_url(&args.input).await.context("Failed to fetch URL")?;
        (html, args.url.clone().unwrap_or_else(|| args.input.clone()))
    } else {
        let html = fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
        (html, args.url.clone().unwrap_or_default())
    };

    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
    }

    let record = extract_article(&html, &source_url, &ExtractConfig::default()).context("Failed to extract article")?;

    if verbose {
        eprintln!("  {} {}", "Title:".dimmed(), record.title.bright_white());
        eprintln!("  {} {}\n", "Body:".dimmed(), format!("{} chars", record.body.chars().count()).bright_white());
    }
    if !record.has_body() {
        echo::print_warning("No article body found");
    }

    let output = match args.format {
        OutputFormat::Text => record.body.clone(),
        OutputFormat::Json => format!("{:#}", record.to_json().context("Failed to serialize article")?),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if cli.verbose {
        echo::print_banner();
    }

    match cli.command {
        Command::Harvest(args) => run_harvest(args, cli.quiet).await,
        Command::Extract(args) => run_extract(args, cli.verbose).await,
    }
}
