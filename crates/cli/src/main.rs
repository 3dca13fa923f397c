use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use colligo_core::{
    ConfigLoader, Document, Entry, ExtractConfig, Feed, FetchOptions, Fetcher, Pipeline, ReqwestFetcher,
    RewriteConfig, Rewriter, RuleTables, ScrapeConfig, Scraper, User, extract_content_with_config, fetch_file,
    fetch_stdin, is_kept,
};
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{
    format_size, print_banner, print_extraction_details, print_info, print_step, print_success, print_timing_summary,
    print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for page content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: html, text, json", s)),
        }
    }
}

/// Extract, scrape, rewrite and filter feed entry content
#[derive(Parser, Debug)]
#[command(name = "colligo")]
#[command(author = "Colligo Contributors")]
#[command(version)]
#[command(about = "Feed entry content pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Rules file layered over the compiled-in site rules
    #[arg(long, global = true, value_name = "FILE")]
    rules_file: Option<PathBuf>,

    /// Ignore the compiled-in site rules
    #[arg(long, global = true)]
    no_predefined: bool,

    /// Enable verbose output with debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the main content of a page with readability
    Extract(ExtractArgs),
    /// Fetch a page and extract it with site rules, following link-only pages
    Scrape(ScrapeArgs),
    /// Apply rewrite rules to entry content
    Rewrite(RewriteArgs),
    /// Drop entries rejected by feed and user filter rules
    Filter(FilterArgs),
    /// Run filter, scrape and rewrite over a feed's entries
    Process(ProcessArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Cookie header sent with requests
    #[arg(long, value_name = "COOKIE")]
    cookie: Option<String>,
}

impl FetchArgs {
    fn options(&self) -> FetchOptions {
        let mut options = FetchOptions { timeout: self.timeout, cookie: self.cookie.clone(), ..Default::default() };
        if let Some(user_agent) = &self.user_agent {
            options.user_agent = user_agent.clone();
        }
        options
    }
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, text, json)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: OutputFormat,

    /// Minimum text length for a paragraph to be scored
    #[arg(long, default_value = "25", value_name = "NUM")]
    min_text_length: usize,

    /// Maximum number of elements scored before the rest are ignored
    #[arg(long, default_value = "10000", value_name = "NUM")]
    max_elements: usize,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Page URL
    #[arg(value_name = "URL")]
    url: String,

    /// CSS selector used instead of the site rules
    #[arg(short, long, default_value = "", value_name = "SELECTOR")]
    selector: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (html, text, json)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: OutputFormat,

    /// Maximum number of link-only pages to follow
    #[arg(long, default_value = "3", value_name = "NUM")]
    max_hops: usize,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct RewriteArgs {
    /// Entry content file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Entry URL, used to pick site rules and resolve relative links
    #[arg(short, long, value_name = "URL")]
    url: String,

    /// Entry title
    #[arg(short, long, default_value = "", value_name = "TITLE")]
    title: String,

    /// Rewrite rules used instead of the site rules
    #[arg(short, long, default_value = "", value_name = "RULES")]
    rules: String,

    /// Print the entry as JSON instead of the rewritten content
    #[arg(long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EntrySource {
    /// JSON array of entries, newest first
    #[arg(long, value_name = "FILE")]
    entries: PathBuf,

    /// JSON feed settings
    #[arg(long, value_name = "FILE")]
    feed: Option<PathBuf>,

    /// JSON user filter rules
    #[arg(long, value_name = "FILE")]
    user: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[command(flatten)]
    source: EntrySource,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    #[command(flatten)]
    source: EntrySource,

    /// Entry URL already stored; such entries are not scraped again
    #[arg(long = "known", value_name = "URL")]
    known: Vec<String>,

    /// Proxy for feeds that are fetched via proxy
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    #[command(flatten)]
    fetch: FetchArgs,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn load_tables(cli: &Cli) -> anyhow::Result<RuleTables> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.rules_file {
        loader = loader.with_path(path);
    }
    if cli.no_predefined {
        loader = loader.without_predefined();
    }
    let tables = loader.load().context("Failed to load rules")?;
    debug!(scraper = tables.scraper_len(), rewrite = tables.rewrite_len(), "Loaded rule tables");
    Ok(tables)
}

async fn read_input(input: &str, options: &FetchOptions) -> anyhow::Result<String> {
    if input == "-" {
        fetch_stdin().context("Failed to read from stdin")
    } else if input.starts_with("http://") || input.starts_with("https://") {
        let response = ReqwestFetcher::new().fetch(input, options).await.context("Failed to fetch URL")?;
        if response.status >= 400 {
            anyhow::bail!("{} returned HTTP {}", response.effective_url, response.status);
        }
        Ok(response.body)
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn read_json<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn render(content: &str, base_url: Option<&str>, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Html => content.to_string(),
        OutputFormat::Text => Document::parse_fragment(content).body().map(|body| body.text().trim().to_string()).unwrap_or_default(),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "base_url": base_url,
            "content": content,
        }))
        .context("Failed to serialize output")?,
    })
}

async fn run_extract(args: ExtractArgs, verbose: bool) -> anyhow::Result<()> {
    let total = Instant::now();
    let mut timings = Vec::new();

    if verbose {
        print_step(1, 3, &format!("Reading {}", args.input.bright_white()));
    }
    let started = Instant::now();
    let html = read_input(&args.input, &args.fetch.options()).await?;
    timings.push(("Read".to_string(), started.elapsed()));
    if verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), format_size(html.len()).bright_white());
        print_step(2, 3, "Extracting content");
    }

    let config = ExtractConfig::builder()
        .min_text_length(args.min_text_length)
        .max_scored_elements(args.max_elements)
        .build();
    let started = Instant::now();
    let extracted = extract_content_with_config(&html, &config);
    timings.push(("Extract".to_string(), started.elapsed()));

    if verbose {
        print_extraction_details(&extracted);
        print_step(3, 3, "Writing output");
        print_timing_summary(total.elapsed(), &timings);
    }

    let output = render(&extracted.content, extracted.base_url.as_deref(), args.format)?;
    write_output(args.output.as_deref(), &output)
}

async fn run_scrape(args: ScrapeArgs, tables: &RuleTables, verbose: bool) -> anyhow::Result<()> {
    let fetcher = ReqwestFetcher::new();
    let config = ScrapeConfig { max_hops: args.max_hops, fetch: args.fetch.options(), ..Default::default() };
    let scraper = Scraper::new(&fetcher, tables, config);

    if verbose {
        print_step(1, 2, &format!("Scraping {}", args.url.bright_white().underline()));
    }
    let started = Instant::now();
    let page = scraper
        .scrape_website(&args.url, &args.selector)
        .await
        .with_context(|| format!("Failed to scrape {}", args.url))?;

    if verbose {
        eprintln!("  {} {}", "Base URL:".dimmed(), page.base_url.bright_white());
        eprintln!("  {} {}\n", "Content:".dimmed(), format_size(page.content.len()).bright_white());
        print_step(2, 2, "Writing output");
        print_timing_summary(started.elapsed(), &[]);
    }

    let output = render(&page.content, Some(&page.base_url), args.format)?;
    write_output(args.output.as_deref(), &output)
}

fn run_rewrite(args: RewriteArgs, tables: &RuleTables, verbose: bool) -> anyhow::Result<()> {
    let content = if args.input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
    };

    let rewriter = Rewriter::new(tables, RewriteConfig::default());
    if verbose {
        let names: Vec<String> = rewriter.resolve_rules(&args.url, &args.rules).into_iter().map(|r| r.name).collect();
        print_info(&format!("Rules: {}", if names.is_empty() { "(none)".to_string() } else { names.join(", ") }));
    }

    let mut entry = Entry::new(args.url.as_str(), args.title, content);
    rewriter.rewrite(&args.url, &mut entry, &args.rules);

    let output = if args.json {
        serde_json::to_string_pretty(&entry).context("Failed to serialize entry")?
    } else {
        entry.content
    };
    write_output(args.output.as_deref(), &output)
}

fn load_entries(source: &EntrySource) -> anyhow::Result<(Vec<Entry>, Feed, User)> {
    let text = fs::read_to_string(&source.entries)
        .with_context(|| format!("Failed to read file: {}", source.entries.display()))?;
    let entries: Vec<Entry> =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", source.entries.display()))?;
    let feed: Feed = read_json(source.feed.as_deref())?;
    let user: User = read_json(source.user.as_deref())?;
    Ok((entries, feed, user))
}

fn write_entries(source: &EntrySource, entries: &[Entry]) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(entries).context("Failed to serialize entries")?;
    write_output(source.output.as_deref(), &output)
}

fn run_filter(args: &FilterArgs, verbose: bool) -> anyhow::Result<()> {
    let (entries, feed, user) = load_entries(&args.source)?;
    let total = entries.len();
    let kept: Vec<Entry> = entries.into_iter().filter(|entry| is_kept(&feed, entry, &user)).collect();

    if verbose {
        print_info(&format!("Kept {} of {} entries", kept.len(), total));
    }
    write_entries(&args.source, &kept)
}

async fn run_process(args: &ProcessArgs, tables: &RuleTables, verbose: bool) -> anyhow::Result<()> {
    let (entries, feed, user) = load_entries(&args.source)?;
    let total = entries.len();

    if verbose && feed.crawler && args.proxy.is_none() && feed.fetch_via_proxy {
        print_warning("Feed asks for a proxy but none was given; fetching directly");
    }

    let fetcher = ReqwestFetcher::new();
    let config = ScrapeConfig { fetch: args.fetch.options(), proxy_url: args.proxy.clone(), ..Default::default() };
    let pipeline = Pipeline::new(&fetcher, tables, config, RewriteConfig::default());

    let started = Instant::now();
    let processed = pipeline
        .process_feed_entries(&feed, &user, entries, |entry| !args.known.contains(&entry.url))
        .await;

    if verbose {
        print_info(&format!("Kept {} of {} entries", processed.len(), total));
        print_timing_summary(started.elapsed(), &[]);
    }
    write_entries(&args.source, &processed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let tables = match &cli.command {
        Command::Scrape(_) | Command::Rewrite(_) | Command::Process(_) => load_tables(&cli)?,
        _ => RuleTables::new(),
    };

    let verbose = cli.verbose;
    match cli.command {
        Command::Extract(args) => run_extract(args, verbose).await,
        Command::Scrape(args) => run_scrape(args, &tables, verbose).await,
        Command::Rewrite(args) => run_rewrite(args, &tables, verbose),
        Command::Filter(args) => run_filter(&args, verbose),
        Command::Process(args) => run_process(&args, &tables, verbose).await,
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "colligo", &mut io::stdout());
            Ok(())
        }
    }
}
