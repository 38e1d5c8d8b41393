//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use csindex_core::{
    BrowseOptions, DirectOptions, ProgressReporter, export_structured, run_browser, run_direct,
};
use csindex_shared::{AppConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// csindex: download the CSI index list.
#[derive(Parser)]
#[command(
    name = "csindex",
    version,
    about = "Download the full CSI index list as JSON and spreadsheets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.csindex/csindex.toml).
    #[arg(long, global = true, env = "CSINDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download the list through the export endpoint.
    Direct {
        /// Spreadsheet path (defaults to a dated name in the output directory).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only download and parse; write no spreadsheet.
        #[arg(long)]
        no_export: bool,
    },

    /// Page through the rendered list in a headless browser.
    Browse {
        /// Spreadsheet path (defaults to a dated name in the output directory).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Stop after this many pages.
        #[arg(long)]
        max_pages: Option<u32>,

        /// Show the browser window.
        #[arg(long)]
        headed: bool,
    },

    /// Re-export a structured dump from an earlier crawl.
    Export {
        /// Structured dump (defaults to the one in the output directory).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Spreadsheet path (defaults to a dated name in the output directory).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "csindex=info",
        1 => "csindex=debug",
        _ => "csindex=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Direct { out, no_export } => {
            cmd_direct(config_path.as_deref(), out, no_export).await
        }
        Command::Browse {
            out,
            max_pages,
            headed,
        } => cmd_browse(config_path.as_deref(), out, max_pages, headed).await,
        Command::Export { input, out } => {
            cmd_export(config_path.as_deref(), input.as_deref(), out.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load the config named on the command line, or the default one.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_direct(config_path: Option<&Path>, out: Option<PathBuf>, no_export: bool) -> Result<()> {
    let config = resolve_config(config_path)?;
    let options = DirectOptions {
        output: out,
        export: !no_export,
    };

    info!(url = %config.direct.export_url, export = options.export, "downloading index list");

    let reporter = CliProgress::new();
    let report = run_direct(&config, &options, &reporter).await?;

    println!();
    println!("  Index list downloaded!");
    println!("  Rows:    {}", report.sheet.rows.len());
    println!("  Columns: {}", report.sheet.headers.join(", "));
    match &report.spreadsheet {
        Some(path) => println!("  File:    {}", path.display()),
        None if options.export => println!("  File:    (export failed, see log)"),
        None => {}
    }
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_browse(
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    max_pages: Option<u32>,
    headed: bool,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(n) = max_pages {
        config.browser.max_pages = n;
    }
    if headed {
        config.browser.headless = false;
    }
    config.validate()?;

    info!(
        url = %config.browser.list_url,
        max_pages = config.browser.max_pages,
        headless = config.browser.headless,
        "crawling index list"
    );

    let reporter = CliProgress::new();
    let report = run_browser(&config, &BrowseOptions { output: out }, &reporter).await;

    println!();
    if report.is_empty() {
        println!("  No data scraped.");
        println!();
        return Ok(());
    }

    println!("  Crawl finished ({}).", report.result.stop);
    println!("  Pages:      {}", report.result.pages_reached);
    println!("  Raw rows:   {}", report.result.raw_count());
    println!("  Indices:    {}", report.result.structured_count());
    for (label, path) in [
        ("Raw JSON:  ", &report.raw_json),
        ("JSON:      ", &report.structured_json),
        ("File:      ", &report.spreadsheet),
    ] {
        if let Some(path) = path {
            println!("  {label} {}", path.display());
        }
    }
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_export(config_path: Option<&Path>, input: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;

    match export_structured(&config.export, input, out) {
        Some(path) => {
            println!("Exported to: {}", path.display());
            Ok(())
        }
        None => Err(eyre!("nothing exported; see the log for details")),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_scraped(&self, page: u32, rows: usize, total: usize) {
        self.spinner
            .set_message(format!("Page {page}: {rows} rows ({total} total)"));
    }

    fn done(&self, _summary: &str) {
        self.spinner.finish_and_clear();
    }
}
