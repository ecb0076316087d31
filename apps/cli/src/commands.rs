//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use newsbrief_core::{
    DeliveryStatus, Dispatcher, OllamaClient, Pipeline, ProgressReporter, RunOptions, RunReport,
};
use newsbrief_links::SpreadsheetLinks;
use newsbrief_mailer::SmtpMailer;
use newsbrief_shared::{
    AppConfig, MailSettings, init_config, init_config_at, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// newsbrief: turn a spreadsheet of links into an emailed AI briefing.
#[derive(Parser)]
#[command(
    name = "newsbrief",
    version,
    about = "Fetch the articles listed in a spreadsheet, summarize them with a local model, and email the briefing.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.newsbrief/newsbrief.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Spreadsheet of links; overrides `[input] path`.
    #[arg(long)]
    pub links: Option<PathBuf>,

    /// Print the briefing instead of sending it.
    #[arg(long)]
    pub dry_run: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Optional subcommands. Without one, a single briefing run is performed.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
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
        0 => "newsbrief=info",
        1 => "newsbrief=debug",
        _ => "newsbrief=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Init never reads the existing file, so it can replace a broken one.
        Some(Command::Config {
            action: ConfigAction::Init,
        }) => cmd_config_init(cli.config.as_deref()),
        Some(Command::Config {
            action: ConfigAction::Show,
        }) => cmd_config_show(&resolve_config(cli.config.as_deref())?),
        None => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_run(config, cli.links, cli.dry_run).await
        }
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn cmd_run(config: AppConfig, links: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let links_path = links.unwrap_or_else(|| config.input.path.clone());
    let settings = MailSettings::from_env(&config.mail);

    info!(
        links = %links_path.display(),
        model = %config.model.name,
        dry_run,
        "starting briefing"
    );

    let pipeline = Pipeline::new(
        SpreadsheetLinks::new(links_path, config.input.url_column.clone()),
        config.fetch.clone(),
        OllamaClient::new(&config.model),
        Dispatcher::new(settings.clone(), SmtpMailer::from_settings(&settings)),
    )
    .with_options(RunOptions { dry_run });

    let reporter = CliProgress::new();
    let report = match pipeline.run(&reporter).await {
        Ok(report) => report,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    let (out, stats) = render_report(&report);
    println!("{out}");
    eprintln!("{stats}");
    Ok(())
}

/// Split the end-of-run output into the stdout text and the stderr stats
/// line. On a dry run stdout carries only the briefing.
fn render_report(report: &RunReport) -> (String, String) {
    let out = match &report.delivery {
        DeliveryStatus::Sent => "Newsletter sent successfully!".to_string(),
        DeliveryStatus::Failed { reason } => format!("Failed to send: {reason}"),
        DeliveryStatus::Skipped => report.state.summary.clone(),
    };

    let stats = format!(
        "  Links: {}  Articles: {}  Started: {}  Time: {:.1}s",
        report.state.links.len(),
        report.state.processed_articles.len(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed.as_secs_f64()
    );

    (out, stats)
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

    fn page_fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => init_config_at(path)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
