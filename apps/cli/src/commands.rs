//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use trellobackup_core::{
    BackupConfig, BackupOutcome, BackupSummary, ProgressReporter, run_backup,
};
use trellobackup_shared::{AppConfig, Credentials, init_config, load_config, load_config_from};

/// Crates whose log output the verbosity flags control.
const LOG_TARGETS: &[&str] = &[
    "trellobackup",
    "trellobackup_core",
    "trellobackup_client",
    "trellobackup_discovery",
    "trellobackup_storage",
    "trellobackup_transcript",
    "trellobackup_shared",
];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// trellobackup: back up Trello boards to local JSON files.
#[derive(Parser)]
#[command(
    name = "trellobackup",
    version,
    about = "Back up Trello boards and attachments to local JSON files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.trellobackup/trellobackup.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Save every board (and optionally attachments) into a new backup folder.
    Backup {
        /// Trello API key (overrides the env var named in the config file).
        #[arg(long, env = "TRELLO_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Trello application token (overrides the env var named in the config file).
        #[arg(long, env = "TRELLO_APP_TOKEN", hide_env_values = true)]
        app_token: Option<String>,

        /// Also download attachments referenced by board actions.
        #[arg(long)]
        attachments: bool,

        /// Directory receiving the timestamped backup folder (defaults to ./backups).
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Write a comment transcript (.txt) next to a saved board file.
    Transcript {
        /// Board JSON file produced by `backup`.
        file: PathBuf,
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

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout carries only progress and results.
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
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Backup {
            api_key,
            app_token,
            attachments,
            out,
        } => cmd_backup(config_path, api_key, app_token, attachments, out).await,
        Command::Transcript { file } => cmd_transcript(&file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_backup(
    config_path: Option<&Path>,
    api_key: Option<String>,
    app_token: Option<String>,
    attachments: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path)?;

    // CLI/env values win over the env vars named in the config file.
    let from_config = config.credentials();
    let credentials = Credentials::new(
        api_key.unwrap_or(from_config.api_key),
        app_token.unwrap_or(from_config.app_token),
    );

    let mut backup_config = BackupConfig::from_app_config(&config, credentials);
    if let Some(out) = out {
        backup_config.backup_root = out;
    }
    backup_config.backup_attachments |= attachments;

    info!(
        root = %backup_config.backup_root.display(),
        attachments = backup_config.backup_attachments,
        "starting backup"
    );

    let reporter = CliProgress::new();
    let outcome = run_backup(&backup_config, &reporter).await;
    reporter.spinner.finish_and_clear();

    match outcome? {
        BackupOutcome::TokenRequired { authorize_url } => {
            println!(
                "Application token not set. Please visit {authorize_url} in your browser to create an application token."
            );
        }
        BackupOutcome::Completed(summary) => {
            println!();
            println!(
                "  Done! {} trello boards have been downloaded and saved in \"{}\" folder.",
                summary.board_count,
                summary.folder.display()
            );
            if backup_config.backup_attachments {
                println!("  Attachments: {}", summary.attachment_count);
            }
            println!("  Time:   {:.1}s", summary.elapsed.as_secs_f64());
            println!();
        }
    }

    Ok(())
}

fn cmd_transcript(file: &Path) -> Result<()> {
    let output = trellobackup_transcript::convert_file(file)?;
    println!("Transcript written to: {}", output.display());
    Ok(())
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

/// CLI progress reporter: an indicatif spinner plus one printed line per step.
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
        spinner.set_message("Listing boards");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn boards_discovered(&self, count: usize) {
        self.spinner.println(format!("Found {count} boards"));
    }

    fn board_started(&self, board: &str, organization: &str, current: usize, total: usize) {
        self.spinner.println(format!(
            "Fetching board {board} in organization {organization}"
        ));
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {board}"));
    }

    fn attachment_started(&self, id: &str, name: &str) {
        self.spinner
            .println(format!("    Fetching attachment {id}: {name}"));
    }

    fn done(&self, _summary: &BackupSummary) {
        self.spinner.finish_and_clear();
    }
}
