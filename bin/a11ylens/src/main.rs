mod commands;

use a11ylens_core::{ScreenshotMode, WcagLevel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::scan::OutputFormat;

#[derive(Parser)]
#[command(name = "a11ylens")]
#[command(about = "Accessibility scanner with heuristic scoring and HTML reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an HTML file or URL without a browser
    Scan {
        /// Local HTML file or http(s) URL
        target: Option<String>,

        /// CSV file with a `url` column to scan in batch
        #[arg(long, conflicts_with = "target")]
        csv: Option<PathBuf>,

        /// WCAG level (A, AA, AAA)
        #[arg(short, long)]
        level: Option<WcagLevel>,

        /// Base URL for resolving relative image sources in local files
        #[arg(long)]
        base_url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        output: OutputFormat,

        /// Write an HTML report to this path (single target)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Directory for batch reports (defaults to ~/.a11ylens/reports)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Analyze a live page in a browser, highlight issues and consult the backend
    Analyze {
        /// Page URL
        url: String,

        /// WCAG level (A, AA, AAA)
        #[arg(short, long)]
        level: Option<WcagLevel>,

        /// Screenshot mode (off, viewport, multi)
        #[arg(long)]
        screenshot: Option<ScreenshotMode>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Skip the backend and analyze client-side only
        #[arg(long)]
        no_backend: bool,

        /// Write the local HTML report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Also download the backend report into the reports directory
        #[arg(long)]
        download: bool,

        /// Keep the browser open until Ctrl+C
        #[arg(long)]
        keep_open: bool,
    },

    /// Mobile companion: submit a view hierarchy for analysis
    Mobile {
        #[command(subcommand)]
        command: MobileCommands,
    },

    /// Show or clear the mobile report history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show configuration, browser and backend status
    Status,
}

#[derive(Subcommand)]
enum MobileCommands {
    /// Analyze a captured view hierarchy (JSON array of nodes)
    Analyze {
        /// View hierarchy JSON file
        hierarchy: PathBuf,

        /// Application display name
        #[arg(long)]
        app_name: String,

        /// Application package name
        #[arg(long)]
        package: String,

        /// WCAG level (A, AA, AAA)
        #[arg(short, long)]
        level: Option<WcagLevel>,

        /// Backend base URL (overrides saved preference)
        #[arg(long)]
        base_url: Option<String>,

        /// Do not request AI analysis
        #[arg(long)]
        no_ai: bool,
    },

    /// Show or update mobile preferences
    Prefs {
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        ai: Option<bool>,

        #[arg(long)]
        screenshot: Option<bool>,

        /// Bearer token sent with mobile requests (empty string clears it)
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List recent reports, newest first
    List,
    /// Remove all history entries
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Get a config value by dot-separated key (e.g. scan.level)
    Get { key: String },
    /// Set a config value by dot-separated key
    Set { key: String, value: String },
    /// Reset config to defaults
    Reset {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Scan {
            target,
            csv,
            level,
            base_url,
            output,
            report,
            out_dir,
        } => match csv {
            Some(csv) => commands::scan::batch(&csv, level, out_dir).await?,
            None => {
                let target = target
                    .ok_or_else(|| anyhow::anyhow!("Provide a file or URL, or --csv <file>"))?;
                commands::scan::run(&target, level, base_url, output, report).await?;
            }
        },
        Commands::Analyze {
            url,
            level,
            screenshot,
            headed,
            no_backend,
            report,
            download,
            keep_open,
        } => {
            commands::analyze::run(commands::analyze::AnalyzeArgs {
                url,
                level,
                screenshot,
                headed,
                no_backend,
                report,
                download,
                keep_open,
            })
            .await?;
        }
        Commands::Mobile { command } => match command {
            MobileCommands::Analyze {
                hierarchy,
                app_name,
                package,
                level,
                base_url,
                no_ai,
            } => {
                commands::mobile::analyze(&hierarchy, &app_name, &package, level, base_url, no_ai)
                    .await?;
            }
            MobileCommands::Prefs {
                base_url,
                ai,
                screenshot,
                token,
            } => {
                commands::mobile::prefs(base_url, ai, screenshot, token).await?;
            }
        },
        Commands::History { command } => match command {
            HistoryCommands::List => commands::history::list().await?,
            HistoryCommands::Clear => commands::history::clear().await?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show().await?,
            ConfigCommands::Get { key } => commands::config_cmd::get(&key).await?,
            ConfigCommands::Set { key, value } => commands::config_cmd::set(&key, &value).await?,
            ConfigCommands::Reset { force } => commands::config_cmd::reset(force).await?,
        },
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
