mod asset_cmds;
mod event_cmds;
mod export_cmd;
mod project_cmds;
mod template_cmds;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use clap::{Parser, Subcommand};

use reelplan_lib::core::settings::SettingsManager;

use asset_cmds::AssetCommands;
use event_cmds::EventCommands;
use template_cmds::TemplateCommands;

#[derive(Parser)]
#[command(name = "reelplan", version, about = "Plan scheduled video releases and export generation briefs")]
struct Cli {
    /// Settings directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write daily-rotated log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project file
    New {
        /// Project file path (".reelplan" is appended when missing)
        path: PathBuf,
        /// Project name
        #[arg(long)]
        name: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
        /// Project-wide brief prepended to every generation prompt
        #[arg(long)]
        global_prompt: Option<String>,
    },
    /// Show project summary
    Info {
        /// Project file
        project: PathBuf,
    },
    /// Move or resize the planning window
    Plan {
        /// Project file
        project: PathBuf,
        /// Start the window in the week containing this date
        #[arg(long)]
        start: Option<chrono::NaiveDate>,
        /// Window length in weeks (1-4)
        #[arg(long)]
        weeks: Option<u32>,
        /// Move the window by whole windows (negative moves back)
        #[arg(long, allow_hyphen_values = true)]
        shift: Option<i64>,
    },
    /// Media asset management
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Scheduled event management
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// Template parameter management
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Print the resolved fixed configuration as JSON
    Resolve {
        /// Project file
        project: PathBuf,
        /// Content type to resolve
        content_type: String,
        /// Include this event's own template
        #[arg(long)]
        event: Option<String>,
    },
    /// Print generation instructions
    Prompt {
        /// Project file
        project: PathBuf,
        /// Content type to build instructions for
        content_type: String,
        /// Include this event's own template
        #[arg(long)]
        event: Option<String>,
        /// Base prompt placed before the settings sections
        #[arg(long, default_value = "")]
        base: String,
    },
    /// Export templates and scheduled content as JSON
    Export {
        /// Project file
        project: PathBuf,
        /// Output file (defaults to <project>.export.json in the export location)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Editor layouts JSON ({"contentTypes": {...}, "events": {...}})
        #[arg(long)]
        layouts: Option<PathBuf>,
        /// Force compact JSON regardless of settings
        #[arg(long)]
        compact: bool,
    },
    /// List recently opened projects
    Recent {
        /// Forget all recent projects
        #[arg(long)]
        clear: bool,
    },
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

fn init_logging(level: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory: {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "reelplan.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

fn settings_manager(settings_dir: Option<PathBuf>) -> anyhow::Result<SettingsManager> {
    let dir = match settings_dir {
        Some(dir) => dir,
        None => SettingsManager::default_dir()
            .context("cannot determine a settings directory; pass --settings-dir")?,
    };
    Ok(SettingsManager::new(dir))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let settings = settings_manager(cli.settings_dir)?;

    match cli.command {
        Commands::New {
            path,
            name,
            description,
            global_prompt,
        } => project_cmds::run_new(
            &settings,
            &path,
            &name,
            description.as_deref(),
            global_prompt.as_deref(),
        ),
        Commands::Info { project } => project_cmds::run_info(&settings, &project),
        Commands::Plan {
            project,
            start,
            weeks,
            shift,
        } => project_cmds::run_plan(&settings, &project, start, weeks, shift),
        Commands::Asset { command } => asset_cmds::run_asset_command(&settings, command),
        Commands::Event { command } => event_cmds::run_event_command(&settings, command),
        Commands::Template { command } => template_cmds::run_template_command(&settings, command),
        Commands::Resolve {
            project,
            content_type,
            event,
        } => template_cmds::run_resolve(&settings, &project, &content_type, event.as_deref()),
        Commands::Prompt {
            project,
            content_type,
            event,
            base,
        } => template_cmds::run_prompt(
            &settings,
            &project,
            &content_type,
            event.as_deref(),
            &base,
        ),
        Commands::Export {
            project,
            output,
            layouts,
            compact,
        } => export_cmd::run_export(
            &settings,
            &project,
            output.as_deref(),
            layouts.as_deref(),
            compact,
        ),
        Commands::Recent { clear } => project_cmds::run_recent(&settings, clear),
    }
}
