//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use pfcontent_core::{AlgorithmRegistry, EventSummary, Pipeline, load_events};
use pfcontent_shared::{AppConfig, init_config, load_config, load_config_from};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pfcontent: particle-flow content algorithms.
#[derive(Parser)]
#[command(
    name = "pfcontent",
    version,
    about = "Run particle-flow reconstruction algorithms over calorimeter event files.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Run the configured algorithm sequence over every event in a file.
    Run {
        /// JSON file holding one event or an array of events.
        #[arg(short, long)]
        events: PathBuf,

        /// Pipeline config (defaults to ~/.pfcontent/pfcontent.toml).
        #[arg(short, long, env = "PFCONTENT_CONFIG")]
        config: Option<PathBuf>,

        /// Print one JSON summary per event instead of text.
        #[arg(long)]
        json: bool,

        /// Stop at the first failed event.
        #[arg(long)]
        stop_on_error: bool,

        /// Process at most this many events.
        #[arg(long)]
        max_events: Option<usize>,
    },

    /// List the registered algorithm types.
    Algorithms,

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
    Show {
        /// Config file to show instead of the default location.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pfcontent=info",
        1 => "pfcontent=debug",
        _ => "pfcontent=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so JSON summaries on stdout stay parseable.
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
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            events,
            config,
            json,
            stop_on_error,
            max_events,
        } => cmd_run(&events, config.as_deref(), json, stop_on_error, max_events),
        Command::Algorithms => cmd_algorithms(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn cmd_run(
    events_path: &Path,
    config_path: Option<&Path>,
    json: bool,
    stop_on_error: bool,
    max_events: Option<usize>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let stop_on_error = stop_on_error || config.run.stop_on_error;
    let max_events = max_events.or(config.run.max_events);

    let registry = AlgorithmRegistry::new();
    let mut pipeline = Pipeline::from_config(&config, &registry)?;

    let mut events = load_events(events_path)?;
    if let Some(max) = max_events {
        events.truncate(max);
    }

    info!(
        events = events.len(),
        path = %events_path.display(),
        algorithms = ?pipeline.algorithm_names(),
        "processing events"
    );

    let progress = EventProgress::new(events.len());
    let mut failed = 0usize;

    for (i, event) in events.iter().enumerate() {
        let label = event
            .event_number
            .map_or_else(|| format!("#{i}"), |n| n.to_string());
        progress.start(&label);

        match pipeline.process_event(event) {
            Ok(summary) => progress.suspend(|| print_summary(&label, &summary, json))?,
            Err(e) => {
                failed += 1;
                warn!(event = %label, status = %e.status_code(), error = %e, "event failed");
                if stop_on_error {
                    progress.finish();
                    return Err(eyre!("event {label} failed: {e}"));
                }
            }
        }
    }

    progress.finish();

    if !json {
        println!();
        println!("  Events:    {}", events.len());
        println!("  Succeeded: {}", events.len() - failed);
        println!("  Failed:    {failed}");
        println!();
    }

    if failed > 0 {
        return Err(eyre!("{failed} of {} events failed", events.len()));
    }
    Ok(())
}

fn print_summary(label: &str, summary: &EventSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }

    println!("  Event {label} ({} ms)", summary.elapsed_ms);
    for (kind, list) in &summary.current_lists {
        println!("    current {kind:<12} {:<20} {:>5}", list.name, list.size);
    }
    for cluster in &summary.clusters {
        println!(
            "    {}: {} hits, em {:.3} GeV, had {:.3} GeV",
            cluster.id,
            cluster.calo_hits.len(),
            cluster.electromagnetic_energy,
            cluster.hadronic_energy
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Event-loop progress bar on stderr.
struct EventProgress {
    bar: ProgressBar,
}

impl EventProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        Self { bar }
    }

    fn start(&self, label: &str) {
        self.bar.set_message(format!("event {label}"));
        self.bar.inc(1);
    }

    fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn cmd_algorithms() -> Result<()> {
    let registry = AlgorithmRegistry::new();
    for name in registry.type_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
