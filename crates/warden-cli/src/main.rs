//! Warden CLI - scenario runner and archetype tooling.
//!
//! - `warden simulate <scenario>` - run a scripted encounter and stream its decision trace
//! - `warden archetype show <preset>` - print a built-in archetype
//! - `warden archetype check <file>` - load and validate an archetype file

mod scenario;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use warden_combat::ArchetypeConfig;

use scenario::{RunOptions, ScenarioKind, TraceFormat};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Combat decision core for hostile agents", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted encounter against the reference world
    Simulate {
        #[arg(value_enum)]
        scenario: ScenarioKind,

        /// Number of fixed steps to run
        #[arg(long, default_value_t = 300)]
        ticks: u64,

        /// Run seed
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Seconds per step
        #[arg(long, default_value_t = 0.1)]
        dt: f32,

        /// Archetype file (yaml or json); defaults to the rifleman preset
        #[arg(long)]
        archetype: Option<PathBuf>,

        /// Trace output on stdout
        #[arg(long, value_enum, default_value_t = TraceFormat::Json)]
        trace: TraceFormat,
    },

    /// Archetype presets and files
    Archetype {
        #[command(subcommand)]
        command: ArchetypeCommands,
    },
}

#[derive(Subcommand)]
enum ArchetypeCommands {
    /// Print a built-in preset
    Show {
        /// default, rifleman or skirmisher
        preset: String,

        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },

    /// Load and validate an archetype file
    Check { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    // Logs go to stderr so stdout stays a clean trace stream.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            scenario,
            ticks,
            seed,
            dt,
            archetype,
            trace,
        } => simulate(
            scenario,
            archetype.as_deref(),
            RunOptions {
                ticks,
                seed,
                dt,
                trace,
            },
        ),
        Commands::Archetype { command } => match command {
            ArchetypeCommands::Show { preset, format } => show_preset(&preset, format),
            ArchetypeCommands::Check { file } => check_archetype(&file),
        },
    }
}

fn load_archetype(path: &Path) -> Result<ArchetypeConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("{} has no file extension", path.display()))?;
    ArchetypeConfig::from_str_with_extension(&text, extension)
        .with_context(|| format!("Invalid archetype {}", path.display()))
}

fn simulate(kind: ScenarioKind, archetype: Option<&Path>, options: RunOptions) -> Result<()> {
    ensure!(
        options.dt > 0.0 && options.dt.is_finite(),
        "--dt must be a positive number of seconds"
    );

    let config = match archetype {
        Some(path) => load_archetype(path)?,
        None => ArchetypeConfig::rifleman(),
    };

    tracing::info!(
        scenario = ?kind,
        archetype = %config.name,
        ticks = options.ticks,
        seed = options.seed,
        "Starting simulation"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = scenario::run(kind, &config, options, &mut out)?;

    tracing::info!(ticks = summary.ticks, events = summary.events, "Simulation finished");
    for agent in &summary.agents {
        tracing::info!(
            agent = %agent.agent,
            mode = %agent.mode,
            task = agent.task.map(|t| t.0).unwrap_or("none"),
            x = agent.position.x,
            y = agent.position.y,
            health = agent.health,
            shots = agent.shots_fired,
            "Final state"
        );
    }
    Ok(())
}

fn show_preset(name: &str, format: Format) -> Result<()> {
    let config = ArchetypeConfig::preset(name).ok_or_else(|| {
        anyhow!("Unknown preset '{}' (expected one of: {})", name, ArchetypeConfig::PRESETS.join(", "))
    })?;

    let rendered = match format {
        Format::Yaml => serde_yaml::to_string(&config).context("Failed to encode YAML")?,
        Format::Json => {
            serde_json::to_string_pretty(&config).context("Failed to encode JSON")? + "\n"
        }
    };
    print!("{rendered}");
    Ok(())
}

fn check_archetype(path: &Path) -> Result<()> {
    let config = load_archetype(path)?;
    println!(
        "{}: ok (archetype '{}', strafe trigger {:.0})",
        path.display(),
        config.name,
        config.strafe.trigger_distance()
    );
    Ok(())
}
