//! Folio CLI
//!
//! Runs headless page scenarios, prints stage and theme timelines, and
//! scaffolds `folio.toml`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_app::{
    run_loaded_scenario, FolioConfig, HeadlessRunConfig, HeadlessScenario, Page, CONFIG_FILE,
};
use folio_theme::ColorScheme;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Progressive reveal page runtime", long_about = None)]
struct Cli {
    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless scenario against a fresh page
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Config file or directory containing folio.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the JSON report to this relative path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Pretend the OS prefers this scheme
        #[arg(long)]
        prefer: Option<ColorScheme>,

        /// Frame budget for the whole scenario
        #[arg(long, default_value_t = 10_000)]
        max_frames: u64,
    },

    /// Print the stage and theme timeline of a page
    Trace {
        /// Config file or directory containing folio.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Theme toggles to request, one after another
        #[arg(long, default_value_t = 1)]
        toggles: u32,

        /// Pretend the OS prefers this scheme
        #[arg(long)]
        prefer: Option<ColorScheme>,
    },

    /// Write a default folio.toml
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            scenario,
            config,
            report,
            prefer,
            max_frames,
        } => {
            let passed = cmd_run(
                &scenario,
                config.as_deref(),
                report.as_deref(),
                prefer,
                max_frames,
            )?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Trace {
            config,
            toggles,
            prefer,
        } => cmd_trace(config.as_deref(), toggles, prefer)?,
        Commands::Init { path, force } => cmd_init(&path, force)?,
    }

    Ok(())
}

/// Explicit path, then ./folio.toml, then built-in defaults
fn load_config(path: Option<&Path>, prefer: Option<ColorScheme>) -> Result<FolioConfig> {
    let mut config = match path {
        Some(path) => FolioConfig::load(path)?,
        None if Path::new(CONFIG_FILE).exists() => FolioConfig::load(Path::new(CONFIG_FILE))?,
        None => FolioConfig::default(),
    };
    if let Some(scheme) = prefer {
        config.theme.ambient = scheme.into();
    }
    Ok(config)
}

fn cmd_run(
    scenario_path: &Path,
    config: Option<&Path>,
    report_path: Option<&Path>,
    prefer: Option<ColorScheme>,
    max_frames: u64,
) -> Result<bool> {
    let config = load_config(config, prefer)?;
    let scenario = HeadlessScenario::from_path(scenario_path)?;
    let runtime = HeadlessRunConfig {
        tick_ms: config.runtime.frame_ms,
        max_frames,
    };

    info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        assertions = scenario.assertion_count(),
        "running scenario"
    );

    let mut page = Page::from_config(config);
    let outcome = run_loaded_scenario(&scenario, runtime, &mut page)?;
    page.teardown();

    let report = outcome.report();
    report.write_to_writer(&mut io::stdout().lock())?;
    if let Some(path) = report_path {
        report
            .write_to_path(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if outcome.is_failed() {
        tracing::error!(
            step = report.failed_step_index,
            assertion = report.assertion.as_deref().unwrap_or(""),
            "{}",
            report.message.as_deref().unwrap_or("scenario failed")
        );
    }
    Ok(!outcome.is_failed())
}

fn cmd_trace(config: Option<&Path>, toggles: u32, prefer: Option<ColorScheme>) -> Result<()> {
    let config = load_config(config, prefer)?;
    let mut page = Page::from_config(config);
    let timings = page.sequencer().timings();

    println!("initial scheme: {}", page.sequencer().scheme());

    // Let every stage open before toggling so all sections take part
    page.advance(1000);
    for _ in 0..toggles {
        let outcome = page.toggle_theme();
        let cycle = timings.cycle_ms(page.sequencer().content_count());
        info!(?outcome, cycle_ms = cycle, "theme toggle");
        page.advance(cycle);
    }

    println!("stages:");
    for (stage, at_ms) in page.stages().history() {
        println!("  {at_ms:>6} ms  {stage}");
    }

    println!("mount order:");
    for section in page.mounted_sections() {
        println!("  {}", section.anchor());
    }

    println!("theme phases:");
    for change in page.sequencer().phase_log() {
        println!("  {:>6} ms  {:?}", change.at_ms, change.phase);
    }

    println!("final scheme: {}", page.sequencer().scheme());
    page.sync_surface();
    println!("environment changes applied: {}", page.surface().applied());
    page.teardown();
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    let target = path.join(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            target.display()
        );
    }

    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let content = FolioConfig::default().to_toml()?;
    std::fs::write(&target, content)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!(path = %target.display(), "wrote default config");
    Ok(())
}
