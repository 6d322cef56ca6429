//! Retrace replay CLI
//!
//! Replay recorded motion-capture trials headless and report what was applied.

use anyhow::{bail, Context};
use clap::Parser;
use retrace_env::TickPhase;
use retrace_sim::{ReplayRunner, RunResult, SimConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Retrace session replay CLI
#[derive(Parser, Debug)]
#[command(name = "retrace-sim")]
#[command(about = "Replay recorded motion-capture sessions headless", long_about = None)]
struct Args {
    /// Root data directory (root/{participant}/{session}/{trials}.csv)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Participant ID (default: first available)
    #[arg(short, long)]
    participant: Option<String>,

    /// Session ID (default: first available)
    #[arg(short, long)]
    session: Option<String>,

    /// Trials file, with or without .csv (default: first available)
    #[arg(short, long)]
    trial: Option<String>,

    /// Scene tracker to drive; repeat for several (default: every tracker column)
    #[arg(long = "tracker")]
    trackers: Vec<String>,

    /// Trial row to play (1-based)
    #[arg(short = 'n', long, conflicts_with = "all_trials")]
    trial_index: Option<usize>,

    /// Play every trial in order
    #[arg(long)]
    all_trials: bool,

    /// Playback speed multiplier (clamped to 1..=2)
    #[arg(long)]
    speed: Option<f64>,

    /// Host frame rate in Hz
    #[arg(long)]
    fps: Option<u32>,

    /// Host phase playback advances in (pre_tick, tick, post_tick)
    #[arg(long)]
    phase: Option<TickPhase>,

    /// JSON run configuration; flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export every applied frame to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Builds the run configuration: file (or defaults), then flags on top.
    fn into_config(self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };

        match self.root {
            Some(root) => config.root = root,
            None if self.config.is_none() => bail!("--root is required without --config"),
            None => {}
        }
        if self.participant.is_some() {
            config.participant = self.participant;
        }
        if self.session.is_some() {
            config.session = self.session;
        }
        if self.trial.is_some() {
            config.trial_file = self.trial;
        }
        if !self.trackers.is_empty() {
            config.trackers = self.trackers;
        }
        if let Some(index) = self.trial_index {
            config.trial_index = index;
            config.all_trials = false;
        }
        if self.all_trials {
            config.all_trials = true;
        }
        if let Some(speed) = self.speed {
            config.replay.speed_multiplier = speed;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(phase) = self.phase {
            config.replay.tick_phase = phase;
        }
        if self.export.is_some() {
            config.export = self.export;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout stays clean for --json
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let json = args.json;
    let config = args.into_config()?;

    if !json {
        info!("Retrace replay v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let export_path = config.export.clone();
    let result = ReplayRunner::new(config)
        .run()
        .context("Failed to load replay session")?;

    if let Some(path) = &export_path {
        result
            .export
            .write_to_file(path)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        info!("Exported {} frames to {}", result.export.frame_count(), path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary(&result))?);
    } else {
        report(&result);
    }

    // Exit with proper code for scripts
    if !result.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn summary(result: &RunResult) -> serde_json::Value {
    let failed = result.trials.iter().filter(|t| !t.passed()).count();
    serde_json::json!({
        "participant": result.resolved.participant_id,
        "session": result.resolved.session_id,
        "trial_file": result.resolved.trial_file,
        "trackers": result.trackers.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "total": result.trials.len(),
        "passed": result.trials.len() - failed,
        "failed": failed,
        "frames": result.total_frames(),
        "trials": result.trials,
    })
}

fn report(result: &RunResult) {
    info!(
        "Session {}/{}/{}",
        result.resolved.participant_id, result.resolved.session_id, result.resolved.trial_file
    );
    for trial in &result.trials {
        match &trial.failure_reason {
            None => info!(
                "✓ Trial {} ({:.2}s): {} frames, {} applied, {} skipped",
                trial.trial_index, trial.duration_sec, trial.frames, trial.applied, trial.skipped
            ),
            Some(reason) => error!("✗ Trial {} FAILED: {}", trial.trial_index, reason),
        }
        if !trial.trackers_without_data.is_empty() {
            info!("  no data: {}", trial.trackers_without_data.join(", "));
        }
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if result.passed() {
        info!("✅ All {} trials replayed ({} frames)", result.trials.len(), result.total_frames());
    } else {
        let failed = result.trials.iter().filter(|t| !t.passed()).count();
        error!("❌ {}/{} trials failed", failed, result.trials.len());
    }
}
