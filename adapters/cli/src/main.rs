#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver that plays a scripted Koma Rush session.

use std::{fmt, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use koma_rush_core::{AgentId, Event, SessionState};
use koma_rush_session::{default_config, load_config, Session};
use tracing::info;
use tracing_subscriber::{fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Interval between shots of the simulated gunner.
const FIRE_INTERVAL: Duration = Duration::from_secs(1);

/// Command-line arguments accepted by the driver.
#[derive(Debug, Parser)]
#[command(name = "koma-rush", about = "Runs a headless Koma Rush session")]
struct CliArgs {
    /// TOML configuration to load instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides the wave-selection seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 120)]
    seconds: u64,
    /// Length of a simulation tick in milliseconds.
    #[arg(long = "tick-ms", default_value_t = 50)]
    tick_ms: u64,
}

/// Final statistics of a headless run.
#[derive(Debug, PartialEq)]
struct Summary {
    turns: u32,
    stage: u32,
    score: u64,
    best_combo: u32,
    kills: u32,
    escaped: usize,
    state: SessionState,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.state {
            SessionState::Ready => "not started".to_owned(),
            SessionState::Running => "still running".to_owned(),
            SessionState::Ended(outcome) => format!("{outcome:?}"),
        };
        writeln!(f, "turns:      {}", self.turns)?;
        writeln!(f, "stage:      {}", self.stage)?;
        writeln!(f, "score:      {}", self.score)?;
        writeln!(f, "best combo: {}", self.best_combo)?;
        writeln!(f, "kills:      {}", self.kills)?;
        writeln!(f, "escaped:    {}", self.escaped)?;
        write!(f, "outcome:    {outcome}")
    }
}

/// Entry point for the Koma Rush command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();
    let summary = run(&args)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("koma_rush=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_target(false))
        .init();
}

fn run(args: &CliArgs) -> Result<Summary> {
    ensure!(args.tick_ms > 0, "--tick-ms must be positive");

    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => default_config().context("built-in configuration is invalid")?,
    };
    if let Some(seed) = args.seed {
        config.director.seed = seed;
    }

    let tick = Duration::from_millis(args.tick_ms);
    let total = Duration::from_secs(args.seconds);
    info!(seconds = args.seconds, tick_ms = args.tick_ms, "starting headless session");

    let mut session = Session::new(config);
    session.start();

    let mut simulated = Duration::ZERO;
    let mut since_shot = Duration::ZERO;
    let mut escaped = 0;
    while simulated < total && !session.state().is_ended() {
        session.advance(tick);
        simulated += tick;
        since_shot += tick;
        while since_shot >= FIRE_INTERVAL {
            since_shot -= FIRE_INTERVAL;
            if let Some(agent) = front_most_visible(&session) {
                session.report_hit(agent, 1);
            }
        }
        escaped += session
            .take_events()
            .iter()
            .filter(|event| matches!(event, Event::AgentEscaped { .. }))
            .count();
    }

    Ok(Summary {
        turns: session.turn(),
        stage: session.stage().get(),
        score: session.score(),
        best_combo: session.best_combo(),
        kills: session.kills(),
        escaped,
        state: session.state(),
    })
}

/// Agent closest to the player among those already on screen.
fn front_most_visible(session: &Session) -> Option<AgentId> {
    session
        .agents()
        .active()
        .filter(|agent| agent.cell.row() >= 0)
        .max_by(|a, b| a.cell.row().cmp(&b.cell.row()).then(b.id.cmp(&a.id)))
        .map(|agent| agent.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(seconds: u64, seed: Option<u64>) -> CliArgs {
        CliArgs {
            config: None,
            seed,
            seconds,
            tick_ms: 50,
        }
    }

    #[test]
    fn arguments_are_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let parsed = CliArgs::try_parse_from([
            "koma-rush",
            "--seed",
            "9",
            "--seconds",
            "30",
            "--tick-ms",
            "20",
        ])
        .expect("valid flags");
        assert_eq!(parsed.seed, Some(9));
        assert_eq!(parsed.seconds, 30);
        assert_eq!(parsed.tick_ms, 20);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn headless_runs_are_reproducible() {
        let first = run(&args(90, Some(5))).expect("run succeeds");
        let second = run(&args(90, Some(5))).expect("run succeeds");
        assert_eq!(first, second);
        assert!(first.turns > 20);
        assert!(first.kills > 0);
        assert_eq!(first.state, SessionState::Running);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let mut bad = args(1, None);
        bad.tick_ms = 0;
        assert!(run(&bad).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let mut bad = args(1, None);
        bad.config = Some(PathBuf::from("/nonexistent/koma_rush.toml"));
        let error = run(&bad).expect_err("missing file");
        assert!(error.to_string().contains("failed to load configuration"));
    }
}
