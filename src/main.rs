//! Advised Billiards entry point
//!
//! Runs a headless session at a fixed tick rate, asking the configured
//! advisor for every shot and logging what happens on the table.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use advised_billiards::Settings;
use advised_billiards::advisor::{HttpAdvisor, OfflineAdvisor, ShotAdvisor};
use advised_billiards::sim::{GameState, TableEvent, TableSnapshot, tick};

#[derive(Debug, Parser)]
#[command(name = "advised-billiards", version, about)]
struct Args {
    /// JSON settings file (defaults are used for anything missing)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Rack seed; defaults to the current time
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the network advisor; every shot aims at the closest ball
    #[arg(long)]
    offline: bool,

    /// Pace ticks at the configured tick rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Stop after this many ticks even if the game is not over
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,

    /// Print a JSON table snapshot after every shot and at the end
    #[arg(long)]
    snapshots: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    log::info!("Racking table with seed {seed}");

    let mut state = GameState::new(seed, settings.table.clone(), settings.rules.clone())?;

    let mut advisor: Box<dyn ShotAdvisor> = if args.offline {
        log::info!("Offline mode: shots aim at the closest ball");
        Box::new(OfflineAdvisor)
    } else {
        let advisor = HttpAdvisor::new(settings.advisor.clone());
        let cfg = advisor.settings();
        log::info!("Advisor at http://{}:{}{} ({})", cfg.host, cfg.port, cfg.path, cfg.model);
        Box::new(advisor)
    };

    let frame = Duration::from_secs_f64(1.0 / f64::from(settings.tick_rate_hz));
    let mut next_frame = Instant::now();

    while !state.is_game_over() && state.time_ticks < args.max_ticks {
        let events = tick(&mut state, advisor.as_mut());

        for event in &events {
            match event {
                TableEvent::Potted { id, kind, pocket } => {
                    log::info!("{} ball {} dropped in pocket {}", kind.label(), id, pocket + 1);
                }
                TableEvent::ShotTaken { .. } | TableEvent::GameOver { .. } if args.snapshots => {
                    println!("{}", serde_json::to_string(&TableSnapshot::capture(&state))?);
                }
                _ => {}
            }
        }

        if args.realtime {
            // A slow advisor round-trip resets the schedule instead of fast-forwarding
            next_frame += frame;
            let now = Instant::now();
            if next_frame > now {
                thread::sleep(next_frame - now);
            } else {
                next_frame = now;
            }
        }
    }

    let snapshot = TableSnapshot::capture(&state);
    log::info!("{}", snapshot.hud());
    match &snapshot.message {
        Some(message) => log::info!("{message}"),
        None => log::warn!("Stopped after {} ticks without a result", state.time_ticks),
    }
    Ok(())
}
