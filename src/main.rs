//! Neon Arena headless runner
//!
//! Plays a run on autopilot at a fixed 60 Hz step, persisting progression
//! whenever the simulation asks for a save.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use neon_arena::difficulty::Difficulty;
use neon_arena::persistence::{JsonFileStore, ProgressionStore};
use neon_arena::sim::{GameEvent, GameState, RunConfig, TickInput, tick};
use neon_arena::tuning::Ship;

const STEP: f32 = 1.0 / 60.0;

#[derive(Debug, Parser)]
#[command(name = "neon-arena", about = "Run the arena simulation headless")]
struct Args {
    /// Ship: viper, tanks or razor (defaults to the saved selection)
    #[arg(long)]
    ship: Option<String>,
    /// Difficulty: easy, normal, hard or nightmare (defaults to the saved selection)
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated seconds before stopping
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Progression save file
    #[arg(long, default_value = "neon-arena-save.json")]
    save: PathBuf,
    /// Print the final snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let store = JsonFileStore::new(&args.save);
    let progression = store.load_or_default();

    let ship = match args.ship.as_deref() {
        Some(s) => Ship::from_str(s).with_context(|| format!("unknown ship '{s}'"))?,
        None => progression.ship(),
    };
    let difficulty = match args.difficulty.as_deref() {
        Some(s) => {
            Difficulty::from_str(s).with_context(|| format!("unknown difficulty '{s}'"))?
        }
        None => progression.difficulty(),
    };
    if args.seconds <= 0.0 || args.seconds.is_nan() {
        bail!("--seconds must be positive");
    }

    let config = RunConfig {
        seed: args.seed,
        ship,
        difficulty,
    };
    let mut state = GameState::new(config, progression);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let steps = (args.seconds / STEP).ceil() as u64;
    for _ in 0..steps {
        tick(&mut state, &input, STEP);
        for event in state.drain_events() {
            match event {
                GameEvent::SaveRequested => store.save_or_log(&state.progression),
                GameEvent::WaveStarted { wave, kind } => {
                    log::debug!("wave {wave} started ({kind:?})")
                }
                GameEvent::UpgradeChoice => {
                    for (i, u) in state.upgrade_choices.iter().enumerate() {
                        log::info!("  [{}] {}: {}", i + 1, u.name(), u.description());
                    }
                }
                _ => {}
            }
        }
        if state.game_over {
            break;
        }
    }

    log::info!(
        "Stopped at wave {} with score {} ({} kills)",
        state.wave(),
        state.score,
        state.stats.enemies_killed
    );
    store.save_or_log(&state.progression);

    if args.snapshot {
        let json = serde_json::to_string_pretty(&state.snapshot())?;
        println!("{json}");
    }
    Ok(())
}
