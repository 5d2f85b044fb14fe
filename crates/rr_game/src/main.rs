//! Ring Rush -- headless host loop.
//!
//! Loads the game config, the runner model and an input replay, then drives a
//! `GameSession` with the fixed-timestep clock (see `TimeState`):
//!
//!   1. apply the replay frame's held keys to `InputState`
//!   2. `begin_frame_with(frame_dt)` -- feed the accumulator
//!   3. `while should_step()` -- handle restart/quit edges, tick the session
//!   4. `end_frame()`
//!
//! Keys are read level-triggered by the character, edge-triggered for the host
//! commands (R restarts, Escape quits). Events are logged as they happen and a
//! JSON summary is printed at the end.
//!
//! Usage: `rr_game [config.json] [replay.json]`

mod character;
mod collision;
mod config;
mod error;
mod events;
mod pool;
mod replay;
mod score;
mod session;
mod states;

use std::path::PathBuf;

use rr_core::input::{InputState, Key};
use rr_core::time::TimeState;
use serde::Serialize;

use character::load_character_model;
use config::load_config_or_default;
use events::GameEvent;
use replay::load_replay_from_path;
use session::GameSession;
use states::StateId;

const CONFIG_PATH: &str = "assets/config/game.json";
const REPLAY_PATH: &str = "assets/replays/demo.json";

#[derive(Debug, Serialize)]
struct RunSummary {
    ticks: u64,
    collision_checks: u64,
    sim_time_s: f64,
    avg_frame_ms: f64,
    restarts: u32,
    game_overs: u32,
    bonuses: u32,
    score: u32,
    high_score: u32,
    final_state: Option<StateId>,
    running: bool,
}

fn run() -> Result<RunSummary, String> {
    let mut args = std::env::args().skip(1);
    let config_path = PathBuf::from(args.next().unwrap_or_else(|| CONFIG_PATH.to_string()));
    let replay_path = PathBuf::from(args.next().unwrap_or_else(|| REPLAY_PATH.to_string()));

    let config = load_config_or_default(&config_path)?;
    log::info!(
        "Config: {} ticks/s, {} track entities, seed {:?}",
        config.ticks_per_second,
        config.track.entity_count,
        config.seed
    );

    let model_dir = PathBuf::from(&config.character.model_dir);
    let model = load_character_model(&model_dir, &config.character.model_name)?;
    let replay = load_replay_from_path(&replay_path)?;
    let inputs = replay.expanded_inputs();
    let mut requests = replay.state_requests().into_iter().peekable();
    log::info!(
        "Replay '{}': {} frames at {:.4}s",
        replay_path.display(),
        inputs.len(),
        replay.frame_dt
    );

    let mut time = TimeState::with_rate(config.ticks_per_second);
    let mut input = InputState::new();
    let mut session = GameSession::new(config);
    session.on_model_loaded(model);
    session.start();

    let mut restarts = 0;
    let mut game_overs = 0;
    let mut bonuses = 0;

    'frames: for (index, frame) in inputs.iter().enumerate() {
        frame.apply(&mut input);
        while let Some((_, name)) = requests.next_if(|(at, _)| *at == index) {
            session
                .request_state(&name)
                .map_err(|e| format!("Replay frame {index}: {e}"))?;
        }
        time.begin_frame_with(replay.frame_dt);

        while time.should_step() {
            if input.is_just_pressed(Key::Escape) {
                log::info!("Escape pressed, stopping replay.");
                break 'frames;
            }
            if input.is_just_pressed(Key::R) && session.restart(time.total_time) {
                restarts += 1;
            }

            for event in session.tick(time.fixed_dt as f32, &input) {
                match &event {
                    GameEvent::StateChanged { .. } => log::debug!("{event:?}"),
                    GameEvent::BonusCollected { slot, score } => {
                        bonuses += 1;
                        log::info!("Bonus from slot {slot}, score {score}");
                    }
                    GameEvent::GameOver { .. } => {
                        game_overs += 1;
                        log::info!("Game over: {event:?}");
                    }
                }
            }
            input.end_frame();
        }
        time.end_frame();
    }

    let score = session.score();
    Ok(RunSummary {
        ticks: session.tick_count(),
        collision_checks: session.collision_checks(),
        sim_time_s: time.total_time,
        avg_frame_ms: time.smoothed_frame_time_ms,
        restarts,
        game_overs,
        bonuses,
        score: score.score,
        high_score: score.high_score,
        final_state: session.state(),
        running: session.is_running(),
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Ring Rush starting...");

    match run() {
        Ok(summary) => match serde_json::to_string(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Failed to serialize run summary: {err}"),
        },
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    }
}
