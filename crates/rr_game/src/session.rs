//! One play session: the runner, the track, score and the restart rules.
//!
//! Tick order: character (pending tween completions, state machine, clips,
//! tweens), ground phase, track scroll and recycle, then collision. A game
//! over stops the session until the host restarts it.

use rr_core::input::InputState;

use crate::character::{CharacterController, CharacterModel};
use crate::collision::CollisionDetector;
use crate::config::GameConfig;
use crate::error::CharacterError;
use crate::events::GameEvent;
use crate::pool::TrackEntityPool;
use crate::score::Scoreboard;
use crate::states::StateId;

pub struct GameSession {
    config: GameConfig,
    character: CharacterController,
    pool: TrackEntityPool,
    detector: CollisionDetector,
    score: Scoreboard,
    running: bool,
    ground_phase: f32,
    last_restart_at: Option<f64>,
    tick_count: u64,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let character = CharacterController::new(config.character.clone());
        let pool = TrackEntityPool::new(config.track.clone(), config.seed);
        Self {
            config,
            character,
            pool,
            detector: CollisionDetector::new(),
            score: Scoreboard::default(),
            running: false,
            ground_phase: 0.0,
            last_restart_at: None,
            tick_count: 0,
        }
    }

    pub fn on_model_loaded(&mut self, model: CharacterModel) {
        self.character.on_model_loaded(model);
    }

    pub fn start(&mut self) {
        if !self.running {
            log::info!("Session started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Session stopped after {} ticks", self.tick_count);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start over at host time `now_s`. Rejected (returns false) while inside
    /// the cooldown of the previous accepted restart.
    pub fn restart(&mut self, now_s: f64) -> bool {
        if let Some(last) = self.last_restart_at {
            if now_s < last + self.config.restart_cooldown_s {
                log::debug!(
                    "Restart at {now_s:.2}s ignored, cooldown until {:.2}s",
                    last + self.config.restart_cooldown_s
                );
                return false;
            }
        }
        self.last_restart_at = Some(now_s);

        self.score.reset_score();
        self.character.reset();
        self.character.take_transitions();
        self.pool.reset();
        self.ground_phase = 0.0;
        log::info!(
            "Restarted at {now_s:.2}s (high score {})",
            self.score.high_score
        );
        self.start();
        true
    }

    /// Host request for a named state, e.g. `"boost"`.
    pub fn request_state(&mut self, name: &str) -> Result<bool, CharacterError> {
        self.character.set_state_by_name(name)
    }

    /// Advance one fixed step. Does nothing while stopped.
    pub fn tick(&mut self, dt: f32, input: &InputState) -> Vec<GameEvent> {
        if !self.running {
            return Vec::new();
        }
        self.tick_count += 1;

        self.character.update(dt, input);
        let mut events: Vec<GameEvent> = self
            .character
            .take_transitions()
            .into_iter()
            .map(|t| GameEvent::StateChanged {
                from: t.from,
                to: t.to,
            })
            .collect();

        self.ground_phase = (self.ground_phase + dt * self.config.track.ground_speed).rem_euclid(1.0);
        self.pool.tick(dt);

        if let Some(bounds) = self.character.bounding_box() {
            events.extend(self.detector.check(&bounds, &mut self.pool, &mut self.score));
        }

        if events.iter().any(GameEvent::is_terminal) {
            self.stop();
        }
        events
    }

    pub fn score(&self) -> Scoreboard {
        self.score
    }

    #[allow(dead_code)]
    pub fn ground_phase(&self) -> f32 {
        self.ground_phase
    }

    pub fn state(&self) -> Option<StateId> {
        self.character.state()
    }

    #[allow(dead_code)]
    pub fn character(&self) -> &CharacterController {
        &self.character
    }

    #[allow(dead_code)]
    pub fn pool(&self) -> &TrackEntityPool {
        &self.pool
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks that ran collision detection (the model was loaded).
    pub fn collision_checks(&self) -> u64 {
        self.detector.checks()
    }

    #[cfg(test)]
    pub(crate) fn pool_mut(&mut self) -> &mut TrackEntityPool {
        &mut self.pool
    }
}
