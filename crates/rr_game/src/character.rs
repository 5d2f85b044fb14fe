//! The runner: model bounds, clip mixer, position tweens and the locomotion
//! state machine, driven once per tick by the session.
//!
//! Tween completions never touch the state machine from inside the tween
//! update. They are queued and handed to the machine at the start of the next
//! tick, before input is read.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use glam::Vec3;
use rr_core::animation::{load_animation_file, AnimationClip, AnimationMixer};
use rr_core::input::InputState;
use rr_core::tween::{TweenCompletion, TweenHandle, TweenManager};
use serde::Deserialize;

use crate::collision::Aabb3;
use crate::config::CharacterConfig;
use crate::error::CharacterError;
use crate::states::{CharacterEvent, CharacterStateMachine, Hook, StateContext, StateId};

/// Loaded runner model: collision bounds in model space plus its clips.
#[derive(Debug, Clone)]
pub struct CharacterModel {
    pub model_id: String,
    pub bounds: Aabb3,
    pub clips: HashMap<String, AnimationClip>,
}

#[derive(Debug, Deserialize)]
struct ModelJson {
    version: String,
    model_id: String,
    bounds: BoundsJson,
    animation: String,
}

#[derive(Debug, Deserialize)]
struct BoundsJson {
    min: [f32; 3],
    max: [f32; 3],
}

/// Load `<dir>/<name>/model.json` and the animation file it points at.
pub fn load_character_model(dir: &Path, name: &str) -> Result<CharacterModel, String> {
    let model_dir = dir.join(name);
    let path = model_dir.join("model.json");
    let raw =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let json: ModelJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse model JSON {}: {e}", path.display()))?;
    validate_model_json(&json)?;

    let animation = load_animation_file(&model_dir.join(&json.animation))?;
    for &id in StateId::ALL {
        if !animation.clips.contains_key(id.clip()) {
            return Err(format!(
                "Model validation failed: '{}' has no '{}' clip",
                json.model_id,
                id.clip()
            ));
        }
    }

    log::info!(
        "Loaded model '{}' with {} clips from {}",
        json.model_id,
        animation.clips.len(),
        path.display()
    );
    Ok(CharacterModel {
        model_id: json.model_id,
        bounds: Aabb3::new(Vec3::from(json.bounds.min), Vec3::from(json.bounds.max)),
        clips: animation.clips,
    })
}

fn validate_model_json(json: &ModelJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Model validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.model_id.is_empty() {
        return Err("Model validation failed: model_id is empty".to_string());
    }
    let bounds = Aabb3::new(Vec3::from(json.bounds.min), Vec3::from(json.bounds.max));
    if !bounds.is_valid() || bounds.height() <= 0.0 {
        return Err(format!(
            "Model validation failed: '{}' has degenerate bounds",
            json.model_id
        ));
    }
    if json.animation.is_empty() {
        return Err("Model validation failed: animation path is empty".to_string());
    }
    Ok(())
}

/// A state change observed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<StateId>,
    pub to: StateId,
}

pub struct CharacterController {
    model: Option<CharacterModel>,
    position: Vec3,
    fsm: CharacterStateMachine,
    mixer: AnimationMixer,
    tweens: TweenManager<CharacterEvent>,
    /// Lane change in flight, kept across state changes.
    dodge: Option<TweenHandle>,
    pending: VecDeque<TweenCompletion<CharacterEvent>>,
    tuning: CharacterConfig,
    transitions: Vec<Transition>,
}

impl CharacterController {
    pub fn new(tuning: CharacterConfig) -> Self {
        Self {
            model: None,
            position: Vec3::ZERO,
            fsm: CharacterStateMachine::new(),
            mixer: AnimationMixer::default(),
            tweens: TweenManager::new(),
            dodge: None,
            pending: VecDeque::new(),
            tuning,
            transitions: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn state(&self) -> Option<StateId> {
        self.fsm.state_id()
    }

    #[allow(dead_code)]
    pub fn dodge_in_flight(&self) -> bool {
        self.dodge.is_some()
    }

    #[allow(dead_code)]
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Install the model and start running.
    pub fn on_model_loaded(&mut self, model: CharacterModel) {
        log::info!("Character model '{}' ready", model.model_id);
        self.mixer = AnimationMixer::new(&model.clips);
        self.model = Some(model);
        self.fsm.clear();
        self.enter(StateId::Run);
    }

    /// Host-side state request (e.g. boost). Re-requesting the active state is
    /// a no-op and returns `Ok(false)`.
    pub fn set_state(&mut self, id: StateId) -> Result<bool, CharacterError> {
        if !self.is_loaded() {
            return Err(CharacterError::AssetNotReady);
        }
        Ok(self.enter(id))
    }

    pub fn set_state_by_name(&mut self, name: &str) -> Result<bool, CharacterError> {
        let id: StateId = name.parse()?;
        self.set_state(id)
    }

    fn enter(&mut self, id: StateId) -> bool {
        let mut ctx = StateContext {
            mixer: &mut self.mixer,
            tweens: &mut self.tweens,
            dodge: &mut self.dodge,
            position: self.position,
            tuning: &self.tuning,
        };
        let changed = self.fsm.set_state(id, &mut ctx);
        self.collect_hooks();
        changed
    }

    /// One tick. Does nothing until the model is loaded.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        if self.model.is_none() {
            return;
        }

        let mut ctx = StateContext {
            mixer: &mut self.mixer,
            tweens: &mut self.tweens,
            dodge: &mut self.dodge,
            position: self.position,
            tuning: &self.tuning,
        };
        while let Some(completion) = self.pending.pop_front() {
            self.fsm.handle_tween_completion(completion, &mut ctx);
        }

        let scaled = dt * self.tuning.motion_speed;
        self.fsm.update(scaled, input, &mut ctx);
        self.mixer.update(seconds_to_us(scaled));

        let completions = self.tweens.update(seconds_to_us(dt), &mut self.position);
        self.pending.extend(completions);
        self.collect_hooks();
    }

    fn collect_hooks(&mut self) {
        for hook in self.fsm.drain_hooks() {
            match hook {
                Hook::Exit(state) => log::trace!("exit {state}"),
                Hook::Enter { state, previous } => {
                    match previous {
                        Some(prev) => log::debug!("state {prev} -> {state}"),
                        None => log::debug!("state -> {state}"),
                    }
                    self.transitions.push(Transition {
                        from: previous,
                        to: state,
                    });
                }
            }
        }
    }

    /// Transitions since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    /// World-space collision box. Ball squashes the box vertically, keeping
    /// its bottom on the ground.
    pub fn bounding_box(&self) -> Option<Aabb3> {
        let model = self.model.as_ref()?;
        let mut bounds = model.bounds.translated(self.position);
        if self.state() == Some(StateId::Ball) {
            bounds.max.y = bounds.min.y + bounds.height() / self.tuning.ball_height_divisor;
        }
        Some(bounds)
    }

    /// Back to the start line: centered, no tweens, fresh clips, running.
    pub fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.tweens.clear();
        self.dodge = None;
        self.pending.clear();
        self.fsm.clear();
        self.fsm.drain_hooks();
        if let Some(model) = &self.model {
            self.mixer = AnimationMixer::new(&model.clips);
            self.enter(StateId::Run);
        }
    }
}

fn seconds_to_us(dt: f32) -> u64 {
    (f64::from(dt.max(0.0)) * 1_000_000.0).round() as u64
}
