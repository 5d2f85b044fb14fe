//! Character locomotion state machine.
//!
//! Four fixed states (run, boost, jump, ball) share one capability set:
//! `enter(previous)`, `exit()`, `update(dt, input)` and `id()`. Dispatch is a
//! `match` on `CharacterState`. States never switch themselves: `update` and
//! tween completions return the target `StateId`, and the machine performs the
//! exit/construct/enter sequence.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rr_core::animation::AnimationMixer;
use rr_core::input::InputState;
use rr_core::tween::{Axis, Easing, Tween, TweenCompletion, TweenHandle, TweenManager, TweenTarget};
use serde::{Deserialize, Serialize};

use crate::config::CharacterConfig;
use crate::error::CharacterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateId {
    Run,
    Boost,
    Jump,
    Ball,
}

impl StateId {
    pub const ALL: &'static [StateId] = &[StateId::Run, StateId::Boost, StateId::Jump, StateId::Ball];

    pub fn name(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Boost => "boost",
            Self::Jump => "jump",
            Self::Ball => "ball",
        }
    }

    /// Animation clip played while this state is active.
    pub fn clip(self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StateId {
    type Err = CharacterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| CharacterError::IllegalTransition(s.to_string()))
    }
}

/// Payload of character tweens, delivered back through `TweenCompletion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterEvent {
    DodgeFinished,
    Landed,
}

/// What a state may touch while running its hooks.
pub struct StateContext<'a> {
    pub mixer: &'a mut AnimationMixer,
    pub tweens: &'a mut TweenManager<CharacterEvent>,
    /// In-flight lane change. Owned outside the states so it survives state
    /// changes; lateral input is ignored while set.
    pub dodge: &'a mut Option<TweenHandle>,
    pub position: Vec3,
    pub tuning: &'a CharacterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterState {
    Run,
    Boost,
    Jump { landing: Option<TweenHandle> },
    Ball,
}

impl CharacterState {
    fn new(id: StateId) -> Self {
        match id {
            StateId::Run => Self::Run,
            StateId::Boost => Self::Boost,
            StateId::Jump => Self::Jump { landing: None },
            StateId::Ball => Self::Ball,
        }
    }

    pub fn id(&self) -> StateId {
        match self {
            Self::Run => StateId::Run,
            Self::Boost => StateId::Boost,
            Self::Jump { .. } => StateId::Jump,
            Self::Ball => StateId::Ball,
        }
    }

    fn enter(&mut self, previous: Option<StateId>, ctx: &mut StateContext<'_>) {
        let clip = self.id().clip();
        match self {
            Self::Run => {
                cross_fade_in(ctx.mixer, clip, previous, 0.0, true);
            }
            Self::Boost => {
                ctx.mixer.play(clip);
            }
            Self::Jump { landing } => {
                cross_fade_in(ctx.mixer, clip, previous, 0.1, true);
                let t = ctx.tuning;
                let arc = Tween::to(Axis::Y, TweenTarget::Absolute(t.jump_height), t.jump_rise_ms * 1000)
                    .easing(Easing::QuadraticOut)
                    .chain(
                        Tween::to(Axis::Y, TweenTarget::Absolute(0.0), t.jump_fall_ms * 1000)
                            .easing(Easing::QuadraticIn)
                            .on_complete(CharacterEvent::Landed),
                    );
                *landing = Some(ctx.tweens.start(arc));
            }
            Self::Ball => {
                cross_fade_in(ctx.mixer, clip, previous, 0.1, false);
                ctx.mixer.set_effective_time_scale(clip, 0.5);
            }
        }
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) {
        // In-flight tweens are left running: a dodge still finishes its lane
        // change after a jump starts, and the arc still lands if a jump is
        // interrupted by a host request.
    }

    fn update(&mut self, _dt: f32, input: &InputState, ctx: &mut StateContext<'_>) -> Option<StateId> {
        match self {
            Self::Run => {
                let x = ctx.position.x;
                let t = ctx.tuning;
                if input.left() {
                    if x > -t.lane_limit && ctx.dodge.is_none() {
                        *ctx.dodge = Some(start_dodge(ctx.tweens, -t.dodge_offset, t.dodge_ms));
                    }
                    None
                } else if input.right() {
                    if x < t.lane_limit && ctx.dodge.is_none() {
                        *ctx.dodge = Some(start_dodge(ctx.tweens, t.dodge_offset, t.dodge_ms));
                    }
                    None
                } else if input.up() {
                    Some(StateId::Jump)
                } else if input.down() {
                    Some(StateId::Ball)
                } else {
                    None
                }
            }
            Self::Ball if !input.down() => Some(StateId::Run),
            Self::Ball | Self::Boost | Self::Jump { .. } => None,
        }
    }

    fn on_tween_complete(&mut self, handle: TweenHandle, event: CharacterEvent) -> Option<StateId> {
        match (self, event) {
            (Self::Jump { landing }, CharacterEvent::Landed) if *landing == Some(handle) => {
                Some(StateId::Run)
            }
            (state, event) => {
                log::trace!("Dropping stale {event:?} for {}", state.id());
                None
            }
        }
    }
}

fn start_dodge(tweens: &mut TweenManager<CharacterEvent>, offset: f32, duration_ms: u64) -> TweenHandle {
    tweens.start(
        Tween::to(Axis::X, TweenTarget::Relative(offset), duration_ms * 1000)
            .on_complete(CharacterEvent::DodgeFinished),
    )
}

fn cross_fade_in(
    mixer: &mut AnimationMixer,
    clip: &str,
    previous: Option<StateId>,
    duration_s: f32,
    warp: bool,
) {
    if let Some(prev) = previous {
        mixer.reset(clip);
        mixer.cross_fade_from(clip, prev.clip(), duration_s, warp);
    }
    mixer.play(clip);
}

/// Hook invocations, recorded in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Exit(StateId),
    Enter {
        state: StateId,
        previous: Option<StateId>,
    },
}

#[derive(Debug, Default)]
pub struct CharacterStateMachine {
    current: Option<CharacterState>,
    hooks: Vec<Hook>,
}

impl CharacterStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn current(&self) -> Option<&CharacterState> {
        self.current.as_ref()
    }

    pub fn state_id(&self) -> Option<StateId> {
        self.current.as_ref().map(CharacterState::id)
    }

    /// Returns false when `id` is already active (no hooks run).
    pub fn set_state(&mut self, id: StateId, ctx: &mut StateContext<'_>) -> bool {
        let previous = match self.current.as_mut() {
            Some(state) if state.id() == id => return false,
            Some(state) => {
                state.exit(ctx);
                self.hooks.push(Hook::Exit(state.id()));
                Some(state.id())
            }
            None => None,
        };

        let mut next = CharacterState::new(id);
        next.enter(previous, ctx);
        self.hooks.push(Hook::Enter {
            state: id,
            previous,
        });
        self.current = Some(next);
        true
    }

    pub fn update(&mut self, dt: f32, input: &InputState, ctx: &mut StateContext<'_>) {
        let target = match self.current.as_mut() {
            Some(state) => state.update(dt, input, ctx),
            None => None,
        };
        if let Some(id) = target {
            self.set_state(id, ctx);
        }
    }

    pub fn handle_tween_completion(
        &mut self,
        completion: TweenCompletion<CharacterEvent>,
        ctx: &mut StateContext<'_>,
    ) {
        let TweenCompletion { handle, event } = completion;
        if event == CharacterEvent::DodgeFinished && *ctx.dodge == Some(handle) {
            *ctx.dodge = None;
            return;
        }
        let target = match self.current.as_mut() {
            Some(state) => state.on_tween_complete(handle, event),
            None => None,
        };
        if let Some(id) = target {
            self.set_state(id, ctx);
        }
    }

    /// Forget the active state without running its exit hook.
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn drain_hooks(&mut self) -> Vec<Hook> {
        std::mem::take(&mut self.hooks)
    }
}
