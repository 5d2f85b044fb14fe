//! Scripted key sequences for headless runs and deterministic tests.
//!
//! Each frame lists the keys held during that frame; `repeat` holds the same
//! set for several frames. Edges are derived by diffing consecutive frames.

use rr_core::input::{InputState, Key};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub frame_dt: f64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReplayFrame {
    pub left: bool,
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub restart: bool,
    pub escape: bool,
    pub repeat: u32,
    /// Host-side state request (e.g. `"boost"`), issued on the first frame of
    /// this block.
    pub request_state: Option<String>,
}

/// Held keys for a single expanded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputFrame {
    pub left: bool,
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub restart: bool,
    pub escape: bool,
}

impl InputFrame {
    /// Drive `input` to this frame's key set.
    pub fn apply(&self, input: &mut InputState) {
        input.set_key(Key::Left, self.left);
        input.set_key(Key::Up, self.up);
        input.set_key(Key::Right, self.right);
        input.set_key(Key::Down, self.down);
        input.set_key(Key::R, self.restart);
        input.set_key(Key::Escape, self.escape);
    }
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<InputFrame> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let keys = InputFrame {
                left: frame.left,
                up: frame.up,
                right: frame.right,
                down: frame.down,
                restart: frame.restart,
                escape: frame.escape,
            };
            for _ in 0..frame.repeat.max(1) {
                out.push(keys);
            }
        }
        out
    }

    /// `(expanded frame index, state name)` for every block with a request.
    pub fn state_requests(&self) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        let mut index = 0;
        for frame in &self.frames {
            if let Some(name) = &frame.request_state {
                out.push((index, name.clone()));
            }
            index += frame.repeat.max(1) as usize;
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.frame_dt <= 0.0 {
        return Err("Replay validation failed: frame_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f64 {
    1.0 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterModel;
    use crate::collision::Aabb3;
    use crate::config::GameConfig;
    use crate::events::GameEvent;
    use crate::session::GameSession;
    use crate::states::StateId;
    use glam::Vec3;
    use rr_core::animation::AnimationClip;
    use rr_core::time::TimeState;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rr_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn test_model() -> CharacterModel {
        let clips = StateId::ALL
            .iter()
            .map(|id| {
                (
                    id.clip().to_string(),
                    AnimationClip {
                        duration_us: 800_000,
                        looping: true,
                    },
                )
            })
            .collect();
        CharacterModel {
            model_id: "runner".to_string(),
            bounds: Aabb3::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 1.8, 0.5)),
            clips,
        }
    }

    /// Drive a fresh seeded session through `inputs` the way the binary does.
    fn play(inputs: &[InputFrame], frame_dt: f64, seed: u64) -> (Vec<GameEvent>, GameSession) {
        let config = GameConfig {
            seed: Some(seed),
            ..GameConfig::default()
        };
        let mut time = TimeState::with_rate(config.ticks_per_second);
        let mut session = GameSession::new(config);
        session.on_model_loaded(test_model());
        session.start();

        let mut input = InputState::new();
        let mut events = Vec::new();
        for frame in inputs {
            frame.apply(&mut input);
            time.begin_frame_with(frame_dt);
            while time.should_step() {
                if input.is_just_pressed(Key::R) {
                    session.restart(time.total_time);
                }
                events.extend(session.tick(time.fixed_dt as f32, &input));
                input.end_frame();
            }
            time.end_frame();
        }
        (events, session)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frame_dt": 0.016666667,
              "frames": [
                { "left": true, "repeat": 3 },
                { "up": true, "request_state": "boost" },
                { "restart": true, "repeat": 0 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(expanded[..3].iter().all(|f| f.left && !f.up));
        assert!(expanded[3].up);
        assert!(expanded[4].restart);
        assert_eq!(replay.state_requests(), vec![(3, "boost".to_string())]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn frames_drive_edges_on_change_only() {
        let mut input = InputState::new();
        let held = InputFrame {
            left: true,
            ..InputFrame::default()
        };
        held.apply(&mut input);
        assert!(input.is_just_pressed(Key::Left));
        input.end_frame();

        held.apply(&mut input);
        assert!(input.left());
        assert!(!input.is_just_pressed(Key::Left));

        InputFrame::default().apply(&mut input);
        assert!(!input.left());
        assert!(input.is_just_released(Key::Left));
    }

    #[test]
    fn seeded_replay_run_is_deterministic() {
        let replay = ReplaySequence {
            frame_dt: 1.0 / 60.0,
            frames: vec![
                ReplayFrame {
                    repeat: 30,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    left: true,
                    repeat: 20,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    up: true,
                    repeat: 2,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    repeat: 60,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    down: true,
                    repeat: 40,
                    ..ReplayFrame::default()
                },
                ReplayFrame {
                    right: true,
                    repeat: 240,
                    ..ReplayFrame::default()
                },
            ],
        };
        let inputs = replay.expanded_inputs();

        let (events_a, run_a) = play(&inputs, replay.frame_dt, 1234);
        let (events_b, run_b) = play(&inputs, replay.frame_dt, 1234);

        assert!(!events_a.is_empty());
        assert_eq!(events_a, events_b);
        assert_eq!(run_a.score(), run_b.score());
        assert_eq!(run_a.tick_count(), run_b.tick_count());
        assert_eq!(run_a.character().position(), run_b.character().position());
        assert_eq!(run_a.pool().entities(), run_b.pool().entities());
        assert_eq!(run_a.pool().scroll_offset(), run_b.pool().scroll_offset());
    }
}
