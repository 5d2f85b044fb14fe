//! Skeletal clip playback: clip definitions plus a small mixer.
//!
//! The mixer owns one `ClipAction` per clip and tracks the playback state the
//! game logic drives: play/reset, cross-fade weights, time scale. Skinning and
//! pose evaluation belong to the renderer; this module only answers "which clip
//! is playing, at what time, with what weight".
//!
//! All timing uses integer microseconds so cross-fades finish on the same tick
//! on every platform. The JSON format stores `duration_ms` for readability and
//! is converted to `duration_us` on load.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A named clip with a fixed cycle length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    pub duration_us: u64,
    pub looping: bool,
}

/// Top-level animation definition file (deserialized from JSON).
#[derive(Debug, Clone)]
pub struct AnimationFile {
    pub version: String,
    pub animation_id: String,
    pub clips: HashMap<String, AnimationClip>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from_weight: f32,
    to_weight: f32,
    duration_us: u64,
    elapsed_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Warp {
    from_scale: f32,
    to_scale: f32,
}

/// Runtime playback state for one clip.
#[derive(Debug, Clone)]
pub struct ClipAction {
    pub clip: AnimationClip,
    pub time_us: u64,
    pub weight: f32,
    pub time_scale: f32,
    pub playing: bool,
    fade: Option<Fade>,
    warp: Option<Warp>,
}

impl ClipAction {
    fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time_us: 0,
            weight: 1.0,
            time_scale: 1.0,
            playing: false,
            fade: None,
            warp: None,
        }
    }

    /// Time scale including any in-flight warp.
    pub fn effective_time_scale(&self) -> f32 {
        match (self.warp, self.fade) {
            (Some(warp), Some(fade)) if fade.duration_us > 0 => {
                let k = fade.elapsed_us as f32 / fade.duration_us as f32;
                self.time_scale * (warp.from_scale + (warp.to_scale - warp.from_scale) * k)
            }
            _ => self.time_scale,
        }
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn start_fade(&mut self, from_weight: f32, to_weight: f32, duration_us: u64) {
        if duration_us == 0 {
            self.weight = to_weight;
            self.fade = None;
            self.warp = None;
            if to_weight == 0.0 {
                self.playing = false;
            }
        } else {
            self.weight = from_weight;
            self.fade = Some(Fade {
                from_weight,
                to_weight,
                duration_us,
                elapsed_us: 0,
            });
        }
    }

    fn tick(&mut self, dt_us: u64) {
        if !self.playing {
            return;
        }

        let scaled = (dt_us as f64 * f64::from(self.effective_time_scale())).max(0.0) as u64;
        let duration = self.clip.duration_us;
        if duration > 0 {
            let t = self.time_us + scaled;
            self.time_us = if self.clip.looping {
                t % duration
            } else {
                t.min(duration)
            };
        }

        if let Some(mut fade) = self.fade {
            fade.elapsed_us += dt_us;
            if fade.elapsed_us >= fade.duration_us {
                self.weight = fade.to_weight;
                self.fade = None;
                self.warp = None;
                if fade.to_weight == 0.0 {
                    self.playing = false;
                }
            } else {
                let k = fade.elapsed_us as f32 / fade.duration_us as f32;
                self.weight = fade.from_weight + (fade.to_weight - fade.from_weight) * k;
                self.fade = Some(fade);
            }
        }
    }
}

/// Holds one action per clip of a loaded model.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: HashMap<String, ClipAction>,
}

impl AnimationMixer {
    pub fn new(clips: &HashMap<String, AnimationClip>) -> Self {
        let actions = clips
            .iter()
            .map(|(name, clip)| (name.clone(), ClipAction::new(clip.clone())))
            .collect();
        Self { actions }
    }

    pub fn action(&self, name: &str) -> Option<&ClipAction> {
        self.actions.get(name)
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Names of actions currently playing with non-zero weight.
    pub fn playing(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .actions
            .iter()
            .filter(|(_, a)| a.playing && a.weight > 0.0)
            .map(|(n, _)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn play(&mut self, name: &str) {
        match self.actions.get_mut(name) {
            Some(action) => action.playing = true,
            None => log::warn!("play: unknown clip '{name}'"),
        }
    }

    /// Rewind to the start and drop any fade or warp. Weight and time scale are
    /// left as they are.
    pub fn reset(&mut self, name: &str) {
        if let Some(action) = self.actions.get_mut(name) {
            action.time_us = 0;
            action.playing = true;
            action.fade = None;
            action.warp = None;
        }
    }

    pub fn set_effective_time_scale(&mut self, name: &str, scale: f32) {
        if let Some(action) = self.actions.get_mut(name) {
            action.time_scale = scale;
            action.warp = None;
        }
    }

    /// Fade `to` in and `from` out over `duration_s`. With `warp`, both
    /// actions' speeds are blended so their cycles line up during the fade.
    pub fn cross_fade_from(&mut self, to: &str, from: &str, duration_s: f32, warp: bool) {
        if to == from {
            return;
        }
        let duration_us = (f64::from(duration_s.max(0.0)) * 1_000_000.0).round() as u64;

        let durations = match (self.actions.get(from), self.actions.get(to)) {
            (Some(f), Some(t)) => (f.clip.duration_us, t.clip.duration_us),
            _ => {
                log::warn!("cross_fade_from: unknown clip pair '{from}' -> '{to}'");
                return;
            }
        };

        if let Some(out) = self.actions.get_mut(from) {
            let start = out.weight;
            out.start_fade(start, 0.0, duration_us);
            if warp && duration_us > 0 && durations.1 > 0 {
                out.warp = Some(Warp {
                    from_scale: 1.0,
                    to_scale: durations.0 as f32 / durations.1 as f32,
                });
            }
        }
        if let Some(inc) = self.actions.get_mut(to) {
            inc.start_fade(0.0, 1.0, duration_us);
            if warp && duration_us > 0 && durations.0 > 0 {
                inc.warp = Some(Warp {
                    from_scale: durations.1 as f32 / durations.0 as f32,
                    to_scale: 1.0,
                });
            }
        }
    }

    pub fn update(&mut self, dt_us: u64) {
        for action in self.actions.values_mut() {
            action.tick(dt_us);
        }
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    version: String,
    animation_id: String,
    clips: HashMap<String, AnimationClipJson>,
}

#[derive(Debug, Deserialize)]
struct AnimationClipJson {
    duration_ms: u64,
    #[serde(default)]
    looping: bool,
}

/// Load an animation definition file from disk.
pub fn load_animation_file(path: &Path) -> Result<AnimationFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    parse_animation_file(&raw)
        .map_err(|e| format!("Animation file {}: {e}", path.display()))
}

pub fn parse_animation_file(raw: &str) -> Result<AnimationFile, String> {
    let json: AnimationFileJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse animation JSON: {e}"))?;
    validate_animation_json(&json)?;

    let clips = json
        .clips
        .into_iter()
        .map(|(name, clip)| {
            (
                name,
                AnimationClip {
                    duration_us: clip.duration_ms * 1000,
                    looping: clip.looping,
                },
            )
        })
        .collect();

    Ok(AnimationFile {
        version: json.version,
        animation_id: json.animation_id,
        clips,
    })
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Animation validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.animation_id.is_empty() {
        return Err("Animation validation failed: animation_id is empty".to_string());
    }
    if json.clips.is_empty() {
        return Err("Animation validation failed: no clips".to_string());
    }
    for (name, clip) in &json.clips {
        if clip.duration_ms == 0 {
            return Err(format!(
                "Animation validation failed: clip '{}' has zero duration",
                name
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rr_anim_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn clips() -> HashMap<String, AnimationClip> {
        let mut clips = HashMap::new();
        clips.insert(
            "run".to_string(),
            AnimationClip {
                duration_us: 800_000,
                looping: true,
            },
        );
        clips.insert(
            "jump".to_string(),
            AnimationClip {
                duration_us: 400_000,
                looping: false,
            },
        );
        clips
    }

    #[test]
    fn play_advances_and_loops() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.play("run");
        mixer.update(900_000);
        let run = mixer.action("run").expect("run action");
        assert_eq!(run.time_us, 100_000);
        assert!(run.playing);
    }

    #[test]
    fn non_looping_clamps_at_end() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.play("jump");
        mixer.update(1_000_000);
        assert_eq!(mixer.action("jump").expect("jump").time_us, 400_000);
    }

    #[test]
    fn instant_cross_fade_swaps_weights() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.play("jump");
        mixer.reset("run");
        mixer.cross_fade_from("run", "jump", 0.0, true);
        mixer.play("run");

        assert_eq!(mixer.action("run").expect("run").weight, 1.0);
        let jump = mixer.action("jump").expect("jump");
        assert_eq!(jump.weight, 0.0);
        assert!(!jump.playing);
        assert_eq!(mixer.playing(), vec!["run"]);
    }

    #[test]
    fn timed_cross_fade_blends_then_settles() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.play("run");
        mixer.reset("jump");
        mixer.cross_fade_from("jump", "run", 0.1, false);
        mixer.play("jump");

        mixer.update(50_000);
        let jump = mixer.action("jump").expect("jump");
        assert!((jump.weight - 0.5).abs() < 1e-4);
        assert!(jump.is_fading());

        mixer.update(50_000);
        assert_eq!(mixer.action("jump").expect("jump").weight, 1.0);
        assert!(!mixer.action("run").expect("run").playing);
    }

    #[test]
    fn warp_scales_incoming_speed_during_fade() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.play("run");
        mixer.reset("jump");
        mixer.cross_fade_from("jump", "run", 0.1, true);
        // Jump is half the length of run, so it starts at half speed.
        let jump = mixer.action("jump").expect("jump");
        assert!((jump.effective_time_scale() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn time_scale_slows_playback() {
        let mut mixer = AnimationMixer::new(&clips());
        mixer.set_effective_time_scale("run", 0.5);
        mixer.play("run");
        mixer.update(200_000);
        assert_eq!(mixer.action("run").expect("run").time_us, 100_000);
    }

    #[test]
    fn load_animation_file_parses_valid_json() {
        let path = temp_file_path("valid");
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "runner",
          "clips": {
            "run":  { "duration_ms": 800, "looping": true },
            "jump": { "duration_ms": 550 }
          }
        }
        "#;
        fs::write(&path, json).expect("write temp file");

        let file = load_animation_file(&path).expect("should parse");
        assert_eq!(file.animation_id, "runner");
        assert_eq!(file.clips.len(), 2);
        assert!(file.clips["run"].looping);
        assert_eq!(file.clips["jump"].duration_us, 550_000);
        assert!(!file.clips["jump"].looping);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn parse_rejects_bad_version() {
        let json = r#"{ "version": "9.9", "animation_id": "x", "clips": { "run": { "duration_ms": 1 } } }"#;
        let err = parse_animation_file(json).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
    }

    #[test]
    fn parse_rejects_zero_duration() {
        let json = r#"{ "version": "0.1", "animation_id": "x", "clips": { "run": { "duration_ms": 0 } } }"#;
        let err = parse_animation_file(json).expect_err("zero duration should fail");
        assert!(err.contains("zero duration"));
    }
}
