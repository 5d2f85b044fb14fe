//! Game tuning loaded from JSON. Every field has a default, so a partial file
//! (or no file at all) yields the stock runner.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub ticks_per_second: u32,
    pub restart_cooldown_s: f64,
    /// Fixed seed for entity placement. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub character: CharacterConfig,
    pub track: TrackConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CharacterConfig {
    pub model_dir: String,
    pub model_name: String,
    /// Multiplier on dt for state updates and clip playback. Tweens run on
    /// unscaled time.
    pub motion_speed: f32,
    pub lane_limit: f32,
    pub dodge_offset: f32,
    pub dodge_ms: u64,
    pub jump_height: f32,
    pub jump_rise_ms: u64,
    pub jump_fall_ms: u64,
    pub ball_height_divisor: f32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackConfig {
    pub entity_count: usize,
    pub guaranteed_rings: usize,
    pub slot_spacing: f32,
    pub lanes: Vec<f32>,
    pub spawn_gap_min: f32,
    pub spawn_gap_max: f32,
    pub recycle_threshold_z: f32,
    pub initial_scroll_offset: f32,
    pub object_speed: f32,
    pub ground_speed: f32,
    pub ring_spin_rate: f32,
    pub bomb_spin_rate: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            restart_cooldown_s: 2.5,
            seed: None,
            character: CharacterConfig::default(),
            track: TrackConfig::default(),
        }
    }
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            model_dir: "assets/models".to_string(),
            model_name: "runner".to_string(),
            motion_speed: 2.0,
            lane_limit: 3.0,
            dodge_offset: 3.0,
            dodge_ms: 200,
            jump_height: 3.0,
            jump_rise_ms: 300,
            jump_fall_ms: 250,
            ball_height_divisor: 1.5,
        }
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            entity_count: 10,
            guaranteed_rings: 3,
            slot_spacing: 50.0,
            lanes: vec![-3.0, 0.0, 3.0],
            spawn_gap_min: 20.0,
            spawn_gap_max: 30.0,
            recycle_threshold_z: 10.0,
            initial_scroll_offset: -200.0,
            object_speed: 60.0,
            ground_speed: 1.5,
            ring_spin_rate: 2.0,
            bomb_spin_rate: 10.0,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Missing file falls back to defaults; a present but broken file is an error.
pub fn load_config_or_default(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found, using built-in defaults.",
            path.display()
        );
        return Ok(GameConfig::default());
    }
    load_config_from_path(path)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.ticks_per_second == 0 {
        return Err("Config validation failed: ticks_per_second must be > 0".to_string());
    }
    if config.restart_cooldown_s < 0.0 {
        return Err("Config validation failed: restart_cooldown_s must be >= 0".to_string());
    }

    let ch = &config.character;
    if ch.motion_speed <= 0.0 {
        return Err("Config validation failed: character.motion_speed must be > 0".to_string());
    }
    if ch.ball_height_divisor <= 0.0 {
        return Err(
            "Config validation failed: character.ball_height_divisor must be > 0".to_string(),
        );
    }
    if ch.model_name.is_empty() {
        return Err("Config validation failed: character.model_name is empty".to_string());
    }

    let track = &config.track;
    if track.entity_count == 0 {
        return Err("Config validation failed: track.entity_count must be > 0".to_string());
    }
    if track.guaranteed_rings > track.entity_count {
        return Err(format!(
            "Config validation failed: track.guaranteed_rings ({}) exceeds entity_count ({})",
            track.guaranteed_rings, track.entity_count
        ));
    }
    if track.lanes.is_empty() {
        return Err("Config validation failed: track.lanes is empty".to_string());
    }
    if track.spawn_gap_min < 0.0 || track.spawn_gap_max <= track.spawn_gap_min {
        return Err(format!(
            "Config validation failed: track spawn gap range [{}, {}) is invalid",
            track.spawn_gap_min, track.spawn_gap_max
        ));
    }
    if track.object_speed < 0.0 || track.ground_speed < 0.0 {
        return Err("Config validation failed: track speeds must be >= 0".to_string());
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
            "rr_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "seed": 7, "track": { "object_speed": 30.0 } }"#)
            .expect("write temp file");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.track.object_speed, 30.0);
        assert_eq!(config.track.entity_count, 10);
        assert_eq!(config.track.lanes, vec![-3.0, 0.0, 3.0]);
        assert_eq!(config.character.dodge_ms, 200);
        assert_eq!(config.ticks_per_second, 60);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_inverted_gap_range() {
        let path = temp_file_path("gap");
        fs::write(
            &path,
            r#"{ "track": { "spawn_gap_min": 30.0, "spawn_gap_max": 20.0 } }"#,
        )
        .expect("write temp file");

        let err = load_config_from_path(&path).expect_err("inverted range should fail");
        assert!(err.contains("spawn gap range"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_more_guaranteed_rings_than_slots() {
        let path = temp_file_path("rings");
        fs::write(
            &path,
            r#"{ "track": { "entity_count": 2, "guaranteed_rings": 3 } }"#,
        )
        .expect("write temp file");

        let err = load_config_from_path(&path).expect_err("should fail");
        assert!(err.contains("guaranteed_rings"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let config = load_config_or_default(&path).expect("defaults");
        assert_eq!(config.restart_cooldown_s, 2.5);
        assert!(config.seed.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write temp file");
        let err = load_config_or_default(&path).expect_err("malformed should fail");
        assert!(err.contains("Failed to parse config JSON"));
        let _ = fs::remove_file(path);
    }
}
