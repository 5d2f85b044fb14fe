//! Latched keyboard state with both level-triggered and edge-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every tick the key is
//!   physically down. The character state machine only reads this form: lane
//!   dodges, jump and ball are all driven by held arrows.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()`. The host loop
//!   uses these for one-shot commands such as restart.
//!
//! The main loop calls `end_frame()` only after at least one fixed simulation
//! step has consumed the edges, so a press landing on a frame with zero steps
//! is not lost.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
    R,
    Escape,
}

impl Key {
    /// Arrow keys in the order the run state checks them.
    pub const ARROWS: &'static [Key] = &[Key::Left, Key::Right, Key::Up, Key::Down];
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Drive `key` to `down`, emitting the matching edge only on change.
    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            self.key_down(key);
        } else {
            self.key_up(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn left(&self) -> bool {
        self.is_held(Key::Left)
    }

    pub fn up(&self) -> bool {
        self.is_held(Key::Up)
    }

    pub fn right(&self) -> bool {
        self.is_held(Key::Right)
    }

    pub fn down(&self) -> bool {
        self.is_held(Key::Down)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::Left);
        assert!(input.is_held(Key::Left));
        assert!(input.is_just_pressed(Key::Left));
        assert!(input.left());
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Down);
        input.key_up(Key::Down);
        assert!(!input.down());
        assert!(input.is_just_released(Key::Down));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Up);
        assert!(!input.is_just_released(Key::Up));
        assert!(!input.up());
    }

    #[test]
    fn test_end_frame_keeps_held_clears_edges() {
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::R);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Right));
        assert!(!input.is_just_pressed(Key::R));
        assert!(input.right());
        assert!(input.is_held(Key::R));
    }

    #[test]
    fn test_set_key_repeated_down_emits_single_edge() {
        let mut input = InputState::new();
        input.set_key(Key::Left, true);
        input.end_frame();
        input.set_key(Key::Left, true);
        assert!(input.left());
        assert!(!input.is_just_pressed(Key::Left));

        input.set_key(Key::Left, false);
        assert!(input.is_just_released(Key::Left));
    }

    #[test]
    fn test_default_state_is_empty() {
        let input = InputState::default();
        for &key in Key::ARROWS {
            assert!(!input.is_held(key));
            assert!(!input.is_just_pressed(key));
        }
    }
}
