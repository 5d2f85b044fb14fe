//! Engine services shared by the runner: input latching, the fixed-timestep
//! clock, axis tweens and clip playback. Nothing in here knows game rules.

pub mod animation;
pub mod input;
pub mod time;
pub mod tween;
