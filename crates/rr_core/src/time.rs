//! Fixed-timestep clock.
//!
//! The host feeds wall-clock (or synthetic) frame deltas into an accumulator
//! and drains it in `fixed_dt` slices. Every simulation tick therefore sees the
//! same dt regardless of render rate, which keeps tween timing and entity
//! scrolling reproducible.

use std::time::Instant;

/// Frames averaged for the reported frame time.
const FPS_SAMPLE_COUNT: usize = 60;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    /// Seconds of simulation consumed by `should_step`. Advances even while the
    /// game session is halted, so it doubles as the host clock for debouncing.
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::with_rate(60)
    }

    pub fn with_rate(ticks_per_second: u32) -> Self {
        let fixed_dt = 1.0 / f64::from(ticks_per_second.max(1));
        Self {
            fixed_dt,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [fixed_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    /// Measure the wall-clock delta since the previous frame and feed it in.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.begin_frame_with(real_dt);
    }

    /// Feed an explicit frame delta. Headless runs and tests use this to get
    /// bit-identical stepping.
    pub fn begin_frame_with(&mut self, real_dt: f64) {
        self.real_dt = real_dt.max(0.0);

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;
        self.record_frame_time(self.real_dt);
    }

    /// Rolling average over the last `FPS_SAMPLE_COUNT` (capped) frame deltas.
    fn record_frame_time(&mut self, dt: f64) {
        self.fps_samples[self.fps_sample_index] = dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg * 1000.0;
        self.smoothed_fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        // Tolerance absorbs float error when a frame delta equals fixed_dt.
        if self.accumulator + 1e-9 >= self.fixed_dt {
            self.accumulator = (self.accumulator - self.fixed_dt).max(0.0);
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    /// Simulation time left in the accumulator after this frame's steps, as a
    /// fraction of one step.
    pub fn end_frame(&mut self) -> f64 {
        self.accumulator / self.fixed_dt
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
