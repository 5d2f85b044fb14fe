//! Axis tweens over a `Vec3` with easing, chaining and completion events.
//!
//! Timing uses integer microseconds like the animation clock so that a chain
//! of segments lands on exactly the same tick on every run.
//!
//! Completions are not callbacks. `TweenManager::update` returns them as plain
//! values and the owner decides when to apply them; the character controller
//! queues them and applies them before the next state-machine update.

use std::collections::VecDeque;

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Self::X => v.x = value,
            Self::Y => v.y = value,
            Self::Z => v.z = value,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
}

impl Easing {
    /// Map normalized progress `k` in [0, 1] to eased progress.
    pub fn apply(self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);
        match self {
            Self::Linear => k,
            Self::QuadraticIn => k * k,
            Self::QuadraticOut => k * (2.0 - k),
            Self::QuadraticInOut => {
                if k < 0.5 {
                    2.0 * k * k
                } else {
                    -1.0 + (4.0 - 2.0 * k) * k
                }
            }
        }
    }
}

/// End value of a segment. `Relative` is resolved against the axis value at
/// the moment the segment starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    Absolute(f32),
    Relative(f32),
}

#[derive(Debug, Clone)]
struct Segment<E> {
    axis: Axis,
    target: TweenTarget,
    duration_us: u64,
    easing: Easing,
    on_complete: Option<E>,
}

/// A tween description: one or more segments played back to back.
///
/// ```ignore
/// let jump = Tween::to(Axis::Y, TweenTarget::Absolute(3.0), 300_000)
///     .easing(Easing::QuadraticOut)
///     .chain(Tween::to(Axis::Y, TweenTarget::Absolute(0.0), 250_000).on_complete(Landed));
/// ```
#[derive(Debug, Clone)]
pub struct Tween<E> {
    segments: Vec<Segment<E>>,
}

impl<E> Tween<E> {
    pub fn to(axis: Axis, target: TweenTarget, duration_us: u64) -> Self {
        Self {
            segments: vec![Segment {
                axis,
                target,
                duration_us,
                easing: Easing::Linear,
                on_complete: None,
            }],
        }
    }

    /// Set the easing of the last segment.
    pub fn easing(mut self, easing: Easing) -> Self {
        if let Some(seg) = self.segments.last_mut() {
            seg.easing = easing;
        }
        self
    }

    /// Attach an event to the completion of the last segment.
    pub fn on_complete(mut self, event: E) -> Self {
        if let Some(seg) = self.segments.last_mut() {
            seg.on_complete = Some(event);
        }
        self
    }

    /// Append `next` so it starts when this tween finishes.
    pub fn chain(mut self, next: Tween<E>) -> Self {
        self.segments.extend(next.segments);
        self
    }

    pub fn total_duration_us(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_us).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TweenCompletion<E> {
    pub handle: TweenHandle,
    pub event: E,
}

#[derive(Debug)]
struct ActiveTween<E> {
    handle: TweenHandle,
    segments: VecDeque<Segment<E>>,
    /// (start, end) of the front segment, captured when it begins.
    span: Option<(f32, f32)>,
    elapsed_us: u64,
}

impl<E> ActiveTween<E> {
    /// Returns true once every segment has finished.
    fn advance(&mut self, dt_us: u64, target: &mut Vec3, done: &mut Vec<TweenCompletion<E>>) -> bool {
        let mut budget = dt_us;
        while let Some(seg) = self.segments.front_mut() {
            let (start, end) = *self.span.get_or_insert_with(|| {
                let start = seg.axis.get(*target);
                let end = match seg.target {
                    TweenTarget::Absolute(v) => v,
                    TweenTarget::Relative(d) => start + d,
                };
                (start, end)
            });

            self.elapsed_us += budget;
            if self.elapsed_us < seg.duration_us {
                let k = self.elapsed_us as f32 / seg.duration_us as f32;
                seg.axis.set(target, start + (end - start) * seg.easing.apply(k));
                return false;
            }

            // Segment finished: snap to the end value and carry leftover time
            // into the chained segment.
            seg.axis.set(target, end);
            budget = self.elapsed_us - seg.duration_us;
            if let Some(event) = seg.on_complete.take() {
                done.push(TweenCompletion {
                    handle: self.handle,
                    event,
                });
            }
            self.segments.pop_front();
            self.span = None;
            self.elapsed_us = 0;
        }
        true
    }
}

/// Owns every running tween for one target vector.
#[derive(Debug)]
pub struct TweenManager<E> {
    active: Vec<ActiveTween<E>>,
    next_handle: u64,
}

impl<E> TweenManager<E> {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn start(&mut self, tween: Tween<E>) -> TweenHandle {
        let handle = TweenHandle(self.next_handle);
        self.next_handle += 1;
        self.active.push(ActiveTween {
            handle,
            segments: tween.segments.into(),
            span: None,
            elapsed_us: 0,
        });
        handle
    }

    pub fn is_active(&self, handle: TweenHandle) -> bool {
        self.active.iter().any(|t| t.handle == handle)
    }

    /// Drop a tween without firing its completion events.
    pub fn stop(&mut self, handle: TweenHandle) -> bool {
        let before = self.active.len();
        self.active.retain(|t| t.handle != handle);
        self.active.len() != before
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance all tweens by `dt_us`, writing into `target`. Tweens started in
    /// the same tick begin from the current value of their axis.
    pub fn update(&mut self, dt_us: u64, target: &mut Vec3) -> Vec<TweenCompletion<E>> {
        let mut done = Vec::new();
        self.active
            .retain_mut(|tween| !tween.advance(dt_us, target, &mut done));
        done
    }
}

impl<E> Default for TweenManager<E> {
    fn default() -> Self {
        Self::new()
    }
}
