//! Frame timing.
//!
//! The engine owns no clock. A driver hands it a [`FrameTime`] every tick;
//! [`Time`] is a convenient driver-side clock that produces those ticks from
//! real time or from a fixed step.
//!
//! # Example
//!
//! ```ignore
//! use ember::time::Time;
//!
//! let mut time = Time::new();
//! time.set_fixed_delta(Some(1.0 / 60.0));
//!
//! loop {
//!     let tick = time.tick();
//!     system.step(tick)?;
//! }
//! ```

use std::time::Instant;

/// Tick value passed to every `step` call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub delta: f32,
    /// Seconds since the driver started.
    pub elapsed: f32,
}

impl FrameTime {
    #[inline]
    pub fn new(delta: f32, elapsed: f32) -> Self {
        Self { delta, elapsed }
    }
}

/// Driver-side clock.
///
/// Elapsed time is the sum of the deltas handed out so far, so a fixed delta
/// gives a fully deterministic timeline regardless of how long frames take.
#[derive(Debug)]
pub struct Time {
    last_tick: Instant,
    elapsed: f32,
    delta: f32,
    frames: u64,
    fixed_delta: Option<f32>,
}

impl Time {
    /// Clock starting now, measuring real frame durations.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            elapsed: 0.0,
            delta: 0.0,
            frames: 0,
            fixed_delta: None,
        }
    }

    /// Advance the clock by one frame and return the new tick.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let measured = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.delta = self.fixed_delta.unwrap_or(measured);
        self.elapsed += self.delta;
        self.frames += 1;
        FrameTime::new(self.delta, self.elapsed)
    }

    /// Seconds handed out so far.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of ticks so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frames
    }

    /// Step by `delta` on every tick instead of measuring wall time.
    /// `None` goes back to measured deltas.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
