//! Simulation time model.
//!
//! # Design
//!
//! Hosts drive agents from two update phases:
//!
//! - a variable-rate **frame** phase, advanced once per rendered frame with
//!   whatever delta the host measured, and
//! - a fixed-rate **physics** phase, run zero or more times per frame from an
//!   accumulator so physics bodies always integrate with `fixed_delta_secs`.
//!
//! `Frame` is the discrete counter used to detect "same frame" conditions
//! (the position history must not be rotated twice within one frame).
//! Elapsed time is held as `f64` seconds so repath intervals stay exact over
//! long sessions.

use std::fmt;

use glam::Vec3;

use crate::{NavError, NavResult};

// ── Frame ────────────────────────────────────────────────────────────────────

/// An absolute frame counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame(pub u64);

impl Frame {
    pub const ZERO: Frame = Frame(0);

    /// Return the frame `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Frame {
        Frame(self.0 + n)
    }

    /// Frames elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Frame) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Frame {
    type Output = Frame;
    #[inline]
    fn add(self, rhs: u64) -> Frame {
        Frame(self.0 + rhs)
    }
}

impl std::ops::Sub for Frame {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Frame) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks elapsed simulated time, the frame counter, and the fixed-step
/// accumulator.
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Seconds simulated since the clock was created.
    pub elapsed_secs: f64,
    /// The current frame, advanced by `SimClock::advance()` each iteration.
    pub current_frame: Frame,
    /// Length of one physics step in seconds.
    pub fixed_delta_secs: f32,
    /// Upper bound on physics steps per frame (avoids the spiral of death
    /// after a long hitch).
    pub max_fixed_steps: u32,
    /// Delta passed to the most recent `advance` call.
    pub last_delta_secs: f32,
    fixed_accumulator: f32,
}

impl SimClock {
    pub fn new(fixed_delta_secs: f32, max_fixed_steps: u32) -> Self {
        Self {
            elapsed_secs: 0.0,
            current_frame: Frame::ZERO,
            fixed_delta_secs,
            max_fixed_steps,
            last_delta_secs: 0.0,
            fixed_accumulator: 0.0,
        }
    }

    /// Advance the clock by one frame of `delta_secs` seconds.
    ///
    /// Returns how many fixed physics steps the host should run this frame.
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, delta_secs: f32) -> u32 {
        let delta = if delta_secs.is_finite() { delta_secs.max(0.0) } else { 0.0 };
        self.current_frame = self.current_frame + 1;
        self.elapsed_secs += delta as f64;
        self.last_delta_secs = delta;

        if self.fixed_delta_secs <= 0.0 {
            return 0;
        }
        self.fixed_accumulator += delta;
        let mut steps = 0;
        while self.fixed_accumulator >= self.fixed_delta_secs && steps < self.max_fixed_steps {
            self.fixed_accumulator -= self.fixed_delta_secs;
            steps += 1;
        }
        if steps == self.max_fixed_steps {
            // Drop the backlog rather than carrying it into the next frame.
            self.fixed_accumulator = self.fixed_accumulator.min(self.fixed_delta_secs);
        }
        steps
    }

    /// Elapsed simulated seconds as `f64`.
    #[inline]
    pub fn now(&self) -> f64 {
        self.elapsed_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3} s)", self.current_frame, self.elapsed_secs)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the world builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seconds per rendered frame when the host runs at a steady rate.
    pub frame_delta_secs: f32,

    /// Seconds per physics step.  Default: 0.02 (50 Hz).
    pub fixed_delta_secs: f32,

    /// Cap on physics steps per frame.
    pub max_fixed_steps_per_frame: u32,

    /// Total frames to simulate when calling `World::run`.
    pub total_frames: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Gravity used by agents configured with `Gravity::World`.
    pub world_gravity: Vec3,

    /// Worker thread count passed to Rayon.  `None` uses all logical cores.
    pub num_threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_delta_secs: 1.0 / 60.0,
            fixed_delta_secs: 0.02,
            max_fixed_steps_per_frame: 5,
            total_frames: 600,
            seed: 0,
            world_gravity: Vec3::new(0.0, -9.81, 0.0),
            num_threads: None,
        }
    }
}

impl SimConfig {
    /// The frame at which `World::run` stops (exclusive upper bound).
    #[inline]
    pub fn end_frame(&self) -> Frame {
        Frame(self.total_frames)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.fixed_delta_secs, self.max_fixed_steps_per_frame)
    }

    /// Reject configurations the tick loop cannot run.
    pub fn validate(&self) -> NavResult<()> {
        if !(self.frame_delta_secs.is_finite() && self.frame_delta_secs >= 0.0) {
            return Err(NavError::Config(format!(
                "frame_delta_secs must be finite and non-negative, got {}",
                self.frame_delta_secs
            )));
        }
        if !(self.fixed_delta_secs.is_finite() && self.fixed_delta_secs > 0.0) {
            return Err(NavError::Config(format!(
                "fixed_delta_secs must be positive, got {}",
                self.fixed_delta_secs
            )));
        }
        if self.max_fixed_steps_per_frame == 0 {
            return Err(NavError::Config("max_fixed_steps_per_frame must be at least 1".into()));
        }
        if !self.world_gravity.is_finite() {
            return Err(NavError::Config("world_gravity must be finite".into()));
        }
        Ok(())
    }
}
