//! Repath throttling and the in-flight request guard.
//!
//! The scheduler owns no service handle.  It answers *whether* to request a
//! path and remembers *which* request is outstanding; the agent performs the
//! actual service calls.  Keeping exactly one `pending` id is what makes
//! stale completions detectable: a result whose id differs from `pending`
//! belongs to a request that was cancelled or superseded.

use glam::Vec3;
use nav_core::PathId;

/// What to do with a path the service delivered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompletionDisposition {
    /// The outstanding request finished; pending is cleared.
    Accept,
    /// Not the outstanding request.  Must not touch agent state.
    Stale,
}

#[derive(Clone, Debug)]
pub struct PathRequestScheduler {
    last_repath: f64,
    pending:     Option<PathId>,
}

impl Default for PathRequestScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRequestScheduler {
    pub fn new() -> Self {
        Self { last_repath: f64::NEG_INFINITY, pending: None }
    }

    /// Forget the throttle so the next check may request immediately.
    pub fn reset_throttle(&mut self) {
        self.last_repath = f64::NEG_INFINITY;
    }

    /// `true` when a new request is due: the repath interval has elapsed,
    /// nothing is in flight, searching is enabled, and a destination is set.
    pub fn should_request(&self, now: f64, repath_rate: f32, can_search: bool, destination: Vec3) -> bool {
        now - self.last_repath >= repath_rate as f64
            && self.pending.is_none()
            && can_search
            && destination.x != f32::INFINITY
    }

    /// Record that request `id` was issued at `now`.
    pub fn begin_request(&mut self, now: f64, id: PathId) {
        self.last_repath = now;
        self.pending = Some(id);
    }

    /// Drop the outstanding request.  Returns its id so the caller can
    /// cancel it with the service; `None` when nothing was pending.
    pub fn cancel_pending(&mut self) -> Option<PathId> {
        self.pending.take()
    }

    /// Classify a delivered path.
    pub fn complete(&mut self, id: PathId) -> CompletionDisposition {
        if self.pending == Some(id) {
            self.pending = None;
            CompletionDisposition::Accept
        } else {
            CompletionDisposition::Stale
        }
    }

    #[inline]
    pub fn pending(&self) -> Option<PathId> {
        self.pending
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn last_repath(&self) -> f64 {
        self.last_repath
    }
}
