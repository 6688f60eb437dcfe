//! World observer trait for progress reporting and gameplay hooks.

use nav_agent::AgentEvent;
use nav_core::{AgentId, Frame};
use tracing::{debug, info, trace};

/// Callbacks invoked by [`World::step`][crate::World::step] at key points in
/// the frame loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: arrival counter
///
/// ```rust,ignore
/// struct Arrivals(usize);
///
/// impl SimObserver for Arrivals {
///     fn on_agent_event(&mut self, _frame: Frame, _agent: AgentId, event: &AgentEvent) {
///         if matches!(event, AgentEvent::TargetReached) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each frame, before any processing.
    fn on_frame_start(&mut self, _frame: Frame) {}

    /// Called once per event an agent raised this frame, in ascending
    /// `AgentId` order.
    fn on_agent_event(&mut self, _frame: Frame, _agent: AgentId, _event: &AgentEvent) {}

    /// Called at the end of each frame.
    ///
    /// `moving` is the number of agents that still have a path they have not
    /// reached the end of.
    fn on_frame_end(&mut self, _frame: Frame, _moving: usize) {}

    /// Called once after the final frame completes.
    fn on_sim_end(&mut self, _final_frame: Frame) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forwards agent events to `tracing`.
///
/// Path outcomes and arrivals log at `debug`, per-frame movement at `trace`,
/// and the end of the run at `info`.
#[derive(Default)]
pub struct TracingObserver {
    pub arrivals: usize,
    pub failures: usize,
}

impl SimObserver for TracingObserver {
    fn on_agent_event(&mut self, frame: Frame, agent: AgentId, event: &AgentEvent) {
        match event {
            AgentEvent::SearchPath { destination } => {
                debug!(%frame, %agent, ?destination, "searching path");
            }
            AgentEvent::PathAccepted { path, points } => {
                debug!(%frame, %agent, %path, points, "path accepted");
            }
            AgentEvent::PathFailed { path, failure } => {
                self.failures += 1;
                debug!(%frame, %agent, %path, %failure, "path failed");
            }
            AgentEvent::TargetReached => {
                self.arrivals += 1;
                debug!(%frame, %agent, "target reached");
            }
            AgentEvent::Moved { delta } => {
                trace!(%frame, %agent, ?delta, "moved");
            }
        }
    }

    fn on_sim_end(&mut self, final_frame: Frame) {
        info!(%final_frame, arrivals = self.arrivals, failures = self.failures, "simulation finished");
    }
}
