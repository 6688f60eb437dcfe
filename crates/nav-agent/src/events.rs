//! Notifications an agent raises for gameplay code.
//!
//! Events are queued on the agent during an update and drained by the host
//! loop afterwards, so listeners never run while agent state is borrowed.

use glam::Vec3;
use nav_core::PathId;
use nav_path::PathFailure;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentEvent {
    /// A path request is about to be issued.
    SearchPath { destination: Vec3 },
    /// A path replaced the one being followed.
    PathAccepted { path: PathId, points: usize },
    /// A search failed.  The previous path, if any, is still followed.
    PathFailed { path: PathId, failure: PathFailure },
    /// The end of the path came within `end_reached_distance`.  Raised once
    /// per approach.
    TargetReached,
    /// The finalized position moved by `delta` this update.
    Moved { delta: Vec3 },
}
