//! Agent snapshots.
//!
//! A snapshot captures the kinematic state needed to resume steering:
//! pose, destination, and velocity.  Paths are not included; a restored
//! agent re-acquires one through its normal repath cycle or `set_path`.

use glam::{Quat, Vec2, Vec3};
use nav_core::AgentId;

use crate::{MovementHost, PathAgent, UNSET_DESTINATION};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentSnapshot {
    pub agent:             AgentId,
    pub position:          Vec3,
    pub rotation:          Quat,
    /// `None` when no destination is set.
    pub destination:       Option<Vec3>,
    pub velocity_2d:       Vec2,
    pub vertical_velocity: f32,
    pub is_stopped:        bool,
}

impl PathAgent {
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            agent:             self.id,
            position:          self.simulated_position,
            rotation:          self.simulated_rotation,
            destination:       self.has_destination().then_some(self.destination),
            velocity_2d:       self.velocity_2d,
            vertical_velocity: self.vertical_velocity,
            is_stopped:        self.is_stopped,
        }
    }

    /// Overwrite the kinematic state from `snapshot` and push the pose to
    /// `host`.  The agent id is kept.
    pub fn restore(&mut self, snapshot: &AgentSnapshot, host: &mut dyn MovementHost) {
        self.simulated_position = snapshot.position;
        self.simulated_rotation = snapshot.rotation;
        self.destination = snapshot.destination.unwrap_or(UNSET_DESTINATION);
        self.velocity_2d = snapshot.velocity_2d;
        self.vertical_velocity = snapshot.vertical_velocity;
        self.is_stopped = snapshot.is_stopped;
        self.accumulated_delta = Vec3::ZERO;
        self.history.reset(snapshot.position);
        if self.config.update_position {
            host.write_position(snapshot.position);
        }
        if self.config.update_rotation {
            host.write_rotation(snapshot.rotation);
        }
        tracing::debug!(agent = %self.id, position = ?snapshot.position, "agent restored");
    }
}
