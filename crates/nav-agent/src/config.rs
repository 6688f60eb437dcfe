//! Per-agent tuning.
//!
//! `AgentConfig::default()` reproduces the stock tuning of a humanoid
//! walker: half-metre radius, two metres tall, one unit per second.  Game
//! code usually loads a config per archetype from JSON and overrides a few
//! fields.

use glam::Vec3;
use nav_core::OrientationMode;

use crate::host::LayerMask;
use crate::{AgentError, AgentResult};

/// Where the agent's gravity comes from.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gravity {
    /// No gravity and no ground probing.
    Disabled,
    /// Use the world's gravity vector.
    #[default]
    World,
    /// Use this vector instead of the world's.
    Custom(Vec3),
}

impl Gravity {
    /// Resolve to a concrete vector given the world's gravity.
    #[inline]
    pub fn resolve(self, world: Vec3) -> Vec3 {
        match self {
            Gravity::Disabled => Vec3::ZERO,
            Gravity::World => world,
            Gravity::Custom(g) => g,
        }
    }
}

/// What to do once the end of the path is within `end_reached_distance`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CloseToDestinationMode {
    /// Brake as hard as possible.
    #[default]
    Stop,
    /// Keep steering until the exact end point.
    ContinueToExactDestination,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Radius of the agent's footprint.
    pub radius: f32,
    /// Height of the agent.  Also bounds the vertical destination check.
    pub height: f32,

    /// Minimum seconds between two path requests.
    pub repath_rate: f32,
    /// Request paths automatically.
    pub can_search: bool,
    /// Run the movement update at all.
    pub can_move: bool,

    /// Top speed in units per second.
    pub max_speed: f32,
    /// Acceleration in units/s².  Negative values mean
    /// `|max_acceleration| * max_speed`; see `effective_acceleration`.
    pub max_acceleration: f32,
    /// Degrees per second.
    pub rotation_speed: f32,
    /// Distance from the path end at which speed starts to taper.
    pub slowdown_distance: f32,
    /// Radius of the look-ahead circle.
    pub pick_next_waypoint_dist: f32,
    /// Distance to the path end that counts as having reached it.
    pub end_reached_distance: f32,
    /// Slow down while the agent faces away from its velocity.
    pub slow_when_not_facing_target: bool,
    pub when_close_to_destination: CloseToDestinationMode,

    /// Rotate the agent at all.
    pub enable_rotation: bool,
    /// Write the simulated position to the host.
    pub update_position: bool,
    /// Write the simulated rotation to the host.
    pub update_rotation: bool,

    pub gravity: Gravity,
    /// Layers the ground probe may hit.
    pub ground_mask: LayerMask,
    pub orientation: OrientationMode,

    /// Clamp the finalized position onto the walkable surface.
    pub constrain_inside_graph: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            radius:                      0.5,
            height:                      2.0,
            repath_rate:                 0.5,
            can_search:                  true,
            can_move:                    true,
            max_speed:                   1.0,
            max_acceleration:            -2.5,
            rotation_speed:              360.0,
            slowdown_distance:           0.6,
            pick_next_waypoint_dist:     2.0,
            end_reached_distance:        0.2,
            slow_when_not_facing_target: true,
            when_close_to_destination:   CloseToDestinationMode::Stop,
            enable_rotation:             true,
            update_position:             true,
            update_rotation:             true,
            gravity:                     Gravity::World,
            ground_mask:                 LayerMask::ALL,
            orientation:                 OrientationMode::ZAxisForward,
            constrain_inside_graph:      false,
        }
    }
}

impl AgentConfig {
    /// Reject values the control loop cannot work with.
    pub fn validate(&self) -> AgentResult<()> {
        let non_negative = [
            ("radius", self.radius),
            ("height", self.height),
            ("repath_rate", self.repath_rate),
            ("max_speed", self.max_speed),
            ("rotation_speed", self.rotation_speed),
            ("slowdown_distance", self.slowdown_distance),
            ("pick_next_waypoint_dist", self.pick_next_waypoint_dist),
            ("end_reached_distance", self.end_reached_distance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AgentError::Config(format!("{name} must be finite and non-negative, got {value}")));
            }
        }
        if !self.max_acceleration.is_finite() {
            return Err(AgentError::Config("max_acceleration must be finite".into()));
        }
        if let Gravity::Custom(g) = self.gravity {
            if !g.is_finite() {
                return Err(AgentError::Config("custom gravity must be finite".into()));
            }
        }
        Ok(())
    }
}
