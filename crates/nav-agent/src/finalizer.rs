//! Movement finalization.
//!
//! Turns the simulated next pose from the movement update into a committed
//! pose on the host.  Depending on the backend that means a relative
//! character-controller move, or a direct write followed by a ground ray
//! cast.  Either way the result may then be clamped onto the walkable
//! surface, and the position history that backs the observed velocity is
//! updated.

use glam::{Quat, Vec2, Vec3};
use nav_core::{Frame, MovementPlane};
use nav_path::WalkableClamp;

use crate::{AgentEvent, Backend, GroundProbe, MovementContext, MovementHost, PathAgent};

/// The two most recent finalized positions, at most one entry per frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionHistory {
    prev1:      Vec3,
    prev2:      Vec3,
    prev_frame: Option<Frame>,
}

impl PositionHistory {
    pub fn new(position: Vec3) -> Self {
        Self { prev1: position, prev2: position, prev_frame: None }
    }

    /// Collapse both entries onto `position`, e.g. after a teleport.
    pub fn reset(&mut self, position: Vec3) {
        self.prev1 = position;
        self.prev2 = position;
    }

    /// Record the finalized position for `frame`.  Several records in one
    /// frame replace the newest entry instead of shifting.
    pub fn record(&mut self, position: Vec3, frame: Frame) {
        if self.prev_frame != Some(frame) {
            self.prev2 = self.prev1;
        }
        self.prev1 = position;
        self.prev_frame = Some(frame);
    }

    /// Velocity implied by the last two entries over `delta_time` seconds.
    pub fn observed_velocity(&self, delta_time: f32) -> Vec3 {
        if delta_time > 1e-6 { (self.prev1 - self.prev2) / delta_time } else { Vec3::ZERO }
    }

    #[inline]
    pub fn latest(&self) -> Vec3 {
        self.prev1
    }

    #[inline]
    pub fn previous(&self) -> Vec3 {
        self.prev2
    }
}

impl PathAgent {
    /// Commit `next_position` and `next_rotation` to the host.
    pub fn finalize_movement(&mut self, next_position: Vec3, next_rotation: Quat, ctx: &mut MovementContext<'_>) {
        if self.config.enable_rotation {
            self.finalize_rotation(next_rotation, ctx.host);
        }
        self.finalize_position(next_position, ctx);
    }

    fn finalize_rotation(&mut self, rotation: Quat, host: &mut dyn MovementHost) {
        self.simulated_rotation = rotation;
        if self.config.update_rotation {
            host.write_rotation(rotation);
        }
    }

    fn finalize_position(&mut self, next_position: Vec3, ctx: &mut MovementContext<'_>) {
        let start = self.simulated_position;
        let mut current = start;
        let mut dirty = false;

        if ctx.host.backend() == Backend::CharacterController && self.config.update_position {
            // The controller moves from where it actually is.
            ctx.host.write_position(current);
            let outcome = ctx.host.move_relative((next_position - current) + self.accumulated_delta, ctx.ground);
            current = outcome.position;
            if outcome.grounded {
                self.vertical_velocity = 0.0;
            }
        } else {
            let (_, last_elevation) = self.plane.to_plane_with_elevation(current);
            current = next_position + self.accumulated_delta;
            if self.using_gravity {
                current = self.raycast_position(current, last_elevation, ctx.ground);
            }
            dirty = true;
        }

        let (current, clamped) = self.clamp_to_walkable(current, ctx.walkable);

        if (dirty || clamped) && self.config.update_position {
            ctx.host.write_position(current);
        }

        self.accumulated_delta = Vec3::ZERO;
        self.simulated_position = current;
        self.history.record(current, ctx.frame);

        let delta = current - start;
        if delta != Vec3::ZERO {
            self.events.push(AgentEvent::Moved { delta });
        }
    }

    /// Snap `position` onto the ground below it.
    ///
    /// The ray starts half the agent's height above `position`, extended by
    /// however far the agent dropped this update so a fast fall cannot tunnel
    /// through the ground.  A hit damps the vertical velocity.
    fn raycast_position(&mut self, position: Vec3, last_elevation: f32, ground: &dyn GroundProbe) -> Vec3 {
        let (_, elevation) = self.plane.to_plane_with_elevation(position);
        let ray_length = self.config.height * 0.5 + (last_elevation - elevation).max(0.0);
        let origin = position + self.plane.to_world(Vec2::ZERO, ray_length);

        match ground.raycast(origin, -self.plane.up(), ray_length, self.config.ground_mask) {
            Some(hit) => {
                self.vertical_velocity *= (1.0 - 5.0 * self.last_delta_time).max(0.0);
                hit.point
            }
            None => position,
        }
    }

    /// Clamp `position` onto the walkable surface, if configured.
    ///
    /// The in-plane velocity loses its component along the correction so the
    /// agent slides along the boundary instead of pushing into it.  Returns
    /// the position and whether it changed.
    fn clamp_to_walkable(&mut self, position: Vec3, walkable: Option<&dyn WalkableClamp>) -> (Vec3, bool) {
        if !self.config.constrain_inside_graph {
            return (position, false);
        }
        let Some(clamped) = walkable.and_then(|w| w.nearest_walkable(position)) else {
            return (position, false);
        };

        let difference = self.plane.to_plane(clamped - position);
        let sqr_difference = difference.length_squared();
        if sqr_difference > 1e-6 {
            self.velocity_2d -= difference * difference.dot(self.velocity_2d) / sqr_difference;
            (position + self.plane.to_world(difference, 0.0), true)
        } else {
            (position, false)
        }
    }
}
