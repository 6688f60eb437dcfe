//! The path-following agent.
//!
//! `PathAgent` ties the pieces of this crate together for one agent:
//!
//! 1. the [`PathRequestScheduler`] decides when to ask the path service for a
//!    new route,
//! 2. accepted paths are claimed from the service's pool and loaded into a
//!    [`PathInterpolator`],
//! 3. [`movement_update`](PathAgent::movement_update) steers along the
//!    interpolator and produces the next pose,
//! 4. [`finalize_movement`](PathAgent::finalize_movement) commits that pose
//!    to the host.
//!
//! The agent holds no references to the world.  Everything it touches during
//! an update arrives through a [`MovementContext`], so a host loop can keep
//! agents, bodies, and the path service in separate collections.

use glam::{Quat, Vec2, Vec3};
use nav_core::math::{look_rotation, rotate_towards};
use nav_core::{AgentId, Frame, MovementPlane, PathId, PlaneTransform};
use nav_path::{Path, PathInterpolator, PathKind, PathRequest, PathService, PathState, WalkableClamp};
use tracing::{debug, trace, warn};

use crate::finalizer::PositionHistory;
use crate::scheduler::{CompletionDisposition, PathRequestScheduler};
use crate::steering::{
    acceleration_to_reach_point, brake, clamp_velocity, delta_to_move, effective_acceleration,
    rotation_speed_scale, slowdown_factor,
};
use crate::{
    AgentConfig, AgentError, AgentEvent, AgentResult, Backend, CloseToDestinationMode, GroundProbe,
    MovementHost,
};

/// Destination value meaning "none set".  Only the x component is checked.
pub const UNSET_DESTINATION: Vec3 = Vec3::splat(f32::INFINITY);

/// Which host callback an update runs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePhase {
    /// Once per rendered frame.
    Frame,
    /// Once per fixed physics step.
    Fixed,
}

impl UpdatePhase {
    /// The phase in which an agent on `backend` moves.
    #[inline]
    pub fn driving(backend: Backend) -> UpdatePhase {
        if backend.is_rigid_body() { UpdatePhase::Fixed } else { UpdatePhase::Frame }
    }
}

/// Everything outside the agent that one update reads or writes.
pub struct MovementContext<'a> {
    pub host:          &'a mut dyn MovementHost,
    pub paths:         &'a mut dyn PathService,
    pub ground:        &'a dyn GroundProbe,
    pub walkable:      Option<&'a dyn WalkableClamp>,
    pub frame:         Frame,
    /// Simulation time in seconds.
    pub now:           f64,
    pub world_gravity: Vec3,
}

pub struct PathAgent {
    pub(crate) id:                  AgentId,
    pub(crate) config:              AgentConfig,

    pub(crate) simulated_position:  Vec3,
    pub(crate) simulated_rotation:  Quat,
    pub(crate) destination:         Vec3,

    pub(crate) velocity_2d:         Vec2,
    pub(crate) vertical_velocity:   f32,
    /// External movement queued by `move_by`, applied at finalization.
    pub(crate) accumulated_delta:   Vec3,
    pub(crate) last_delta_time:     f32,
    pub(crate) last_delta_position: Vec2,
    pub(crate) history:             PositionHistory,

    pub(crate) plane:               PlaneTransform,
    /// The claimed path backing the interpolator.
    pub(crate) path:                Option<Path>,
    pub(crate) interpolator:        PathInterpolator,
    pub(crate) scheduler:           PathRequestScheduler,

    pub(crate) reached_end_of_path: bool,
    pub(crate) is_stopped:          bool,
    pub(crate) using_gravity:       bool,
    pub(crate) events:              Vec<AgentEvent>,
}

impl PathAgent {
    /// Create an agent standing at the host's current pose.
    pub fn new(id: AgentId, config: AgentConfig, host: &dyn MovementHost) -> AgentResult<Self> {
        config.validate()?;
        let position = host.position();
        let plane = config.orientation.default_plane();
        Ok(Self {
            id,
            simulated_position:  position,
            simulated_rotation:  host.rotation(),
            destination:         UNSET_DESTINATION,
            velocity_2d:         Vec2::ZERO,
            vertical_velocity:   0.0,
            accumulated_delta:   Vec3::ZERO,
            last_delta_time:     0.0,
            last_delta_position: Vec2::ZERO,
            history:             PositionHistory::new(position),
            plane,
            path:                None,
            interpolator:        PathInterpolator::new(),
            scheduler:           PathRequestScheduler::new(),
            reached_end_of_path: false,
            is_stopped:          false,
            using_gravity:       false,
            events:              Vec::new(),
            config,
        })
    }

    /// Bring the agent into the world: settle at the host's position and
    /// request a path right away if a destination is already set.
    pub fn start(&mut self, ctx: &mut MovementContext<'_>) {
        let position = ctx.host.position();
        self.teleport(position, false, ctx);
        self.scheduler.reset_throttle();
        self.refresh_gravity(ctx.host.backend(), ctx.world_gravity);
        if self.should_recalculate_path(ctx.now) {
            self.search_path(ctx.now, ctx.paths);
        }
    }

    // ── Update phases ─────────────────────────────────────────────────────────

    /// Run one update in `phase` with a step of `dt` seconds.
    ///
    /// The frame phase also handles repath checks.  Movement runs in the
    /// phase matching the host's backend and only while `can_move` is set.
    pub fn update(&mut self, phase: UpdatePhase, dt: f32, ctx: &mut MovementContext<'_>) {
        let backend = ctx.host.backend();
        if phase == UpdatePhase::Frame {
            if self.should_recalculate_path(ctx.now) {
                self.search_path(ctx.now, ctx.paths);
            }
            self.refresh_gravity(backend, ctx.world_gravity);
        }

        if self.config.can_move && UpdatePhase::driving(backend) == phase {
            let (next_position, next_rotation) = self.movement_update(dt, ctx);
            self.finalize_movement(next_position, next_rotation, ctx);
        }
    }

    /// The agent adds gravity itself unless the host body already does.
    fn refresh_gravity(&mut self, backend: Backend, world_gravity: Vec3) {
        let gravity = self.config.gravity.resolve(world_gravity);
        self.using_gravity =
            gravity != Vec3::ZERO && (!self.config.update_position || !backend.applies_own_gravity());
    }

    // ── Path requests ─────────────────────────────────────────────────────────

    pub fn should_recalculate_path(&self, now: f64) -> bool {
        self.scheduler.should_request(now, self.config.repath_rate, self.config.can_search, self.destination)
    }

    /// Request a path from the current position to the destination.
    ///
    /// Any request still in flight is cancelled first.  Does nothing while no
    /// destination is set.
    pub fn search_path(&mut self, now: f64, paths: &mut dyn PathService) {
        if !self.has_destination() {
            return;
        }
        self.events.push(AgentEvent::SearchPath { destination: self.destination });
        self.cancel_current_path_request(paths);

        let request = PathRequest::point_to_point(self.id, self.feet_position(), self.destination);
        let id = paths.start_path(request);
        self.scheduler.begin_request(now, id);
        trace!(agent = %self.id, path = %id, "path requested");
    }

    /// Replace the current path.
    ///
    /// * `None` clears the path and cancels any request.
    /// * A `Created` path is submitted to the service and accepted when it
    ///   returns.
    /// * A `Returned` path is accepted immediately.
    pub fn set_path(&mut self, path: Option<Path>, now: f64, paths: &mut dyn PathService) -> AgentResult<()> {
        let Some(mut path) = path else {
            self.clear_path(paths);
            return Ok(());
        };
        if path.kind != PathKind::PointToPoint {
            return Err(AgentError::UnsupportedPathKind(path.id));
        }

        match path.state {
            PathState::Created => {
                self.cancel_current_path_request(paths);
                path.requester = self.id;
                let id = paths.submit(path);
                self.scheduler.begin_request(now, id);
                Ok(())
            }
            PathState::Returned => {
                if path.id.is_valid() && paths.current_path(self.id) == Some(path.id) {
                    return Err(AgentError::AlreadyBeingComputed(path.id));
                }
                self.cancel_current_path_request(paths);
                if !path.id.is_valid() {
                    path.id = paths.pool_mut().issue_id();
                }
                self.accept_path(path, paths)
            }
            PathState::Computing => Err(AgentError::PathStillComputing(path.id)),
        }
    }

    /// Deliver a path the service finished for this agent.
    ///
    /// Paths other than the outstanding request are stale and ignored.
    pub fn on_path_complete(&mut self, path: Path, paths: &mut dyn PathService) -> AgentResult<()> {
        match self.scheduler.complete(path.id) {
            CompletionDisposition::Stale => {
                trace!(agent = %self.id, path = %path.id, "ignoring stale path");
                Ok(())
            }
            CompletionDisposition::Accept => self.accept_path(path, paths),
        }
    }

    fn accept_path(&mut self, path: Path, paths: &mut dyn PathService) -> AgentResult<()> {
        if path.kind != PathKind::PointToPoint {
            return Err(AgentError::UnsupportedPathKind(path.id));
        }
        if let Some(failure) = &path.failure {
            warn!(agent = %self.id, path = %path.id, %failure, "path search failed; keeping previous path");
            self.events.push(AgentEvent::PathFailed { path: path.id, failure: failure.clone() });
            return Ok(());
        }

        // Claim the new path before letting go of the old one so a shared
        // record is never recycled in between.
        paths.pool_mut().claim(&path, self.id)?;
        if let Some(old) = self.path.take() {
            if let Err(e) = paths.pool_mut().release(old.id, self.id) {
                warn!(agent = %self.id, path = %old.id, error = %e, "releasing previous path failed");
            }
        }

        self.interpolator.set_path(Some(path.points.clone()));
        self.plane = path.plane.unwrap_or_else(|| self.config.orientation.default_plane());
        self.reached_end_of_path = false;

        // Snap onto the path: first towards the point halfway between the
        // agent and the path start, then the agent itself.  This keeps the
        // cursor on the right segment when the path doubles back on itself.
        let feet = self.feet_position();
        self.interpolator.move_to_locally_closest_point((feet + path.start) * 0.5, true, true);
        self.interpolator.move_to_locally_closest_point(feet, true, true);
        self.interpolator.move_to_circle_intersection_2d(
            self.simulated_position,
            self.config.pick_next_waypoint_dist,
            &self.plane,
        );

        debug!(agent = %self.id, path = %path.id, points = path.points.len(), "path accepted");
        self.events.push(AgentEvent::PathAccepted { path: path.id, points: path.points.len() });
        self.path = Some(path);

        if self.remaining_distance() <= self.config.end_reached_distance {
            self.reached_end_of_path = true;
            self.events.push(AgentEvent::TargetReached);
        }
        Ok(())
    }

    fn cancel_current_path_request(&mut self, paths: &mut dyn PathService) {
        if let Some(id) = self.scheduler.cancel_pending() {
            paths.cancel(id);
        }
    }

    /// Stop following the current path and cancel any request.
    ///
    /// The path stays claimed until a new one replaces it or the agent is
    /// torn down.
    pub fn clear_path(&mut self, paths: &mut dyn PathService) {
        self.cancel_current_path_request(paths);
        self.interpolator.set_path(None);
        self.reached_end_of_path = false;
    }

    /// Move instantly to `position`.
    ///
    /// The velocity history collapses so the observed velocity does not spike.
    /// With `clear_path` the current path is dropped and a new one requested
    /// from the new position.
    pub fn teleport(&mut self, position: Vec3, clear_path: bool, ctx: &mut MovementContext<'_>) {
        self.reached_end_of_path = false;
        if clear_path {
            self.clear_path(ctx.paths);
        }
        self.simulated_position = position;
        self.history.reset(position);
        if self.config.update_position {
            ctx.host.write_position(position);
        }
        if clear_path {
            self.search_path(ctx.now, ctx.paths);
        }
    }

    // ── Movement ──────────────────────────────────────────────────────────────

    /// Compute the next pose after `dt` seconds without committing it.
    ///
    /// A zero or negative `dt` still refreshes the path cursor and the
    /// end-of-path flag but leaves pose and velocity untouched.
    pub fn movement_update(&mut self, dt: f32, ctx: &mut MovementContext<'_>) -> (Vec3, Quat) {
        self.last_delta_time = dt.max(0.0);
        let acceleration = effective_acceleration(self.config.max_acceleration, self.config.max_speed);

        if self.config.update_position {
            self.simulated_position = ctx.host.position();
        }
        if self.config.update_rotation {
            self.simulated_rotation = ctx.host.rotation();
        }
        let current_position = self.simulated_position;

        self.interpolator.move_to_circle_intersection_2d(
            current_position,
            self.config.pick_next_waypoint_dist,
            &self.plane,
        );
        let dir = self.plane.to_plane(self.steering_target() - current_position);
        let distance_to_end = dir.length() + self.interpolator.remaining_distance().max(0.0);

        let was_reached = self.reached_end_of_path;
        self.reached_end_of_path =
            distance_to_end <= self.config.end_reached_distance && self.interpolator.valid();
        if !was_reached && self.reached_end_of_path {
            debug!(agent = %self.id, "end of path reached");
            self.events.push(AgentEvent::TargetReached);
        }

        if dt <= 0.0 {
            self.last_delta_position = Vec2::ZERO;
            return (current_position, self.simulated_rotation);
        }

        let forwards = self.plane.to_plane(self.simulated_rotation * self.config.orientation.forward_axis());

        let slowdown = if self.interpolator.valid() && !self.is_stopped {
            let slowdown = slowdown_factor(distance_to_end, self.config.slowdown_distance);
            if self.reached_end_of_path && self.config.when_close_to_destination == CloseToDestinationMode::Stop {
                self.velocity_2d = brake(self.velocity_2d, acceleration, dt);
            } else {
                self.velocity_2d += acceleration_to_reach_point(
                    dir,
                    dir.normalize_or_zero() * self.config.max_speed,
                    self.velocity_2d,
                    acceleration,
                    self.config.rotation_speed,
                    self.config.max_speed,
                    forwards,
                ) * dt;
            }
            slowdown
        } else {
            self.velocity_2d = brake(self.velocity_2d, acceleration, dt);
            1.0
        };

        self.velocity_2d = clamp_velocity(
            self.velocity_2d,
            self.config.max_speed,
            slowdown,
            self.config.slow_when_not_facing_target && self.config.enable_rotation,
            forwards,
        );

        self.apply_gravity(dt, ctx.world_gravity);

        let delta_2d = delta_to_move(self.velocity_2d, dt, distance_to_end);
        self.last_delta_position = delta_2d;
        let next_position = current_position + self.plane.to_world(delta_2d, self.vertical_velocity * dt);
        let next_rotation = self.calculate_next_rotation(slowdown);
        (next_position, next_rotation)
    }

    fn apply_gravity(&mut self, dt: f32, world_gravity: Vec3) {
        if self.using_gravity {
            let gravity = self.config.gravity.resolve(world_gravity) * dt;
            let (in_plane, vertical) = self.plane.to_plane_with_elevation(gravity);
            self.velocity_2d += in_plane;
            self.vertical_velocity += vertical;
        } else {
            self.vertical_velocity = 0.0;
        }
    }

    fn calculate_next_rotation(&self, slowdown: f32) -> Quat {
        if self.last_delta_time > 1e-5 && self.config.enable_rotation {
            let speed = self.config.rotation_speed * rotation_speed_scale(slowdown);
            self.simulate_rotation_towards_2d(self.velocity_2d, speed * self.last_delta_time)
        } else {
            self.simulated_rotation
        }
    }

    /// Rotation after turning towards `direction` by at most `max_degrees`.
    /// Does not change the agent.
    pub fn simulate_rotation_towards(&self, direction: Vec3, max_degrees: f32) -> Quat {
        self.simulate_rotation_towards_2d(self.plane.to_plane(direction), max_degrees)
    }

    fn simulate_rotation_towards_2d(&self, direction: Vec2, max_degrees: f32) -> Quat {
        if direction == Vec2::ZERO {
            return self.simulated_rotation;
        }
        let world_dir = self.plane.to_world(direction, 0.0);
        match look_rotation(self.config.orientation, world_dir, self.plane.up()) {
            Some(target) => rotate_towards(self.simulated_rotation, target, max_degrees.to_radians()),
            None => self.simulated_rotation,
        }
    }

    /// Queue an external displacement, applied at the next finalization.
    pub fn move_by(&mut self, delta: Vec3) {
        self.accumulated_delta += delta;
    }

    // ── Control ───────────────────────────────────────────────────────────────

    /// Brake to a halt while keeping the path.
    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    pub fn resume(&mut self) {
        self.is_stopped = false;
    }

    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = destination;
    }

    pub fn clear_destination(&mut self) {
        self.destination = UNSET_DESTINATION;
    }

    /// Remove the agent from play: drop its path, return the claim to the
    /// pool, and zero all motion state.
    pub fn teardown(&mut self, paths: &mut dyn PathService) {
        self.clear_path(paths);
        if let Some(old) = self.path.take() {
            if let Err(e) = paths.pool_mut().release(old.id, self.id) {
                warn!(agent = %self.id, path = %old.id, error = %e, "releasing path on teardown failed");
            }
        }
        self.velocity_2d = Vec2::ZERO;
        self.accumulated_delta = Vec3::ZERO;
        self.vertical_velocity = 0.0;
        self.last_delta_time = 0.0;
        self.last_delta_position = Vec2::ZERO;
        debug!(agent = %self.id, "agent torn down");
    }

    /// Take the events raised since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, AgentEvent> {
        self.events.drain(..)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replace the tuning.  Invalid configs are rejected and the old one kept.
    pub fn set_config(&mut self, config: AgentConfig) -> AgentResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.simulated_position
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.simulated_rotation
    }

    /// The point paths are requested from.
    #[inline]
    pub fn feet_position(&self) -> Vec3 {
        self.simulated_position
    }

    #[inline]
    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    #[inline]
    pub fn has_destination(&self) -> bool {
        self.destination.x != f32::INFINITY
    }

    #[inline]
    pub fn plane(&self) -> PlaneTransform {
        self.plane
    }

    /// The in-plane velocity the controller is steering with.
    #[inline]
    pub fn velocity_2d(&self) -> Vec2 {
        self.velocity_2d
    }

    #[inline]
    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Velocity observed from the last two finalized positions.
    pub fn velocity(&self) -> Vec3 {
        self.history.observed_velocity(self.last_delta_time)
    }

    /// Velocity the controller asked for in the last update.
    pub fn desired_velocity(&self) -> Vec3 {
        if self.last_delta_time > 1e-5 {
            self.plane.to_world(self.last_delta_position / self.last_delta_time, self.vertical_velocity)
        } else {
            Vec3::ZERO
        }
    }

    /// The look-ahead point on the path, or the agent's position without one.
    pub fn steering_target(&self) -> Vec3 {
        if self.interpolator.valid() { self.interpolator.position() } else { self.simulated_position }
    }

    /// Distance left along the path, including the gap to the look-ahead
    /// point.  Infinite without a path.
    pub fn remaining_distance(&self) -> f32 {
        if self.interpolator.valid() {
            self.interpolator.remaining_distance()
                + self.plane.to_plane(self.interpolator.position() - self.simulated_position).length()
        } else {
            f32::INFINITY
        }
    }

    #[inline]
    pub fn reached_end_of_path(&self) -> bool {
        self.reached_end_of_path
    }

    /// `true` once the agent is at the end of its path *and* the distance
    /// left along the path plus the gap from the path's end to the
    /// destination is within `end_reached_distance`.
    ///
    /// Outside `YAxisForward` mode the destination must also lie within the
    /// agent's vertical extent: no higher than `height` above the agent and
    /// no lower than half of it below.
    pub fn reached_destination(&self) -> bool {
        if !self.reached_end_of_path || !self.has_destination() {
            return false;
        }
        let end_gap = self.plane.to_plane(self.destination - self.interpolator.end_point()).length();
        if self.remaining_distance() + end_gap > self.config.end_reached_distance {
            return false;
        }
        if self.config.orientation != nav_core::OrientationMode::YAxisForward {
            let (_, y_difference) = self.plane.to_plane_with_elevation(self.destination - self.simulated_position);
            let height = self.config.height;
            if y_difference > height || y_difference < -height * 0.5 {
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn has_path(&self) -> bool {
        self.interpolator.valid()
    }

    #[inline]
    pub fn path_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Id of the outstanding request, if any.
    #[inline]
    pub fn pending_path(&self) -> Option<PathId> {
        self.scheduler.pending()
    }

    /// The path currently claimed by this agent.
    #[inline]
    pub fn current_path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.is_stopped
    }

    #[inline]
    pub fn uses_gravity(&self) -> bool {
        self.using_gravity
    }

    /// Fill `buffer` with the agent's position followed by the rest of the
    /// path.  Returns `true` when there is no valid path, in which case the
    /// buffer holds only the position.
    pub fn get_remaining_path(&self, buffer: &mut Vec<Vec3>) -> bool {
        buffer.clear();
        buffer.push(self.simulated_position);
        if !self.interpolator.valid() {
            return true;
        }
        self.interpolator.get_remaining_path(buffer);
        false
    }
}
