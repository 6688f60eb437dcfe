//! Unit tests for nav-agent.
//!
//! Agent tests drive a single agent through a `Harness` that plays the host
//! loop: update, poll the path service, deliver completed paths.

#[cfg(test)]
mod helpers {
    use glam::{Quat, Vec3};
    use nav_core::math::look_rotation;
    use nav_core::{AgentId, Frame, OrientationMode};
    use nav_path::{Path, PathPlanner, PathService, QueuedPathService, StraightLinePlanner, WalkableClamp};

    use crate::{
        AgentConfig, AgentEvent, Body, GroundProbe, Gravity, MovementContext, NoGround, PathAgent, TransformBody,
        UpdatePhase,
    };

    pub const DT: f32 = 1.0 / 60.0;
    pub const WORLD_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    pub fn flat_config() -> AgentConfig {
        AgentConfig { gravity: Gravity::Disabled, can_search: false, ..AgentConfig::default() }
    }

    pub fn facing_x() -> Quat {
        look_rotation(OrientationMode::ZAxisForward, Vec3::X, Vec3::Y).unwrap()
    }

    pub fn x_line(length: f32) -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::new(length, 0.0, 0.0)]
    }

    pub struct Harness<P: PathPlanner = StraightLinePlanner> {
        pub body:     Body,
        pub service:  QueuedPathService<P>,
        pub ground:   Box<dyn GroundProbe>,
        pub walkable: Option<Box<dyn WalkableClamp>>,
        pub frame:    u64,
        pub now:      f64,
        pub events:   Vec<AgentEvent>,
    }

    impl Harness {
        pub fn new(body: Body) -> Self {
            Harness::with_planner(body, StraightLinePlanner { plane: None })
        }

        pub fn at(position: Vec3) -> Self {
            Harness::new(Body::Transform(TransformBody::new(position)))
        }
    }

    impl<P: PathPlanner> Harness<P> {
        pub fn with_planner(body: Body, planner: P) -> Self {
            Self {
                body,
                service: QueuedPathService::new(planner),
                ground: Box::new(NoGround),
                walkable: None,
                frame: 0,
                now: 0.0,
                events: Vec::new(),
            }
        }

        pub fn agent(&self, id: u32, config: AgentConfig) -> PathAgent {
            PathAgent::new(AgentId(id), config, &self.body).unwrap()
        }

        pub fn ctx(&mut self) -> MovementContext<'_> {
            MovementContext {
                host:          &mut self.body,
                paths:         &mut self.service,
                ground:        self.ground.as_ref(),
                walkable:      self.walkable.as_deref(),
                frame:         Frame(self.frame),
                now:           self.now,
                world_gravity: WORLD_GRAVITY,
            }
        }

        pub fn set_path(&mut self, agent: &mut PathAgent, points: Vec<Vec3>) {
            let path = Path::from_points(agent.id(), points);
            agent.set_path(Some(path), self.now, &mut self.service).unwrap();
            self.events.extend(agent.drain_events());
        }

        pub fn deliver(&mut self, agent: &mut PathAgent) {
            self.service.poll();
            let mut done = Vec::new();
            self.service.drain_completed(&mut done);
            for path in done {
                if path.requester == agent.id() {
                    agent.on_path_complete(path, &mut self.service).unwrap();
                }
            }
        }

        pub fn step_phase(&mut self, agent: &mut PathAgent, phase: UpdatePhase, dt: f32) {
            {
                let mut ctx = self.ctx();
                agent.update(phase, dt, &mut ctx);
            }
            self.deliver(agent);
            self.events.extend(agent.drain_events());
        }

        pub fn step(&mut self, agent: &mut PathAgent, dt: f32) {
            self.step_phase(agent, UpdatePhase::Frame, dt);
            self.frame += 1;
            self.now += dt as f64;
        }

        pub fn count(&self, pred: impl Fn(&AgentEvent) -> bool) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }
    }
}

// ── Steering ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod steering {
    use glam::Vec2;

    use crate::steering::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn negative_acceleration_scales_with_max_speed() {
        assert_eq!(effective_acceleration(-2.5, 5.0), 12.5);
        assert_eq!(effective_acceleration(3.0, 5.0), 3.0);
    }

    #[test]
    fn slowdown_inside_zone_only() {
        assert!((slowdown_factor(0.3, 0.6) - 0.5f32.sqrt()).abs() < 1e-6);
        assert_eq!(slowdown_factor(1.0, 0.6), 1.0);
        assert_eq!(slowdown_factor(0.1, 0.0), 1.0);
    }

    #[test]
    fn rotation_scale_cuts_off_below_threshold() {
        assert_eq!(rotation_speed_scale(1.0), 1.0);
        assert_eq!(rotation_speed_scale(0.3), 0.0);
        assert_eq!(rotation_speed_scale(0.1), 0.0);
    }

    #[test]
    fn brake_never_reverses() {
        assert!(approx(brake(Vec2::new(3.0, 4.0), 10.0, 0.1), Vec2::new(2.4, 3.2)));
        assert_eq!(brake(Vec2::new(0.5, 0.0), 10.0, 1.0), Vec2::ZERO);
    }

    #[test]
    fn delta_never_overshoots_end() {
        assert!(approx(delta_to_move(Vec2::new(10.0, 0.0), 1.0, 2.0), Vec2::new(2.0, 0.0)));
        assert!(approx(delta_to_move(Vec2::new(1.0, 0.0), 0.5, 2.0), Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn clamp_without_facing_penalty() {
        let v = clamp_velocity(Vec2::new(10.0, 0.0), 5.0, 1.0, false, Vec2::Y);
        assert!(approx(v, Vec2::new(5.0, 0.0)));
        let v = clamp_velocity(Vec2::new(10.0, 0.0), 5.0, 0.5, false, Vec2::Y);
        assert!(approx(v, Vec2::new(2.5, 0.0)));
    }

    #[test]
    fn clamp_keeps_aligned_velocity() {
        let v = clamp_velocity(Vec2::new(3.0, 0.0), 5.0, 1.0, true, Vec2::X);
        assert!(approx(v, Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn clamp_turns_backwards_velocity_towards_facing() {
        let v = clamp_velocity(Vec2::new(-1.0, 0.0), 5.0, 1.0, true, Vec2::X);
        // Facing away: speed capped at 20% of max, direction within 20°.
        assert!(v.length() <= 1.0 + 1e-5);
        let angle = v.angle_to(Vec2::X).abs().to_degrees();
        assert!((angle - 20.0).abs() < 1e-3, "angle {angle}");
    }

    #[test]
    fn acceleration_is_capped_along_heading() {
        let a = acceleration_to_reach_point(Vec2::new(10.0, 0.0), Vec2::new(1.0, 0.0), Vec2::ZERO, 2.5, 360.0, 1.0, Vec2::X);
        assert!(approx(a, Vec2::new(2.5, 0.0)));
    }

    #[test]
    fn acceleration_against_heading_is_penalised() {
        let a = acceleration_to_reach_point(
            Vec2::new(-10.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            2.5,
            0.0,
            1.0,
            Vec2::X,
        );
        assert!(approx(a, Vec2::new(-1.25, 0.0)), "{a}");
    }

    #[test]
    fn zero_target_velocity_arrives() {
        // 0.5 units left at 2 u/s², arrive speed 1.4 is above max_speed 1.
        let a = acceleration_to_reach_point(Vec2::new(0.5, 0.0), Vec2::ZERO, Vec2::ZERO, 2.0, 360.0, 1.0, Vec2::X);
        assert!(a.x > 0.0 && a.y.abs() < 1e-6);
        assert_eq!(
            acceleration_to_reach_point(Vec2::X, Vec2::X, Vec2::ZERO, 0.0, 360.0, 1.0, Vec2::X),
            Vec2::ZERO
        );
    }
}

#[cfg(test)]
mod steering_props {
    use glam::Vec2;
    use proptest::prelude::*;

    use crate::steering::clamp_velocity;

    proptest! {
        #[test]
        fn clamped_speed_never_exceeds_limit(
            vx in -50.0f32..50.0, vy in -50.0f32..50.0,
            fx in -1.0f32..1.0, fy in -1.0f32..1.0,
            max_speed in 0.0f32..10.0,
            slowdown in 0.0f32..1.0,
            facing in any::<bool>(),
        ) {
            let v = clamp_velocity(Vec2::new(vx, vy), max_speed, slowdown, facing, Vec2::new(fx, fy));
            let limit = max_speed * slowdown;
            prop_assert!(v.length() <= limit * (1.0 + 1e-4) + 1e-4, "{} > {}", v.length(), limit);
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use glam::Vec3;
    use nav_core::PathId;

    use crate::{CompletionDisposition, PathRequestScheduler, UNSET_DESTINATION};

    #[test]
    fn requests_are_throttled_and_exclusive() {
        let mut s = PathRequestScheduler::new();
        assert!(s.should_request(0.0, 0.5, true, Vec3::ONE));
        assert!(!s.should_request(0.0, 0.5, true, UNSET_DESTINATION));
        assert!(!s.should_request(0.0, 0.5, false, Vec3::ONE));

        s.begin_request(1.0, PathId(7));
        assert!(!s.should_request(5.0, 0.5, true, Vec3::ONE), "in flight");
        assert_eq!(s.complete(PathId(7)), CompletionDisposition::Accept);
        assert!(!s.should_request(1.2, 0.5, true, Vec3::ONE), "throttled");
        assert!(s.should_request(1.5, 0.5, true, Vec3::ONE));
    }

    #[test]
    fn cancel_on_idle_scheduler_is_noop() {
        let mut s = PathRequestScheduler::new();
        assert_eq!(s.cancel_pending(), None);
        assert!(!s.is_pending());
        assert!(s.should_request(0.0, 0.5, true, Vec3::ONE));
    }

    #[test]
    fn superseded_results_are_stale() {
        let mut s = PathRequestScheduler::new();
        s.begin_request(0.0, PathId(1));
        s.begin_request(0.1, PathId(2));
        assert_eq!(s.complete(PathId(1)), CompletionDisposition::Stale);
        assert_eq!(s.pending(), Some(PathId(2)));
        assert_eq!(s.cancel_pending(), Some(PathId(2)));
        assert_eq!(s.complete(PathId(2)), CompletionDisposition::Stale);
    }
}

// ── Position history ──────────────────────────────────────────────────────────

#[cfg(test)]
mod history {
    use glam::Vec3;
    use nav_core::Frame;

    use crate::PositionHistory;

    #[test]
    fn one_shift_per_frame() {
        let mut h = PositionHistory::new(Vec3::ZERO);
        h.record(Vec3::X, Frame(1));
        h.record(Vec3::X * 2.0, Frame(1));
        assert_eq!(h.previous(), Vec3::ZERO);
        assert_eq!(h.latest(), Vec3::X * 2.0);

        h.record(Vec3::X * 3.0, Frame(2));
        assert_eq!(h.previous(), Vec3::X * 2.0);
        assert_eq!(h.observed_velocity(0.5), Vec3::X * 2.0);
        assert_eq!(h.observed_velocity(0.0), Vec3::ZERO);
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod agent {
    use glam::Vec3;
    use nav_path::{Path, PathError, PathKind, PathPlanner, PathResult, PathService, PathState, PlannedPath};

    use super::helpers::*;
    use crate::{AgentConfig, AgentError, AgentEvent, Body, MovementHost, PathAgent, TransformBody};

    struct Unreachable;

    impl PathPlanner for Unreachable {
        fn plan(&self, _: Vec3, _: Vec3) -> PathResult<PlannedPath> {
            Err(PathError::EmptyGraph)
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let h = Harness::at(Vec3::ZERO);
        let config = AgentConfig { max_speed: -1.0, ..AgentConfig::default() };
        assert!(matches!(PathAgent::new(nav_core::AgentId(0), config, &h.body), Err(AgentError::Config(_))));
    }

    #[test]
    fn accelerates_monotonically_to_max_speed() {
        let mut h = Harness::new(Body::Transform(TransformBody { position: Vec3::ZERO, rotation: facing_x() }));
        let config = AgentConfig { max_speed: 5.0, max_acceleration: -2.5, ..flat_config() };
        let mut agent = h.agent(0, config);
        h.set_path(&mut agent, x_line(100.0));

        let frames = (2.0 / DT).ceil() as usize + 1;
        let mut last_speed = 0.0;
        for _ in 0..frames {
            h.step(&mut agent, DT);
            let speed = agent.velocity_2d().length();
            assert!(speed + 1e-5 >= last_speed, "speed dropped from {last_speed} to {speed}");
            last_speed = speed;
        }
        assert!(last_speed >= 5.0 * 0.99, "speed {last_speed}");
        assert!(last_speed <= 5.0 + 1e-4);
    }

    #[test]
    fn zero_dt_leaves_pose_and_velocity() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, x_line(10.0));
        for _ in 0..20 {
            h.step(&mut agent, DT);
        }
        let velocity = agent.velocity_2d();
        let (position, rotation) = (h.body.position(), h.body.rotation());

        let mut ctx = h.ctx();
        let (next_position, next_rotation) = agent.movement_update(0.0, &mut ctx);
        assert_eq!(next_position, position);
        assert_eq!(next_rotation, rotation);
        assert_eq!(agent.velocity_2d(), velocity);
        assert_eq!(agent.desired_velocity(), Vec3::ZERO);
    }

    #[test]
    fn follows_path_to_the_end_and_stops() {
        let mut h = Harness::at(Vec3::ZERO);
        let config = AgentConfig { max_speed: 2.0, slowdown_distance: 2.0, end_reached_distance: 0.2, ..flat_config() };
        let mut agent = h.agent(0, config);
        let target = Vec3::new(10.0, 0.0, 0.0);
        agent.set_destination(target);
        h.set_path(&mut agent, x_line(10.0));

        for _ in 0..(30.0 / DT) as usize {
            h.step(&mut agent, DT);
        }

        assert!(agent.reached_end_of_path());
        assert!(agent.reached_destination());
        assert!(h.body.position().distance(target) <= 0.2 + 1e-3, "{}", h.body.position());
        assert!(agent.velocity_2d().length() < 1e-3);
        assert_eq!(h.count(|e| *e == AgentEvent::TargetReached), 1, "reached flag flapped");
    }

    #[test]
    fn destination_off_path_end_counts_agent_gap() {
        let mut h = Harness::at(Vec3::ZERO);
        let config = AgentConfig { max_speed: 2.0, slowdown_distance: 2.0, end_reached_distance: 0.2, ..flat_config() };
        let mut agent = h.agent(0, config);
        agent.set_destination(Vec3::new(10.0, 0.0, 0.15));
        h.set_path(&mut agent, x_line(10.0));

        for _ in 0..(30.0 / DT) as usize {
            h.step(&mut agent, DT);
        }

        // Stopped short of the path end, so the gap to the destination is
        // more than the end gap alone.
        assert!(agent.reached_end_of_path());
        let remaining = agent.remaining_distance();
        assert!(remaining > 0.05 && remaining <= 0.2, "remaining {remaining}");
        assert!(remaining + 0.15 > 0.2);
        assert!(!agent.reached_destination());

        // A destination right at the path end is still reached.
        agent.set_destination(Vec3::new(10.0, 0.0, 0.0));
        assert!(agent.reached_destination());
    }

    #[test]
    fn stopped_agent_brakes_but_keeps_path() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, x_line(50.0));
        for _ in 0..60 {
            h.step(&mut agent, DT);
        }
        assert!(agent.velocity_2d().length() > 0.5);

        agent.stop();
        for _ in 0..60 {
            h.step(&mut agent, DT);
        }
        assert_eq!(agent.velocity_2d().length(), 0.0);
        assert!(agent.has_path());
        assert!(agent.is_stopped());
    }

    #[test]
    fn set_path_rejects_computing_and_multi_target() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());

        let mut computing = Path::from_points(agent.id(), x_line(1.0));
        computing.state = PathState::Computing;
        assert!(matches!(
            agent.set_path(Some(computing), 0.0, &mut h.service),
            Err(AgentError::PathStillComputing(_))
        ));

        let mut multi = Path::from_points(agent.id(), x_line(1.0));
        multi.kind = PathKind::MultiTarget;
        assert!(matches!(agent.set_path(Some(multi), 0.0, &mut h.service), Err(AgentError::UnsupportedPathKind(_))));
        assert!(!agent.has_path());
    }

    #[test]
    fn own_repath_result_cannot_be_set() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        agent.set_destination(Vec3::new(5.0, 0.0, 0.0));
        agent.search_path(h.now, &mut h.service);
        h.service.poll();
        let mut done = Vec::new();
        h.service.drain_completed(&mut done);
        let path = done.pop().unwrap();

        assert!(matches!(agent.set_path(Some(path), 0.0, &mut h.service), Err(AgentError::AlreadyBeingComputed(_))));
    }

    #[test]
    fn created_path_is_submitted_and_accepted_later() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        let request = nav_path::PathRequest::point_to_point(agent.id(), Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0));
        agent.set_path(Some(Path::from_request(request)), 0.0, &mut h.service).unwrap();
        assert!(agent.path_pending());
        assert!(!agent.has_path());

        h.deliver(&mut agent);
        assert!(!agent.path_pending());
        assert!(agent.has_path());
    }

    #[test]
    fn superseded_request_is_ignored() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        agent.set_destination(Vec3::new(5.0, 0.0, 0.0));
        agent.search_path(0.0, &mut h.service);
        let first = agent.pending_path().unwrap();
        agent.set_destination(Vec3::new(0.0, 0.0, 5.0));
        agent.search_path(0.1, &mut h.service);
        let second = agent.pending_path().unwrap();
        assert_ne!(first, second);

        h.deliver(&mut agent);
        let events: Vec<_> = agent.drain_events().collect();
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::PathFailed { .. })));
        assert_eq!(agent.current_path().map(|p| p.id), Some(second));
        assert_eq!(agent.current_path().map(|p| p.end), Some(Vec3::new(0.0, 0.0, 5.0)));
        assert!(!h.service.pool().is_claimed_by(first, agent.id()));
    }

    #[test]
    fn failed_search_keeps_previous_path() {
        let mut h = Harness::with_planner(Body::Transform(TransformBody::new(Vec3::ZERO)), Unreachable);
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, x_line(10.0));
        let kept = agent.current_path().map(|p| p.id);

        agent.set_destination(Vec3::new(3.0, 0.0, 3.0));
        agent.search_path(0.0, &mut h.service);
        h.deliver(&mut agent);

        let events: Vec<_> = agent.drain_events().collect();
        assert!(events.iter().any(|e| matches!(e, AgentEvent::PathFailed { .. })));
        assert!(agent.has_path());
        assert_eq!(agent.current_path().map(|p| p.id), kept);
        assert!(!agent.path_pending());
    }

    #[test]
    fn replacing_a_path_moves_the_claim() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, x_line(10.0));
        let first = agent.current_path().unwrap().id;
        h.set_path(&mut agent, vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)]);
        let second = agent.current_path().unwrap().id;

        assert_eq!(h.service.pool().claim_count(first), 0);
        assert!(h.service.pool().is_claimed_by(second, agent.id()));

        agent.teardown(&mut h.service);
        assert_eq!(h.service.pool().claim_count(second), 0);
        assert!(!agent.has_path());
        assert_eq!(agent.velocity_2d(), glam::Vec2::ZERO);
    }

    #[test]
    fn short_path_is_reached_on_acceptance() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, vec![Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0)]);
        assert!(agent.reached_end_of_path());
        assert_eq!(h.count(|e| *e == AgentEvent::TargetReached), 1);

        // Destination must lie within the agent's vertical extent.
        agent.set_destination(Vec3::new(0.1, 3.0, 0.0));
        assert!(!agent.reached_destination());
        agent.set_destination(Vec3::new(0.1, 1.5, 0.0));
        assert!(agent.reached_destination());
        agent.set_destination(Vec3::new(0.1, -1.5, 0.0));
        assert!(!agent.reached_destination());
        agent.clear_destination();
        assert!(!agent.reached_destination());
    }

    #[test]
    fn remaining_path_and_distance() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        let mut buffer = Vec::new();
        assert!(agent.get_remaining_path(&mut buffer));
        assert_eq!(buffer, vec![Vec3::ZERO]);
        assert_eq!(agent.remaining_distance(), f32::INFINITY);
        assert_eq!(agent.steering_target(), Vec3::ZERO);

        h.set_path(&mut agent, vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 5.0)]);
        assert!(!agent.get_remaining_path(&mut buffer));
        assert_eq!(buffer.len(), 4);
        assert!(buffer[1].distance(Vec3::new(2.0, 0.0, 0.0)) < 1e-4);
        assert_eq!(buffer[3], Vec3::new(5.0, 0.0, 5.0));
        assert!((agent.remaining_distance() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn teleport_resets_history_and_repaths() {
        let mut h = Harness::at(Vec3::ZERO);
        let config = AgentConfig { can_search: true, ..flat_config() };
        let mut agent = h.agent(0, config);
        h.set_path(&mut agent, x_line(10.0));
        for _ in 0..30 {
            h.step(&mut agent, DT);
        }
        assert!(agent.velocity().length() > 0.0);

        agent.set_destination(Vec3::new(0.0, 0.0, 20.0));
        let mut ctx = h.ctx();
        agent.teleport(Vec3::new(3.0, 0.0, 3.0), true, &mut ctx);
        assert_eq!(h.body.position(), Vec3::new(3.0, 0.0, 3.0));
        assert_eq!(agent.velocity(), Vec3::ZERO);
        assert!(!agent.has_path());
        assert!(agent.path_pending());
    }

    #[test]
    fn start_requests_immediately() {
        let mut h = Harness::at(Vec3::new(1.0, 0.0, 1.0));
        let config = AgentConfig { can_search: true, ..flat_config() };
        let mut agent = h.agent(0, config);
        agent.set_destination(Vec3::new(8.0, 0.0, 1.0));
        let mut ctx = h.ctx();
        agent.start(&mut ctx);
        assert!(agent.path_pending());

        h.deliver(&mut agent);
        assert!(agent.has_path());
        let events: Vec<_> = agent.drain_events().collect();
        assert!(matches!(events[0], AgentEvent::SearchPath { .. }));
    }

    #[test]
    fn move_by_applies_at_finalization() {
        let mut h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(0, flat_config());
        agent.move_by(Vec3::new(0.0, 0.0, 1.5));
        h.step(&mut agent, DT);
        assert_eq!(h.body.position(), Vec3::new(0.0, 0.0, 1.5));
        assert!(h.events.iter().any(|e| matches!(e, AgentEvent::Moved { .. })));
    }
}

// ── Hosts, gravity, and clamping ──────────────────────────────────────────────

#[cfg(test)]
mod hosts {
    use glam::Vec3;
    use nav_path::WalkableClamp;

    use super::helpers::*;
    use crate::{
        AgentConfig, Body, CharacterBody, GroundPlane, Gravity, LayerMask, MovementHost, RigidBodyLike, UpdatePhase,
    };

    /// Walkable strip |z| <= 0.5.
    struct Strip;

    impl WalkableClamp for Strip {
        fn nearest_walkable(&self, p: Vec3) -> Option<Vec3> {
            Some(Vec3::new(p.x, p.y, p.z.clamp(-0.5, 0.5)))
        }
    }

    #[test]
    fn falls_onto_ground() {
        let mut h = Harness::at(Vec3::new(0.0, 1.0, 0.0));
        h.ground = Box::new(GroundPlane::horizontal(0.0));
        let config = AgentConfig { gravity: Gravity::World, can_search: false, ..AgentConfig::default() };
        let mut agent = h.agent(0, config);

        for _ in 0..120 {
            h.step(&mut agent, DT);
        }
        assert!(agent.uses_gravity());
        assert!(h.body.position().y.abs() < 1e-5, "{}", h.body.position());
    }

    #[test]
    fn ground_outside_mask_is_ignored() {
        let mut h = Harness::at(Vec3::new(0.0, 1.0, 0.0));
        h.ground = Box::new(GroundPlane { layer: 3, ..GroundPlane::horizontal(0.0) });
        let config = AgentConfig { ground_mask: LayerMask::layer(1), can_search: false, ..AgentConfig::default() };
        let mut agent = h.agent(0, config);
        for _ in 0..120 {
            h.step(&mut agent, DT);
        }
        assert!(h.body.position().y < -1.0);
    }

    #[test]
    fn dynamic_rigid_body_owns_gravity() {
        let mut h = Harness::new(Body::RigidBody(RigidBodyLike::new(Vec3::ZERO, false)));
        let mut agent = h.agent(0, AgentConfig { can_search: false, ..AgentConfig::default() });
        h.step(&mut agent, DT);
        assert!(!agent.uses_gravity());

        let mut h = Harness::new(Body::RigidBody(RigidBodyLike::new(Vec3::ZERO, true)));
        let mut agent = h.agent(0, AgentConfig { can_search: false, ..AgentConfig::default() });
        h.step(&mut agent, DT);
        assert!(agent.uses_gravity());
    }

    #[test]
    fn rigid_body_moves_in_fixed_phase() {
        let mut h = Harness::new(Body::RigidBody(RigidBodyLike::new(Vec3::ZERO, true)));
        let mut agent = h.agent(0, flat_config());
        h.set_path(&mut agent, x_line(10.0));
        for _ in 0..10 {
            h.step(&mut agent, DT);
        }
        assert_eq!(h.body.position(), Vec3::ZERO, "frame phase must not move a rigid body");

        for _ in 0..10 {
            h.step_phase(&mut agent, UpdatePhase::Fixed, 0.02);
            h.body.integrate(0.02, WORLD_GRAVITY, h.ground.as_ref());
        }
        assert!(h.body.position().x > 0.0);
        assert!((h.body.position() - agent.position()).length() < 1e-6);
    }

    #[test]
    fn character_controller_stays_grounded() {
        let mut h = Harness::new(Body::Character(CharacterBody::new(Vec3::ZERO, 2.0)));
        h.ground = Box::new(GroundPlane::horizontal(0.0));
        let config = AgentConfig { gravity: Gravity::World, can_search: false, ..AgentConfig::default() };
        let mut agent = h.agent(0, config);
        h.set_path(&mut agent, x_line(10.0));

        for _ in 0..120 {
            h.step(&mut agent, DT);
        }
        assert!(h.body.position().x > 0.5);
        assert!(h.body.position().y.abs() < 1e-5);
        assert_eq!(agent.vertical_velocity(), 0.0);
    }

    #[test]
    fn clamped_to_walkable_strip() {
        let mut h = Harness::at(Vec3::ZERO);
        h.walkable = Some(Box::new(Strip));
        let config = AgentConfig { constrain_inside_graph: true, max_speed: 3.0, ..flat_config() };
        let mut agent = h.agent(0, config);
        h.set_path(&mut agent, vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 5.0)]);

        for _ in 0..240 {
            h.step(&mut agent, DT);
            assert!(h.body.position().z <= 0.5 + 1e-5, "{}", h.body.position());
        }
        assert!(h.body.position().x > 2.0);
    }
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot {
    use glam::Vec3;

    use super::helpers::*;
    use crate::{AgentSnapshot, Body, MovementHost, TransformBody};

    #[test]
    fn restored_agent_moves_identically() {
        let points = vec![Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)];

        let body = Body::Transform(TransformBody { position: Vec3::ZERO, rotation: facing_x() });
        let mut ha = Harness::new(body);
        let mut a = ha.agent(0, flat_config());
        ha.set_path(&mut a, points.clone());
        for _ in 0..30 {
            ha.step(&mut a, DT);
        }

        let json = serde_json::to_string(&a.snapshot()).unwrap();
        let snapshot: AgentSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, a.snapshot());
        assert_eq!(snapshot.destination, None);

        let mut hb = Harness::new(body);
        hb.frame = ha.frame;
        hb.now = ha.now;
        let mut b = hb.agent(1, flat_config());
        hb.set_path(&mut b, points);
        b.restore(&snapshot, &mut hb.body);
        assert_eq!(hb.body.position(), ha.body.position());

        for _ in 0..30 {
            ha.step(&mut a, DT);
            hb.step(&mut b, DT);
            assert!((ha.body.position() - hb.body.position()).length() < 1e-5);
            assert!((a.velocity_2d() - b.velocity_2d()).length() < 1e-5);
        }
    }

    #[test]
    fn destination_survives_round_trip() {
        let h = Harness::at(Vec3::ZERO);
        let mut agent = h.agent(4, flat_config());
        agent.set_destination(Vec3::new(1.0, 2.0, 3.0));
        agent.stop();
        let json = serde_json::to_string(&agent.snapshot()).unwrap();
        let back: AgentSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.destination, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(back.is_stopped);
    }
}
