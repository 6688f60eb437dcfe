//! Destination controllers: the gameplay side of path following.
//!
//! A controller decides *where* an agent should go; the agent decides *how*.
//! The world calls every controller once per frame, before agents update, and
//! applies the returned [`DestinationUpdate`].

use glam::Vec3;
use nav_agent::PathAgent;
use nav_core::{Frame, MarkerId, SimRng};

// ── Controller context ────────────────────────────────────────────────────────

/// Read-only world state shared by all controllers during one frame.
pub struct ControllerContext<'a> {
    pub frame:   Frame,
    /// Simulation time in seconds.
    pub now:     f64,
    markers:     &'a [Vec3],
}

impl<'a> ControllerContext<'a> {
    #[inline]
    pub fn new(frame: Frame, now: f64, markers: &'a [Vec3]) -> Self {
        Self { frame, now, markers }
    }

    /// Current position of `marker`, if it exists.
    #[inline]
    pub fn marker(&self, marker: MarkerId) -> Option<Vec3> {
        self.markers.get(marker.index()).copied()
    }
}

/// What a controller wants done with its agent's destination.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DestinationUpdate {
    Unchanged,
    /// Set the destination; the agent repaths on its normal schedule.
    Set(Vec3),
    /// Set the destination and request a path right away.
    SetAndSearch(Vec3),
    Clear,
}

/// Pluggable destination logic.
///
/// Controllers are owned per agent, so they may keep state (a patrol index,
/// a wait timer).  They must be `Send + Sync` because the world moves agent
/// slots across Rayon's pool with the `parallel` feature.
pub trait DestinationController: Send + Sync {
    fn update(&mut self, agent: &PathAgent, ctx: &ControllerContext<'_>, rng: &mut SimRng) -> DestinationUpdate;
}

/// `true` once an agent is idle at the end of its path.
#[inline]
fn arrived(agent: &PathAgent) -> bool {
    agent.reached_end_of_path() && !agent.path_pending()
}

// ── FixedDestination ──────────────────────────────────────────────────────────

/// Head for one point forever.
pub struct FixedDestination(pub Vec3);

impl DestinationController for FixedDestination {
    fn update(&mut self, agent: &PathAgent, _ctx: &ControllerContext<'_>, _rng: &mut SimRng) -> DestinationUpdate {
        if agent.destination() == self.0 { DestinationUpdate::Unchanged } else { DestinationUpdate::Set(self.0) }
    }
}

// ── FollowMarker ──────────────────────────────────────────────────────────────

/// Track a marker as it moves.  The agent picks up the new position at its
/// next scheduled repath.
pub struct FollowMarker {
    pub marker: MarkerId,
}

impl DestinationController for FollowMarker {
    fn update(&mut self, _agent: &PathAgent, ctx: &ControllerContext<'_>, _rng: &mut SimRng) -> DestinationUpdate {
        match ctx.marker(self.marker) {
            Some(p) => DestinationUpdate::Set(p),
            None => DestinationUpdate::Clear,
        }
    }
}

// ── Patrol ────────────────────────────────────────────────────────────────────

/// Visit `targets` in order, looping, optionally waiting at each one.
pub struct Patrol {
    pub targets:   Vec<Vec3>,
    /// Seconds to wait at each target before moving on.
    pub wait_secs: f64,
    index:         usize,
    switch_time:   f64,
}

impl Patrol {
    pub fn new(targets: Vec<Vec3>, wait_secs: f64) -> Self {
        Self { targets, wait_secs, index: 0, switch_time: f64::INFINITY }
    }

    /// Index of the target currently being approached.
    #[inline]
    pub fn current(&self) -> usize {
        self.index
    }
}

impl DestinationController for Patrol {
    fn update(&mut self, agent: &PathAgent, ctx: &ControllerContext<'_>, _rng: &mut SimRng) -> DestinationUpdate {
        if self.targets.is_empty() {
            return DestinationUpdate::Unchanged;
        }

        if arrived(agent) && self.switch_time == f64::INFINITY {
            self.switch_time = ctx.now + self.wait_secs;
        }
        let mut search = false;
        if ctx.now >= self.switch_time {
            self.index += 1;
            self.switch_time = f64::INFINITY;
            search = true;
        }
        self.index %= self.targets.len();

        let target = self.targets[self.index];
        if search {
            DestinationUpdate::SetAndSearch(target)
        } else if agent.destination() != target {
            DestinationUpdate::Set(target)
        } else {
            DestinationUpdate::Unchanged
        }
    }
}

// ── DefendZone ────────────────────────────────────────────────────────────────

/// Guard a circular zone: chase the intruder marker while it is inside,
/// otherwise return to the post.
pub struct DefendZone {
    pub center:   Vec3,
    pub radius:   f32,
    pub post:     Vec3,
    pub intruder: MarkerId,
}

impl DefendZone {
    fn inside(&self, p: Vec3) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }
}

impl DestinationController for DefendZone {
    fn update(&mut self, agent: &PathAgent, ctx: &ControllerContext<'_>, _rng: &mut SimRng) -> DestinationUpdate {
        let target = match ctx.marker(self.intruder) {
            Some(p) if self.inside(p) => p,
            _ => self.post,
        };
        if agent.destination() == target { DestinationUpdate::Unchanged } else { DestinationUpdate::Set(target) }
    }
}

// ── Wander ────────────────────────────────────────────────────────────────────

/// Pick a random point in a disc around `center` on the XZ plane, walk
/// there, repeat.
pub struct Wander {
    pub center: Vec3,
    pub radius: f32,
    started:    bool,
}

impl Wander {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius, started: false }
    }
}

impl DestinationController for Wander {
    fn update(&mut self, agent: &PathAgent, _ctx: &ControllerContext<'_>, rng: &mut SimRng) -> DestinationUpdate {
        if self.started && !arrived(agent) {
            return DestinationUpdate::Unchanged;
        }
        self.started = true;
        let offset = rng.unit_disc() * self.radius;
        DestinationUpdate::SetAndSearch(self.center + Vec3::new(offset.x, 0.0, offset.y))
    }
}
