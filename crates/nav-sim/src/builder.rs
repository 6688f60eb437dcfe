//! Fluent builders for constructing a [`World`] and its agents.

use std::sync::Arc;

use glam::Vec3;
use nav_agent::{AgentConfig, Body, GroundProbe, TransformBody};
use nav_core::SimConfig;
use nav_path::{PathService, WalkableClamp};

use crate::destinations::DestinationController;
use crate::{SimResult, World};

// ── AgentSpawn ────────────────────────────────────────────────────────────────

/// Everything needed to put one agent into a world.
///
/// ```rust,ignore
/// let spawn = AgentSpawn::new(Body::Transform(TransformBody::new(p)))
///     .config(archetype.clone())
///     .controller(Patrol::new(waypoints, 1.0));
/// ```
pub struct AgentSpawn {
    pub config:      AgentConfig,
    pub body:        Body,
    pub controller:  Option<Box<dyn DestinationController>>,
    pub destination: Option<Vec3>,
}

impl AgentSpawn {
    /// An agent with default tuning on `body`.
    pub fn new(body: Body) -> Self {
        Self { config: AgentConfig::default(), body, controller: None, destination: None }
    }

    /// Shorthand for a plain transform at `position`.
    pub fn at(position: Vec3) -> Self {
        Self::new(Body::Transform(TransformBody::new(position)))
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn controller(mut self, controller: impl DestinationController + 'static) -> Self {
        self.controller = Some(Box::new(controller));
        self
    }

    /// Initial destination.  A path is requested as soon as the agent spawns.
    pub fn destination(mut self, destination: Vec3) -> Self {
        self.destination = Some(destination);
        self
    }
}

// ── WorldBuilder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`World<S, G>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: frame and physics step lengths, seed, gravity, …
/// - `S: PathService`, e.g. a `QueuedPathService` over a `GraphPlanner`
/// - `G: GroundProbe`: what agents stand on (`NoGround` for flat worlds)
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                          |
/// |-----------------|----------------------------------|
/// | `.walkable(w)`  | none; `constrain_inside_graph` is a no-op |
/// | `.marker(p)`    | no markers                       |
/// | `.spawn(s)`     | no agents                        |
pub struct WorldBuilder<S: PathService, G: GroundProbe> {
    config:   SimConfig,
    service:  S,
    ground:   G,
    walkable: Option<Arc<dyn WalkableClamp>>,
    markers:  Vec<Vec3>,
    spawns:   Vec<AgentSpawn>,
}

impl<S: PathService, G: GroundProbe> WorldBuilder<S, G> {
    pub fn new(config: SimConfig, service: S, ground: G) -> Self {
        Self { config, service, ground, walkable: None, markers: Vec::new(), spawns: Vec::new() }
    }

    /// Surface used to clamp agents with `constrain_inside_graph` set.
    pub fn walkable(mut self, walkable: Arc<dyn WalkableClamp>) -> Self {
        self.walkable = Some(walkable);
        self
    }

    /// Add a marker.  Markers get ids `MarkerId(0)`, `MarkerId(1)`, … in call
    /// order.
    pub fn marker(mut self, position: Vec3) -> Self {
        self.markers.push(position);
        self
    }

    /// Queue an agent.  Agents get ids `AgentId(0)`, `AgentId(1)`, … in call
    /// order.
    pub fn spawn(mut self, spawn: AgentSpawn) -> Self {
        self.spawns.push(spawn);
        self
    }

    /// Validate the config and every agent's tuning, then spawn all agents.
    pub fn build(self) -> SimResult<World<S, G>> {
        for spawn in &self.spawns {
            spawn.config.validate()?;
        }
        let mut world = World::new(self.config, self.service, self.ground, self.walkable, self.markers)?;
        for spawn in self.spawns {
            world.spawn(spawn)?;
        }
        Ok(world)
    }
}
