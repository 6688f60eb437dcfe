//! The `World` struct and its frame loop.

use std::sync::Arc;

use glam::Vec3;
use nav_agent::{AgentEvent, Body, MovementContext, MovementHost, PathAgent, UpdatePhase};
use nav_core::{AgentId, Frame, MarkerId, NavError, SimClock, SimConfig, SimRng};
use nav_path::{Path, PathService, WalkableClamp};
use tracing::{debug, trace, warn};

use crate::destinations::{ControllerContext, DestinationController, DestinationUpdate};
use crate::{AgentSpawn, SimObserver, SimResult};

// ── AgentSlot ─────────────────────────────────────────────────────────────────

/// Everything the world stores for one live agent.
pub struct AgentSlot {
    pub agent:      PathAgent,
    pub body:       Body,
    pub controller: Option<Box<dyn DestinationController>>,
    pub rng:        SimRng,
}

// ── World ─────────────────────────────────────────────────────────────────────

/// The frame-loop host.
///
/// `World<S, G>` owns every agent with its body, the path service `S`, and
/// the ground `G`, and drives the per-frame sequence:
///
/// 1. **Fixed steps**: for each physics step due this frame, update
///    rigid-body agents in the fixed phase, then integrate all bodies
///    (parallel with the `parallel` feature).
/// 2. **Controllers**: each agent's [`DestinationController`] may move its
///    destination.
/// 3. **Frame phase**: every agent updates in ascending `AgentId` order;
///    agents on non-rigid bodies move here.
/// 4. **Delivery**: the path service is polled and completed paths are
///    handed to their requesters.  This is the only point where path results
///    enter agent state.
/// 5. **Events**: queued agent events go to the observer.
///
/// Create via [`WorldBuilder`][crate::WorldBuilder].
pub struct World<S: PathService, G: nav_agent::GroundProbe> {
    pub config:  SimConfig,
    pub clock:   SimClock,
    pub service: S,
    pub ground:  G,

    /// Indexed by `AgentId`.  Despawned agents leave a `None` hole so ids
    /// stay stable.
    slots:     Vec<Option<AgentSlot>>,
    walkable:  Option<Arc<dyn WalkableClamp>>,
    markers:   Vec<Vec3>,
    completed: Vec<Path>,
    events:    Vec<AgentEvent>,
    master_rng: SimRng,

    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl<S: PathService, G: nav_agent::GroundProbe> World<S, G> {
    pub(crate) fn new(
        config:   SimConfig,
        service:  S,
        ground:   G,
        walkable: Option<Arc<dyn WalkableClamp>>,
        markers:  Vec<Vec3>,
    ) -> SimResult<Self> {
        config.validate()?;

        #[cfg(feature = "parallel")]
        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| crate::SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            clock:      config.make_clock(),
            master_rng: SimRng::new(config.seed),
            config,
            service,
            ground,
            slots:      Vec::new(),
            walkable,
            markers,
            completed:  Vec::new(),
            events:     Vec::new(),
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    // ── Agents ────────────────────────────────────────────────────────────

    /// Add an agent and bring it into play.  Ids are assigned densely in
    /// spawn order.
    pub fn spawn(&mut self, spawn: AgentSpawn) -> SimResult<AgentId> {
        let id = AgentId(self.slots.len() as u32);
        let AgentSpawn { config, mut body, controller, destination } = spawn;

        let mut agent = PathAgent::new(id, config, &body)?;
        if let Some(d) = destination {
            agent.set_destination(d);
        }
        {
            let mut ctx = MovementContext {
                host:          &mut body,
                paths:         &mut self.service,
                ground:        &self.ground,
                walkable:      self.walkable.as_deref(),
                frame:         self.clock.current_frame,
                now:           self.clock.now(),
                world_gravity: self.config.world_gravity,
            };
            agent.start(&mut ctx);
        }

        let rng = SimRng::for_agent(self.config.seed, id);
        self.slots.push(Some(AgentSlot { agent, body, controller, rng }));
        debug!(agent = %id, "agent spawned");
        Ok(id)
    }

    /// Remove an agent, cancelling its requests and releasing its path.
    pub fn despawn(&mut self, id: AgentId) -> SimResult<()> {
        let mut slot = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(NavError::AgentNotFound(id))?;
        slot.agent.teardown(&mut self.service);
        self.service.forget(id);
        debug!(agent = %id, "agent despawned");
        Ok(())
    }

    pub fn agent(&self, id: AgentId) -> Option<&PathAgent> {
        self.slot(id).map(|s| &s.agent)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut PathAgent> {
        self.slot_mut(id).map(|s| &mut s.agent)
    }

    pub fn body(&self, id: AgentId) -> Option<&Body> {
        self.slot(id).map(|s| &s.body)
    }

    pub fn slot(&self, id: AgentId) -> Option<&AgentSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn slot_mut(&mut self, id: AgentId) -> Option<&mut AgentSlot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live agents in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = &PathAgent> + '_ {
        self.slots.iter().flatten().map(|s| &s.agent)
    }

    pub fn agent_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Teleport an agent, dropping its path and repathing from the new spot.
    pub fn teleport(&mut self, id: AgentId, position: Vec3) -> SimResult<()> {
        let slot = self.slots.get_mut(id.index()).and_then(Option::as_mut).ok_or(NavError::AgentNotFound(id))?;
        let mut ctx = MovementContext {
            host:          &mut slot.body,
            paths:         &mut self.service,
            ground:        &self.ground,
            walkable:      self.walkable.as_deref(),
            frame:         self.clock.current_frame,
            now:           self.clock.now(),
            world_gravity: self.config.world_gravity,
        };
        slot.agent.teleport(position, true, &mut ctx);
        Ok(())
    }

    // ── Markers ───────────────────────────────────────────────────────────

    pub fn add_marker(&mut self, position: Vec3) -> MarkerId {
        self.markers.push(position);
        MarkerId((self.markers.len() - 1) as u16)
    }

    pub fn marker(&self, id: MarkerId) -> Option<Vec3> {
        self.markers.get(id.index()).copied()
    }

    /// Move a marker.  Unknown markers are ignored.
    pub fn set_marker(&mut self, id: MarkerId, position: Vec3) {
        match self.markers.get_mut(id.index()) {
            Some(m) => *m = position,
            None => warn!(marker = %id, "set_marker on unknown marker"),
        }
    }

    /// A fresh RNG derived from the world seed, e.g. for spawn placement.
    pub fn child_rng(&mut self, offset: u64) -> SimRng {
        self.master_rng.child(offset)
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run from the current frame to `config.end_frame()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_frame < self.config.end_frame() {
            self.step(observer)?;
        }
        observer.on_sim_end(self.clock.current_frame);
        Ok(())
    }

    /// Run exactly `n` frames (ignores `end_frame`).
    pub fn run_frames<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Advance one frame of `config.frame_delta_secs`.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let frame = self.clock.current_frame;
        observer.on_frame_start(frame);

        let dt = self.config.frame_delta_secs;
        let fixed_steps = self.clock.advance(dt);
        let now = self.clock.now();

        // ── Phase 1: fixed physics steps ──────────────────────────────────
        for _ in 0..fixed_steps {
            self.fixed_step(frame, now);
        }

        // ── Phase 2: destination controllers ──────────────────────────────
        self.run_controllers(frame, now);

        // ── Phase 3: frame-phase agent updates ────────────────────────────
        //
        // Explicit field borrows so the borrow checker sees disjoint access.
        let service  = &mut self.service;
        let ground   = &self.ground;
        let walkable = self.walkable.as_deref();
        let gravity  = self.config.world_gravity;
        for slot in self.slots.iter_mut().flatten() {
            let mut ctx = MovementContext {
                host: &mut slot.body,
                paths: &mut *service,
                ground,
                walkable,
                frame,
                now,
                world_gravity: gravity,
            };
            slot.agent.update(UpdatePhase::Frame, dt, &mut ctx);
        }

        // ── Phase 4: deliver completed paths ──────────────────────────────
        self.deliver_paths();

        // ── Phase 5: events ───────────────────────────────────────────────
        let mut moving = 0;
        for slot in self.slots.iter_mut().flatten() {
            let id = slot.agent.id();
            self.events.extend(slot.agent.drain_events());
            for event in self.events.drain(..) {
                observer.on_agent_event(frame, id, &event);
            }
            if slot.agent.has_path() && !slot.agent.reached_end_of_path() {
                moving += 1;
            }
        }
        observer.on_frame_end(frame, moving);
        Ok(())
    }

    fn fixed_step(&mut self, frame: Frame, now: f64) {
        let fixed_dt = self.config.fixed_delta_secs;
        let gravity = self.config.world_gravity;
        {
            let service  = &mut self.service;
            let ground   = &self.ground;
            let walkable = self.walkable.as_deref();
            for slot in self.slots.iter_mut().flatten() {
                if UpdatePhase::driving(slot.body.backend()) != UpdatePhase::Fixed {
                    continue;
                }
                let mut ctx = MovementContext {
                    host: &mut slot.body,
                    paths: &mut *service,
                    ground,
                    walkable,
                    frame,
                    now,
                    world_gravity: gravity,
                };
                slot.agent.update(UpdatePhase::Fixed, fixed_dt, &mut ctx);
            }
        }
        self.integrate_bodies(fixed_dt, gravity);
    }

    #[cfg(not(feature = "parallel"))]
    fn integrate_bodies(&mut self, dt: f32, gravity: Vec3) {
        let ground = &self.ground;
        for slot in self.slots.iter_mut().flatten() {
            slot.body.integrate(dt, gravity, ground);
        }
    }

    #[cfg(feature = "parallel")]
    fn integrate_bodies(&mut self, dt: f32, gravity: Vec3) {
        use rayon::prelude::*;

        let ground = &self.ground;
        let slots = &mut self.slots;
        let mut integrate = || {
            slots
                .par_iter_mut()
                .filter_map(Option::as_mut)
                .for_each(|slot| slot.body.integrate(dt, gravity, ground));
        };
        match &self.pool {
            Some(pool) => pool.install(integrate),
            None => integrate(),
        }
    }

    fn run_controllers(&mut self, frame: Frame, now: f64) {
        let ctx = ControllerContext::new(frame, now, &self.markers);
        let service = &mut self.service;
        for slot in self.slots.iter_mut().flatten() {
            let Some(controller) = slot.controller.as_mut() else { continue };
            match controller.update(&slot.agent, &ctx, &mut slot.rng) {
                DestinationUpdate::Unchanged => {}
                DestinationUpdate::Set(d) => slot.agent.set_destination(d),
                DestinationUpdate::SetAndSearch(d) => {
                    slot.agent.set_destination(d);
                    slot.agent.search_path(now, &mut *service);
                }
                DestinationUpdate::Clear => slot.agent.clear_destination(),
            }
        }
    }

    fn deliver_paths(&mut self) {
        self.service.poll();
        self.service.drain_completed(&mut self.completed);
        for path in self.completed.drain(..) {
            let id = path.id;
            match self.slots.get_mut(path.requester.index()).and_then(Option::as_mut) {
                Some(slot) => {
                    if let Err(e) = slot.agent.on_path_complete(path, &mut self.service) {
                        warn!(agent = %slot.agent.id(), path = %id, error = %e, "path delivery rejected");
                    }
                }
                None => trace!(path = %id, "requester gone; dropping path"),
            }
        }
    }
}
