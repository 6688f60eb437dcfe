//! dungeon: a small crowd of path-following mobs in a nine-room dungeon.
//!
//! Patrollers walk the room ring, guards defend the throne room against a
//! scripted player, and wanderers drift around the great hall.  Paths come
//! from a waypoint graph with a two-poll latency to mimic an asynchronous
//! path service.
//!
//! Usage: `dungeon [overrides.json]`, where the optional file may carry a
//! `"sim"` object (a `SimConfig`) and an `"agent"` object (an
//! `AgentConfig` applied to every mob).  Set `RUST_LOG=debug` for per-agent
//! path events.

mod dungeon;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nav_agent::{AgentConfig, AgentEvent, Body, CharacterBody, Gravity, GroundPlane, MovementHost, TransformBody};
use nav_core::{AgentId, Frame, MarkerId, SimConfig, SimRng};
use nav_path::{GraphPlanner, PathService, QueuedPathService};
use nav_sim::{AgentSpawn, DefendZone, Patrol, SimObserver, TracingObserver, Wander, WorldBuilder};

use dungeon::{ROOM_SPACING, build_dungeon};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:           u64 = 7;
const SIM_SECONDS:    u64 = 60;
const PATROLLERS:     usize = 4;
const GUARDS:         usize = 2;
const WANDERERS:      usize = 3;
const PATH_LATENCY:   u32 = 2;
const THRONE_RADIUS:  f32 = 6.0;

// ── Observer wrapper ──────────────────────────────────────────────────────────

struct DungeonObserver {
    inner:       TracingObserver,
    peak_moving: usize,
    requests:    usize,
}

impl SimObserver for DungeonObserver {
    fn on_agent_event(&mut self, frame: Frame, agent: AgentId, event: &AgentEvent) {
        if matches!(event, AgentEvent::SearchPath { .. }) {
            self.requests += 1;
        }
        self.inner.on_agent_event(frame, agent, event);
    }

    fn on_frame_end(&mut self, frame: Frame, moving: usize) {
        self.peak_moving = self.peak_moving.max(moving);
        self.inner.on_frame_end(frame, moving);
    }

    fn on_sim_end(&mut self, final_frame: Frame) {
        self.inner.on_sim_end(final_frame);
    }
}

// ── Overrides ─────────────────────────────────────────────────────────────────

fn load_overrides(sim: &mut SimConfig, agent: &mut AgentConfig) -> Result<()> {
    let Some(path) = std::env::args().nth(1) else { return Ok(()) };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let mut doc: serde_json::Value = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;

    if let Some(v) = doc.get_mut("sim").map(serde_json::Value::take) {
        *sim = serde_json::from_value(v).context("\"sim\" is not a SimConfig")?;
    }
    if let Some(v) = doc.get_mut("agent").map(serde_json::Value::take) {
        *agent = serde_json::from_value(v).context("\"agent\" is not an AgentConfig")?;
    }
    info!(%path, "loaded overrides");
    Ok(())
}

/// The player's scripted route: a figure eight through the throne room.
fn player_position(throne: Vec3, t: f64) -> Vec3 {
    let t = t as f32;
    throne + Vec3::new((t * 0.3).sin() * 10.0, 0.0, (t * 0.6).sin() * 3.0)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut sim_config = SimConfig { seed: SEED, ..SimConfig::default() };
    sim_config.total_frames = (SIM_SECONDS as f32 / sim_config.frame_delta_secs).round() as u64;
    let mut mob = AgentConfig { max_speed: 3.0, slowdown_distance: 1.5, ..AgentConfig::default() };
    load_overrides(&mut sim_config, &mut mob)?;

    println!("=== dungeon | rust_nav path following ===");
    println!(
        "Mobs: {}  |  Frames: {}  |  Seed: {}",
        PATROLLERS + GUARDS + WANDERERS,
        sim_config.total_frames,
        sim_config.seed
    );
    println!();

    // 1. Layout.
    let (graph, rooms) = build_dungeon();
    println!(
        "Dungeon: {} waypoints, {} corridor edges, throne room degree {}",
        graph.node_count(),
        graph.edge_count(),
        graph.out_degree(rooms.nodes[7])
    );
    let graph = Arc::new(graph);

    // 2. Spawn rooms, shuffled so every seed starts the mobs differently.
    let mut rng = SimRng::new(sim_config.seed);
    let mut spawn_rooms = rooms.centres;
    rng.shuffle(&mut spawn_rooms);

    let service = QueuedPathService::with_latency(GraphPlanner::new(Arc::clone(&graph)), PATH_LATENCY);
    let player = MarkerId(0);
    let mut builder = WorldBuilder::new(sim_config.clone(), service, GroundPlane::horizontal(0.0))
        .walkable(graph.clone())
        .marker(player_position(rooms.throne, 0.0));

    let mut roles = Vec::new();

    // Patrollers walk the outer ring, each starting at a different corner.
    let ring = [0, 1, 2, 5, 8, 7, 6, 3].map(|i| rooms.centres[i]);
    for i in 0..PATROLLERS {
        let mut targets = ring.to_vec();
        targets.rotate_left(i * 2);
        let config = AgentConfig { constrain_inside_graph: true, ..mob.clone() };
        builder = builder.spawn(
            AgentSpawn::new(Body::Character(CharacterBody::new(spawn_rooms[i], config.height)))
                .config(config)
                .controller(Patrol::new(targets, 0.5)),
        );
        roles.push("patrol");
    }

    // Guards hold the alcove until the player steps into the throne room.
    for i in 0..GUARDS {
        let post = rooms.alcove + Vec3::new(i as f32 * 1.5 - 0.75, 0.0, 0.0);
        builder = builder.spawn(
            AgentSpawn::new(Body::Transform(TransformBody::new(post)))
                .config(AgentConfig { max_speed: mob.max_speed * 1.5, ..mob.clone() })
                .controller(DefendZone { center: rooms.throne, radius: THRONE_RADIUS, post, intruder: player }),
        );
        roles.push("guard");
    }

    // Wanderers float through the great hall without gravity.
    let hall = rooms.centres[4];
    for i in 0..WANDERERS {
        let start = spawn_rooms[PATROLLERS + i];
        builder = builder.spawn(
            AgentSpawn::at(start)
                .config(AgentConfig { gravity: Gravity::Disabled, max_speed: 1.5, ..mob.clone() })
                .controller(Wander::new(hall, ROOM_SPACING * 0.4)),
        );
        roles.push("wander");
    }

    let mut world = builder.build()?;

    // 3. Run, moving the player before each frame.
    let mut obs = DungeonObserver { inner: TracingObserver::default(), peak_moving: 0, requests: 0 };
    let t0 = Instant::now();
    while world.clock.current_frame < world.config.end_frame() {
        let now = world.clock.now();
        world.set_marker(player, player_position(rooms.throne, now));
        world.step(&mut obs)?;
    }
    obs.on_sim_end(world.clock.current_frame);
    let elapsed = t0.elapsed();

    // 4. Summary.
    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), world.clock);
    println!("  path requests   : {}", obs.requests);
    println!("  arrivals        : {}", obs.inner.arrivals);
    println!("  failed paths    : {}", obs.inner.failures);
    println!("  peak moving     : {}", obs.peak_moving);
    println!("  paths recycled  : {}", world.service.pool().recycled());
    println!();

    println!("{:<6} {:<8} {:<24} {:<8} {:<8}", "Agent", "Role", "Position", "Speed", "Arrived");
    println!("{}", "-".repeat(58));
    for (agent, role) in world.agents().zip(&roles) {
        let p = world.body(agent.id()).map_or(agent.position(), |b| b.position());
        println!(
            "{:<6} {:<8} {:<24} {:<8.2} {:<8}",
            agent.id().0,
            role,
            format!("({:.1}, {:.1}, {:.1})", p.x, p.y, p.z),
            agent.velocity().length(),
            agent.reached_destination(),
        );
    }

    Ok(())
}
