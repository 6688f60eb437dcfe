//! `nav-sim`: frame loop host for the rust_nav framework.
//!
//! # Frame loop
//!
//! ```text
//! for frame in 0..config.total_frames:
//!   ① Fixed      : for each physics step due: rigid-body agents update in
//!                  the fixed phase, then bodies integrate (parallel with
//!                  the `parallel` feature).
//!   ② Controllers : DestinationController::update per agent.
//!   ③ Frame      : every agent updates in ascending AgentId order:
//!                  repath check, then movement for non-rigid bodies.
//!   ④ Delivery   : poll the path service; hand completed paths to their
//!                  requesters.
//!   ⑤ Events     : agent events → SimObserver.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Integrates rigid bodies on Rayon's thread pool.         |
//! | `fx-hash`  | FxHash for the path service's per-requester map.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nav_agent::NoGround;
//! use nav_core::SimConfig;
//! use nav_path::{QueuedPathService, StraightLinePlanner};
//! use nav_sim::{AgentSpawn, NoopObserver, WorldBuilder};
//!
//! let service = QueuedPathService::new(StraightLinePlanner { plane: None });
//! let mut world = WorldBuilder::new(SimConfig::default(), service, NoGround)
//!     .spawn(AgentSpawn::at(Vec3::ZERO).destination(Vec3::new(10.0, 0.0, 0.0)))
//!     .build()?;
//! world.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod destinations;
pub mod error;
pub mod observer;
pub mod world;


pub use builder::{AgentSpawn, WorldBuilder};
pub use destinations::{
    ControllerContext, DefendZone, DestinationController, DestinationUpdate, FixedDestination, FollowMarker,
    Patrol, Wander,
};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TracingObserver};
pub use world::{AgentSlot, World};
