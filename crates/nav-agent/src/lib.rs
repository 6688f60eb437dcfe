//! `nav-agent`: path-following agents.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                           |
//! |---------------|--------------------------------------------------------------------|
//! | [`agent`]     | `PathAgent` facade, `MovementContext<'a>`, `UpdatePhase`           |
//! | [`config`]    | `AgentConfig`, `Gravity`, `CloseToDestinationMode`                 |
//! | [`scheduler`] | `PathRequestScheduler`: repath throttle and stale-result guard    |
//! | [`steering`]  | Pure 2D steering functions (acceleration, braking, clamping)       |
//! | [`finalizer`] | `PositionHistory`; committing poses, ground snapping, walkable clamp |
//! | [`host`]      | `MovementHost`, `GroundProbe`, `LayerMask`, built-in bodies         |
//! | [`snapshot`]  | `AgentSnapshot`: serializable kinematic state                     |
//! | [`events`]    | `AgentEvent` notifications                                         |
//! | [`error`]     | `AgentError`, `AgentResult<T>`                                     |
//!
//! # Update cycle
//!
//! Each frame the host loop calls [`PathAgent::update`] with
//! [`UpdatePhase::Frame`], and once per fixed physics step with
//! [`UpdatePhase::Fixed`].  The frame phase checks whether a new path is
//! due; movement runs in whichever phase matches the host's backend:
//!
//! ```text
//! movement_update ──► (next position, next rotation) ──► finalize_movement
//!   sync pose from host                                   write / move host
//!   advance path cursor                                   ground ray cast
//!   steer + clamp velocity                                walkable clamp
//!   gravity                                               position history
//! ```
//!
//! Paths arrive asynchronously.  After polling the path service the host loop
//! hands each completed path to its requester via
//! [`PathAgent::on_path_complete`]; results for requests the agent has since
//! cancelled or superseded are dropped there.
//!
//! # Features
//!
//! | Feature | Default | Effect                                         |
//! |---------|---------|------------------------------------------------|
//! | `serde` | yes     | Serialize configs, snapshots, and events       |

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod finalizer;
pub mod host;
pub mod scheduler;
pub mod snapshot;
pub mod steering;

#[cfg(test)]
mod tests;

pub use agent::{MovementContext, PathAgent, UNSET_DESTINATION, UpdatePhase};
pub use config::{AgentConfig, CloseToDestinationMode, Gravity};
pub use error::{AgentError, AgentResult};
pub use events::AgentEvent;
pub use finalizer::PositionHistory;
pub use host::{
    Backend, Body, CharacterBody, GroundPlane, GroundProbe, LayerMask, MoveOutcome, MovementHost, NoGround,
    RayHit, RigidBodyLike, TransformBody,
};
pub use scheduler::{CompletionDisposition, PathRequestScheduler};
pub use snapshot::AgentSnapshot;
