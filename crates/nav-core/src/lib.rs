//! `nav-core`: foundational types for the `rust_nav` agent movement framework.
//!
//! This crate is a dependency of every other `nav-*` crate.  It has no
//! `nav-*` dependencies and few external ones (`glam`, `rand`, `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `PathId`, `NodeId`, `EdgeId`, `MarkerId`       |
//! | [`time`]        | `Frame`, `SimClock`, `SimConfig`                          |
//! | [`plane`]       | `MovementPlane`, `PlaneTransform`, `OrientationMode`      |
//! | [`math`]        | clamping, line/circle factors, bounded rotation           |
//! | [`rng`]         | `SimRng` (seeded, deterministic)                          |
//! | [`error`]       | `NavError`, `NavResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                          |
//! |---------|-----------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on public value types (snapshots).    |

pub mod error;
pub mod ids;
pub mod math;
pub mod plane;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{NavError, NavResult};
pub use glam::{Mat3, Quat, Vec2, Vec3};
pub use ids::{AgentId, EdgeId, MarkerId, NodeId, PathId};
pub use plane::{MovementPlane, OrientationMode, PlaneTransform};
pub use rng::SimRng;
pub use time::{Frame, SimClock, SimConfig};
