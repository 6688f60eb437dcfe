//! `nav-path`: paths, path ownership, interpolation, and the path service
//! boundary.
//!
//! Agents never search graphs themselves.  They hand a [`PathRequest`] to a
//! [`PathService`], which answers some polls later with a [`Path`]: either an
//! ordered polyline or an error marker.  Completed polylines are shared
//! between owners through the claim/release registry in [`PathPool`].
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`path`]         | `Path`, `PathRequest`, `PathKind`, `PathState`, `PathFailure` |
//! | [`pool`]         | `PathPool` claim/release registry                          |
//! | [`interpolator`] | `PathInterpolator` (cursor over a polyline)                |
//! | [`graph`]        | `WaypointGraph` (CSR + R-tree), `WaypointGraphBuilder`, `WalkableClamp` |
//! | [`planner`]      | `PathPlanner` trait, `StraightLinePlanner`, `GraphPlanner` |
//! | [`service`]      | `PathService` trait, `QueuedPathService`                   |
//! | [`error`]        | `PathError`, `PathResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `serde`   | Derives `Serialize`/`Deserialize` on public value types.   |
//! | `fx-hash` | FxHash instead of SipHash for the claim registry.          |

pub mod error;
pub mod graph;
pub mod interpolator;
pub mod path;
pub mod planner;
pub mod pool;
pub mod service;


pub use error::{PathError, PathResult};
pub use graph::{WalkableClamp, WaypointGraph, WaypointGraphBuilder};
pub use interpolator::PathInterpolator;
pub use path::{Path, PathFailure, PathKind, PathRequest, PathState};
pub use planner::{GraphPlanner, PathPlanner, PlannedPath, StraightLinePlanner};
pub use pool::PathPool;
pub use service::{PathService, QueuedPathService};
