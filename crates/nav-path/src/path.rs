//! Path requests and computed paths.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use nav_core::{AgentId, PathId, PlaneTransform};

// ── PathKind / PathState ──────────────────────────────────────────────────────

/// What kind of query produced a path.
///
/// Agents only follow `PointToPoint` paths; a `MultiTarget` path has no
/// single original end point to treat as the destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathKind {
    #[default]
    PointToPoint,
    MultiTarget,
}

/// Pipeline state of a path.
///
/// `Created → Computing → Returned`.  Only `Returned` paths may be claimed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathState {
    #[default]
    Created,
    Computing,
    Returned,
}

/// Error marker on a returned path.  Callers branch on presence only.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathFailure {
    /// The planner found no connection between the endpoints.
    NoPath,
    /// The request was cancelled before it completed.
    Cancelled,
    /// Any other planner failure.
    Error(String),
}

impl fmt::Display for PathFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathFailure::NoPath => f.write_str("no path"),
            PathFailure::Cancelled => f.write_str("cancelled"),
            PathFailure::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

// ── PathRequest ───────────────────────────────────────────────────────────────

/// A query handed to a path service.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRequest {
    pub requester: AgentId,
    pub start:     Vec3,
    pub end:       Vec3,
    pub kind:      PathKind,
}

impl PathRequest {
    pub fn point_to_point(requester: AgentId, start: Vec3, end: Vec3) -> Self {
        Self { requester, start, end, kind: PathKind::PointToPoint }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// A path moving through the service pipeline, and its result.
///
/// `points` is shared: cloning a `Path` never copies the polyline.
#[derive(Clone, Debug)]
pub struct Path {
    /// Issued by the path pool.  `PathId::INVALID` until submitted.
    pub id:        PathId,
    pub kind:      PathKind,
    pub state:     PathState,
    pub requester: AgentId,
    /// Start point as originally requested (not snapped to the graph).
    pub start:     Vec3,
    /// End point as originally requested.
    pub end:       Vec3,
    pub points:    Arc<[Vec3]>,
    pub failure:   Option<PathFailure>,
    /// Movement plane of the graph the path was computed on, if any.
    pub plane:     Option<PlaneTransform>,
}

impl Path {
    /// A not-yet-started path for `request`.
    pub fn from_request(request: PathRequest) -> Self {
        Self {
            id:        PathId::INVALID,
            kind:      request.kind,
            state:     PathState::Created,
            requester: request.requester,
            start:     request.start,
            end:       request.end,
            points:    Arc::from(Vec::new()),
            failure:   None,
            plane:     None,
        }
    }

    /// An already-computed path built from a caller-supplied polyline.
    ///
    /// The first and last points become the original start and end.  The id
    /// stays `INVALID` until the path is registered with a pool.
    pub fn from_points(requester: AgentId, points: Vec<Vec3>) -> Self {
        let start = points.first().copied().unwrap_or(Vec3::ZERO);
        let end = points.last().copied().unwrap_or(Vec3::ZERO);
        Self {
            id:        PathId::INVALID,
            kind:      PathKind::PointToPoint,
            state:     PathState::Returned,
            requester,
            start,
            end,
            points:    Arc::from(points),
            failure:   None,
            plane:     None,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }

    #[inline]
    pub fn is_returned(&self) -> bool {
        self.state == PathState::Returned
    }

    /// Euclidean length of the polyline.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}
