//! Planner trait and the built-in planners.
//!
//! # Pluggability
//!
//! The path service computes paths through the [`PathPlanner`] trait, so
//! applications can swap in a navmesh or grid search without touching the
//! agent code.  Two planners ship with the crate:
//!
//! - [`StraightLinePlanner`]: the two-point polyline `[start, end]`.  Useful
//!   for open arenas and tests.
//! - [`GraphPlanner`]: Dijkstra over a [`WaypointGraph`].  Endpoints are
//!   snapped to their nearest nodes and the exact requested points are kept
//!   at both ends of the polyline.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use glam::Vec3;
use nav_core::{EdgeId, NodeId, PlaneTransform};

use crate::{PathError, PathResult, WaypointGraph};

/// Consecutive points closer than this are merged.
const DUPLICATE_EPS: f32 = 1e-4;

// ── PlannedPath ───────────────────────────────────────────────────────────────

/// The polyline produced by a planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    pub points: Vec<Vec3>,
    /// Movement plane of the searched graph, if the planner knows one.
    pub plane:  Option<PlaneTransform>,
}

// ── PathPlanner trait ─────────────────────────────────────────────────────────

/// Pluggable path search.
///
/// Implementations must be `Send + Sync` so one planner can be shared by
/// services running on worker threads.
pub trait PathPlanner: Send + Sync {
    /// Compute a polyline from `start` to `end`.
    fn plan(&self, start: Vec3, end: Vec3) -> PathResult<PlannedPath>;
}

impl<P: PathPlanner + ?Sized> PathPlanner for Arc<P> {
    fn plan(&self, start: Vec3, end: Vec3) -> PathResult<PlannedPath> {
        (**self).plan(start, end)
    }
}

// ── StraightLinePlanner ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLinePlanner {
    pub plane: Option<PlaneTransform>,
}

impl PathPlanner for StraightLinePlanner {
    fn plan(&self, start: Vec3, end: Vec3) -> PathResult<PlannedPath> {
        Ok(PlannedPath { points: vec![start, end], plane: self.plane })
    }
}

// ── GraphPlanner ──────────────────────────────────────────────────────────────

/// Dijkstra over a shared [`WaypointGraph`].
#[derive(Clone)]
pub struct GraphPlanner {
    graph: Arc<WaypointGraph>,
}

impl GraphPlanner {
    pub fn new(graph: Arc<WaypointGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Arc<WaypointGraph> {
        &self.graph
    }
}

impl PathPlanner for GraphPlanner {
    fn plan(&self, start: Vec3, end: Vec3) -> PathResult<PlannedPath> {
        let graph = &*self.graph;
        let (Some(from), Some(to)) = (graph.snap_to_node(start), graph.snap_to_node(end)) else {
            return Err(PathError::EmptyGraph);
        };

        let nodes = dijkstra(graph, from, to)?;

        let mut points = Vec::with_capacity(nodes.len() + 2);
        points.push(start);
        if from != to {
            points.extend(nodes.iter().map(|n| graph.node_pos[n.index()]));
        }
        points.push(end);
        points.dedup_by(|b, a| a.distance_squared(*b) < DUPLICATE_EPS * DUPLICATE_EPS);

        Ok(PlannedPath { points, plane: Some(graph.plane()) })
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Heap key: total-ordered `f32` cost.
#[derive(Copy, Clone, PartialEq)]
struct Cost(f32);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Node sequence from `from` to `to`, both included.
fn dijkstra(graph: &WaypointGraph, from: NodeId, to: NodeId) -> PathResult<Vec<NodeId>> {
    if from == to {
        return Ok(vec![from]);
    }

    let n = graph.node_count();
    let mut dist      = vec![f32::INFINITY; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];
    dist[from.index()] = 0.0;

    // Secondary key NodeId gives deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev_edge, to));
        }
        if cost > dist[node.index()] {
            continue;
        }
        for edge in graph.out_edges(node) {
            let neighbor = graph.edge_to[edge.index()];
            let new_cost = cost + graph.edge_length[edge.index()];
            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    Err(PathError::NoPath { from, to })
}

fn reconstruct(graph: &WaypointGraph, prev_edge: &[EdgeId], to: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![to];
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        cur = graph.edge_from[e.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    nodes
}
