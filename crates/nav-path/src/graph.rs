//! Waypoint graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node and indexed by `EdgeId`, so a
//! node's neighbours are one contiguous scan in Dijkstra's inner loop.
//!
//! # Spatial index
//!
//! Two R-trees (via `rstar`) work in the graph's movement plane: one over
//! nodes for snapping path endpoints, one over edge segments for clamping
//! positions onto the walkable network.

use glam::Vec3;
use rstar::primitives::{GeomWithData, Line};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use nav_core::math::closest_point_on_line_factor;
use nav_core::{EdgeId, MovementPlane, NodeId, PlaneTransform};

// ── WalkableClamp ─────────────────────────────────────────────────────────────

/// Anything that can report the nearest walkable point to a position.
pub trait WalkableClamp: Send + Sync {
    /// `None` if there is no walkable surface at all.
    fn nearest_walkable(&self, p: Vec3) -> Option<Vec3>;
}

// ── R-tree entries ────────────────────────────────────────────────────────────

/// A node projected into the movement plane.
#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// An edge projected into the movement plane.
type SegmentEntry = GeomWithData<Line<[f32; 2]>, EdgeId>;

// ── WaypointGraph ─────────────────────────────────────────────────────────────

/// Directed waypoint graph in CSR format plus spatial indices.
///
/// Do not construct directly; use [`WaypointGraphBuilder`].
pub struct WaypointGraph {
    /// World position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<Vec3>,

    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each edge (used for path reconstruction).
    pub edge_from: Vec<NodeId>,

    pub edge_to: Vec<NodeId>,

    /// Euclidean length of each edge, the Dijkstra cost.
    pub edge_length: Vec<f32>,

    plane:       PlaneTransform,
    node_idx:    RTree<NodeEntry>,
    segment_idx: RTree<SegmentEntry>,
}

impl WaypointGraph {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// Movement plane agents should steer in while following paths on
    /// this graph.
    pub fn plane(&self) -> PlaneTransform {
        self.plane
    }

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos` in the movement plane.  `None` if empty.
    pub fn snap_to_node(&self, pos: Vec3) -> Option<NodeId> {
        let p = self.plane.to_plane(pos);
        self.node_idx.nearest_neighbor(&[p.x, p.y]).map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `pos`, sorted by ascending distance.
    pub fn k_nearest_nodes(&self, pos: Vec3, k: usize) -> Vec<NodeId> {
        let p = self.plane.to_plane(pos);
        self.node_idx
            .nearest_neighbor_iter(&[p.x, p.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// Closest point on any edge, with elevation interpolated along it.
    /// Falls back to the nearest node for a graph without edges.
    pub fn nearest_point_on_edges(&self, pos: Vec3) -> Option<Vec3> {
        let p = self.plane.to_plane(pos);
        match self.segment_idx.nearest_neighbor(&[p.x, p.y]) {
            Some(seg) => {
                let e = seg.data.index();
                let a = self.node_pos[self.edge_from[e].index()];
                let b = self.node_pos[self.edge_to[e].index()];
                // Factor in the plane so elevation does not skew the projection.
                let (a2, b2) = (self.plane.to_plane(a), self.plane.to_plane(b));
                let t = closest_point_on_line_factor(a2.extend(0.0), b2.extend(0.0), p.extend(0.0));
                Some(a.lerp(b, t.clamp(0.0, 1.0)))
            }
            None => self.snap_to_node(pos).map(|n| self.node_pos[n.index()]),
        }
    }
}

impl WalkableClamp for WaypointGraph {
    fn nearest_walkable(&self, p: Vec3) -> Option<Vec3> {
        self.nearest_point_on_edges(p)
    }
}

// ── WaypointGraphBuilder ──────────────────────────────────────────────────────

/// Construct a [`WaypointGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use nav_core::PlaneTransform;
/// use nav_path::WaypointGraphBuilder;
///
/// let mut b = WaypointGraphBuilder::new(PlaneTransform::IDENTITY);
/// let a = b.add_node(Vec3::ZERO);
/// let c = b.add_node(Vec3::new(4.0, 0.0, 0.0));
/// b.add_corridor(a, c);
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct WaypointGraphBuilder {
    plane:     PlaneTransform,
    nodes:     Vec<Vec3>,
    raw_edges: Vec<(NodeId, NodeId)>,
}

impl WaypointGraphBuilder {
    pub fn new(plane: PlaneTransform) -> Self {
        Self { plane, nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(plane: PlaneTransform, nodes: usize, edges: usize) -> Self {
        Self {
            plane,
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a waypoint and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: Vec3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge.  Its cost is the Euclidean length.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId) {
        self.raw_edges.push((from, to));
    }

    /// Add edges in both directions.
    pub fn add_corridor(&mut self, a: NodeId, b: NodeId) {
        self.add_directed_edge(a, b);
        self.add_directed_edge(b, a);
    }

    pub fn node_pos(&self, id: NodeId) -> Vec3 {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`WaypointGraph`].
    pub fn build(self) -> WaypointGraph {
        let node_count = self.nodes.len();
        let plane = self.plane;

        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|&(from, to)| (from.0, to.0));

        let edge_from: Vec<NodeId> = raw.iter().map(|e| e.0).collect();
        let edge_to:   Vec<NodeId> = raw.iter().map(|e| e.1).collect();
        let edge_length: Vec<f32> = raw
            .iter()
            .map(|&(a, b)| self.nodes[a.index()].distance(self.nodes[b.index()]))
            .collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for &(from, _) in &raw {
            node_out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        let project = |p: Vec3| {
            let q = plane.to_plane(p);
            [q.x, q.y]
        };
        let node_entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: project(pos), id: NodeId(i as u32) })
            .collect();
        let segment_entries: Vec<SegmentEntry> = raw
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| {
                let line = Line::new(project(self.nodes[a.index()]), project(self.nodes[b.index()]));
                GeomWithData::new(line, EdgeId(i as u32))
            })
            .collect();

        WaypointGraph {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length,
            plane,
            node_idx: RTree::bulk_load(node_entries),
            segment_idx: RTree::bulk_load(segment_entries),
        }
    }
}

impl Default for WaypointGraphBuilder {
    fn default() -> Self {
        Self::new(PlaneTransform::IDENTITY)
    }
}
