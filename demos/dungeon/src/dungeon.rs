//! The dungeon layout shared by every mob in the demo.
//!
//! A 3×3 grid of rooms twelve units apart, joined by corridors to their
//! orthogonal neighbours.  The middle room of the top row is the throne
//! room; it has an extra alcove node so the guards have somewhere to stand.

use glam::Vec3;
use nav_core::{NodeId, PlaneTransform};
use nav_path::{WaypointGraph, WaypointGraphBuilder};

pub const ROOM_SPACING: f32 = 12.0;

/// Room centres, row-major from the south-west corner.
pub struct Rooms {
    pub centres: [Vec3; 9],
    pub nodes:   [NodeId; 9],
    pub throne:  Vec3,
    pub alcove:  Vec3,
}

pub fn build_dungeon() -> (WaypointGraph, Rooms) {
    let mut b = WaypointGraphBuilder::with_capacity(PlaneTransform::IDENTITY, 10, 26);

    let mut centres = [Vec3::ZERO; 9];
    let mut nodes = [NodeId::INVALID; 9];
    for row in 0..3 {
        for col in 0..3 {
            let i = row * 3 + col;
            centres[i] = Vec3::new(col as f32 * ROOM_SPACING, 0.0, row as f32 * ROOM_SPACING);
            nodes[i] = b.add_node(centres[i]);
        }
    }

    for row in 0..3 {
        for col in 0..3 {
            let i = row * 3 + col;
            if col + 1 < 3 {
                b.add_corridor(nodes[i], nodes[i + 1]);
            }
            if row + 1 < 3 {
                b.add_corridor(nodes[i], nodes[i + 3]);
            }
        }
    }

    let throne = centres[7];
    let alcove = throne + Vec3::new(0.0, 0.0, 4.0);
    let alcove_node = b.add_node(alcove);
    b.add_corridor(nodes[7], alcove_node);

    (b.build(), Rooms { centres, nodes, throne, alcove })
}
