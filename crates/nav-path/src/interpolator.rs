//! Cursor over a polyline.
//!
//! # Model
//!
//! The cursor is an arclength `distance` from the first point, cached as a
//! segment index plus the arclength at that segment's start.  Moving the
//! cursor walks segment by segment, so every query is O(1) amortised while
//! an agent advances along its path.
//!
//! An interpolator without a path is *invalid*: queries return zero values
//! and every `move_*` call is a no-op.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use nav_core::MovementPlane;
use nav_core::math::{closest_point_on_line_factor, line_circle_intersection_factor};

#[derive(Clone, Debug, Default)]
pub struct PathInterpolator {
    path:                     Option<Arc<[Vec3]>>,
    distance_to_segment_start: f32,
    current_distance:         f32,
    current_segment_length:   f32,
    total_distance:           f32,
    segment_index:            usize,
}

impl PathInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the polyline and reset the cursor to its start.
    ///
    /// A single-point path is expanded to a zero-length segment.  An empty
    /// path (or `None`) leaves the interpolator invalid.
    pub fn set_path(&mut self, points: Option<Arc<[Vec3]>>) {
        self.current_distance = 0.0;
        self.segment_index = 0;
        self.distance_to_segment_start = 0.0;

        let points = match points {
            Some(p) if p.len() == 1 => Some(Arc::from(vec![p[0], p[0]])),
            Some(p) if p.is_empty() => None,
            other => other,
        };
        let Some(points) = points else {
            self.path = None;
            self.total_distance = 0.0;
            self.current_segment_length = 0.0;
            return;
        };

        self.current_segment_length = points[0].distance(points[1]);
        self.total_distance = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        self.path = Some(points);
    }

    #[inline]
    pub fn valid(&self) -> bool {
        self.path.is_some()
    }

    #[inline]
    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Arclength from the path start to the cursor.
    #[inline]
    pub fn distance(&self) -> f32 {
        self.current_distance
    }

    /// Move the cursor to arclength `value`, walking segments as needed.
    pub fn set_distance(&mut self, value: f32) {
        let Some(path) = self.path.clone() else { return };
        self.current_distance = value;
        while self.current_distance < self.distance_to_segment_start && self.segment_index > 0 {
            self.prev_segment(&path);
        }
        while self.current_distance > self.distance_to_segment_start + self.current_segment_length
            && self.segment_index < path.len() - 2
        {
            self.next_segment(&path);
        }
    }

    /// Arclength from the cursor to the path end.  Zero when invalid.
    #[inline]
    pub fn remaining_distance(&self) -> f32 {
        if self.valid() { self.total_distance - self.current_distance } else { 0.0 }
    }

    pub fn total_distance(&self) -> f32 {
        if self.valid() { self.total_distance } else { 0.0 }
    }

    /// World point at the cursor.
    pub fn position(&self) -> Vec3 {
        let Some(path) = &self.path else { return Vec3::ZERO };
        let t = if self.current_segment_length > 1e-4 {
            (self.current_distance - self.distance_to_segment_start) / self.current_segment_length
        } else {
            0.0
        };
        path[self.segment_index].lerp(path[self.segment_index + 1], t.clamp(0.0, 1.0))
    }

    /// Direction of the current segment (not normalised).
    pub fn tangent(&self) -> Vec3 {
        let Some(path) = &self.path else { return Vec3::ZERO };
        path[self.segment_index + 1] - path[self.segment_index]
    }

    pub fn end_point(&self) -> Vec3 {
        self.path.as_ref().and_then(|p| p.last().copied()).unwrap_or(Vec3::ZERO)
    }

    /// Append the cursor position and every later path point to `buffer`.
    pub fn get_remaining_path(&self, buffer: &mut Vec<Vec3>) {
        let Some(path) = &self.path else { return };
        buffer.push(self.position());
        buffer.extend_from_slice(&path[self.segment_index + 1..]);
    }

    // ── Cursor movement ──────────────────────────────────────────────────

    /// Place the cursor at `fraction` (clamped to [0, 1]) along segment
    /// `index`.  Out-of-range indices are ignored.
    pub fn move_to_segment(&mut self, index: usize, fraction: f32) {
        let Some(path) = self.path.clone() else { return };
        if index >= path.len() - 1 {
            return;
        }
        while index > self.segment_index {
            self.next_segment(&path);
        }
        while index < self.segment_index {
            self.prev_segment(&path);
        }
        self.current_distance =
            self.distance_to_segment_start + fraction.clamp(0.0, 1.0) * self.current_segment_length;
    }

    /// Move the cursor to the globally closest point on the path to `point`.
    pub fn move_to_closest_point(&mut self, point: Vec3) {
        let Some(path) = self.path.clone() else { return };
        let mut best = (f32::INFINITY, 0usize, 0.0f32);
        for (i, w) in path.windows(2).enumerate() {
            let factor = closest_point_on_line_factor(w[0], w[1], point).clamp(0.0, 1.0);
            let d = w[0].lerp(w[1], factor).distance_squared(point);
            if d < best.0 {
                best = (d, i, factor);
            }
        }
        self.move_to_segment(best.1, best.2);
    }

    /// Move the cursor to the point closest to `point`, searching only the
    /// segments around the current cursor.
    ///
    /// Walks forward while the next vertex is no farther from `point` than
    /// the current one, then backward likewise, then picks the closer of
    /// the two segments adjacent to the resulting vertex.
    pub fn move_to_locally_closest_point(&mut self, point: Vec3, allow_forwards: bool, allow_backwards: bool) {
        let Some(path) = self.path.clone() else { return };

        while allow_forwards
            && self.segment_index < path.len() - 2
            && path[self.segment_index + 1].distance_squared(point)
                <= path[self.segment_index].distance_squared(point)
        {
            self.next_segment(&path);
        }
        while allow_backwards
            && self.segment_index > 0
            && path[self.segment_index - 1].distance_squared(point)
                <= path[self.segment_index].distance_squared(point)
        {
            self.prev_segment(&path);
        }

        let i = self.segment_index;
        let (mut factor1, mut d1) = (0.0, f32::INFINITY);
        if i > 0 {
            factor1 = closest_point_on_line_factor(path[i - 1], path[i], point).clamp(0.0, 1.0);
            d1 = path[i - 1].lerp(path[i], factor1).distance_squared(point);
        }
        let factor2 = closest_point_on_line_factor(path[i], path[i + 1], point).clamp(0.0, 1.0);
        let d2 = path[i].lerp(path[i + 1], factor2).distance_squared(point);

        if d1 < d2 {
            self.move_to_segment(i - 1, factor1);
        } else {
            self.move_to_segment(i, factor2);
        }
    }

    /// Advance the cursor to the farthest point ahead that is still within
    /// `radius` of `center`, measured in the movement plane.
    ///
    /// The cursor never moves backwards.  If the whole remaining path lies
    /// inside the circle the cursor ends at the path end.
    pub fn move_to_circle_intersection_2d<P: MovementPlane + ?Sized>(
        &mut self,
        center: Vec3,
        radius: f32,
        plane: &P,
    ) {
        let Some(path) = self.path.clone() else { return };

        // Skip segments whose closest approach to the center lies behind us.
        while self.segment_index < path.len() - 2
            && closest_point_on_line_factor(path[self.segment_index], path[self.segment_index + 1], center) > 1.0
        {
            self.next_segment(&path);
        }

        let center2: Vec2 = plane.to_plane(center);
        let sqr_radius = radius * radius;
        while self.segment_index < path.len() - 2
            && plane.to_plane(path[self.segment_index + 1]).distance_squared(center2) <= sqr_radius
        {
            self.next_segment(&path);
        }

        let i = self.segment_index;
        let factor = line_circle_intersection_factor(
            center2,
            plane.to_plane(path[i]),
            plane.to_plane(path[i + 1]),
            radius,
        );
        let current = if self.current_segment_length > 1e-6 {
            ((self.current_distance - self.distance_to_segment_start) / self.current_segment_length)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.move_to_segment(i, factor.max(current));
    }

    // ── Segment stepping ─────────────────────────────────────────────────

    fn next_segment(&mut self, path: &[Vec3]) {
        self.segment_index += 1;
        self.distance_to_segment_start += self.current_segment_length;
        self.current_segment_length = path[self.segment_index].distance(path[self.segment_index + 1]);
        self.current_distance = self.current_distance.max(self.distance_to_segment_start);
    }

    fn prev_segment(&mut self, path: &[Vec3]) {
        self.segment_index -= 1;
        self.current_segment_length = path[self.segment_index].distance(path[self.segment_index + 1]);
        self.distance_to_segment_start -= self.current_segment_length;
        self.current_distance = self
            .current_distance
            .min(self.distance_to_segment_start + self.current_segment_length);
    }
}
