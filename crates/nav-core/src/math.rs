//! Vector helpers shared by the path interpolator and the steering code.

use glam::{Mat3, Quat, Vec2, Vec3};

use crate::OrientationMode;

/// Squared segment length below which a segment is treated as a point.
const DEGENERATE_SQR_LEN: f32 = 1e-6;

/// Clamp `v` to at most `max` in length.  A non-positive `max` yields zero.
#[inline]
pub fn clamp_length(v: Vec2, max: f32) -> Vec2 {
    if max <= 0.0 {
        return Vec2::ZERO;
    }
    let sqr = v.length_squared();
    if sqr > max * max { v * (max / sqr.sqrt()) } else { v }
}

/// Factor `t` such that `a + t * (b - a)` is the point on the infinite line
/// through `a` and `b` closest to `p`.  Not clamped; `0` for a degenerate line.
#[inline]
pub fn closest_point_on_line_factor(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let dir = b - a;
    let sqr_len = dir.length_squared();
    if sqr_len <= DEGENERATE_SQR_LEN {
        return 0.0;
    }
    (p - a).dot(dir) / sqr_len
}

/// Factor along `a → b` of the *farther* intersection between the line and a
/// circle around `center`.
///
/// When the line misses the circle the factor of the closest approach is
/// returned instead.  A degenerate segment yields `1`.
pub fn line_circle_intersection_factor(center: Vec2, a: Vec2, b: Vec2, radius: f32) -> f32 {
    let seg = b - a;
    let len = seg.length();
    if len <= 1e-5 {
        return 1.0;
    }
    let dir = seg / len;
    let to_start = a - center;
    let dot = to_start.dot(dir);
    let discriminant = (dot * dot - (to_start.length_squared() - radius * radius)).max(0.0);
    (-dot + discriminant.sqrt()) / len
}

/// Rotate `from` towards `to` by at most `max_radians`.
pub fn rotate_towards(from: Quat, to: Quat, max_radians: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= 1e-6 || !angle.is_finite() || max_radians >= angle {
        return to;
    }
    from.slerp(to, max_radians.max(0.0) / angle).normalize()
}

/// Rotation whose forward axis (per `orientation`) points along `dir` with
/// the agent's up side facing `up`.
///
/// In `YAxisForward` mode the agent's local +Z points away from `up`, so a 2D
/// sprite keeps facing the camera.  Returns `None` when `dir` is zero or
/// parallel to `up`.
pub fn look_rotation(orientation: OrientationMode, dir: Vec3, up: Vec3) -> Option<Quat> {
    let forward = dir.try_normalize()?;
    let up = up.try_normalize()?;
    let basis = match orientation {
        OrientationMode::ZAxisForward => {
            let x = up.cross(forward).try_normalize()?;
            let y = forward.cross(x);
            Mat3::from_cols(x, y, forward)
        }
        OrientationMode::YAxisForward => {
            let z = -up;
            let x = forward.cross(z).try_normalize()?;
            let z = x.cross(forward);
            Mat3::from_cols(x, forward, z)
        }
    };
    Some(Quat::from_mat3(&basis).normalize())
}
