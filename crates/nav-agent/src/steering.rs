//! Steering math in the movement plane.
//!
//! Everything here is a pure function of 2D vectors and scalars so the
//! control loop can be tested without an agent.
//!
//! # Acceleration policy
//!
//! [`acceleration_to_reach_point`] works in the agent's heading frame
//! (+x forward).  It wants to close the gap to the target velocity within
//! [`REACH_TIME_SECS`], bounds the result by an ellipse whose forward axis is
//! the configured acceleration and whose lateral axis is the centripetal
//! acceleration the rotation speed allows, and finally scales the result by
//! a turn penalty: `1` when the acceleration points along the heading,
//! falling to `1 - TURN_PENALTY` when it points straight back.

use glam::Vec2;
use nav_core::math::clamp_length;

/// Time the controller aims to take to reach its target velocity.
pub const REACH_TIME_SECS: f32 = 0.1;

/// Fraction of the acceleration removed when it points opposite the heading.
pub const TURN_PENALTY: f32 = 0.5;

/// Resolve the configured acceleration to units/s².
///
/// A negative value is read as "reach top speed in `1 / |value|` seconds",
/// i.e. `|value| * max_speed`.
#[inline]
pub fn effective_acceleration(max_acceleration: f32, max_speed: f32) -> f32 {
    if max_acceleration < 0.0 { -max_acceleration * max_speed } else { max_acceleration }
}

/// Speed multiplier near the path end: `sqrt(d / slowdown_distance)` inside
/// the slowdown zone, `1` outside it.
#[inline]
pub fn slowdown_factor(distance_to_end: f32, slowdown_distance: f32) -> f32 {
    if distance_to_end < slowdown_distance && slowdown_distance > 0.0 {
        (distance_to_end / slowdown_distance).max(0.0).sqrt()
    } else {
        1.0
    }
}

/// Rotation speed multiplier.  Zero below a slowdown factor of 0.3 so an
/// agent creeping up to its target does not spin in place.
#[inline]
pub fn rotation_speed_scale(slowdown: f32) -> f32 {
    ((slowdown - 0.3) / 0.7).max(0.0)
}

/// Decelerate towards zero by at most `acceleration * dt`.
#[inline]
pub fn brake(velocity: Vec2, acceleration: f32, dt: f32) -> Vec2 {
    velocity - clamp_length(velocity, acceleration * dt)
}

/// Movement for this step, never overshooting the path end.
#[inline]
pub fn delta_to_move(velocity: Vec2, dt: f32, distance_to_end: f32) -> Vec2 {
    clamp_length(velocity * dt, distance_to_end)
}

/// Express `v` in the frame whose +x axis is the unit vector `heading`.
#[inline]
fn to_heading_frame(v: Vec2, heading: Vec2) -> Vec2 {
    Vec2::new(v.dot(heading), heading.perp_dot(v))
}

#[inline]
fn from_heading_frame(v: Vec2, heading: Vec2) -> Vec2 {
    Vec2::new(v.x * heading.x - v.y * heading.y, v.x * heading.y + v.y * heading.x)
}

/// Acceleration steering `current_velocity` towards `target_velocity`.
///
/// When `target_velocity` is zero the agent instead arrives at
/// `delta_position` (the offset to the target point), decelerating so it
/// can stop there.
pub fn acceleration_to_reach_point(
    delta_position:        Vec2,
    target_velocity:       Vec2,
    current_velocity:      Vec2,
    forwards_acceleration: f32,
    rotation_speed_deg:    f32,
    max_speed:             f32,
    forwards:              Vec2,
) -> Vec2 {
    if forwards_acceleration <= 0.0 {
        return Vec2::ZERO;
    }

    let speed = current_velocity.length();
    // Centripetal limit, but never below the forward limit so a slowly
    // rotating agent can still correct sideways.
    let sideways_acceleration = (speed * rotation_speed_deg.to_radians()).max(forwards_acceleration);

    let heading = forwards
        .try_normalize()
        .or_else(|| current_velocity.try_normalize())
        .unwrap_or(Vec2::X);

    let target = if target_velocity == Vec2::ZERO {
        let dist = delta_position.length();
        let arrive_speed = (2.0 * forwards_acceleration * dist).sqrt().min(max_speed);
        delta_position.normalize_or_zero() * arrive_speed
    } else {
        target_velocity
    };

    let mut local = to_heading_frame((target - current_velocity) / REACH_TIME_SECS, heading);

    let ellipse = (local.x / forwards_acceleration).powi(2) + (local.y / sideways_acceleration).powi(2);
    if ellipse > 1.0 {
        local /= ellipse.sqrt();
    }

    if let Some(dir) = local.try_normalize() {
        // dir.x is the cosine between the acceleration and the heading.
        local *= 1.0 - TURN_PENALTY * (1.0 - dir.x) * 0.5;
    }

    from_heading_frame(local, heading)
}

/// Clamp `velocity` to `max_speed * slowdown`, and optionally penalise
/// moving in a direction the agent is not facing.
///
/// With the facing penalty on, speed is scaled by
/// `clamp(cos θ + 0.707, 0.2, 1)` and the velocity is rotated to within
/// `20° + 180° (1 - slowdown²)` of `forward`.  The allowed angle widens as the
/// agent slows so it can still turn on the spot near its target.
pub fn clamp_velocity(
    velocity:                    Vec2,
    max_speed:                   f32,
    slowdown:                    f32,
    slow_when_not_facing_target: bool,
    forward:                     Vec2,
) -> Vec2 {
    let current_max_speed = max_speed * slowdown;

    let forward = match forward.try_normalize() {
        Some(f) if slow_when_not_facing_target => f,
        _ => return clamp_length(velocity, current_max_speed),
    };

    let speed = velocity.length();
    let dir = if speed > f32::EPSILON { velocity / speed } else { Vec2::ZERO };
    let dot = dir.dot(forward);

    let current_max_speed = current_max_speed * (dot + 0.707).clamp(0.2, 1.0);
    let speed = speed.min(current_max_speed);

    let max_angle = (20.0 + 180.0 * (1.0 - slowdown * slowdown)).to_radians();
    let angle = dot.clamp(-1.0, 1.0).acos().min(max_angle);
    let (mut sin, cos) = angle.sin_cos();
    // Rotate towards the side the velocity lies on.
    sin *= (dir.x * forward.y - dir.y * forward.x).signum();

    Vec2::new(forward.x * cos + forward.y * sin, -forward.x * sin + forward.y * cos) * speed
}
