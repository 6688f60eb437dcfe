//! Movement planes.
//!
//! Steering runs in 2D.  A `MovementPlane` maps world points into that 2D
//! space plus an *elevation* along the plane's up axis, and back.  The same
//! controller therefore drives a top-down 3D game (XZ plane, +Y up) and a
//! side-on 2D game (XY plane) without branching.
//!
//! Planes here are pure rotations: points and direction vectors project the
//! same way.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec2, Vec3};

/// A 3D ↔ 2D projection with a defined up axis.
pub trait MovementPlane {
    /// Project a world point (or direction) onto the plane, dropping elevation.
    fn to_plane(&self, p: Vec3) -> Vec2 {
        self.to_plane_with_elevation(p).0
    }

    /// Project a world point onto the plane and return its elevation too.
    fn to_plane_with_elevation(&self, p: Vec3) -> (Vec2, f32);

    /// Lift a plane point at `elevation` back into world space.
    fn to_world(&self, p: Vec2, elevation: f32) -> Vec3;

    /// World-space unit vector along the plane's up axis.
    fn up(&self) -> Vec3 {
        self.to_world(Vec2::ZERO, 1.0)
    }
}

// ── PlaneTransform ────────────────────────────────────────────────────────────

/// A movement plane given by a rotation of the XZ plane.
///
/// Plane coordinates `(x, y)` at elevation `e` correspond to the local point
/// `(x, e, y)`, which is then rotated into world space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneTransform {
    pub rotation: Quat,
}

impl PlaneTransform {
    /// The XZ plane with +Y up.  Used by 3D games.
    pub const IDENTITY: PlaneTransform = PlaneTransform { rotation: Quat::IDENTITY };

    /// The XY plane.  World `y` maps to plane `y`; elevation runs along -Z.
    pub fn xy() -> PlaneTransform {
        PlaneTransform { rotation: Quat::from_rotation_x(-FRAC_PI_2) }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        PlaneTransform { rotation: rotation.normalize() }
    }
}

impl Default for PlaneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl MovementPlane for PlaneTransform {
    #[inline]
    fn to_plane_with_elevation(&self, p: Vec3) -> (Vec2, f32) {
        let local = self.rotation.inverse() * p;
        (Vec2::new(local.x, local.z), local.y)
    }

    #[inline]
    fn to_world(&self, p: Vec2, elevation: f32) -> Vec3 {
        self.rotation * Vec3::new(p.x, elevation, p.y)
    }

    #[inline]
    fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

// ── OrientationMode ───────────────────────────────────────────────────────────

/// Which local axis of the agent counts as "forward".
///
/// 3D games conventionally face along +Z; 2D games face along +Y with the
/// camera looking down -Z.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrientationMode {
    #[default]
    ZAxisForward,
    YAxisForward,
}

impl OrientationMode {
    /// Local forward axis of an agent in this mode.
    #[inline]
    pub fn forward_axis(self) -> Vec3 {
        match self {
            OrientationMode::ZAxisForward => Vec3::Z,
            OrientationMode::YAxisForward => Vec3::Y,
        }
    }

    /// The movement plane used when the path carries none.
    pub fn default_plane(self) -> PlaneTransform {
        match self {
            OrientationMode::ZAxisForward => PlaneTransform::IDENTITY,
            OrientationMode::YAxisForward => PlaneTransform::xy(),
        }
    }
}
