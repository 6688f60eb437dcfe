//! Movement hosts and ground probes.
//!
//! The agent never owns its transform.  It reads and writes pose through a
//! [`MovementHost`], which is one of three backends:
//!
//! | Backend               | How the finalized pose is applied                 |
//! |-----------------------|---------------------------------------------------|
//! | `Transform`           | position and rotation are overwritten directly     |
//! | `RigidBody`           | written as a move target; applied at the next physics step |
//! | `CharacterController` | moved by a relative delta; the body reports grounding |
//!
//! Agents on a rigid body run in the fixed-rate physics phase; all others
//! run in the frame phase.
//!
//! Ground is found through a [`GroundProbe`] ray cast, used only when the
//! agent applies its own gravity.

use glam::{Quat, Vec3};

// ── LayerMask ─────────────────────────────────────────────────────────────────

/// Bit set of collision layers (32 layers).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    /// Mask with only `layer` set.  Layers above 31 yield an empty mask.
    #[inline]
    pub fn layer(layer: u8) -> LayerMask {
        LayerMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    #[inline]
    pub fn contains(self, layer: u8) -> bool {
        self.intersects(LayerMask::layer(layer))
    }

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

// ── Ground probing ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    pub point:    Vec3,
    pub normal:   Vec3,
    pub distance: f32,
}

/// Bounded ray casts against walkable geometry.
pub trait GroundProbe: Send + Sync {
    /// First hit along `dir` (unit length) within `max_distance`, considering
    /// only geometry on a layer in `mask`.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

/// A world with nothing to stand on.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
        None
    }
}

/// An infinite plane on one layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundPlane {
    pub point:  Vec3,
    pub normal: Vec3,
    pub layer:  u8,
}

impl GroundPlane {
    /// The plane `y = height`, facing up, on layer 0.
    pub fn horizontal(height: f32) -> Self {
        Self { point: Vec3::new(0.0, height, 0.0), normal: Vec3::Y, layer: 0 }
    }
}

impl GroundProbe for GroundPlane {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        if !mask.contains(self.layer) {
            return None;
        }
        let normal = self.normal.try_normalize()?;
        let denom = dir.dot(normal);
        // Only hit the plane from its front side.
        if denom >= -1e-6 {
            return None;
        }
        let distance = (self.point - origin).dot(normal) / denom;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        Some(RayHit { point: origin + dir * distance, normal, distance })
    }
}

impl<G: GroundProbe + ?Sized> GroundProbe for Box<G> {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        (**self).raycast(origin, dir, max_distance, mask)
    }
}

// ── MovementHost ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    Transform,
    RigidBody { kinematic: bool },
    CharacterController,
}

impl Backend {
    #[inline]
    pub fn is_rigid_body(self) -> bool {
        matches!(self, Backend::RigidBody { .. })
    }

    /// `true` if the backend integrates gravity itself, so the agent must
    /// not add its own.
    #[inline]
    pub fn applies_own_gravity(self) -> bool {
        matches!(self, Backend::RigidBody { kinematic: false })
    }
}

/// Result of a relative move on a character controller.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveOutcome {
    pub position: Vec3,
    pub grounded: bool,
}

/// The pose the agent drives.
pub trait MovementHost {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn backend(&self) -> Backend;

    /// Overwrite the position (rigid bodies apply it at the next physics step).
    fn write_position(&mut self, position: Vec3);
    fn write_rotation(&mut self, rotation: Quat);

    /// Move by `delta`, resolving against ground.  Hosts that are not
    /// character controllers simply translate.
    fn move_relative(&mut self, delta: Vec3, ground: &dyn GroundProbe) -> MoveOutcome {
        let _ = ground;
        let position = self.position() + delta;
        self.write_position(position);
        MoveOutcome { position, grounded: false }
    }
}

// ── Concrete bodies ───────────────────────────────────────────────────────────

/// A bare transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TransformBody {
    pub position: Vec3,
    pub rotation: Quat,
}

impl TransformBody {
    pub fn new(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }
}

impl MovementHost for TransformBody {
    fn position(&self) -> Vec3 { self.position }
    fn rotation(&self) -> Quat { self.rotation }
    fn backend(&self) -> Backend { Backend::Transform }
    fn write_position(&mut self, position: Vec3) { self.position = position; }
    fn write_rotation(&mut self, rotation: Quat) { self.rotation = rotation; }
}

/// A rigid body integrated at the fixed physics rate.
///
/// Pose writes are queued as move targets and applied by
/// [`integrate`](Self::integrate).  A non-kinematic body without a target
/// falls under gravity until the ground probe stops it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RigidBodyLike {
    pub position:        Vec3,
    pub rotation:        Quat,
    pub velocity:        Vec3,
    pub kinematic:       bool,
    pub target_position: Option<Vec3>,
    pub target_rotation: Option<Quat>,
}

impl RigidBodyLike {
    pub fn new(position: Vec3, kinematic: bool) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            kinematic,
            target_position: None,
            target_rotation: None,
        }
    }

    /// One physics step of `dt` seconds.
    pub fn integrate(&mut self, dt: f32, gravity: Vec3, ground: &dyn GroundProbe) {
        if let Some(rot) = self.target_rotation.take() {
            self.rotation = rot;
        }
        match self.target_position.take() {
            Some(target) => {
                if dt > 0.0 {
                    self.velocity = (target - self.position) / dt;
                }
                self.position = target;
            }
            None if !self.kinematic => {
                self.velocity += gravity * dt;
                let next = self.position + self.velocity * dt;
                self.position = match ground_below(self.position, next, ground) {
                    Some(hit) => {
                        self.velocity -= hit.normal * self.velocity.dot(hit.normal).min(0.0);
                        hit.point
                    }
                    None => next,
                };
            }
            None => {}
        }
    }
}

/// Ground crossed when moving from `from` to `to`, if any.
fn ground_below(from: Vec3, to: Vec3, ground: &dyn GroundProbe) -> Option<RayHit> {
    let delta = to - from;
    let len = delta.length();
    let dir = delta.try_normalize()?;
    ground.raycast(from, dir, len, LayerMask::ALL)
}

impl MovementHost for RigidBodyLike {
    fn position(&self) -> Vec3 { self.position }
    fn rotation(&self) -> Quat { self.rotation }
    fn backend(&self) -> Backend { Backend::RigidBody { kinematic: self.kinematic } }
    fn write_position(&mut self, position: Vec3) { self.target_position = Some(position); }
    fn write_rotation(&mut self, rotation: Quat) { self.target_rotation = Some(rotation); }
}

/// A capsule moved by relative deltas that snaps onto ground within its
/// skin width.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CharacterBody {
    pub position:    Vec3,
    pub rotation:    Quat,
    pub half_height: f32,
    pub skin_width:  f32,
    pub grounded:    bool,
}

impl CharacterBody {
    pub fn new(position: Vec3, height: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            half_height: height * 0.5,
            skin_width: 0.08,
            grounded: false,
        }
    }
}

impl MovementHost for CharacterBody {
    fn position(&self) -> Vec3 { self.position }
    fn rotation(&self) -> Quat { self.rotation }
    fn backend(&self) -> Backend { Backend::CharacterController }
    fn write_position(&mut self, position: Vec3) { self.position = position; }
    fn write_rotation(&mut self, rotation: Quat) { self.rotation = rotation; }

    fn move_relative(&mut self, delta: Vec3, ground: &dyn GroundProbe) -> MoveOutcome {
        let next = self.position + delta;
        let up = Vec3::Y * self.half_height;
        let probe = ground.raycast(next + up, Vec3::NEG_Y, self.half_height + self.skin_width, LayerMask::ALL);
        self.grounded = probe.is_some();
        self.position = probe.map_or(next, |hit| hit.point);
        MoveOutcome { position: self.position, grounded: self.grounded }
    }
}

/// Any of the built-in bodies, for hosts that store them side by side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Body {
    Transform(TransformBody),
    RigidBody(RigidBodyLike),
    Character(CharacterBody),
}

impl Body {
    /// Advance rigid bodies by one physics step.  Other bodies ignore it.
    pub fn integrate(&mut self, dt: f32, gravity: Vec3, ground: &dyn GroundProbe) {
        if let Body::RigidBody(rb) = self {
            rb.integrate(dt, gravity, ground);
        }
    }

    fn host(&self) -> &dyn MovementHost {
        match self {
            Body::Transform(b) => b,
            Body::RigidBody(b) => b,
            Body::Character(b) => b,
        }
    }

    fn host_mut(&mut self) -> &mut dyn MovementHost {
        match self {
            Body::Transform(b) => b,
            Body::RigidBody(b) => b,
            Body::Character(b) => b,
        }
    }
}

impl MovementHost for Body {
    fn position(&self) -> Vec3 { self.host().position() }
    fn rotation(&self) -> Quat { self.host().rotation() }
    fn backend(&self) -> Backend { self.host().backend() }
    fn write_position(&mut self, position: Vec3) { self.host_mut().write_position(position) }
    fn write_rotation(&mut self, rotation: Quat) { self.host_mut().write_rotation(rotation) }

    fn move_relative(&mut self, delta: Vec3, ground: &dyn GroundProbe) -> MoveOutcome {
        self.host_mut().move_relative(delta, ground)
    }
}
