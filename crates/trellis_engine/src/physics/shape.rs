//! Geometric shape descriptors
//!
//! Shapes are pure parameter sets. They carry no placement of their own; a
//! [`HitArea`](super::HitArea) binds one to a support node that places it in
//! the world.

use crate::foundation::math::Vec3;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a concrete shape type
///
/// Used as the key of the collision dispatch table. Equality and hashing only
/// consider the type identity; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct ShapeKind {
    id: TypeId,
    name: &'static str,
}

impl ShapeKind {
    /// Kind of the shape type `S`
    pub fn of<S: Shape>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    /// Fully qualified type name of the shape
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ShapeKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShapeKind {}

impl Hash for ShapeKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeKind({})", self.name)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.name.rsplit("::").next().unwrap_or(self.name);
        f.write_str(short)
    }
}

/// A collision shape centered on its support's origin
///
/// New shape kinds implement this trait and register their narrow-phase
/// tests through [`RegisterCollisions`](super::RegisterCollisions); existing
/// shapes need no changes.
pub trait Shape: Any + fmt::Debug {
    /// Dispatch key of the concrete type
    fn kind(&self) -> ShapeKind;

    /// Whether a point in the support's object space lies inside the shape
    fn contains_local(&self, point: Vec3) -> bool;

    /// Upcast used by the dispatch table to recover the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Axis-aligned box with full extents along X, Y and Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    /// Extent along X
    pub width: f32,
    /// Extent along Y
    pub height: f32,
    /// Extent along Z
    pub depth: f32,
}

impl BoxShape {
    /// Create a box from its full extents
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth }
    }

    /// Full extents as a vector
    pub fn extents(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    /// Half extents as a vector
    pub fn half_extents(&self) -> Vec3 {
        self.extents() * 0.5
    }
}

impl Shape for BoxShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::of::<Self>()
    }

    fn contains_local(&self, point: Vec3) -> bool {
        let half = self.half_extents();
        point.x.abs() <= half.x && point.y.abs() <= half.y && point.z.abs() <= half.z
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sphere around the support's origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    /// Radius before any support scaling
    pub radius: f32,
}

impl SphereShape {
    /// Create a sphere
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Shape for SphereShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::of::<Self>()
    }

    fn contains_local(&self, point: Vec3) -> bool {
        point.norm_squared() <= self.radius * self.radius
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
