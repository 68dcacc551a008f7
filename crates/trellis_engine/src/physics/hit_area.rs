//! Shape bound to a support node

use super::shape::{Shape, ShapeKind};
use crate::foundation::math::Vec3;
use crate::scene::NodeId;

/// A shape placed in the world by a dedicated support node
///
/// The support is a child of the owning node and carries the shape's offset,
/// rotation and scale. Nothing but the hit area uses it.
#[derive(Debug)]
pub struct HitArea {
    support: NodeId,
    shape: Box<dyn Shape>,
}

impl HitArea {
    pub(crate) fn new(support: NodeId, shape: Box<dyn Shape>) -> Self {
        Self { support, shape }
    }

    /// Node placing the shape
    pub fn support(&self) -> NodeId {
        self.support
    }

    /// The bound shape
    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    /// Dispatch key of the bound shape
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Containment test for a point already in the support's object space
    pub fn contains_local(&self, point: Vec3) -> bool {
        self.shape.contains_local(point)
    }
}
