//! Transform node stored in the scene graph arena

use crate::foundation::math::{Mat4, Quat, Transform, Vec3, FORWARD, RIGHT, UP};
use crate::physics::HitArea;
use std::fmt;

slotmap::new_key_type! {
    /// Stable, generational handle to a node in a [`SceneGraph`](super::SceneGraph)
    pub struct NodeId;
}

/// Callback fired after a node's world matrix has been recomputed
pub type TransformObserver = Box<dyn FnMut(NodeId, &Mat4)>;

/// Opaque mesh handle resolved by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Opaque material handle resolved by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u32);

/// What the renderer needs to draw a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    /// Mesh to draw
    pub mesh: MeshHandle,
    /// Material to draw it with; `None` uses the renderer's default
    pub material: Option<MaterialHandle>,
}

/// A node of the transform hierarchy
///
/// Local state is authoritative. World position, rotation, pseudo-scale,
/// the derived axes and the world matrix are caches the graph refreshes on
/// every write, so they are never stale when read.
pub struct Node {
    pub(crate) local_position: Vec3,
    pub(crate) local_rotation: Quat,
    pub(crate) local_scale: Vec3,

    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) pseudo_scale: Vec3,

    pub(crate) forward: Vec3,
    pub(crate) right: Vec3,
    pub(crate) up: Vec3,
    pub(crate) world_matrix: Mat4,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) fixed_rotation: bool,
    pub(crate) hit_area: Option<HitArea>,
    pub(crate) observer: Option<TransformObserver>,

    /// Free-form name for gameplay code
    pub name: String,
    /// Free-form tag for gameplay code
    pub tag: String,
    /// Render data, if the node is visible
    pub renderable: Option<Renderable>,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeId>, local: &Transform) -> Self {
        Self {
            local_position: local.position,
            local_rotation: local.rotation,
            local_scale: local.scale,
            position: local.position,
            rotation: local.rotation,
            pseudo_scale: local.scale,
            forward: FORWARD,
            right: RIGHT,
            up: UP,
            world_matrix: Mat4::identity(),
            parent,
            children: Vec::new(),
            fixed_rotation: false,
            hit_area: None,
            observer: None,
            name: String::new(),
            tag: String::new(),
            renderable: None,
        }
    }

    pub(crate) fn update_axes(&mut self) {
        self.forward = self.rotation * FORWARD;
        self.right = self.rotation * RIGHT;
        self.up = self.rotation * UP;
    }

    /// Position relative to the parent
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    /// Scale relative to the parent
    pub fn local_scale(&self) -> Vec3 {
        self.local_scale
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World-space rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Product of the local scales up the ancestor chain
    ///
    /// Only a true world scale when no ancestor rotates a non-uniform scale.
    pub fn pseudo_scale(&self) -> Vec3 {
        self.pseudo_scale
    }

    /// World-space forward axis
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// World-space right axis
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// World-space up axis
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Object-to-world matrix
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the world rotation is pinned when ancestors rotate
    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Attached hit area, if any
    pub fn hit_area(&self) -> Option<&HitArea> {
        self.hit_area.as_ref()
    }

    /// Local transform as a value
    pub fn local_transform(&self) -> Transform {
        Transform {
            position: self.local_position,
            rotation: self.local_rotation,
            scale: self.local_scale,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("local_position", &self.local_position)
            .field("position", &self.position)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("fixed_rotation", &self.fixed_rotation)
            .field("hit_area", &self.hit_area)
            .finish_non_exhaustive()
    }
}
