//! Scene management system
//!
//! A scene graph of transform nodes following Game Engine Architecture
//! Chapter 11.2.7 - Scene Graphs, plus the simulation step that drives it.
//!
//! ## Architecture
//!
//! ```text
//! Gameplay code
//!      ↓
//! Scene (motion, layers, collision step, deferred destruction)
//!      ↓
//! SceneGraph (nodes, transform propagation, hit areas)
//!      ↓
//! Renderer (reads world matrices through Scene::draw_list)
//! ```

mod graph;
mod node;
mod runtime;

pub use graph::SceneGraph;
pub use node::{MaterialHandle, MeshHandle, Node, NodeId, Renderable, TransformObserver};
pub use runtime::{Motion, Scene};

/// Misuse of the scene API
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The id does not refer to a live node
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Reparenting would make a node its own ancestor
    #[error("cannot parent {child:?} under {parent:?}: {parent:?} is {child:?} or one of its descendants")]
    CycleDetected {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },

    /// The node is not a child of the given parent
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent
        parent: NodeId,
        /// Node that was expected to be its child
        child: NodeId,
    },

    /// Only layers 0 to 31 exist
    #[error("layer {0} is out of range, only 32 layers exist")]
    LayerOutOfRange(usize),
}
