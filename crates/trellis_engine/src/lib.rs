//! # Trellis Engine
//!
//! Runtime core of a small real-time 3D simulation: a scene graph of
//! transform nodes and a collision engine that resolves contacts between
//! heterogeneous shapes through an open dispatch table.
//!
//! ## Features
//!
//! - **Transform hierarchy**: parent-relative position, rotation and scale,
//!   propagated to every descendant on write
//! - **Hit areas**: boxes and spheres bound to dedicated support nodes
//! - **Open collision dispatch**: narrow-phase tests keyed by shape-kind
//!   pairs, extensible with new shapes without touching existing ones
//! - **Typed events**: per-variant collision reactions through double dispatch
//! - **Layer masks**: 32 collision layers filtering which pairs are tested
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_engine::prelude::*;
//!
//! let mut scene = Scene::new(CollisionDispatcher::with_builtin_shapes());
//! scene.set_collision_mask(0, LayerMask::PLAYER).unwrap();
//!
//! let a = scene.graph_mut().create_root(Transform::identity());
//! let b = scene.graph_mut().create_root(Transform::from_position(Vec3::new(1.5, 0.0, 0.0)));
//! for node in [a, b] {
//!     scene.set_sphere_hit_area(node, 1.0, Vec3::zeros()).unwrap();
//!     scene.add_to_layer(node, 0).unwrap();
//! }
//!
//! let stats = scene.update(1.0 / 60.0);
//! assert_eq!(stats.contacts, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig, LayerRule},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::SimulationClock,
        },
        physics::{
            BoxShape, CollisionContext, CollisionDispatcher, CollisionEvent, CollisionHandler, ContactDetail,
            LayerMask, RegisterCollisions, Shape, ShapeKind, SphereBoxContact, SphereShape, SphereSphereContact,
        },
        scene::{Motion, NodeId, Renderable, Scene, SceneError, SceneGraph},
    };
}
