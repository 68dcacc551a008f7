//! Hit areas and collision detection
//!
//! Shapes are bound to scene nodes through hit areas. Pairs of hit areas are
//! tested by narrow-phase functions looked up in an open dispatch table keyed
//! by shape kind, and each detected contact yields one typed event per side.

pub mod collision_layers;
pub mod collision_system;
pub mod dispatch;
pub mod events;
pub mod hit_area;
pub mod narrow_phase;
pub mod shape;

pub use collision_layers::{CollisionLayers, LayerMask, MAX_LAYERS};
pub use collision_system::{CollisionPair, StepStats};
pub use dispatch::{CollisionDispatcher, Contact, Placement, RegisterCollisions};
pub use events::{
    CollisionContext, CollisionEvent, CollisionHandler, ContactDetail, SphereBoxContact, SphereSphereContact,
};
pub use hit_area::HitArea;
pub use narrow_phase::{collide_box_box, collide_box_sphere, collide_sphere_box, collide_sphere_sphere};
pub use shape::{BoxShape, Shape, ShapeKind, SphereShape};
