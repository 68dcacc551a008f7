//! Collision dispatch table
//!
//! Narrow-phase tests are looked up by the ordered pair of concrete shape
//! kinds. The table is filled once, before the first query, and only read
//! afterwards. Adding a shape kind means registering its pairs; existing
//! shapes stay untouched.
//!
//! ```text
//! (BoxShape,    BoxShape)    -> collide_box_box
//! (BoxShape,    SphereShape) -> collide_box_sphere
//! (SphereShape, BoxShape)    -> collide_sphere_box
//! (SphereShape, SphereShape) -> collide_sphere_sphere
//! ```

use super::events::ContactDetail;
use super::hit_area::HitArea;
use super::shape::{BoxShape, Shape, ShapeKind, SphereShape};
use crate::foundation::math::{Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::fmt;

/// World placement of a hit area's support, captured at query time
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// World position of the support
    pub position: Vec3,
    /// World rotation of the support
    pub rotation: Quat,
    /// Accumulated scale of the support
    pub pseudo_scale: Vec3,
    /// Object-to-world matrix of the support
    pub world_matrix: Mat4,
}

impl Placement {
    /// Placement at `position` with no rotation and unit scale
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::identity(),
            pseudo_scale: Vec3::new(1.0, 1.0, 1.0),
            world_matrix: Mat4::new_translation(&position),
        }
    }

    /// Placement at `position` with a uniform scale factor
    pub fn scaled(position: Vec3, factor: f32) -> Self {
        let pseudo_scale = Vec3::new(factor, factor, factor);
        Self {
            world_matrix: Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&pseudo_scale),
            pseudo_scale,
            ..Self::at(position)
        }
    }
}

/// Outcome of a narrow-phase test, with one detail per participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Whether the shapes overlap or touch
    pub colliding: bool,
    /// Contact as seen from the first participant
    pub first: ContactDetail,
    /// Contact as seen from the second participant
    pub second: ContactDetail,
}

impl Contact {
    /// Detail-free outcome for both sides
    pub fn generic(colliding: bool) -> Self {
        Self {
            colliding,
            first: ContactDetail::Generic,
            second: ContactDetail::Generic,
        }
    }

    /// Same outcome with the participants' details exchanged
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            colliding: self.colliding,
            first: self.second,
            second: self.first,
        }
    }
}

type ErasedTest = Box<dyn Fn(&dyn Shape, &Placement, &dyn Shape, &Placement) -> Option<Contact>>;

/// Implemented by shapes to add their narrow-phase tests to a table
pub trait RegisterCollisions {
    /// Register every pair this shape knows how to test, in both orders
    /// where the other kind is already known
    fn register_collisions(dispatcher: &mut CollisionDispatcher);
}

/// Table of narrow-phase tests keyed by ordered shape-kind pairs
#[derive(Default)]
pub struct CollisionDispatcher {
    tests: HashMap<(ShapeKind, ShapeKind), ErasedTest>,
}

impl CollisionDispatcher {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the box and sphere tests registered
    ///
    /// Call once at startup and hand the result to the scene.
    pub fn with_builtin_shapes() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register_shape::<BoxShape>();
        dispatcher.register_shape::<SphereShape>();
        log::debug!("Collision table ready with {} ordered pairs", dispatcher.len());
        dispatcher
    }

    /// Let shape `S` register its tests
    pub fn register_shape<S: Shape + RegisterCollisions>(&mut self) {
        S::register_collisions(self);
    }

    /// Register the test for the ordered pair `(A, B)`
    ///
    /// A later registration for the same ordered pair replaces the earlier one.
    pub fn register<A, B, F>(&mut self, test: F)
    where
        A: Shape,
        B: Shape,
        F: Fn(&A, &Placement, &B, &Placement) -> Contact + 'static,
    {
        let key = (ShapeKind::of::<A>(), ShapeKind::of::<B>());
        let erased: ErasedTest = Box::new(move |a: &dyn Shape, a_at: &Placement, b: &dyn Shape, b_at: &Placement| {
            let a = a.as_any().downcast_ref::<A>()?;
            let b = b.as_any().downcast_ref::<B>()?;
            Some(test(a, a_at, b, b_at))
        });
        if self.tests.insert(key, erased).is_some() {
            log::warn!("Replaced collision test for ({}, {})", key.0, key.1);
        } else {
            log::debug!("Registered collision test for ({}, {})", key.0, key.1);
        }
    }

    /// Register `(A, B)` and derive `(B, A)` from it with the events swapped
    pub fn register_symmetric<A, B, F>(&mut self, test: F)
    where
        A: Shape,
        B: Shape,
        F: Fn(&A, &Placement, &B, &Placement) -> Contact + Clone + 'static,
    {
        if ShapeKind::of::<A>() != ShapeKind::of::<B>() {
            let forward = test.clone();
            self.register::<B, A, _>(move |b, b_at, a, a_at| forward(a, a_at, b, b_at).swapped());
        }
        self.register::<A, B, _>(test);
    }

    /// Whether a test exists for the ordered pair
    pub fn is_registered(&self, first: ShapeKind, second: ShapeKind) -> bool {
        self.tests.contains_key(&(first, second))
    }

    /// Number of registered ordered pairs
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no test is registered
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Run the narrow-phase test for two placed shapes
    ///
    /// Returns `None` when no test is registered for the ordered pair of
    /// kinds, which callers treat as "never collides".
    pub fn test(&self, first: &dyn Shape, first_at: &Placement, second: &dyn Shape, second_at: &Placement) -> Option<Contact> {
        let test = self.tests.get(&(first.kind(), second.kind()))?;
        test(first, first_at, second, second_at)
    }

    /// Run the narrow-phase test for two hit areas
    pub fn collides(&self, first: &HitArea, first_at: &Placement, second: &HitArea, second_at: &Placement) -> Option<Contact> {
        self.test(first.shape(), first_at, second.shape(), second_at)
    }
}

impl fmt::Debug for CollisionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tests.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::narrow_phase::{collide_box_sphere, collide_sphere_box};
    use std::any::Any;

    #[derive(Debug)]
    struct Marker;

    impl Shape for Marker {
        fn kind(&self) -> ShapeKind {
            ShapeKind::of::<Self>()
        }

        fn contains_local(&self, point: Vec3) -> bool {
            point == Vec3::zeros()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn marker_hits_sphere(_: &Marker, at: &Placement, sphere: &SphereShape, sphere_at: &Placement) -> Contact {
        let mut contact = Contact::generic((at.position - sphere_at.position).norm() <= sphere.radius);
        contact.second = ContactDetail::SphereBox(crate::physics::SphereBoxContact {
            closest_point: at.position,
            displacement: at.position - sphere_at.position,
            distance: 0.0,
        });
        contact
    }

    #[test]
    fn test_builtin_table_covers_all_orderings() {
        let dispatcher = CollisionDispatcher::with_builtin_shapes();
        let boxes = ShapeKind::of::<BoxShape>();
        let spheres = ShapeKind::of::<SphereShape>();

        assert_eq!(dispatcher.len(), 4);
        for (a, b) in [(boxes, boxes), (boxes, spheres), (spheres, boxes), (spheres, spheres)] {
            assert!(dispatcher.is_registered(a, b));
        }
    }

    #[test]
    fn test_unregistered_pair_never_collides() {
        let dispatcher = CollisionDispatcher::with_builtin_shapes();
        let at = Placement::at(Vec3::zeros());

        assert!(dispatcher.test(&Marker, &at, &SphereShape::new(1.0), &at).is_none());
        assert!(CollisionDispatcher::new().test(&BoxShape::new(1.0, 1.0, 1.0), &at, &BoxShape::new(1.0, 1.0, 1.0), &at).is_none());
    }

    #[test]
    fn test_symmetric_registration_swaps_events() {
        let mut dispatcher = CollisionDispatcher::with_builtin_shapes();
        dispatcher.register_symmetric::<Marker, SphereShape, _>(marker_hits_sphere);
        let marker_at = Placement::at(Vec3::new(0.5, 0.0, 0.0));
        let sphere_at = Placement::at(Vec3::zeros());
        let sphere = SphereShape::new(1.0);

        let forward = dispatcher.test(&Marker, &marker_at, &sphere, &sphere_at).unwrap();
        let reverse = dispatcher.test(&sphere, &sphere_at, &Marker, &marker_at).unwrap();

        assert!(forward.colliding && reverse.colliding);
        assert_eq!(forward.first, reverse.second);
        assert_eq!(forward.second, reverse.first);
        assert_eq!(dispatcher.len(), 6);
    }

    #[test]
    fn test_sphere_box_and_box_sphere_agree() {
        let dispatcher = CollisionDispatcher::with_builtin_shapes();
        let cube = BoxShape::new(2.0, 2.0, 2.0);
        let ball = SphereShape::new(0.5);
        let cube_at = Placement::at(Vec3::zeros());

        for x in [0.9, 1.2, 1.5, 2.0] {
            let ball_at = Placement::at(Vec3::new(x, 0.0, 0.0));
            let box_first = dispatcher.test(&cube, &cube_at, &ball, &ball_at).unwrap();
            let sphere_first = dispatcher.test(&ball, &ball_at, &cube, &cube_at).unwrap();

            assert_eq!(box_first.colliding, sphere_first.colliding);
            assert_eq!(box_first.first, sphere_first.second);
            assert_eq!(box_first.second, sphere_first.first);
            assert_eq!(box_first, collide_box_sphere(&cube, &cube_at, &ball, &ball_at));
            assert_eq!(sphere_first, collide_sphere_box(&ball, &ball_at, &cube, &cube_at));
        }
    }
}
