//! Narrow-phase tests for the built-in shapes
//!
//! All tests work in world space on the supports' placements. They assume
//! the documented hit-area restrictions: boxes stay axis-aligned (no rotation
//! on the support or any ancestor) and spheres are scaled uniformly, so only
//! the X component of the pseudo-scale is read for radii. Comparisons are
//! inclusive; touching shapes collide.

use super::dispatch::{CollisionDispatcher, Contact, Placement, RegisterCollisions};
use super::events::{ContactDetail, SphereBoxContact, SphereSphereContact};
use super::shape::{BoxShape, SphereShape};
use crate::foundation::math::Vec3;

fn world_half_extents(shape: &BoxShape, at: &Placement) -> Vec3 {
    shape.extents().component_mul(&at.pseudo_scale).abs() * 0.5
}

fn world_radius(shape: &SphereShape, at: &Placement) -> f32 {
    at.pseudo_scale.x.abs() * shape.radius
}

/// Axis-aligned overlap of two boxes; reports generic contacts
pub fn collide_box_box(a: &BoxShape, a_at: &Placement, b: &BoxShape, b_at: &Placement) -> Contact {
    let a_half = world_half_extents(a, a_at);
    let b_half = world_half_extents(b, b_at);
    let gap = (a_at.position - b_at.position).abs();

    let overlapping = (0..3).all(|axis| gap[axis] <= a_half[axis] + b_half[axis]);
    Contact::generic(overlapping)
}

/// Closest point on the box to the sphere's center
///
/// The box's event points from the closest point toward the sphere; the
/// sphere's event carries the negated displacement.
pub fn collide_box_sphere(cube: &BoxShape, cube_at: &Placement, ball: &SphereShape, ball_at: &Placement) -> Contact {
    let half = world_half_extents(cube, cube_at);
    let min = cube_at.position - half;
    let max = cube_at.position + half;
    let center = ball_at.position;

    let closest_point = Vec3::new(
        center.x.clamp(min.x, max.x),
        center.y.clamp(min.y, max.y),
        center.z.clamp(min.z, max.z),
    );
    let displacement = center - closest_point;
    let distance = displacement.norm();

    Contact {
        colliding: distance <= world_radius(ball, ball_at),
        first: ContactDetail::SphereBox(SphereBoxContact {
            closest_point,
            displacement,
            distance,
        }),
        second: ContactDetail::SphereBox(SphereBoxContact {
            closest_point,
            displacement: -displacement,
            distance,
        }),
    }
}

/// Sphere against box, answered by the box-sphere test with the sides swapped
pub fn collide_sphere_box(ball: &SphereShape, ball_at: &Placement, cube: &BoxShape, cube_at: &Placement) -> Contact {
    collide_box_sphere(cube, cube_at, ball, ball_at).swapped()
}

/// Center distance against the sum of world radii
pub fn collide_sphere_sphere(a: &SphereShape, a_at: &Placement, b: &SphereShape, b_at: &Placement) -> Contact {
    let displacement = b_at.position - a_at.position;
    let distance = displacement.norm();
    let sum_radius = world_radius(a, a_at) + world_radius(b, b_at);

    Contact {
        colliding: distance <= sum_radius,
        first: ContactDetail::SphereSphere(SphereSphereContact {
            displacement,
            distance,
            sum_radius,
        }),
        second: ContactDetail::SphereSphere(SphereSphereContact {
            displacement: -displacement,
            distance,
            sum_radius,
        }),
    }
}

impl RegisterCollisions for BoxShape {
    fn register_collisions(dispatcher: &mut CollisionDispatcher) {
        dispatcher.register::<Self, Self, _>(collide_box_box);
        dispatcher.register::<Self, SphereShape, _>(collide_box_sphere);
    }
}

impl RegisterCollisions for SphereShape {
    fn register_collisions(dispatcher: &mut CollisionDispatcher) {
        dispatcher.register::<Self, BoxShape, _>(collide_sphere_box);
        dispatcher.register::<Self, Self, _>(collide_sphere_sphere);
    }
}
