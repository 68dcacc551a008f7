//! Collision events and their delivery to reaction handlers
//!
//! A detected pair yields one event per participant. Delivering an event
//! resolves its variant and calls the matching method of the receiver's
//! [`CollisionHandler`], so a node can react differently to being hit by a
//! sphere or by anything else without either side knowing the other's type.

use crate::foundation::math::Vec3;
use crate::scene::{NodeId, SceneGraph};

/// Contact geometry between a sphere and a box, seen from one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBoxContact {
    /// Point on the box closest to the sphere's center
    pub closest_point: Vec3,
    /// Vector from the receiver toward the other participant
    pub displacement: Vec3,
    /// Distance between the closest point and the sphere's center
    pub distance: f32,
}

/// Contact geometry between two spheres, seen from one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSphereContact {
    /// Center-to-center vector from the receiver toward the other sphere
    pub displacement: Vec3,
    /// Distance between the centers
    pub distance: f32,
    /// Sum of both world radii
    pub sum_radius: f32,
}

/// What a narrow-phase test reports for one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactDetail {
    /// Contact without geometric detail
    Generic,
    /// Sphere against box
    SphereBox(SphereBoxContact),
    /// Sphere against sphere
    SphereSphere(SphereSphereContact),
}

/// One participant's view of a detected collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// The node collided with
    pub other: NodeId,
    /// Contact geometry, if the test produced any
    pub detail: ContactDetail,
}

impl CollisionEvent {
    /// Create an event
    pub fn new(other: NodeId, detail: ContactDetail) -> Self {
        Self { other, detail }
    }

    /// Deliver the event to the handler method matching its variant
    pub fn dispatch(&self, handler: &mut dyn CollisionHandler, ctx: &mut CollisionContext<'_>) {
        match &self.detail {
            ContactDetail::Generic => handler.on_collision(self.other, ctx),
            ContactDetail::SphereBox(contact) => handler.on_sphere_box(self.other, contact, ctx),
            ContactDetail::SphereSphere(contact) => handler.on_sphere_sphere(self.other, contact, ctx),
        }
    }
}

/// Per-node collision reactions
///
/// Every method defaults to doing nothing. Touching contacts (zero distance)
/// are reported like any other.
pub trait CollisionHandler {
    /// Contact without geometric detail
    fn on_collision(&mut self, other: NodeId, ctx: &mut CollisionContext<'_>) {
        let _ = (other, ctx);
    }

    /// Contact between a sphere and a box
    fn on_sphere_box(&mut self, other: NodeId, contact: &SphereBoxContact, ctx: &mut CollisionContext<'_>) {
        let _ = (other, contact, ctx);
    }

    /// Contact between two spheres
    fn on_sphere_sphere(&mut self, other: NodeId, contact: &SphereSphereContact, ctx: &mut CollisionContext<'_>) {
        let _ = (other, contact, ctx);
    }
}

/// What a handler may touch while reacting
///
/// Handlers may move nodes through the graph immediately. Destruction is only
/// requested here and carried out once the collision pass has finished.
pub struct CollisionContext<'a> {
    node: NodeId,
    graph: &'a mut SceneGraph,
    destroy_requests: &'a mut Vec<NodeId>,
}

impl<'a> CollisionContext<'a> {
    pub(crate) fn new(node: NodeId, graph: &'a mut SceneGraph, destroy_requests: &'a mut Vec<NodeId>) -> Self {
        Self {
            node,
            graph,
            destroy_requests,
        }
    }

    /// The node receiving the event
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read access to the scene graph
    pub fn graph(&self) -> &SceneGraph {
        &*self.graph
    }

    /// Write access to the scene graph
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut *self.graph
    }

    /// Queue `node` and its descendants for destruction at the end of the step
    pub fn destroy(&mut self, node: NodeId) {
        self.destroy_requests.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;

    #[derive(Default)]
    struct Recorder {
        generic: Vec<NodeId>,
        sphere_box: Vec<(NodeId, f32)>,
        sphere_sphere: Vec<(NodeId, f32)>,
    }

    impl CollisionHandler for Recorder {
        fn on_collision(&mut self, other: NodeId, _ctx: &mut CollisionContext<'_>) {
            self.generic.push(other);
        }

        fn on_sphere_box(&mut self, other: NodeId, contact: &SphereBoxContact, _ctx: &mut CollisionContext<'_>) {
            self.sphere_box.push((other, contact.distance));
        }

        fn on_sphere_sphere(&mut self, other: NodeId, contact: &SphereSphereContact, ctx: &mut CollisionContext<'_>) {
            self.sphere_sphere.push((other, contact.sum_radius));
            ctx.destroy(other);
        }
    }

    struct Indifferent;

    impl CollisionHandler for Indifferent {}

    #[test]
    fn test_dispatch_resolves_variant() {
        let mut graph = SceneGraph::new();
        let me = graph.create_root(Transform::identity());
        let other = graph.create_root(Transform::identity());
        let mut requests = Vec::new();
        let mut recorder = Recorder::default();

        {
            let mut ctx = CollisionContext::new(me, &mut graph, &mut requests);
            CollisionEvent::new(other, ContactDetail::Generic).dispatch(&mut recorder, &mut ctx);
            let sphere_box = SphereBoxContact {
                closest_point: Vec3::zeros(),
                displacement: Vec3::x(),
                distance: 0.25,
            };
            CollisionEvent::new(other, ContactDetail::SphereBox(sphere_box)).dispatch(&mut recorder, &mut ctx);
            let sphere_sphere = SphereSphereContact {
                displacement: Vec3::x(),
                distance: 1.0,
                sum_radius: 2.0,
            };
            CollisionEvent::new(other, ContactDetail::SphereSphere(sphere_sphere)).dispatch(&mut recorder, &mut ctx);
        }

        assert_eq!(recorder.generic, vec![other]);
        assert_eq!(recorder.sphere_box, vec![(other, 0.25)]);
        assert_eq!(recorder.sphere_sphere, vec![(other, 2.0)]);
        assert_eq!(requests, vec![other]);
        assert!(graph.contains(other));
    }

    #[test]
    fn test_default_reactions_ignore_events() {
        let mut graph = SceneGraph::new();
        let me = graph.create_root(Transform::identity());
        let mut requests = Vec::new();
        let mut ctx = CollisionContext::new(me, &mut graph, &mut requests);

        CollisionEvent::new(me, ContactDetail::Generic).dispatch(&mut Indifferent, &mut ctx);

        assert_eq!(ctx.node(), me);
        assert!(requests.is_empty());
    }
}
