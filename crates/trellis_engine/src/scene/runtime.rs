//! Simulation step over a scene graph
//!
//! A [`Scene`] owns the graph together with everything the step needs: the
//! collision table, layer membership, per-node motion and collision
//! handlers. One call to [`Scene::update`] integrates motion, runs the
//! collision pass and then destroys whatever was queued for destruction.

use super::{NodeId, Renderable, SceneError, SceneGraph};
use crate::config::{ConfigError, EngineConfig};
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::foundation::time::SimulationClock;
use crate::physics::{
    CollisionContext, CollisionDispatcher, CollisionEvent, CollisionHandler, CollisionLayers, Contact, LayerMask,
    Shape, StepStats,
};
use slotmap::SecondaryMap;

/// Velocity-driven movement of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Local-space units per second
    pub velocity: Vec3,
    /// Rotation axis scaled by radians per second, applied in the node's local frame
    pub angular_velocity: Vec3,
    /// Change of velocity per second
    pub acceleration: Vec3,
    /// Ignore the scene's time scale
    pub use_unscaled_time: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            use_unscaled_time: false,
        }
    }
}

impl Motion {
    /// Motion with a constant velocity
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }
}

/// Scene graph plus simulation step
pub struct Scene {
    graph: SceneGraph,
    dispatcher: CollisionDispatcher,
    layers: CollisionLayers,
    motion: SecondaryMap<NodeId, Motion>,
    handlers: SecondaryMap<NodeId, Box<dyn CollisionHandler>>,
    pending_destroy: Vec<NodeId>,
    clock: SimulationClock,
}

impl Scene {
    /// Create an empty scene using the given collision table
    pub fn new(dispatcher: CollisionDispatcher) -> Self {
        Self {
            graph: SceneGraph::new(),
            dispatcher,
            layers: CollisionLayers::new(),
            motion: SecondaryMap::new(),
            handlers: SecondaryMap::new(),
            pending_destroy: Vec::new(),
            clock: SimulationClock::default(),
        }
    }

    /// Create a scene with the time scale and layer masks of a configuration
    pub fn from_config(config: &EngineConfig, dispatcher: CollisionDispatcher) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut scene = Self::new(dispatcher);
        scene.clock.set_time_scale(config.time_scale);
        for rule in &config.layers {
            let mask = LayerMask::from_layers(&rule.collides_with)
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
            let mask = mask | scene.layers.mask(rule.layer);
            scene
                .set_collision_mask(rule.layer, mask)
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        log::debug!("Scene created from config with {} layer rules", config.layers.len());
        Ok(scene)
    }

    /// The scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The scene graph, for creating and moving nodes
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The collision table
    pub fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    /// Layer membership and masks
    pub fn layers(&self) -> &CollisionLayers {
        &self.layers
    }

    /// Step clock
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Change the time scale used by motion integration
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.clock.set_time_scale(time_scale);
    }

    // ---------------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------------

    /// Put a node on a collision layer
    pub fn add_to_layer(&mut self, node: NodeId, layer: usize) -> Result<(), SceneError> {
        self.ensure_live(node)?;
        self.layers.add(node, layer)
    }

    /// Take a node off a collision layer
    pub fn remove_from_layer(&mut self, node: NodeId, layer: usize) -> Result<(), SceneError> {
        self.layers.remove(node, layer)
    }

    /// Set which layers `layer` is tested against
    pub fn set_collision_mask(&mut self, layer: usize, mask: LayerMask) -> Result<(), SceneError> {
        self.layers.set_mask(layer, mask)
    }

    // ---------------------------------------------------------------------
    // Hit areas
    // ---------------------------------------------------------------------

    /// Attach a box hit area placed by offset, scale and rotation relative to `node`
    pub fn set_box_hit_area(
        &mut self,
        node: NodeId,
        width: f32,
        height: f32,
        depth: f32,
        offset: Vec3,
        scale: Vec3,
        rotation: Quat,
    ) -> Result<NodeId, SceneError> {
        let placement = Transform {
            position: offset,
            rotation,
            scale,
        };
        self.graph.set_box_hit_area(node, width, height, depth, placement)
    }

    /// Attach a sphere hit area at `offset` from `node`
    pub fn set_sphere_hit_area(&mut self, node: NodeId, radius: f32, offset: Vec3) -> Result<NodeId, SceneError> {
        self.graph.set_sphere_hit_area(node, radius, offset)
    }

    /// Attach any registered shape as the hit area of `node`
    pub fn set_hit_area(&mut self, node: NodeId, shape: Box<dyn Shape>, placement: Transform) -> Result<NodeId, SceneError> {
        self.graph.set_hit_area(node, shape, placement)
    }

    /// Whether a world point lies inside the node's hit area
    pub fn contains(&self, node: NodeId, point: Vec3) -> bool {
        self.graph.contains_point(node, point)
    }

    /// Test two nodes' hit areas against each other
    ///
    /// Returns the event for `a` and the event for `b` when they collide.
    /// A missing hit area or an unregistered pair of shape kinds never
    /// collides.
    pub fn collides(&self, a: NodeId, b: NodeId) -> Option<(CollisionEvent, CollisionEvent)> {
        let contact = self.test_pair(a, b)?;
        contact.colliding.then(|| {
            (
                CollisionEvent::new(b, contact.first),
                CollisionEvent::new(a, contact.second),
            )
        })
    }

    fn test_pair(&self, a: NodeId, b: NodeId) -> Option<Contact> {
        let area_a = self.graph.node(a)?.hit_area()?;
        let area_b = self.graph.node(b)?.hit_area()?;
        let at_a = self.graph.placement(area_a.support())?;
        let at_b = self.graph.placement(area_b.support())?;
        self.dispatcher.collides(area_a, &at_a, area_b, &at_b)
    }

    // ---------------------------------------------------------------------
    // Motion and reactions
    // ---------------------------------------------------------------------

    /// Give a node velocity-driven movement
    pub fn set_motion(&mut self, node: NodeId, motion: Motion) -> Result<(), SceneError> {
        self.ensure_live(node)?;
        self.motion.insert(node, motion);
        Ok(())
    }

    /// Movement of a node, if it has any
    pub fn motion(&self, node: NodeId) -> Option<&Motion> {
        self.motion.get(node)
    }

    /// Mutable movement of a node, if it has any
    pub fn motion_mut(&mut self, node: NodeId) -> Option<&mut Motion> {
        self.motion.get_mut(node)
    }

    /// Install the collision reactions of a node
    pub fn set_handler(&mut self, node: NodeId, handler: Box<dyn CollisionHandler>) -> Result<(), SceneError> {
        self.ensure_live(node)?;
        self.handlers.insert(node, handler);
        Ok(())
    }

    /// Remove and return the collision reactions of a node
    pub fn remove_handler(&mut self, node: NodeId) -> Option<Box<dyn CollisionHandler>> {
        self.handlers.remove(node)
    }

    // ---------------------------------------------------------------------
    // Destruction
    // ---------------------------------------------------------------------

    /// Queue a node and its descendants for destruction at the end of the step
    pub fn destroy(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.ensure_live(node)?;
        for id in self.graph.subtree(node) {
            if !self.pending_destroy.contains(&id) {
                self.pending_destroy.push(id);
            }
        }
        Ok(())
    }

    /// Whether a node is queued for destruction
    pub fn is_pending_destroy(&self, node: NodeId) -> bool {
        self.pending_destroy.contains(&node)
    }

    /// Destroy every queued node now; returns how many were destroyed
    pub fn flush_pending_destroy(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_destroy);
        let mut destroyed = 0;
        for id in pending {
            if !self.graph.contains(id) {
                continue;
            }
            self.layers.remove_from_all(id);
            self.motion.remove(id);
            self.handlers.remove(id);
            match self.graph.destroy_node(id) {
                Ok(()) => destroyed += 1,
                Err(err) => log::warn!("Failed to destroy {:?}: {}", id, err),
            }
        }
        destroyed
    }

    // ---------------------------------------------------------------------
    // Step
    // ---------------------------------------------------------------------

    /// Advance the simulation by `delta_seconds` of real time
    pub fn update(&mut self, delta_seconds: f32) -> StepStats {
        self.clock.advance(delta_seconds);
        self.integrate_motion();
        let stats = self.check_collisions();
        let destroyed = self.flush_pending_destroy();
        if destroyed > 0 {
            log::debug!("Destroyed {} nodes at end of step {}", destroyed, self.clock.frame_count());
        }
        self.prune_dead_nodes();
        stats
    }

    /// Forget layer membership, motion and handlers of nodes the graph no
    /// longer holds
    ///
    /// Nodes destroyed straight through [`SceneGraph::destroy_node`] bypass
    /// the destruction queue and leave their entries behind until this runs.
    fn prune_dead_nodes(&mut self) {
        let graph = &self.graph;
        self.layers.retain(|node| graph.contains(node));
        self.motion.retain(|node, _| graph.contains(node));
        self.handlers.retain(|node, _| graph.contains(node));
    }

    fn integrate_motion(&mut self) {
        let scaled = self.clock.delta_time();
        let unscaled = self.clock.unscaled_delta_time();

        for (id, motion) in &mut self.motion {
            let Some(node) = self.graph.node(id) else {
                continue;
            };
            let dt = if motion.use_unscaled_time { unscaled } else { scaled };
            let (position, rotation) = (node.local_position(), node.local_rotation());

            if motion.acceleration != Vec3::zeros() {
                motion.velocity += motion.acceleration * dt;
            }
            if motion.velocity != Vec3::zeros() {
                let moved = position + motion.velocity * dt;
                if let Err(err) = self.graph.set_local_position(id, moved) {
                    log::warn!("Motion update failed: {}", err);
                }
            }
            if motion.angular_velocity != Vec3::zeros() {
                let turned = rotation * Quat::from_scaled_axis(motion.angular_velocity * dt);
                if let Err(err) = self.graph.set_local_rotation(id, turned) {
                    log::warn!("Motion update failed: {}", err);
                }
            }
        }
    }

    /// Run the layer-masked collision pass and deliver events
    ///
    /// Each unique pair is tested once and both events are delivered before
    /// the next pair. Handlers may move nodes right away; destruction they
    /// request waits for the end of the step.
    pub fn check_collisions(&mut self) -> StepStats {
        self.prune_dead_nodes();
        let pairs = self.layers.candidate_pairs();
        let mut stats = StepStats {
            pairs_tested: pairs.len(),
            ..StepStats::default()
        };

        for pair in pairs {
            let Some(contact) = self.test_pair(pair.node_a, pair.node_b) else {
                stats.pairs_skipped += 1;
                continue;
            };
            if !contact.colliding {
                continue;
            }
            log::trace!("Contact between {:?} and {:?}", pair.node_a, pair.node_b);
            stats.contacts += 1;
            self.deliver(pair.node_a, &CollisionEvent::new(pair.node_b, contact.first));
            self.deliver(pair.node_b, &CollisionEvent::new(pair.node_a, contact.second));
        }

        log::trace!(
            "Collision pass: {} pairs, {} skipped, {} contacts",
            stats.pairs_tested,
            stats.pairs_skipped,
            stats.contacts
        );
        stats
    }

    fn deliver(&mut self, node: NodeId, event: &CollisionEvent) {
        let Some(mut handler) = self.handlers.remove(node) else {
            return;
        };
        let mut requests = Vec::new();
        {
            let mut ctx = CollisionContext::new(node, &mut self.graph, &mut requests);
            event.dispatch(handler.as_mut(), &mut ctx);
        }
        if self.graph.contains(node) {
            self.handlers.insert(node, handler);
        }
        for id in requests {
            if let Err(err) = self.destroy(id) {
                log::warn!("Ignoring destroy request from {:?}: {}", node, err);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    /// World matrix and render data of every visible node
    pub fn draw_list(&self) -> impl Iterator<Item = (NodeId, &Mat4, Renderable)> + '_ {
        self.graph
            .iter()
            .filter_map(|(id, node)| node.renderable.map(|renderable| (id, node.world_matrix(), renderable)))
    }

    fn ensure_live(&self, node: NodeId) -> Result<(), SceneError> {
        if self.graph.contains(node) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(node))
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.graph.len())
            .field("dispatcher", &self.dispatcher)
            .field("pending_destroy", &self.pending_destroy)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
