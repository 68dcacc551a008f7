//! Transform hierarchy
//!
//! Nodes live in a slotmap arena and refer to each other by [`NodeId`].
//! A parent lists its children but does not own them destructively:
//! destroying a node orphans its children, which become roots.
//!
//! Propagation happens on write. Every setter recomputes the world state of
//! the touched node, then of every descendant, then rebuilds the world
//! matrices of that subtree before returning.

use super::node::{Node, NodeId, TransformObserver};
use super::SceneError;
use crate::foundation::math::{quat_from_euler, rotate, scale, translate, Mat4, Point3, Quat, Transform, Vec3};
use crate::physics::{BoxShape, HitArea, Placement, Shape, SphereShape};
use slotmap::SlotMap;
use std::ops::Index;

/// Parent world state a child is composed against
#[derive(Clone, Copy)]
struct ParentFrame {
    position: Vec3,
    rotation: Quat,
    pseudo_scale: Vec3,
}

/// Arena of transform nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Read access to a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's non-transform data (name, tag, renderable)
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Iterate over all live nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Create a node with no parent
    pub fn create_root(&mut self, transform: Transform) -> NodeId {
        self.insert_node(None, &transform)
    }

    /// Create a node parented to `parent`, placed by a local transform
    ///
    /// The caller is responsible for eventually destroying the returned node.
    pub fn create_child(&mut self, parent: NodeId, transform: Transform) -> Result<NodeId, SceneError> {
        self.get(parent)?;
        Ok(self.insert_node(Some(parent), &transform))
    }

    fn insert_node(&mut self, parent: Option<NodeId>, transform: &Transform) -> NodeId {
        let id = self.nodes.insert(Node::new(parent, transform));
        if let Some(parent_id) = parent {
            self.nodes[parent_id].children.push(id);
        }
        self.compose_from_local(id, false);
        self.recalculate_matrices(id);
        id
    }

    /// Destroy a node
    ///
    /// The node is detached from its parent and its children become roots
    /// that keep their current world transform. The support node of the
    /// node's hit area is destroyed along with it.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.remove(id).ok_or(SceneError::UnknownNode(id))?;

        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&child| child != id);
            }
        }

        let support = node.hit_area.as_ref().map(HitArea::support);
        for child in node.children {
            if Some(child) == support {
                continue;
            }
            self.orphan(child);
        }
        if let Some(support) = support {
            if self.nodes.contains_key(support) {
                self.destroy_node(support)?;
            }
        }

        log::debug!("Destroyed node {:?}", id);
        Ok(())
    }

    /// Turn a node into a root without moving it in world space
    fn orphan(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
            node.local_position = node.position;
            node.local_rotation = node.rotation;
            node.local_scale = node.pseudo_scale;
            self.recalculate_matrices(id);
        }
    }

    /// Reparent `child` under `parent`
    ///
    /// With `keep_world_position` the child's world position, rotation and
    /// pseudo-scale are preserved and its local transform is recomputed;
    /// otherwise its local transform is kept and it moves with the new parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, keep_world_position: bool) -> Result<(), SceneError> {
        self.get(parent)?;
        self.get(child)?;
        if self.is_ancestor_or_self(child, parent) {
            log::warn!("Refusing to parent {:?} under its own descendant {:?}", child, parent);
            return Err(SceneError::CycleDetected { parent, child });
        }

        if let Some(old_parent) = self.nodes[child].parent {
            self.nodes[old_parent].children.retain(|&c| c != child);
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        if keep_world_position {
            let frame = self.parent_frame(child);
            let node = &mut self.nodes[child];
            if let Some(frame) = frame {
                node.local_position = frame.local_position_of(node.position);
                node.local_rotation = frame.rotation.inverse() * node.rotation;
                node.local_scale = node.pseudo_scale.component_div(&frame.pseudo_scale);
            }
        } else {
            self.compose_from_local(child, false);
        }
        self.propagate_to_children(child);
        self.recalculate_matrices(child);

        log::debug!("Reparented {:?} under {:?} (keep world: {})", child, parent, keep_world_position);
        Ok(())
    }

    /// Detach `child` from `parent`, leaving it a root at the same world transform
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.get(parent)?;
        if self.get(child)?.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.nodes[parent].children.retain(|&c| c != child);
        self.orphan(child);
        Ok(())
    }

    /// A node followed by all its descendants, parents before children
    ///
    /// Hit-area supports are left out; they go with their owner.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            nodes.push(current);
            let support = node.hit_area.as_ref().map(HitArea::support);
            stack.extend(node.children.iter().rev().copied().filter(|&child| Some(child) != support));
        }
        nodes
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Copy a subtree without its hit areas
    ///
    /// The copy carries transforms, names, tags and render data. With
    /// `keep_world_position` the new root sits at the source's world
    /// position and rotation (keeping the source's local scale); children
    /// are always copied with their local transforms.
    pub fn deep_copy(&mut self, source: NodeId, keep_world_position: bool) -> Result<NodeId, SceneError> {
        self.get(source)?;
        Ok(self.copy_subtree(source, None, keep_world_position))
    }

    fn copy_subtree(&mut self, source: NodeId, parent: Option<NodeId>, keep_world_position: bool) -> NodeId {
        let src = &self.nodes[source];
        let transform = if keep_world_position {
            Transform {
                position: src.position,
                rotation: src.rotation,
                scale: src.local_scale,
            }
        } else {
            src.local_transform()
        };
        let support = src.hit_area.as_ref().map(HitArea::support);
        let children: Vec<NodeId> = src
            .children
            .iter()
            .copied()
            .filter(|&child| Some(child) != support)
            .collect();
        let (name, tag, renderable, fixed_rotation) =
            (src.name.clone(), src.tag.clone(), src.renderable, src.fixed_rotation);

        let copy = self.insert_node(parent, &transform);
        let node = &mut self.nodes[copy];
        node.name = name;
        node.tag = tag;
        node.renderable = renderable;
        node.fixed_rotation = fixed_rotation;

        for child in children {
            self.copy_subtree(child, Some(copy), false);
        }
        copy
    }

    // ---------------------------------------------------------------------
    // Local setters
    // ---------------------------------------------------------------------

    /// Set the position relative to the parent
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.get_mut(id)?.local_position = position;
        self.refresh_from_local(id);
        Ok(())
    }

    /// Set the rotation relative to the parent
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), SceneError> {
        self.get_mut(id)?.local_rotation = rotation;
        self.refresh_from_local(id);
        Ok(())
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, id: NodeId, scale: Vec3) -> Result<(), SceneError> {
        self.get_mut(id)?.local_scale = scale;
        self.refresh_from_local(id);
        Ok(())
    }

    fn refresh_from_local(&mut self, id: NodeId) {
        self.compose_from_local(id, false);
        self.propagate_to_children(id);
        self.recalculate_matrices(id);
    }

    // ---------------------------------------------------------------------
    // World setters
    // ---------------------------------------------------------------------

    /// Set the world position, back-solving the local position
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.get(id)?;
        let frame = self.parent_frame(id);
        let node = &mut self.nodes[id];
        node.position = position;
        node.local_position = match frame {
            Some(frame) => frame.local_position_of(position),
            None => position,
        };
        self.propagate_to_children(id);
        self.recalculate_matrices(id);
        Ok(())
    }

    /// Set the world rotation, back-solving the local rotation
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), SceneError> {
        self.get(id)?;
        let frame = self.parent_frame(id);
        let node = &mut self.nodes[id];
        node.rotation = rotation;
        node.local_rotation = match frame {
            Some(frame) => frame.rotation.inverse() * rotation,
            None => rotation,
        };
        node.update_axes();
        self.propagate_to_children(id);
        self.recalculate_matrices(id);
        Ok(())
    }

    /// Set the world pseudo-scale, back-solving the local scale
    pub fn set_pseudo_scale(&mut self, id: NodeId, pseudo_scale: Vec3) -> Result<(), SceneError> {
        self.get(id)?;
        let frame = self.parent_frame(id);
        let node = &mut self.nodes[id];
        node.pseudo_scale = pseudo_scale;
        node.local_scale = match frame {
            Some(frame) => pseudo_scale.component_div(&frame.pseudo_scale),
            None => pseudo_scale,
        };
        self.propagate_to_children(id);
        self.recalculate_matrices(id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Convenience composition
    // ---------------------------------------------------------------------

    /// Move by `translation`, in the parent's frame when `local`, in world space otherwise
    pub fn translate(&mut self, id: NodeId, translation: Vec3, local: bool) -> Result<(), SceneError> {
        let node = self.get(id)?;
        if local {
            let position = node.local_position + translation;
            self.set_local_position(id, position)
        } else {
            let position = node.position + translation;
            self.set_position(id, position)
        }
    }

    /// Pre-multiply the local or world rotation by `rotation`
    pub fn rotate(&mut self, id: NodeId, rotation: Quat, local: bool) -> Result<(), SceneError> {
        let node = self.get(id)?;
        if local {
            let composed = rotation * node.local_rotation;
            self.set_local_rotation(id, composed)
        } else {
            let composed = rotation * node.rotation;
            self.set_rotation(id, composed)
        }
    }

    /// Rotate by XYZ euler angles in radians
    pub fn rotate_euler(&mut self, id: NodeId, angles: Vec3, local: bool) -> Result<(), SceneError> {
        self.rotate(id, quat_from_euler(angles), local)
    }

    /// Multiply the local scale or the pseudo-scale component-wise by `factors`
    pub fn scale(&mut self, id: NodeId, factors: Vec3, local: bool) -> Result<(), SceneError> {
        let node = self.get(id)?;
        if local {
            let scaled = node.local_scale.component_mul(&factors);
            self.set_local_scale(id, scaled)
        } else {
            let scaled = node.pseudo_scale.component_mul(&factors);
            self.set_pseudo_scale(id, scaled)
        }
    }

    /// Pin or release the node's world rotation against ancestor rotation
    pub fn set_fixed_rotation(&mut self, id: NodeId, fixed: bool) -> Result<(), SceneError> {
        self.get_mut(id)?.fixed_rotation = fixed;
        Ok(())
    }

    /// Register the callback fired whenever this node's world matrix is recomputed
    pub fn set_transform_observer(&mut self, id: NodeId, observer: TransformObserver) -> Result<(), SceneError> {
        self.get_mut(id)?.observer = Some(observer);
        Ok(())
    }

    /// Remove a node's transform observer
    pub fn clear_transform_observer(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.get_mut(id)?.observer = None;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Propagation
    // ---------------------------------------------------------------------

    fn parent_frame(&self, id: NodeId) -> Option<ParentFrame> {
        let parent = self.nodes[id].parent?;
        let parent = &self.nodes[parent];
        Some(ParentFrame {
            position: parent.position,
            rotation: parent.rotation,
            pseudo_scale: parent.pseudo_scale,
        })
    }

    /// Recompute a node's world state from its local state and its parent.
    /// With `hold_rotation` the world rotation stays put and the local
    /// rotation is back-solved instead.
    fn compose_from_local(&mut self, id: NodeId, hold_rotation: bool) {
        let frame = self.parent_frame(id);
        let node = &mut self.nodes[id];
        match frame {
            None => {
                node.position = node.local_position;
                if hold_rotation {
                    node.local_rotation = node.rotation;
                } else {
                    node.rotation = node.local_rotation;
                }
                node.pseudo_scale = node.local_scale;
            }
            Some(frame) => {
                node.position = frame.position
                    + frame.rotation * frame.pseudo_scale.component_mul(&node.local_position);
                if hold_rotation {
                    node.local_rotation = frame.rotation.inverse() * node.rotation;
                } else {
                    node.rotation = frame.rotation * node.local_rotation;
                }
                node.pseudo_scale = frame.pseudo_scale.component_mul(&node.local_scale);
            }
        }
        node.update_axes();
    }

    fn propagate_to_children(&mut self, id: NodeId) {
        let children = self.nodes[id].children.clone();
        for child in children {
            let hold_rotation = self.nodes[child].fixed_rotation;
            self.compose_from_local(child, hold_rotation);
            self.propagate_to_children(child);
        }
    }

    /// Rebuild world matrices top-down over a subtree, firing observers
    fn recalculate_matrices(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let parent_matrix = self.nodes[id]
                .parent
                .map_or_else(Mat4::identity, |parent| self.nodes[parent].world_matrix);

            let node = &mut self.nodes[id];
            node.world_matrix = parent_matrix
                * translate(node.local_position)
                * rotate(node.local_rotation)
                * scale(node.local_scale);

            if let Some(mut observer) = node.observer.take() {
                let matrix = node.world_matrix;
                observer(id, &matrix);
                node.observer = Some(observer);
            }
            stack.extend(node.children.iter().copied());
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Object-to-world matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id).map(|node| node.world_matrix)
    }

    /// World-to-object matrix, computed on demand
    pub fn inverse_world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id)?.world_matrix.try_inverse()
    }

    /// Map a point from a node's object space to world space
    pub fn object_to_world_point(&self, id: NodeId, point: Vec3) -> Option<Vec3> {
        let matrix = self.nodes.get(id)?.world_matrix;
        Some(matrix.transform_point(&Point3::from(point)).coords)
    }

    /// Map a world point into a node's object space
    pub fn world_to_object_point(&self, id: NodeId, point: Vec3) -> Option<Vec3> {
        let inverse = self.inverse_world_matrix(id)?;
        Some(inverse.transform_point(&Point3::from(point)).coords)
    }

    // ---------------------------------------------------------------------
    // Hit areas
    // ---------------------------------------------------------------------

    /// Attach a shape to `owner` through a dedicated support child
    ///
    /// The support carries the shape's offset, scale and rotation relative
    /// to the owner. A previous hit area and its support are replaced.
    pub fn set_hit_area(
        &mut self,
        owner: NodeId,
        shape: Box<dyn Shape>,
        placement: Transform,
    ) -> Result<NodeId, SceneError> {
        let previous = self.get_mut(owner)?.hit_area.take();
        if let Some(previous) = previous {
            if self.nodes.contains_key(previous.support()) {
                self.destroy_node(previous.support())?;
            }
        }

        let support = self.insert_node(Some(owner), &placement);
        log::debug!("Attached {} hit area to {:?} (support {:?})", shape.kind(), owner, support);
        self.nodes[owner].hit_area = Some(HitArea::new(support, shape));
        Ok(support)
    }

    /// Attach a box hit area
    pub fn set_box_hit_area(
        &mut self,
        owner: NodeId,
        width: f32,
        height: f32,
        depth: f32,
        placement: Transform,
    ) -> Result<NodeId, SceneError> {
        self.set_hit_area(owner, Box::new(BoxShape::new(width, height, depth)), placement)
    }

    /// Attach a sphere hit area at `offset`; its support keeps a fixed world rotation
    pub fn set_sphere_hit_area(&mut self, owner: NodeId, radius: f32, offset: Vec3) -> Result<NodeId, SceneError> {
        let support = self.set_hit_area(
            owner,
            Box::new(SphereShape::new(radius)),
            Transform::from_position(offset),
        )?;
        self.nodes[support].fixed_rotation = true;
        Ok(support)
    }

    /// World placement of a node, as seen by narrow-phase tests
    pub fn placement(&self, id: NodeId) -> Option<Placement> {
        let node = self.nodes.get(id)?;
        Some(Placement {
            position: node.position,
            rotation: node.rotation,
            pseudo_scale: node.pseudo_scale,
            world_matrix: node.world_matrix,
        })
    }

    /// Whether a world point lies inside the node's hit area
    ///
    /// Nodes without a hit area contain nothing.
    pub fn contains_point(&self, owner: NodeId, point: Vec3) -> bool {
        let Some(hit_area) = self.nodes.get(owner).and_then(|node| node.hit_area.as_ref()) else {
            return false;
        };
        match self.world_to_object_point(hit_area.support(), point) {
            Some(local) => hit_area.contains_local(local),
            None => false,
        }
    }
}

impl ParentFrame {
    fn local_position_of(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * (world - self.position)).component_div(&self.pseudo_scale)
    }
}

impl Index<NodeId> for SceneGraph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPSILON: f32 = 1e-5;

    fn yaw(angle: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn expected_matrix(graph: &SceneGraph, id: NodeId) -> Mat4 {
        let node = &graph[id];
        let parent_matrix = node.parent().map_or_else(Mat4::identity, |p| *graph[p].world_matrix());
        parent_matrix * node.local_transform().to_matrix()
    }

    fn assert_subtree_consistent(graph: &SceneGraph, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            assert_relative_eq!(*graph[id].world_matrix(), expected_matrix(graph, id), epsilon = EPSILON);
            stack.extend(graph[id].children().iter().copied());
        }
    }

    #[test]
    fn test_root_local_equals_world() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));

        assert_eq!(graph[root].position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(graph[root].local_position(), graph[root].position());
        assert!(graph[root].parent().is_none());
    }

    #[test]
    fn test_child_position_composes_through_parent() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(
            Transform::from_position_rotation(Vec3::new(1.0, 0.0, 0.0), yaw(HALF_PI)).with_uniform_scale(2.0),
        );
        let child = graph
            .create_child(parent, Transform::from_position(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();

        // (0,0,1) scaled to (0,0,2), rotated 90 degrees around Y to (2,0,0), offset by (1,0,0)
        assert_relative_eq!(graph[child].position(), Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(graph[child].pseudo_scale(), Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
        assert!(graph[child].rotation().angle_to(&yaw(HALF_PI)) < EPSILON);
        assert_subtree_consistent(&graph, parent);
    }

    #[test]
    fn test_local_mutation_propagates_to_grandchildren() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::identity());
        let child = graph.create_child(root, Transform::from_position(Vec3::new(0.0, 1.0, 0.0))).unwrap();
        let grandchild = graph.create_child(child, Transform::from_position(Vec3::new(0.0, 0.0, 2.0))).unwrap();

        graph.set_local_rotation(root, yaw(HALF_PI)).unwrap();
        graph.set_local_scale(root, Vec3::new(3.0, 3.0, 3.0)).unwrap();
        graph.set_local_position(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();

        assert_relative_eq!(graph[grandchild].position(), Vec3::new(11.0, 3.0, 0.0), epsilon = EPSILON);
        assert_subtree_consistent(&graph, root);
    }

    #[test]
    fn test_world_setter_round_trip_on_child() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(
            Transform::from_position_rotation(Vec3::new(-2.0, 1.0, 4.0), yaw(0.7)).with_uniform_scale(1.5),
        );
        let child = graph.create_child(parent, Transform::identity()).unwrap();
        let target = Vec3::new(3.0, -1.0, 2.0);

        graph.set_position(child, target).unwrap();

        assert_eq!(graph[child].position(), target);
        assert!((graph[child].local_position() - target).norm() > 0.1);
        let recomposed = graph.object_to_world_point(parent, graph[child].local_position()).unwrap();
        assert_relative_eq!(recomposed, target, epsilon = 1e-4);
        assert_subtree_consistent(&graph, parent);
    }

    #[test]
    fn test_world_setters_on_root_are_identity() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::identity());
        let p = Vec3::new(1.0, -4.0, 9.0);

        graph.set_position(root, p).unwrap();
        graph.set_position(root, p).unwrap();
        graph.set_rotation(root, yaw(0.25)).unwrap();
        graph.set_pseudo_scale(root, Vec3::new(2.0, 1.0, 0.5)).unwrap();

        assert_eq!(graph[root].position(), p);
        assert_eq!(graph[root].local_position(), p);
        assert_eq!(graph[root].local_rotation(), graph[root].rotation());
        assert_eq!(graph[root].local_scale(), Vec3::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn test_world_scale_moves_descendants() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::identity());
        let child = graph.create_child(root, Transform::from_position(Vec3::new(1.0, 0.0, 0.0))).unwrap();

        graph.scale(root, Vec3::new(2.0, 2.0, 2.0), false).unwrap();

        assert_relative_eq!(graph[child].position(), Vec3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(graph[child].pseudo_scale(), Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
        assert_subtree_consistent(&graph, root);
    }

    #[test]
    fn test_add_child_keeping_world_transform() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(
            Transform::from_position_rotation(Vec3::new(4.0, 0.0, -1.0), yaw(1.1)).with_uniform_scale(2.0),
        );
        let node = graph.create_root(
            Transform::from_position_rotation(Vec3::new(1.0, 2.0, 3.0), yaw(-0.3)).with_uniform_scale(3.0),
        );
        let (position, rotation, pseudo_scale) =
            (graph[node].position(), graph[node].rotation(), graph[node].pseudo_scale());

        graph.add_child(parent, node, true).unwrap();

        assert_relative_eq!(graph[node].position(), position, epsilon = EPSILON);
        assert!(graph[node].rotation().angle_to(&rotation) < EPSILON);
        assert_relative_eq!(graph[node].pseudo_scale(), pseudo_scale, epsilon = EPSILON);
        assert_relative_eq!(graph[node].local_scale(), Vec3::new(1.5, 1.5, 1.5), epsilon = EPSILON);
        assert_eq!(graph[node].parent(), Some(parent));
        assert_subtree_consistent(&graph, parent);
    }

    #[test]
    fn test_add_child_keeping_local_transform() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let node = graph.create_root(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));

        graph.add_child(parent, node, false).unwrap();

        assert_eq!(graph[node].local_position(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(graph[node].position(), Vec3::new(11.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_reparenting_moves_between_children_lists() {
        let mut graph = SceneGraph::new();
        let a = graph.create_root(Transform::identity());
        let b = graph.create_root(Transform::identity());
        let child = graph.create_child(a, Transform::identity()).unwrap();

        graph.add_child(b, child, true).unwrap();

        assert!(graph[a].children().is_empty());
        assert_eq!(graph[b].children(), &[child]);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::identity());
        let child = graph.create_child(root, Transform::identity()).unwrap();

        assert_eq!(
            graph.add_child(child, root, true),
            Err(SceneError::CycleDetected { parent: child, child: root })
        );
        assert!(graph.add_child(root, root, false).is_err());
        assert_eq!(graph[root].parent(), None);
    }

    #[test]
    fn test_fixed_rotation_child_holds_world_rotation() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(Transform::identity());
        let pinned = graph.create_child(parent, Transform::from_position(Vec3::new(0.0, 0.0, 1.0))).unwrap();
        graph.set_fixed_rotation(pinned, true).unwrap();
        let before = graph[pinned].rotation();

        graph.rotate(parent, yaw(HALF_PI), false).unwrap();

        assert!(graph[pinned].rotation().angle_to(&before) < EPSILON);
        assert!(graph[pinned].local_rotation().angle_to(&yaw(-HALF_PI)) < EPSILON);
        // position still follows the parent
        assert_relative_eq!(graph[pinned].position(), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_subtree_consistent(&graph, parent);
    }

    #[test]
    fn test_rotate_local_vs_world() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(Transform::from_position_rotation(Vec3::zeros(), yaw(HALF_PI)));
        let child = graph.create_child(parent, Transform::identity()).unwrap();

        graph.rotate(child, yaw(0.5), true).unwrap();
        assert!(graph[child].local_rotation().angle_to(&yaw(0.5)) < EPSILON);

        graph.rotate(child, yaw(0.5), false).unwrap();
        assert!(graph[child].rotation().angle_to(&yaw(HALF_PI + 1.0)) < EPSILON);
    }

    #[test]
    fn test_axes_follow_world_rotation() {
        let mut graph = SceneGraph::new();
        let node = graph.create_root(Transform::identity());

        graph.rotate_euler(node, Vec3::new(0.0, HALF_PI, 0.0), false).unwrap();

        assert_relative_eq!(graph[node].forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(graph[node].right(), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(graph[node].up(), Vec3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_destroy_orphans_children_in_place() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(Transform::from_position(Vec3::new(5.0, 0.0, 0.0)));
        let child = graph.create_child(parent, Transform::from_position(Vec3::new(1.0, 0.0, 0.0))).unwrap();

        graph.destroy_node(parent).unwrap();

        assert!(!graph.contains(parent));
        assert!(graph.contains(child));
        assert_eq!(graph[child].parent(), None);
        assert_relative_eq!(graph[child].position(), Vec3::new(6.0, 0.0, 0.0), epsilon = EPSILON);
        assert_eq!(graph[child].local_position(), graph[child].position());
        assert_subtree_consistent(&graph, child);
        assert_eq!(graph.destroy_node(parent), Err(SceneError::UnknownNode(parent)));
    }

    #[test]
    fn test_destroy_removes_hit_area_support() {
        let mut graph = SceneGraph::new();
        let owner = graph.create_root(Transform::identity());
        let support = graph.set_sphere_hit_area(owner, 1.0, Vec3::zeros()).unwrap();

        graph.destroy_node(owner).unwrap();

        assert!(!graph.contains(support));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_detach_child_requires_parentage() {
        let mut graph = SceneGraph::new();
        let a = graph.create_root(Transform::identity());
        let b = graph.create_root(Transform::identity());

        assert_eq!(graph.detach_child(a, b), Err(SceneError::NotAChild { parent: a, child: b }));
    }

    #[test]
    fn test_observer_fires_once_per_recomputed_node() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root(Transform::identity());
        let child = graph.create_child(root, Transform::identity()).unwrap();
        let sibling = graph.create_root(Transform::identity());

        let seen = Rc::new(RefCell::new(Vec::new()));
        for id in [root, child, sibling] {
            let seen = Rc::clone(&seen);
            graph
                .set_transform_observer(id, Box::new(move |node, matrix| seen.borrow_mut().push((node, *matrix))))
                .unwrap();
        }

        graph.translate(root, Vec3::new(0.0, 2.0, 0.0), true).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, root);
        assert_eq!(seen[1].0, child);
        assert_relative_eq!(seen[1].1, translate(Vec3::new(0.0, 2.0, 0.0)), epsilon = EPSILON);
    }

    #[test]
    fn test_deep_copy_skips_hit_areas() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_root(Transform::from_position(Vec3::new(0.0, 0.0, 3.0)));
        let source = graph
            .create_child(parent, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_uniform_scale(2.0))
            .unwrap();
        graph.node_mut(source).unwrap().name = "turret".to_string();
        let barrel = graph.create_child(source, Transform::from_position(Vec3::new(0.0, 0.0, 1.0))).unwrap();
        graph.set_box_hit_area(source, 1.0, 1.0, 1.0, Transform::identity()).unwrap();

        let copy = graph.deep_copy(source, true).unwrap();

        assert_eq!(graph[copy].parent(), None);
        assert_eq!(graph[copy].name, "turret");
        assert!(graph[copy].hit_area().is_none());
        assert_eq!(graph[copy].children().len(), 1);
        assert_relative_eq!(graph[copy].position(), graph[source].position(), epsilon = EPSILON);
        let barrel_copy = graph[copy].children()[0];
        assert_relative_eq!(graph[barrel_copy].position(), graph[barrel].position(), epsilon = EPSILON);
    }

    #[test]
    fn test_contains_point_uses_support_frame() {
        let mut graph = SceneGraph::new();
        let owner = graph.create_root(Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        graph
            .set_box_hit_area(owner, 2.0, 2.0, 2.0, Transform::from_position(Vec3::new(0.0, 5.0, 0.0)))
            .unwrap();

        assert!(graph.contains_point(owner, Vec3::new(10.5, 5.5, 0.0)));
        assert!(!graph.contains_point(owner, Vec3::new(10.0, 0.0, 0.0)));

        let bare = graph.create_root(Transform::identity());
        assert!(!graph.contains_point(bare, Vec3::zeros()));
    }

    #[test]
    fn test_replacing_hit_area_destroys_old_support() {
        let mut graph = SceneGraph::new();
        let owner = graph.create_root(Transform::identity());
        let first = graph.set_sphere_hit_area(owner, 1.0, Vec3::zeros()).unwrap();
        let second = graph.set_box_hit_area(owner, 1.0, 1.0, 1.0, Transform::identity()).unwrap();

        assert!(!graph.contains(first));
        assert_eq!(graph[second].parent(), Some(owner));
        assert!(!graph[second].fixed_rotation());
        assert_eq!(graph[owner].children(), &[second]);
        assert_eq!(graph[owner].hit_area().map(HitArea::support), Some(second));
    }
}
