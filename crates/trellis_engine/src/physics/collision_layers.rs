//! Collision layer system for filtering collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."
//!
//! Nodes join any number of the 32 layers. Each layer carries a mask of the
//! layers it collides with; a pair of layers is tested when either side's
//! mask names the other.

use super::collision_system::CollisionPair;
use crate::scene::{NodeId, SceneError};
use bitflags::bitflags;

/// Number of collision layers
pub const MAX_LAYERS: usize = 32;

bitflags! {
    /// Set of collision layers, one bit per layer index
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerMask: u32 {
        /// Player character layer
        const PLAYER = 1 << 0;
        /// Enemy character layer
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static environment geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes
        const TRIGGER = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 7;

        // Layers 8..31 are free for games to name
        const _ = !0;
    }
}

impl LayerMask {
    /// Mask with only the given layer set
    pub fn layer(index: usize) -> Result<Self, SceneError> {
        check_layer(index)?;
        Ok(Self::from_bits_retain(1 << index))
    }

    /// Helper to create a mask from several layer indices
    ///
    /// # Example
    /// ```
    /// use trellis_engine::physics::LayerMask;
    ///
    /// let mask = LayerMask::from_layers(&[0, 1, 3]).unwrap();
    /// assert_eq!(mask, LayerMask::PLAYER | LayerMask::ENEMY | LayerMask::ENVIRONMENT);
    /// ```
    pub fn from_layers(indices: &[usize]) -> Result<Self, SceneError> {
        indices
            .iter()
            .try_fold(Self::empty(), |mask, &index| Ok(mask | Self::layer(index)?))
    }

    /// Whether the given layer's bit is set
    pub fn has_layer(self, index: usize) -> bool {
        index < MAX_LAYERS && self.bits() & (1 << index) != 0
    }
}

fn check_layer(index: usize) -> Result<(), SceneError> {
    if index < MAX_LAYERS {
        Ok(())
    } else {
        log::warn!("Layer {} is out of range, only {} layers exist", index, MAX_LAYERS);
        Err(SceneError::LayerOutOfRange(index))
    }
}

/// Layer membership and masks for the broad phase
#[derive(Debug, Clone)]
pub struct CollisionLayers {
    members: Vec<Vec<NodeId>>,
    masks: [LayerMask; MAX_LAYERS],
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionLayers {
    /// Empty layers with all masks cleared
    pub fn new() -> Self {
        Self {
            members: vec![Vec::new(); MAX_LAYERS],
            masks: [LayerMask::empty(); MAX_LAYERS],
        }
    }

    /// Put a node on a layer; adding it twice has no effect
    pub fn add(&mut self, node: NodeId, layer: usize) -> Result<(), SceneError> {
        check_layer(layer)?;
        let members = &mut self.members[layer];
        if !members.contains(&node) {
            members.push(node);
        }
        Ok(())
    }

    /// Take a node off a layer
    pub fn remove(&mut self, node: NodeId, layer: usize) -> Result<(), SceneError> {
        check_layer(layer)?;
        self.members[layer].retain(|&member| member != node);
        Ok(())
    }

    /// Take a node off every layer
    pub fn remove_from_all(&mut self, node: NodeId) {
        for members in &mut self.members {
            members.retain(|&member| member != node);
        }
    }

    /// Keep only the members for which `keep` returns true, on every layer
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        for members in &mut self.members {
            members.retain(|&member| keep(member));
        }
    }

    /// Nodes on a layer, in insertion order
    pub fn members(&self, layer: usize) -> &[NodeId] {
        self.members.get(layer).map_or(&[], Vec::as_slice)
    }

    /// Set the layers `layer` collides with
    pub fn set_mask(&mut self, layer: usize, mask: LayerMask) -> Result<(), SceneError> {
        check_layer(layer)?;
        self.masks[layer] = mask;
        Ok(())
    }

    /// Mask of a layer; empty for out-of-range indices
    pub fn mask(&self, layer: usize) -> LayerMask {
        self.masks.get(layer).copied().unwrap_or_default()
    }

    /// Check if two layers should be tested against each other
    ///
    /// Either side's mask naming the other is enough.
    pub fn should_collide(&self, layer_a: usize, layer_b: usize) -> bool {
        self.mask(layer_a).has_layer(layer_b) || self.mask(layer_b).has_layer(layer_a)
    }

    /// Unique unordered node pairs allowed by the masks
    ///
    /// Layer pairs are visited in ascending order and members in insertion
    /// order, so the result is deterministic. A node is never paired with
    /// itself, and a pair shared by several layer combinations appears once.
    pub fn candidate_pairs(&self) -> Vec<CollisionPair> {
        let mut seen = std::collections::HashSet::new();
        let mut pairs = Vec::new();

        for l1 in 0..MAX_LAYERS {
            for l2 in l1..MAX_LAYERS {
                if !self.should_collide(l1, l2) {
                    continue;
                }
                for &a in &self.members[l1] {
                    for &b in &self.members[l2] {
                        if a == b {
                            continue;
                        }
                        let pair = CollisionPair::new(a, b);
                        if seen.insert(pair) {
                            pairs.push(pair);
                        }
                    }
                }
            }
        }
        pairs
    }
}
