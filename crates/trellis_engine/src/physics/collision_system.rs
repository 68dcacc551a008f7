//! Broad-phase bookkeeping
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! The broad phase here is the layer mask filter of
//! [`CollisionLayers`](super::CollisionLayers); the narrow phase is the
//! dispatch table. This module holds the types the two share.

use crate::scene::NodeId;

/// Unordered pair of nodes considered for a narrow-phase test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// Smaller node id
    pub node_a: NodeId,
    /// Larger node id
    pub node_b: NodeId,
}

impl CollisionPair {
    /// Create a new collision pair (always stores smaller node ID first for consistency)
    pub fn new(node_a: NodeId, node_b: NodeId) -> Self {
        if node_a < node_b {
            Self { node_a, node_b }
        } else {
            Self {
                node_a: node_b,
                node_b: node_a,
            }
        }
    }
}

/// Counters for one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Unique pairs passed by the layer masks
    pub pairs_tested: usize,
    /// Pairs without a hit area on one side, or without a registered test
    pub pairs_skipped: usize,
    /// Pairs whose shapes overlapped; each delivered two events
    pub contacts: usize,
}
