//! An [`AigEdge`] points at an [`AigNode`] and can be complemented (indicates the presence of a NOT gate).
//!
//! [`AigNode`]: crate::AigNode

use std::ops::{BitXor, Not};

use crate::NodeId;

/// Unambiguous fanin selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaninId {
    Fanin0,
    Fanin1,
}

impl From<usize> for FaninId {
    fn from(value: usize) -> Self {
        if value == 0 {
            FaninId::Fanin0
        } else if value == 1 {
            FaninId::Fanin1
        } else {
            panic!("could not create FaninId from value={}", value)
        }
    }
}

/// A literal: a node id paired with a polarity bit.
///
/// Every fanin (and every fanout entry) is an edge, so each reference to a node carries its own inverter
/// according to the value of `complement`.
///
/// For example:
///
/// ```rust
/// use fraig::AigEdge;
/// let fanin_false = AigEdge::new(0, false);
/// let fanin_true = AigEdge::new(0, true);
/// assert_eq!(fanin_false, !fanin_true);
/// assert!(fanin_true.is_cst_true());
/// assert_eq!(fanin_false ^ true, fanin_true);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AigEdge {
    /// The node the edge is refering to.
    pub(crate) node: NodeId,
    /// Set to true if signal should be inverted.
    pub(crate) complement: bool,
}

impl Not for AigEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

/// Xoring an edge with a polarity flips the inverter if the polarity is set.
impl BitXor<bool> for AigEdge {
    type Output = Self;

    fn bitxor(mut self, rhs: bool) -> Self::Output {
        self.complement ^= rhs;
        self
    }
}

impl AigEdge {
    pub fn new(node: NodeId, complement: bool) -> Self {
        AigEdge { node, complement }
    }

    /// Builds an edge from an AIGER literal (`2 * id + complement`).
    pub fn from_aiger(literal: u64) -> Self {
        AigEdge::new(literal >> 1, literal & 1 != 0)
    }

    /// Returns the AIGER literal (`2 * id + complement`) of this edge.
    pub fn to_aiger(&self) -> u64 {
        (self.node << 1) | self.complement as u64
    }

    pub fn get_node_id(&self) -> NodeId {
        self.node
    }

    pub fn get_complement(&self) -> bool {
        self.complement
    }

    pub fn is_cst_false(&self) -> bool {
        self.node == 0 && !self.complement
    }

    pub fn is_cst_true(&self) -> bool {
        self.node == 0 && self.complement
    }

    pub fn is_complement_of(&self, other: &AigEdge) -> bool {
        self.node == other.node && self.complement ^ other.complement
    }
}
