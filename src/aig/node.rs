use super::{AigEdge, AigError, FaninId, Result};

/// A node id.
///
/// The constant node [`NodeKind::False`] has id 0 by convention. Also, id must be unique.
pub type NodeId = u64;

/// What a node computes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The constant low/false signal.
    False,
    /// A primary input, `position` being its rank among the inputs.
    Input {
        position: usize,
        name: Option<String>,
    },
    /// An AND gate with two fanins.
    And { fanin0: AigEdge, fanin1: AigEdge },
    /// A primary output, `position` being its rank among the outputs.
    Output {
        position: usize,
        fanin: AigEdge,
        name: Option<String>,
    },
    /// A placeholder for an id which was referenced before (or without) being defined.
    /// It has no fanin, and is skipped by traversals.
    Undefined,
}

/// An AIG node.
///
/// Each node has an id. By convention, id for constant node `False` is 0. The id must be unique.
///
/// Internal note: nodes carry their fanouts with them, one entry per fanin slot pointing at them,
/// with the same polarity as the fanin. Make sure to update this correctly.
#[derive(Debug, Clone)]
pub struct AigNode {
    id: NodeId,
    kind: NodeKind,
    fanouts: Vec<AigEdge>,
}

impl PartialEq for AigNode {
    /// We compare id and kind, but not the fanouts, which are derived from the fanins of other nodes.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for AigNode {}

impl AigNode {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        if id == 0 && kind != NodeKind::False {
            panic!(
                "Hey, you are trying to create a node with id=0. \
                Id=0 is reserved for the constant node NodeKind::False."
            )
        }
        AigNode {
            id,
            kind,
            fanouts: Vec::new(),
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind, NodeKind::False)
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, NodeKind::Input { .. })
    }

    pub fn is_and(&self) -> bool {
        matches!(self.kind, NodeKind::And { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, NodeKind::Output { .. })
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, NodeKind::Undefined)
    }

    pub fn get_id(&self) -> NodeId {
        self.id
    }

    pub fn get_kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn get_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Input { name, .. } | NodeKind::Output { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Names inputs and outputs, other nodes cannot carry a symbol.
    pub fn set_name(&mut self, symbol: impl Into<String>) -> Result<()> {
        match &mut self.kind {
            NodeKind::Input { name, .. } | NodeKind::Output { name, .. } => {
                *name = Some(symbol.into());
                Ok(())
            }
            _ => Err(AigError::InvalidState(format!(
                "node {} is neither an input nor an output, it cannot be named",
                self.id
            ))),
        }
    }

    /// Fanins in slot order (fanin0 then fanin1 for and gates).
    pub fn get_fanins(&self) -> Vec<AigEdge> {
        match &self.kind {
            NodeKind::And { fanin0, fanin1 } => vec![*fanin0, *fanin1],
            NodeKind::Output { fanin, .. } => vec![*fanin],
            _ => vec![],
        }
    }

    pub fn get_fanin(&self, fanin_id: FaninId) -> Option<AigEdge> {
        match (&self.kind, fanin_id) {
            (NodeKind::And { fanin0, .. }, FaninId::Fanin0) => Some(*fanin0),
            (NodeKind::And { fanin1, .. }, FaninId::Fanin1) => Some(*fanin1),
            (NodeKind::Output { fanin, .. }, FaninId::Fanin0) => Some(*fanin),
            _ => None,
        }
    }

    /// Each fanout is an edge `(consumer, complement)`.
    pub fn get_fanouts(&self) -> &[AigEdge] {
        &self.fanouts
    }

    pub(super) fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub(super) fn add_fanout(&mut self, fanout: AigEdge) {
        self.fanouts.push(fanout);
    }

    /// Removes a single entry (a node using us twice is registered twice).
    pub(super) fn remove_fanout(&mut self, fanout: AigEdge) -> Result<()> {
        match self.fanouts.iter().position(|f| *f == fanout) {
            Some(idx) => {
                self.fanouts.swap_remove(idx);
                Ok(())
            }
            None => Err(AigError::InvalidState(format!(
                "failed to remove fanout ({}, {}) (not found) from node {}",
                fanout.node, fanout.complement, self.id
            ))),
        }
    }

    pub(super) fn take_fanouts(&mut self) -> Vec<AigEdge> {
        std::mem::take(&mut self.fanouts)
    }

    /// Overwrites a fanin slot. Fanouts of the previous and new fanin must be updated by the caller,
    /// see [`Aig::add_fanin_edge`].
    ///
    /// [`Aig::add_fanin_edge`]: super::Aig::add_fanin_edge
    pub(super) fn set_fanin(&mut self, fanin: AigEdge, fanin_id: FaninId) -> Result<AigEdge> {
        let slot = match (&mut self.kind, fanin_id) {
            (NodeKind::And { fanin0, .. }, FaninId::Fanin0) => fanin0,
            (NodeKind::And { fanin1, .. }, FaninId::Fanin1) => fanin1,
            (NodeKind::Output { fanin, .. }, FaninId::Fanin0) => fanin,
            _ => return Err(AigError::NoFanin),
        };
        Ok(std::mem::replace(slot, fanin))
    }

    /// Rewrites the first fanin slot equal to `old` into `new`.
    /// Returns false if no slot holds `old`.
    pub(super) fn replace_fanin_edge(&mut self, old: AigEdge, new: AigEdge) -> bool {
        let slots: Vec<&mut AigEdge> = match &mut self.kind {
            NodeKind::And { fanin0, fanin1 } => vec![fanin0, fanin1],
            NodeKind::Output { fanin, .. } => vec![fanin],
            _ => vec![],
        };
        for slot in slots {
            if *slot == old {
                *slot = new;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod test {
    use crate::{AigEdge, FaninId};

    use super::*;

    #[test]
    #[should_panic]
    fn invalid_and_id0_test() {
        let _ = AigNode::new(
            0,
            NodeKind::And {
                fanin0: AigEdge::new(1, false),
                fanin1: AigEdge::new(2, false),
            },
        );
    }

    #[test]
    fn set_fanin_test() {
        let mut n = AigNode::new(
            3,
            NodeKind::And {
                fanin0: AigEdge::new(1, false),
                fanin1: AigEdge::new(2, false),
            },
        );
        let old = n.set_fanin(AigEdge::new(2, true), FaninId::Fanin0).unwrap();
        assert_eq!(old, AigEdge::new(1, false));
        assert_eq!(
            n.get_fanins(),
            vec![AigEdge::new(2, true), AigEdge::new(2, false)]
        );

        let mut i = AigNode::new(
            1,
            NodeKind::Input {
                position: 0,
                name: None,
            },
        );
        assert!(i.set_fanin(AigEdge::new(0, false), FaninId::Fanin0).is_err());
    }

    #[test]
    fn fanouts_are_a_multiset() {
        let mut n = AigNode::new(
            1,
            NodeKind::Input {
                position: 0,
                name: None,
            },
        );
        n.add_fanout(AigEdge::new(3, false));
        n.add_fanout(AigEdge::new(3, true));
        n.add_fanout(AigEdge::new(3, false));
        assert!(n.remove_fanout(AigEdge::new(3, false)).is_ok());
        assert_eq!(n.get_fanouts().len(), 2);
        assert!(n.remove_fanout(AigEdge::new(4, false)).is_err());
    }

    #[test]
    fn replace_fanin_edge_test() {
        let mut n = AigNode::new(
            3,
            NodeKind::And {
                fanin0: AigEdge::new(1, false),
                fanin1: AigEdge::new(1, false),
            },
        );
        assert!(n.replace_fanin_edge(AigEdge::new(1, false), AigEdge::new(2, true)));
        assert_eq!(
            n.get_fanins(),
            vec![AigEdge::new(2, true), AigEdge::new(1, false)]
        );
        assert!(!n.replace_fanin_edge(AigEdge::new(1, true), AigEdge::new(2, true)));
    }

    #[test]
    fn names_test() {
        let mut n = AigNode::new(
            1,
            NodeKind::Input {
                position: 0,
                name: None,
            },
        );
        assert_eq!(n.get_name(), None);
        n.set_name("clk_en").unwrap();
        assert_eq!(n.get_name(), Some("clk_en"));
        assert!(AigNode::new(0, NodeKind::False).set_name("gnd").is_err());
    }
}
