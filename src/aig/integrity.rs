use std::collections::HashMap;

use crate::{Aig, AigEdge, AigError, AigNode, NodeId, NodeKind, Result};

impl Aig {
    /// Checking if the AIG structure is correct.
    /// This function was written for debug purposes, as the library is supposed to maintain
    /// integrity of the AIG at any moment:
    /// - each node is stored under its own id, and only `False` has id 0
    /// - inputs and outputs lists match the nodes positions
    /// - every fanin refers to a known node
    /// - fanouts are exactly the mirror of fanins (same polarity, same multiplicity)
    /// - the AIG is acyclic.
    pub fn check_integrity(&self) -> Result<()> {
        // Checking that all nodes have relevant id
        // and perform some individual integrity checks
        for (&id, node) in &self.nodes {
            if node.get_id() != id {
                return Err(AigError::InvalidState(format!(
                    "node {} is stored under id {}",
                    node.get_id(),
                    id
                )));
            }
            self.check_node_integrity(node)?;
        }

        for (position, &id) in self.inputs.iter().enumerate() {
            match self.get_node(id).map(|n| n.get_kind()) {
                Some(NodeKind::Input { position: p, .. }) if *p == position => (),
                _ => {
                    return Err(AigError::InvalidState(format!(
                        "input {} (position {}) is not a registered input",
                        id, position
                    )));
                }
            }
        }
        for (position, &id) in self.outputs.iter().enumerate() {
            match self.get_node(id).map(|n| n.get_kind()) {
                Some(NodeKind::Output { position: p, .. }) if *p == position => (),
                _ => {
                    return Err(AigError::InvalidState(format!(
                        "output {} (position {}) is not a registered output",
                        id, position
                    )));
                }
            }
        }

        self.check_fanouts_integrity()?;

        // Checks for acyclicity
        self.build_evaluation_order()?;

        Ok(())
    }

    /// Check the integrity for an individual node, that is:
    /// - check that only `False` have id 0
    /// - check that fanins (`AigEdge`) for outputs and and gates are valid too
    ///   (ie they refer to a known node for this AIG)
    fn check_node_integrity(&self, node: &AigNode) -> Result<()> {
        match node.get_kind() {
            NodeKind::False => {
                if node.get_id() != 0 {
                    return Err(AigError::InvalidState("invalid false node".to_string()));
                }
            }
            NodeKind::Input { .. } | NodeKind::Undefined => {
                if node.get_id() == 0 {
                    return Err(AigError::IdZeroButNotFalse);
                }
            }
            NodeKind::And { fanin0, fanin1 } => {
                if node.get_id() == 0 {
                    return Err(AigError::IdZeroButNotFalse);
                }
                self.check_edge_integrity(node.get_id(), fanin0)?;
                self.check_edge_integrity(node.get_id(), fanin1)?;
            }
            NodeKind::Output { fanin, .. } => {
                self.check_edge_integrity(node.get_id(), fanin)?;
                if !node.get_fanouts().is_empty() {
                    return Err(AigError::InvalidState(format!(
                        "output {} is used as a fanin",
                        node.get_id()
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_edge_integrity(&self, parent: NodeId, fanin: &AigEdge) -> Result<()> {
        match self.get_any_node(fanin.node) {
            None => Err(AigError::InvalidState(format!(
                "edge from node {} pointing at node {} which is not in the AIG anymore",
                parent, fanin.node
            ))),
            Some(n) if n.is_output() => Err(AigError::InvalidState(format!(
                "edge from node {} pointing at output {}",
                parent, fanin.node
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Rebuilds the fanouts from the fanins and compares them with the stored ones.
    fn check_fanouts_integrity(&self) -> Result<()> {
        let mut expected: HashMap<NodeId, Vec<AigEdge>> = HashMap::new();
        for node in self.nodes.values() {
            for fanin in node.get_fanins() {
                expected
                    .entry(fanin.node)
                    .or_default()
                    .push(AigEdge::new(node.get_id(), fanin.complement));
            }
        }

        for (&id, node) in &self.nodes {
            let mut stored = node.get_fanouts().to_vec();
            stored.sort_unstable();
            let mut wanted = expected.remove(&id).unwrap_or_default();
            wanted.sort_unstable();
            if stored != wanted {
                return Err(AigError::InvalidState(format!(
                    "incoherent fanouts for node {}: {:?} stored vs {:?} from fanins",
                    id, stored, wanted
                )));
            }
        }

        Ok(())
    }
}
