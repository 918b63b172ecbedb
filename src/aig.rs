//! Module defining the [`Aig`] struct (the node store), as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To start reducing an AIG, check [`crate::strash`], [`crate::optimize`] and [`crate::fraig`] docs.

pub mod dfs;
pub mod edge;
pub mod error;
mod integrity;
mod merge;
pub mod node;
mod parser;
mod writer;

use std::collections::{HashMap, HashSet};

pub use edge::{AigEdge, FaninId};
pub use error::{AigError, ParserError, Result};
pub use node::{AigNode, NodeId, NodeKind};

/// A whole AIG.
///
/// Nodes live in a store indexed by their [`NodeId`], and refer to each other through [`AigEdge`]s
/// (ids with a polarity), so no node ever owns another one.
///
/// Each node keeps both its fanins and its fanouts. Every public mutation keeps the two views in sync:
/// a fanin `(n, p)` of node `a` is always mirrored by a fanout `(a, p)` of node `n`.
/// You can check this (and a few other things) with [`Aig::check_integrity`].
///
/// Ids referenced before being defined are held by [`NodeKind::Undefined`] placeholders. They are
/// skipped by traversals and are defined in place once the real node is created:
///
/// ```rust
/// use fraig::{Aig, AigEdge};
/// let mut aig = Aig::new();
/// aig.add_input(1).unwrap();
/// aig.declare(3).unwrap(); // not known yet
/// aig.new_and(2, AigEdge::new(1, false), AigEdge::new(3, true)).unwrap();
/// assert!(aig.get_node(3).is_none()); // placeholders are holes
/// aig.new_and(3, AigEdge::new(1, true), AigEdge::new(0, true)).unwrap();
/// assert!(aig.get_node(3).unwrap().is_and());
/// ```
///
/// Note that [`Aig::clone`] performs a deep copy: nodes are plain values.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: HashMap<NodeId, AigNode>,
    /// Input ids, in input order.
    inputs: Vec<NodeId>,
    /// Output ids, in output order.
    outputs: Vec<NodeId>,
    /// Largest id ever used, outputs are numbered after it.
    max_id: NodeId,
}

impl Default for Aig {
    fn default() -> Self {
        Aig::new()
    }
}

impl Aig {
    /// Create a brand new AIG (constant node [`NodeKind::False`] included).
    pub fn new() -> Self {
        let nodes = HashMap::from([(0, AigNode::new(0, NodeKind::False))]);
        Aig {
            nodes,
            inputs: Vec::new(),
            outputs: Vec::new(),
            max_id: 0,
        }
    }

    /// Retrieves a node from its id.
    ///
    /// Deleted ids and [`NodeKind::Undefined`] placeholders are both reported as absent.
    pub fn get_node(&self, id: NodeId) -> Option<&AigNode> {
        self.nodes.get(&id).filter(|n| !n.is_undefined())
    }

    /// Retrieves a node from its id, placeholders included.
    pub fn get_any_node(&self, id: NodeId) -> Option<&AigNode> {
        self.nodes.get(&id)
    }

    /// Node lookup for engines working on ids they got from the AIG itself.
    /// Panics if the node was deleted, as it means the AIG invariants are broken.
    pub(crate) fn node(&self, id: NodeId) -> &AigNode {
        match self.nodes.get(&id) {
            Some(n) => n,
            None => panic!("node {} was deleted but is still referenced", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut AigNode {
        match self.nodes.get_mut(&id) {
            Some(n) => n,
            None => panic!("node {} was deleted but is still referenced", id),
        }
    }

    /// Number of nodes in the store (constant and placeholders included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Retrieves inputs id, in input order.
    pub fn get_inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Retrieves outputs id, in output order.
    pub fn get_outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Retrieves the edges driving the outputs, in output order.
    pub fn get_output_edges(&self) -> Vec<AigEdge> {
        self.outputs
            .iter()
            .flat_map(|&id| self.node(id).get_fanins())
            .collect()
    }

    /// Ids of every node currently in the store, sorted.
    pub fn get_node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn bump_max_id(&mut self, id: NodeId) {
        self.max_id = self.max_id.max(id);
    }

    fn check_fanin_exists(&self, fanin: &AigEdge) -> Result<()> {
        if self.nodes.contains_key(&fanin.node) {
            Ok(())
        } else {
            Err(AigError::NodeDoesNotExist(fanin.node))
        }
    }

    fn register_fanins(&mut self, id: NodeId) {
        for fanin in self.node(id).get_fanins() {
            self.node_mut(fanin.node)
                .add_fanout(AigEdge::new(id, fanin.complement));
        }
    }

    /// Create a new (or retrieve existing) input within the AIG.
    /// This will fail if a different node with the same id already exists in the AIG,
    /// or if id is 0 (reserved for constant node [`NodeKind::False`]).
    /// A placeholder with this id becomes the input.
    pub fn add_input(&mut self, id: NodeId) -> Result<NodeId> {
        if id == 0 {
            return Err(AigError::IdZeroButNotFalse);
        }
        let position = self.inputs.len();
        match self.nodes.get_mut(&id) {
            None => {
                self.nodes.insert(
                    id,
                    AigNode::new(
                        id,
                        NodeKind::Input {
                            position,
                            name: None,
                        },
                    ),
                );
            }
            Some(n) if n.is_undefined() => n.set_kind(NodeKind::Input {
                position,
                name: None,
            }),
            Some(n) if n.is_input() => return Ok(id),
            Some(_) => return Err(AigError::DuplicateId(id)),
        }
        self.inputs.push(id);
        self.bump_max_id(id);
        Ok(id)
    }

    /// Reserve an id with an [`NodeKind::Undefined`] placeholder, so that it can be used as a fanin
    /// before being defined. Does nothing if the id is already known.
    pub fn declare(&mut self, id: NodeId) -> Result<NodeId> {
        if !self.nodes.contains_key(&id) {
            self.nodes.insert(id, AigNode::new(id, NodeKind::Undefined));
            self.bump_max_id(id);
        }
        Ok(id)
    }

    /// Create a new and node (or retrieve it if the exact same node already exists).
    /// Both fanins must already be known by the AIG (possibly as placeholders).
    /// A placeholder with this id becomes the and gate, keeping its fanouts.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// // represent i1 & !i1 so will be false all the time (just an example)
    /// aig.new_and(2, AigEdge::new(1, false), AigEdge::new(1, true)).unwrap();
    /// // the same node, simply retrieved
    /// assert!(aig.new_and(2, AigEdge::new(1, false), AigEdge::new(1, true)).is_ok());
    ///
    /// // Some stuff we cannot do
    /// // Node with id 0
    /// assert!(aig.new_and(0, AigEdge::new(1, false), AigEdge::new(1, false)).is_err());
    /// // Id 1 is already taken by an input
    /// assert!(aig.new_and(1, AigEdge::new(2, false), AigEdge::new(2, false)).is_err());
    /// // Node 7 does not exist
    /// assert!(aig.new_and(3, AigEdge::new(7, false), AigEdge::new(1, false)).is_err());
    /// ```
    pub fn new_and(&mut self, id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Result<NodeId> {
        if id == 0 {
            return Err(AigError::IdZeroButNotFalse);
        }
        self.check_fanin_exists(&fanin0)?;
        self.check_fanin_exists(&fanin1)?;
        if fanin0.node == id || fanin1.node == id {
            return Err(AigError::InvalidState(format!(
                "and gate {} cannot be its own fanin",
                id
            )));
        }

        let kind = NodeKind::And { fanin0, fanin1 };
        match self.nodes.get_mut(&id) {
            None => {
                self.nodes.insert(id, AigNode::new(id, kind));
            }
            Some(n) if n.is_undefined() => n.set_kind(kind),
            Some(n) if *n.get_kind() == kind => return Ok(id),
            Some(_) => return Err(AigError::DuplicateId(id)),
        }
        self.register_fanins(id);
        self.bump_max_id(id);
        Ok(id)
    }

    /// Create a new output driven by `fanin`, returning the id of the output node.
    /// Outputs are numbered after every id used so far.
    pub fn add_output(&mut self, fanin: AigEdge) -> Result<NodeId> {
        self.check_fanin_exists(&fanin)?;
        let id = self.max_id + 1;
        let position = self.outputs.len();
        self.nodes.insert(
            id,
            AigNode::new(
                id,
                NodeKind::Output {
                    position,
                    fanin,
                    name: None,
                },
            ),
        );
        self.register_fanins(id);
        self.outputs.push(id);
        self.bump_max_id(id);
        Ok(id)
    }

    /// Give a symbol to an input or an output.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.nodes
            .get_mut(&id)
            .ok_or(AigError::NodeDoesNotExist(id))?
            .set_name(name)
    }

    /// Replace the given fanin of a node by a new fanin, keeping fanouts of both the previous
    /// and the new fanin up to date. Both nodes need to already exist in the AIG.
    pub fn add_fanin_edge(
        &mut self,
        target: NodeId,
        fanin_id: FaninId,
        source: AigEdge,
    ) -> Result<()> {
        self.check_fanin_exists(&source)?;
        if source.node == target {
            return Err(AigError::InvalidState(format!(
                "node {} cannot be its own fanin",
                target
            )));
        }
        let old = self
            .nodes
            .get_mut(&target)
            .ok_or(AigError::NodeDoesNotExist(target))?
            .set_fanin(source, fanin_id)?;
        self.node_mut(old.node)
            .remove_fanout(AigEdge::new(target, old.complement))?;
        self.node_mut(source.node)
            .add_fanout(AigEdge::new(target, source.complement));
        Ok(())
    }

    /// Disconnect the given fanin of a node: the pin is tied to the constant false node.
    /// Returns the edge which was removed.
    pub fn remove_fanin_edge(&mut self, target: NodeId, fanin_id: FaninId) -> Result<AigEdge> {
        let old = self
            .get_any_node(target)
            .ok_or(AigError::NodeDoesNotExist(target))?
            .get_fanin(fanin_id)
            .ok_or(AigError::NoFanin)?;
        self.add_fanin_edge(target, fanin_id, AigEdge::new(0, false))?;
        Ok(old)
    }

    /// Remove a node from the AIG, returning its former fanins.
    ///
    /// The node must not be used anymore (empty fanouts), and must not be the constant, an input or an output:
    /// breaking these rules is a bug in the caller and panics.
    pub fn delete_node(&mut self, id: NodeId) -> Vec<AigEdge> {
        let node = self.node(id);
        assert!(
            node.get_fanouts().is_empty(),
            "deleting node {} which still has {} fanout(s)",
            id,
            node.get_fanouts().len()
        );
        assert!(
            !node.is_false() && !node.is_input() && !node.is_output(),
            "deleting node {} which is the constant, an input or an output",
            id
        );
        let fanins = node.get_fanins();
        for fanin in &fanins {
            if let Err(e) = self
                .node_mut(fanin.node)
                .remove_fanout(AigEdge::new(id, fanin.complement))
            {
                panic!("{}", e);
            }
        }
        self.nodes.remove(&id);
        fanins
    }

    /// Returns the evaluation order of the AIG: a topological sort of the nodes reachable from the outputs,
    /// will error if a cycle is detected.
    ///
    /// Placeholders are skipped. Must be recomputed after any rewrite.
    pub fn build_evaluation_order(&self) -> Result<Vec<NodeId>> {
        let mut dfs = dfs::Dfs::from_outputs(self);
        let mut order = Vec::new();
        while let Some(id) = dfs.next(self)? {
            order.push(id);
        }
        Ok(order)
    }

    /// Number of and gates reachable from the outputs.
    pub fn and_count(&self) -> Result<usize> {
        Ok(self
            .build_evaluation_order()?
            .into_iter()
            .filter(|&id| self.node(id).is_and())
            .count())
    }

    /// An AIG is finalized when no placeholder is reachable from its outputs.
    pub fn is_finalized(&self) -> Result<bool> {
        Ok(self.build_evaluation_order()?.into_iter().all(|id| {
            self.node(id)
                .get_fanins()
                .iter()
                .all(|f| !self.node(f.node).is_undefined())
        }))
    }

    /// Ids of the defined nodes having at least one placeholder as fanin, sorted.
    pub fn floating_gates(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| {
                n.get_fanins()
                    .iter()
                    .any(|f| self.node(f.node).is_undefined())
            })
            .map(|n| n.get_id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of the and gates which cannot be reached from any output, sorted.
    pub fn unused_gates(&self) -> Result<Vec<NodeId>> {
        let reachable: HashSet<NodeId> = self.build_evaluation_order()?.into_iter().collect();
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_and() && !reachable.contains(&n.get_id()))
            .map(|n| n.get_id())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

impl PartialEq for Aig {
    /// Compares the two AIGs. They are equal iff:
    /// - their inputs are equal (same ids, same order)
    /// - their outputs are equal
    /// - their nodes are equal.
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs && self.outputs == other.outputs && self.nodes == other.nodes
    }
}
