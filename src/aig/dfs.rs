//! Provides a DFS visitor to allow simple AIG traversal.
//!
//! See [`Dfs`] for details.
//!
//! [`Dfs`]: Dfs

use std::collections::HashSet;

use crate::{Aig, AigError, NodeId, Result};

/// A DFS visitor yielding nodes in postorder, ie a topological order: every node comes after its fanins.
///
/// You can:
/// - start a DFS from a node using [`from_node`]
/// - or visit all the AIG by starting from the outputs using [`from_outputs`].
///
/// In the latter case, it will start by the first output (and its fanin cone),
/// then explore all non-previously-explored nodes from the fanin of the second output,
/// and so on until all the outputs have been processed.
///
/// [`NodeKind::Undefined`] placeholders are holes: they are neither yielded nor explored.
///
/// The traversal state belongs to the visitor, nodes are never marked.
/// Nothing prevents you from mutating the AIG between two calls to [`next`], but the result
/// only makes sense if the mutation did not change the part of the AIG left to explore.
///
/// [`from_node`]: Dfs::from_node
/// [`from_outputs`]: Dfs::from_outputs
/// [`next`]: Dfs::next
/// [`NodeKind::Undefined`]: crate::NodeKind::Undefined
///
/// Example:
///
/// ```rust
/// use fraig::{Aig, AigEdge, dfs::Dfs};
/// let mut aig = Aig::new();
/// aig.add_input(1).unwrap();
/// aig.add_input(2).unwrap();
/// aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, true)).unwrap();
/// let output = aig.add_output(AigEdge::new(3, false)).unwrap();
///
/// let mut dfs = Dfs::from_outputs(&aig);
/// let mut order = Vec::new();
/// while let Some(id) = dfs.next(&aig).unwrap() {
///     order.push(id);
/// }
/// assert_eq!(order, vec![1, 2, 3, output]);
/// ```
///
/// Inspired by [petgraph DFS](https://docs.rs/petgraph/latest/petgraph/visit/struct.Dfs.html).
#[derive(Debug, Clone)]
pub struct Dfs {
    /// Invariants:
    /// - a node is on the stack with `false` when it still has to be expanded,
    ///   and with `true` once its fanins have been pushed above it
    /// - `seen` holds expanded nodes, `done` the yielded ones: a node seen but not done
    ///   is on the current path
    /// - the different outputs from which to start a DFS are in starts, last one first.
    stack: Vec<(NodeId, bool)>,
    seen: HashSet<NodeId>,
    done: HashSet<NodeId>,
    starts: Vec<NodeId>,
}

impl Dfs {
    /// Create a DFS from the initial start node.
    /// You will only browse the fanin cone of this node.
    pub fn from_node(start: NodeId) -> Self {
        Dfs {
            stack: vec![(start, false)],
            seen: HashSet::new(),
            done: HashSet::new(),
            starts: Vec::new(),
        }
    }

    /// Create a DFS from the outputs of the given AIG, in output order.
    pub fn from_outputs(aig: &Aig) -> Self {
        let mut starts = aig.get_outputs().to_vec();
        starts.reverse();
        Dfs {
            stack: Vec::new(),
            seen: HashSet::new(),
            done: HashSet::new(),
            starts,
        }
    }

    /// Yield the next node of the DFS, or None if it is done.
    /// Errors if a cycle is found.
    pub fn next(&mut self, aig: &Aig) -> Result<Option<NodeId>> {
        loop {
            while let Some((id, expanded)) = self.stack.pop() {
                // Post order check
                if expanded {
                    self.done.insert(id);
                    return Ok(Some(id));
                }

                if self.done.contains(&id) {
                    continue;
                } else if !self.seen.insert(id) {
                    return Err(AigError::InvalidState(format!(
                        "found a cycle through node {}",
                        id
                    )));
                }

                let node = aig
                    .get_any_node(id)
                    .ok_or(AigError::NodeDoesNotExist(id))?;
                if node.is_undefined() {
                    self.done.insert(id);
                    continue;
                }
                self.stack.push((id, true));

                // Fanin0 must be on top to be visited first
                for fanin in node.get_fanins().iter().rev() {
                    if !self.done.contains(&fanin.node) {
                        self.stack.push((fanin.node, false));
                    }
                }
            }

            // Maybe we can start from a different output?
            match self.starts.pop() {
                Some(id) => self.stack.push((id, false)),
                None => return Ok(None),
            }
        }
    }
}

impl Aig {
    /// Returns true if `target` is `root` or one of its (transitive) fanins.
    pub fn in_fanin_cone(&self, root: NodeId, target: NodeId) -> bool {
        let mut stack = vec![root];
        let mut seen = HashSet::from([root]);
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            for fanin in self.node(id).get_fanins() {
                if seen.insert(fanin.node) {
                    stack.push(fanin.node);
                }
            }
        }
        false
    }
}
