//! Local rewriting of trivial and gates, and removal of the logic no output depends on.

use std::collections::HashSet;

use crate::{Aig, AigEdge, AigError, NodeId, NodeKind, Result};

/// The literal an and gate can be replaced with, if its fanins make it trivial.
fn trivial_replacement(fanin0: AigEdge, fanin1: AigEdge) -> Option<AigEdge> {
    let cst_false = AigEdge::new(0, false);
    if fanin0.is_cst_false() || fanin1.is_cst_false() {
        Some(cst_false)
    } else if fanin0.is_cst_true() {
        Some(fanin1)
    } else if fanin1.is_cst_true() {
        Some(fanin0)
    } else if fanin0 == fanin1 {
        Some(fanin0)
    } else if fanin0.is_complement_of(&fanin1) {
        Some(cst_false)
    } else {
        None
    }
}

impl Aig {
    /// Replaces the trivial and gates, visited in evaluation order:
    /// - `a & 0` and `a & !a` by the constant false
    /// - `a & 1` and `a & a` by `a`.
    ///
    /// Returns the number of gates replaced.
    /// A single pass is not a fixed point when combined with [`Aig::strash`], see [`Aig::simplify`].
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.new_and(2, AigEdge::new(1, false), AigEdge::new(1, true)).unwrap();
    /// let output = aig.add_output(AigEdge::new(2, true)).unwrap();
    ///
    /// assert_eq!(aig.optimize().unwrap(), 1);
    /// assert_eq!(aig.get_output_edges(), vec![AigEdge::new(0, true)]);
    /// ```
    pub fn optimize(&mut self) -> Result<usize> {
        let order = self.build_evaluation_order()?;
        let mut rewritten = 0;

        for id in order {
            let target = match self.node(id).get_kind() {
                NodeKind::And { fanin0, fanin1 } => trivial_replacement(*fanin0, *fanin1),
                _ => None,
            };
            if let Some(target) = target {
                log::debug!(
                    "Simplifying: {} merging {}{}...",
                    target.get_node_id(),
                    if target.get_complement() { "!" } else { "" },
                    id
                );
                self.replace(id, target.get_node_id(), target.get_complement());
                rewritten += 1;
            }
        }

        log::info!("Optimize rewrote {} gate(s)", rewritten);
        Ok(rewritten)
    }

    /// Runs [`Aig::optimize`] and [`Aig::strash`] until none of them changes anything.
    /// Returns the total number of gates removed.
    pub fn simplify(&mut self) -> Result<usize> {
        let mut total = 0;
        loop {
            let removed = self.optimize()? + self.strash()?;
            if removed == 0 {
                return Ok(total);
            }
            total += removed;
        }
    }

    /// Removes the and gates and placeholders which are not reachable from any output.
    /// Inputs and the constant node are always kept.
    /// Returns the number of nodes removed.
    pub fn sweep(&mut self) -> Result<usize> {
        let order = self.build_evaluation_order()?;

        // Placeholders are not part of the order, but those used by reachable gates are reachable.
        let mut reachable: HashSet<NodeId> = HashSet::new();
        for &id in &order {
            reachable.insert(id);
            for fanin in self.node(id).get_fanins() {
                reachable.insert(fanin.get_node_id());
            }
        }

        let mut dead: Vec<NodeId> = self
            .get_node_ids()
            .into_iter()
            .filter(|id| {
                let n = self.node(*id);
                (n.is_and() || n.is_undefined()) && !reachable.contains(id)
            })
            .collect();

        // A dead node is only used by other dead nodes: remove them from the top
        let mut removed = 0;
        while !dead.is_empty() {
            let before = dead.len();
            dead.retain(|&id| {
                if !self.node(id).get_fanouts().is_empty() {
                    return true;
                }
                log::debug!("Sweeping: {} removed...", id);
                self.delete_node(id);
                removed += 1;
                false
            });
            if dead.len() == before {
                return Err(AigError::InvalidState(format!(
                    "unreachable nodes {:?} are still used",
                    dead
                )));
            }
        }

        log::info!("Sweep removed {} node(s)", removed);
        Ok(removed)
    }
}
