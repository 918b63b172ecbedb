//! Structural hashing: and gates with the same (unordered) pair of fanins are merged together.

use std::collections::HashMap;

use crate::{Aig, AigEdge, NodeId, NodeKind, Result};

/// Key of an and gate in the structural hash table.
///
/// The pair of fanins is unordered: `StrashKey::new(a, b) == StrashKey::new(b, a)`
/// and both hash the same, as the key is stored sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrashKey(AigEdge, AigEdge);

impl StrashKey {
    pub fn new(mut fanin0: AigEdge, mut fanin1: AigEdge) -> Self {
        if fanin0 > fanin1 {
            std::mem::swap(&mut fanin0, &mut fanin1);
        }
        StrashKey(fanin0, fanin1)
    }
}

impl Aig {
    /// Merges structurally equivalent and gates.
    ///
    /// The gates are visited in evaluation order, so that the fanins of a gate are already hashed
    /// (and possibly merged) when the gate itself is hashed: a single pass is enough for strash alone.
    /// Returns the number of gates merged away.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.add_input(2).unwrap();
    /// aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, true)).unwrap();
    /// aig.new_and(4, AigEdge::new(2, true), AigEdge::new(1, false)).unwrap();
    /// aig.new_and(5, AigEdge::new(3, false), AigEdge::new(4, true)).unwrap();
    /// aig.add_output(AigEdge::new(5, false)).unwrap();
    ///
    /// assert_eq!(aig.strash().unwrap(), 1);
    /// assert!(aig.get_node(4).is_none());
    /// assert_eq!(
    ///     aig.get_node(5).unwrap().get_fanins(),
    ///     vec![AigEdge::new(3, false), AigEdge::new(3, true)]
    /// );
    /// ```
    pub fn strash(&mut self) -> Result<usize> {
        let order = self.build_evaluation_order()?;
        let mut table: HashMap<StrashKey, NodeId> = HashMap::new();
        let mut merged = 0;

        for id in order {
            let key = match self.node(id).get_kind() {
                NodeKind::And { fanin0, fanin1 } => StrashKey::new(*fanin0, *fanin1),
                _ => continue,
            };
            match table.get(&key) {
                Some(&owner) => {
                    log::debug!("Strashing: {} merging {}...", owner, id);
                    self.replace(id, owner, false);
                    merged += 1;
                }
                None => {
                    table.insert(key, id);
                }
            }
        }

        log::info!("Strash merged {} gate(s)", merged);
        Ok(merged)
    }
}
