//! The one structural surgery primitive used by every rewrite: [`Aig::merge`].

use crate::{Aig, AigEdge, NodeId};

impl Aig {
    /// Redirect every use of `loser` to `winner`.
    ///
    /// Each fanout `(consumer, q)` of `loser` becomes a fanout `(consumer, q ^ complement)` of `winner`,
    /// and the matching fanin slot of the consumer is rewritten accordingly.
    /// Set `complement` if `winner` computes the negation of `loser`.
    ///
    /// Afterwards `loser` has no fanout and can be removed with [`Aig::retire`].
    ///
    /// **WARNING**
    ///
    /// This does not check that the two nodes are equivalent, this is your job.
    /// Merging the constant node or merging a node into itself is a bug and panics.
    /// Merging a node into one of its own fanouts (which would create a cycle) is a bug too,
    /// only checked in debug builds.
    pub fn merge(&mut self, loser: NodeId, winner: NodeId, complement: bool) {
        assert_ne!(loser, 0, "the constant node cannot be merged away");
        assert_ne!(loser, winner, "node {} cannot be merged into itself", loser);
        debug_assert!(
            !self.in_fanin_cone(winner, loser),
            "merging node {} into node {} would create a cycle",
            loser,
            winner
        );
        assert!(
            self.get_any_node(winner).is_some(),
            "merging node {} into deleted node {}",
            loser,
            winner
        );

        for fanout in self.node_mut(loser).take_fanouts() {
            let old = AigEdge::new(loser, fanout.complement);
            let new = AigEdge::new(winner, fanout.complement ^ complement);
            let found = self.node_mut(fanout.node).replace_fanin_edge(old, new);
            assert!(
                found,
                "node {} is registered as a fanout of {} but does not use it",
                fanout.node, loser
            );
            self.node_mut(winner)
                .add_fanout(AigEdge::new(fanout.node, new.complement));
        }
    }

    /// Removes a node which is no longer used, along with the placeholders it was the only user of.
    pub fn retire(&mut self, id: NodeId) {
        for fanin in self.delete_node(id) {
            let n = self.node(fanin.node);
            if n.is_undefined() && n.get_fanouts().is_empty() {
                self.delete_node(fanin.node);
            }
        }
    }

    /// Merges `loser` into `winner` then removes `loser`, see [`Aig::merge`].
    pub fn replace(&mut self, loser: NodeId, winner: NodeId, complement: bool) {
        self.merge(loser, winner, complement);
        self.retire(loser);
    }
}

#[cfg(test)]
mod test {
    use crate::{Aig, AigEdge};

    /// ```text
    ///     O1    O2
    ///     |     |
    ///     5     6
    ///    / \   / \
    ///   3   4-+   2
    ///  / \ /
    /// 1   2
    /// ```
    /// with `4 = !1 & !2` and `6 = !4 & 2`.
    fn sample() -> Aig {
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.add_input(2).unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false))
            .unwrap();
        aig.new_and(4, AigEdge::new(1, true), AigEdge::new(2, true))
            .unwrap();
        aig.new_and(5, AigEdge::new(3, false), AigEdge::new(4, false))
            .unwrap();
        aig.new_and(6, AigEdge::new(4, true), AigEdge::new(2, false))
            .unwrap();
        aig.add_output(AigEdge::new(5, false)).unwrap();
        aig.add_output(AigEdge::new(6, true)).unwrap();
        aig
    }

    #[test]
    fn merge_rewires_with_polarity() {
        let mut aig = sample();
        aig.merge(4, 3, true);
        assert!(aig.node(4).get_fanouts().is_empty());
        assert_eq!(
            aig.node(5).get_fanins(),
            vec![AigEdge::new(3, false), AigEdge::new(3, true)]
        );
        assert_eq!(
            aig.node(6).get_fanins(),
            vec![AigEdge::new(3, false), AigEdge::new(2, false)]
        );
        let mut fanouts = aig.node(3).get_fanouts().to_vec();
        fanouts.sort_unstable();
        assert_eq!(
            fanouts,
            vec![
                AigEdge::new(5, false),
                AigEdge::new(5, true),
                AigEdge::new(6, false)
            ]
        );

        // 4 is still holding its fanins until it is retired
        assert!(aig.check_integrity().is_ok());
        aig.retire(4);
        assert!(aig.get_node(4).is_none());
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn merge_output_driver() {
        let mut aig = sample();
        let o2 = aig.get_outputs()[1];
        aig.replace(6, 2, false);
        assert_eq!(aig.node(o2).get_fanins(), vec![AigEdge::new(2, true)]);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn retire_removes_orphan_placeholders() {
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.declare(9).unwrap();
        aig.new_and(2, AigEdge::new(9, false), AigEdge::new(1, false))
            .unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(0, true))
            .unwrap();
        aig.add_output(AigEdge::new(2, false)).unwrap();
        aig.replace(2, 3, false);
        assert!(aig.get_any_node(9).is_none());
        assert!(aig.get_node(1).is_some());
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn merge_into_fanout_panics() {
        let mut aig = sample();
        aig.merge(3, 5, false);
    }

    #[test]
    #[should_panic]
    fn merge_constant_panics() {
        let mut aig = sample();
        aig.merge(0, 3, false);
    }
}
