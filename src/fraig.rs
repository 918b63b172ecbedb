//! Functional reduction: merging the nodes which compute the same function, up to complement.
//!
//! See [`Aig::fraig`] for the algorithm.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    Aig, AigEdge, NodeId, Result,
    fec::{self, FecGroups},
    sat::{EquivOracle, Proof},
    sim::{self, WORD_WIDTH},
};

/// Settings of [`Aig::fraig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraigOptions {
    /// Seed of the random patterns generator, runs are reproducible.
    pub seed: u64,
    /// Random simulation stops after `max(1, log2(nodes)) * stable_rounds_per_log2`
    /// consecutive rounds without any change.
    pub stable_rounds_per_log2: usize,
    /// Simulate the counterexamples found by the SAT solver to split the remaining candidates.
    pub cex_feedback: bool,
}

impl Default for FraigOptions {
    fn default() -> Self {
        FraigOptions {
            seed: 0,
            stable_rounds_per_log2: 4,
            cex_feedback: true,
        }
    }
}

/// What [`Aig::fraig`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FraigStats {
    /// Random simulation rounds, of 64 patterns each.
    pub sim_rounds: usize,
    pub sat_calls: usize,
    /// Pairs proven equivalent, and merged.
    pub merged: usize,
    /// Pairs proven distinct.
    pub disproved: usize,
    /// Gates removed by the final [`Aig::simplify`].
    pub simplified: usize,
}

/// Position of each node in the evaluation order, the constant node coming first.
fn ranks_of(order: &[NodeId]) -> HashMap<NodeId, usize> {
    let mut ranks: HashMap<NodeId, usize> = order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i + 1))
        .collect();
    ranks.insert(0, 0);
    ranks
}

impl Aig {
    /// Merges the nodes which are functionally equivalent (up to complement).
    ///
    /// 1. Random simulation splits the constant node and the and gates into candidate groups,
    ///    see [`fec::random_sim`].
    /// 2. In each group, the member coming first in evaluation order is the representative.
    ///    Every other member is checked against it with a SAT solver: equivalent members are
    ///    merged, the others remain candidates among themselves for the next round.
    /// 3. The counterexamples of the round are simulated to split these remaining candidates.
    /// 4. Once no candidate is left, the AIG is cleaned with [`Aig::simplify`].
    ///
    /// The representative leaves its group at each round, so this always terminates.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge, fraig::FraigOptions};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.add_input(2).unwrap();
    /// // 3 = 1 & 2, 5 = 1 & (2 & 1)
    /// aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false)).unwrap();
    /// aig.new_and(4, AigEdge::new(2, false), AigEdge::new(1, false)).unwrap();
    /// aig.new_and(5, AigEdge::new(1, false), AigEdge::new(4, false)).unwrap();
    /// aig.add_output(AigEdge::new(3, false)).unwrap();
    /// aig.add_output(AigEdge::new(5, true)).unwrap();
    ///
    /// let stats = aig.fraig(&FraigOptions::default()).unwrap();
    /// assert!(stats.merged >= 1);
    /// assert_eq!(aig.and_count().unwrap(), 1);
    /// ```
    pub fn fraig(&mut self, options: &FraigOptions) -> Result<FraigStats> {
        let mut stats = FraigStats::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(options.seed);

        let mut order = self.build_evaluation_order()?;
        let mut fec = FecGroups::new(self, &order);
        stats.sim_rounds = fec::random_sim(self, &mut fec, &mut rng, options)?;

        let mut ranks = ranks_of(&order);
        // Encoded lazily, and again after each merge
        let mut oracle: Option<EquivOracle> = None;

        while !fec.is_empty() {
            let mut next_groups = Vec::new();
            let mut cexs = Vec::new();

            for group in fec.groups() {
                let mut members: Vec<AigEdge> = group
                    .iter()
                    .copied()
                    .filter(|m| ranks.contains_key(&m.get_node_id()))
                    .collect();
                members.sort_by_key(|m| ranks[&m.get_node_id()]);
                let mut members = members.into_iter();
                let Some(mut repr) = members.next() else {
                    continue;
                };

                let mut unresolved = Vec::new();
                for member in members {
                    // Previous merges may have disconnected them
                    if !ranks.contains_key(&member.get_node_id()) {
                        continue;
                    }
                    if !ranks.contains_key(&repr.get_node_id()) {
                        unresolved.push(member);
                        continue;
                    }

                    stats.sat_calls += 1;
                    let proof = oracle
                        .get_or_insert_with(|| EquivOracle::new(self, &order))
                        .prove(repr, member)?;
                    match proof {
                        Proof::Equivalent => {
                            let complement = repr.get_complement() ^ member.get_complement();
                            let (winner, loser) =
                                if self.in_fanin_cone(repr.get_node_id(), member.get_node_id()) {
                                    (member, repr)
                                } else {
                                    (repr, member)
                                };
                            log::debug!(
                                "Fraig: {} merging {}{}...",
                                winner.get_node_id(),
                                if complement { "!" } else { "" },
                                loser.get_node_id()
                            );
                            self.replace(loser.get_node_id(), winner.get_node_id(), complement);
                            stats.merged += 1;
                            repr = winner;

                            order = self.build_evaluation_order()?;
                            ranks = ranks_of(&order);
                            oracle = None;
                        }
                        Proof::Distinct(cex) => {
                            stats.disproved += 1;
                            unresolved.push(member);
                            if options.cex_feedback {
                                cexs.push(cex);
                            }
                        }
                    }
                }
                next_groups.push(unresolved);
            }

            fec = FecGroups::from_polarized(next_groups);
            if !fec.is_empty() {
                for batch in cexs.chunks(WORD_WIDTH) {
                    let words = sim::pack_patterns(batch, self.get_inputs().len());
                    let values = sim::simulate(self, &order, &words)?;
                    fec.refine(&values);
                }
            }
            log::debug!("Fraig: {} FEC group(s) left", fec.len());
        }

        fec.clear();
        stats.simplified = self.simplify()?;

        log::info!(
            "Fraig: {} SAT call(s), {} merge(s), {} gate(s) simplified",
            stats.sat_calls,
            stats.merged,
            stats.simplified
        );
        Ok(stats)
    }
}
