//! Functionally equivalent candidate (FEC) groups.
//!
//! Nodes which have always been simulated to the same word (or to complementary words) so far
//! are candidates for equivalence, and are kept together in a group. More simulation can only
//! split the groups, never merge them: see [`FecGroups::refine`].

use std::{collections::HashMap, io::BufRead, io::Write};

use rand::RngCore;

use crate::{
    Aig, AigEdge, NodeId, Result,
    fraig::FraigOptions,
    sim::{self, SimError, SimValues, WORD_WIDTH},
};

/// Disjoint groups of candidate nodes, each with at least 2 members.
///
/// A member is an [`AigEdge`]: its polarity tells whether the node was simulated to the group
/// word or to its complement. Two members `x` and `y` of a group are candidates for
/// `x ^ x.complement == y ^ y.complement`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FecGroups {
    groups: Vec<Vec<AigEdge>>,
    /// Set once the member polarities come from simulation, see [`FecGroups::refine`].
    polarized: bool,
}

impl FecGroups {
    /// A single group with the constant node and every and gate of `order`,
    /// which is supposed to be an evaluation order of `aig`.
    pub fn new(aig: &Aig, order: &[NodeId]) -> Self {
        let mut members = vec![AigEdge::new(0, false)];
        members.extend(
            order
                .iter()
                .filter(|&&id| aig.node(id).is_and())
                .map(|&id| AigEdge::new(id, false)),
        );
        FecGroups::from_groups(vec![members], false)
    }

    fn from_groups(groups: Vec<Vec<AigEdge>>, polarized: bool) -> Self {
        FecGroups {
            groups: groups.into_iter().filter(|g| g.len() >= 2).collect(),
            polarized,
        }
    }

    /// Groups whose member polarities were already set by a previous simulation.
    /// Groups with less than 2 members are dropped.
    pub(crate) fn from_polarized(groups: Vec<Vec<AigEdge>>) -> Self {
        FecGroups::from_groups(groups, true)
    }

    pub fn groups(&self) -> &[Vec<AigEdge>] {
        &self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of nodes over all groups.
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Splits each group according to the simulation values of its members.
    ///
    /// On the first refinement, members are keyed by the canonical word `min(w, !w)`, and
    /// recorded with a complemented polarity when their word is `!key`. Afterwards the polarity
    /// of a member is fixed: its word is complemented accordingly, and members are keyed by the
    /// exact result, so that a pair found complementary once and equal later is split.
    /// Members which were not simulated (not reachable anymore) and singletons are dropped.
    ///
    /// Returns whether the partition changed.
    pub fn refine(&mut self, values: &SimValues) -> bool {
        let before = (self.len(), self.member_count());
        let polarized = self.polarized;

        let mut refined = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut index: HashMap<u64, usize> = HashMap::new();
            let mut parts: Vec<Vec<AigEdge>> = Vec::new();
            for member in group {
                let Some(word) = values.get(member.get_node_id()) else {
                    continue;
                };
                let (key, complement) = if polarized {
                    let word = if member.get_complement() { !word } else { word };
                    (word, member.get_complement())
                } else {
                    let key = word.min(!word);
                    (key, word != key)
                };
                let i = *index.entry(key).or_insert_with(|| {
                    parts.push(Vec::new());
                    parts.len() - 1
                });
                parts[i].push(AigEdge::new(member.get_node_id(), complement));
            }
            refined.extend(parts.into_iter().filter(|p| p.len() >= 2));
        }
        self.groups = refined;
        self.polarized = true;

        before != (self.len(), self.member_count())
    }
}

/// Refines `fec` with random patterns until it stops changing.
///
/// Stops once the partition did not change for more than
/// `max(1, log2(nodes)) * options.stable_rounds_per_log2` consecutive rounds, or once no group is left.
/// Returns the number of rounds, each of them simulating 64 patterns.
pub fn random_sim(
    aig: &Aig,
    fec: &mut FecGroups,
    rng: &mut impl RngCore,
    options: &FraigOptions,
) -> Result<usize> {
    let order = aig.build_evaluation_order()?;
    let log2 = order.len().max(2).ilog2() as usize;
    let limit = log2.max(1) * options.stable_rounds_per_log2;

    let mut rounds = 0;
    let mut stable = 0;
    while stable <= limit && !fec.is_empty() {
        let words = sim::random_words(aig, rng);
        let values = sim::simulate(aig, &order, &words)?;
        if fec.refine(&values) {
            stable = 0;
        } else {
            stable += 1;
        }
        rounds += 1;
    }

    log::info!(
        "{} patterns simulated, {} FEC group(s) left",
        rounds * WORD_WIDTH,
        fec.len()
    );
    Ok(rounds)
}

/// Refines `fec` with the patterns read from `reader`, see [`sim::parse_patterns`].
///
/// The whole file is validated first: on error, nothing is simulated and `fec` is untouched.
/// If a `sim_log` is given, each pattern is written there followed by a space and the output bits.
/// Returns the number of patterns.
pub fn file_sim(
    aig: &Aig,
    fec: &mut FecGroups,
    reader: impl BufRead,
    mut sim_log: Option<&mut dyn Write>,
) -> Result<usize> {
    let width = aig.get_inputs().len();
    let patterns = sim::parse_patterns(reader, width)?;
    let order = aig.build_evaluation_order()?;

    for batch in patterns.chunks(WORD_WIDTH) {
        let words = sim::pack_patterns(batch, width);
        let values = sim::simulate(aig, &order, &words)?;
        fec.refine(&values);

        if let Some(sim_log) = sim_log.as_mut() {
            for (k, pattern) in batch.iter().enumerate() {
                let inputs: String = pattern.iter().map(|&b| if b { '1' } else { '0' }).collect();
                let outputs: String = aig
                    .get_outputs()
                    .iter()
                    .map(|&id| {
                        if values.get(id).unwrap_or(0) >> k & 1 == 1 {
                            '1'
                        } else {
                            '0'
                        }
                    })
                    .collect();
                writeln!(sim_log, "{} {}", inputs, outputs)
                    .map_err(|e| SimError::IoError(e.to_string()))?;
            }
        }
    }

    log::info!(
        "{} patterns simulated, {} FEC group(s) left",
        patterns.len(),
        fec.len()
    );
    Ok(patterns.len())
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;
    use crate::AigError;

    /// ```text
    /// 3 = 1 & 2
    /// 4 = 2 & 1     (same as 3)
    /// 5 = !1 & !2
    /// 6 = !5 & !3   (1 xor 2)
    /// 7 = !3 & !5   (same as 6)
    /// ```
    fn sample() -> Aig {
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.add_input(2).unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false))
            .unwrap();
        aig.new_and(4, AigEdge::new(2, false), AigEdge::new(1, false))
            .unwrap();
        aig.new_and(5, AigEdge::new(1, true), AigEdge::new(2, true))
            .unwrap();
        aig.new_and(6, AigEdge::new(5, true), AigEdge::new(3, true))
            .unwrap();
        aig.new_and(7, AigEdge::new(3, true), AigEdge::new(5, true))
            .unwrap();
        aig.add_output(AigEdge::new(4, false)).unwrap();
        aig.add_output(AigEdge::new(6, false)).unwrap();
        aig.add_output(AigEdge::new(7, true)).unwrap();
        aig
    }

    fn as_sets(fec: &FecGroups) -> Vec<HashSet<AigEdge>> {
        fec.groups()
            .iter()
            .map(|g| g.iter().copied().collect())
            .collect()
    }

    #[test]
    fn initial_group() {
        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let fec = FecGroups::new(&aig, &order);
        assert_eq!(fec.len(), 1);
        assert_eq!(fec.member_count(), 6);
        assert_eq!(fec.groups()[0][0], AigEdge::new(0, false));
    }

    #[test]
    fn refine_is_a_refinement() {
        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);

        // a = 0011, b = 0101: every combination
        let values = sim::simulate(&aig, &order, &[0b0011, 0b0101]).unwrap();
        assert!(fec.refine(&values));
        let groups = as_sets(&fec);
        assert_eq!(groups.len(), 2);
        // 3 and 4 (and), 6 and 7 (xor), 5 (nor) alone, constant alone
        assert!(groups.contains(&HashSet::from([AigEdge::new(3, false), AigEdge::new(4, false)])));
        assert!(groups.contains(&HashSet::from([AigEdge::new(6, false), AigEdge::new(7, false)])));

        // Same values again: nothing changes
        assert!(!fec.refine(&values));
        assert_eq!(as_sets(&fec), groups);
    }

    #[test]
    fn complemented_members() {
        // 3 = 1 & 2 and 4 = !(1 & 2) through a double gate
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.add_input(2).unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false))
            .unwrap();
        aig.new_and(4, AigEdge::new(3, true), AigEdge::new(0, true))
            .unwrap();
        aig.add_output(AigEdge::new(4, false)).unwrap();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);

        let values = sim::simulate(&aig, &order, &[0b0011, 0b0101]).unwrap();
        fec.refine(&values);
        assert_eq!(fec.len(), 1);
        let group = &fec.groups()[0];
        assert_eq!(group.len(), 2);
        // Exactly one of them is recorded complemented
        assert_ne!(group[0].get_complement(), group[1].get_complement());
    }

    #[test]
    fn constant_group_tracks_complement() {
        // 3 = 1 & !1 is constant false, 4 = !(1 & !1) & !0 is constant true
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(1, true))
            .unwrap();
        aig.new_and(4, AigEdge::new(3, true), AigEdge::new(0, true))
            .unwrap();
        aig.add_output(AigEdge::new(4, false)).unwrap();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        random_sim(&aig, &mut fec, &mut rng, &FraigOptions::default()).unwrap();
        assert_eq!(
            as_sets(&fec),
            vec![HashSet::from([
                AigEdge::new(0, false),
                AigEdge::new(3, false),
                AigEdge::new(4, true)
            ])]
        );
    }

    #[test]
    fn recorded_polarity_is_kept() {
        // 3 = 1 & 2 and 4 = !1 & !2
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.add_input(2).unwrap();
        aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false))
            .unwrap();
        aig.new_and(4, AigEdge::new(1, true), AigEdge::new(2, true))
            .unwrap();
        aig.add_output(AigEdge::new(3, false)).unwrap();
        aig.add_output(AigEdge::new(4, false)).unwrap();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);

        // 1 = 2: the two gates are complementary
        let w = 0xF0F0_F0F0_F0F0_F0F0;
        let values = sim::simulate(&aig, &order, &[w, w]).unwrap();
        assert!(fec.refine(&values));
        assert_eq!(
            as_sets(&fec),
            vec![HashSet::from([AigEdge::new(3, true), AigEdge::new(4, false)])]
        );

        // 1 = !2: both are false, which contradicts the recorded complement
        let values = sim::simulate(&aig, &order, &[u64::MAX, 0]).unwrap();
        assert_eq!(values.get(3), values.get(4));
        assert!(fec.refine(&values));
        assert!(fec.is_empty());
    }

    #[test]
    fn unreachable_members_are_dropped() {
        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);
        let mut values = sim::SimValues::default();
        assert!(values.is_empty());
        // Nothing simulated: every member is dropped
        assert!(fec.refine(&values));
        assert!(fec.is_empty());

        values = sim::simulate(&aig, &order, &[0, 0]).unwrap();
        assert!(!fec.refine(&values));
    }

    #[test]
    fn random_sim_separates_distinct_nodes() {
        let _ = env_logger::builder().is_test(true).try_init();

        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let rounds = random_sim(&aig, &mut fec, &mut rng, &FraigOptions::default()).unwrap();
        assert!(rounds > 0);
        // Polarities depend on the drawn words, the node grouping does not
        let nodes: Vec<HashSet<NodeId>> = fec
            .groups()
            .iter()
            .map(|g| g.iter().map(|m| m.get_node_id()).collect())
            .collect();
        assert_eq!(nodes, vec![HashSet::from([3, 4]), HashSet::from([6, 7])]);
        for group in fec.groups() {
            assert_eq!(group[0].get_complement(), group[1].get_complement());
        }
    }

    #[test]
    fn file_sim_test() {
        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);

        let mut log = Vec::new();
        let n = file_sim(&aig, &mut fec, "00\n01\n\n10\n11\n".as_bytes(), Some(&mut log)).unwrap();
        assert_eq!(n, 4);
        assert_eq!(fec.len(), 2);
        // Outputs: 1 & 2, 1 ^ 2, !(1 ^ 2)
        assert_eq!(
            String::from_utf8(log).unwrap(),
            "00 001\n01 010\n10 010\n11 101\n"
        );
    }

    #[test]
    fn file_sim_rejects_bad_files_untouched() {
        let aig = sample();
        let order = aig.build_evaluation_order().unwrap();
        let mut fec = FecGroups::new(&aig, &order);
        let initial = fec.clone();

        assert!(matches!(
            file_sim(&aig, &mut fec, "00\n01\n101\n".as_bytes(), None),
            Err(AigError::SimError(SimError::PatternWidth { line: 3, .. }))
        ));
        assert_eq!(fec, initial);
        assert!(matches!(
            file_sim(&aig, &mut fec, "00\n0a\n".as_bytes(), None),
            Err(AigError::SimError(SimError::InvalidPatternChar { .. }))
        ));
        assert_eq!(fec, initial);
    }
}
