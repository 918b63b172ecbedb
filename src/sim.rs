//! Bit-parallel simulation: 64 input patterns are evaluated at once, one per bit of a `u64` word.
//!
//! Also provides the parsing of pattern files (one pattern of `0`/`1` per line, one char per input).

use std::{collections::HashMap, io::BufRead};

use rand::RngCore;
use thiserror::Error;

use crate::{Aig, AigEdge, NodeId, NodeKind, Result};

/// Number of patterns simulated at once.
pub const WORD_WIDTH: usize = u64::BITS as usize;

/// Error returned when simulation inputs are invalid.
#[derive(Debug, Error)]
pub enum SimError {
    /// One word per input is required.
    #[error("expected {expected} input words, got {got}")]
    InputCount { expected: usize, got: usize },

    /// A pattern line does not have one bit per input.
    #[error("pattern {line}: expected {expected} bits, got {got}")]
    PatternWidth {
        line: usize,
        expected: usize,
        got: usize,
    },

    /// A pattern line contains something else than `0` and `1`.
    #[error("pattern {line}: invalid character {found:?}")]
    InvalidPatternChar { line: usize, found: char },

    /// Reading patterns or writing the simulation log failed.
    #[error("io error: {0}")]
    IoError(String),
}

/// Simulation values of the nodes, one word per node.
#[derive(Debug, Clone, Default)]
pub struct SimValues {
    values: HashMap<NodeId, u64>,
}

impl SimValues {
    /// Word of a simulated node, None if it was not part of the simulation.
    pub fn get(&self, id: NodeId) -> Option<u64> {
        self.values.get(&id).copied()
    }

    /// Word carried by an edge, ie the word of its node complemented by its polarity.
    /// Nodes which were not simulated (placeholders) are constant false.
    pub fn edge_value(&self, edge: AigEdge) -> u64 {
        let word = self.get(edge.get_node_id()).unwrap_or(0);
        if edge.get_complement() { !word } else { word }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Simulates the nodes of `order` (which must be an evaluation order of `aig`)
/// with one word per input, given in input order.
///
/// The constant node and [`NodeKind::Undefined`] placeholders evaluate to 0.
pub fn simulate(aig: &Aig, order: &[NodeId], inputs: &[u64]) -> Result<SimValues> {
    let expected = aig.get_inputs().len();
    if inputs.len() != expected {
        return Err(SimError::InputCount {
            expected,
            got: inputs.len(),
        }
        .into());
    }

    let mut sim = SimValues {
        values: HashMap::with_capacity(order.len() + 1),
    };
    sim.values.insert(0, 0);
    for &id in order {
        let word = match aig.node(id).get_kind() {
            NodeKind::False | NodeKind::Undefined => 0,
            NodeKind::Input { position, .. } => inputs[*position],
            NodeKind::And { fanin0, fanin1 } => sim.edge_value(*fanin0) & sim.edge_value(*fanin1),
            NodeKind::Output { fanin, .. } => sim.edge_value(*fanin),
        };
        sim.values.insert(id, word);
    }
    Ok(sim)
}

/// One random word per input.
pub fn random_words(aig: &Aig, rng: &mut impl RngCore) -> Vec<u64> {
    (0..aig.get_inputs().len()).map(|_| rng.next_u64()).collect()
}

/// Reads patterns, one per non blank line, each with exactly `width` chars among `0` and `1`.
///
/// All the lines are validated before returning, so that nothing is simulated from a bad file.
pub fn parse_patterns(reader: impl BufRead, width: usize) -> Result<Vec<Vec<bool>>> {
    let mut patterns = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SimError::IoError(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let got = line.chars().count();
        if got != width {
            return Err(SimError::PatternWidth {
                line: i + 1,
                expected: width,
                got,
            }
            .into());
        }
        let pattern = line
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(SimError::InvalidPatternChar { line: i + 1, found }),
            })
            .collect::<std::result::Result<Vec<bool>, SimError>>()?;
        patterns.push(pattern);
    }
    Ok(patterns)
}

/// Packs up to 64 patterns into one word per input: pattern `k` is bit `k`.
pub fn pack_patterns(patterns: &[Vec<bool>], width: usize) -> Vec<u64> {
    debug_assert!(patterns.len() <= WORD_WIDTH);
    let mut words = vec![0; width];
    for (k, pattern) in patterns.iter().enumerate() {
        for (word, &bit) in words.iter_mut().zip(pattern) {
            if bit {
                *word |= 1 << k;
            }
        }
    }
    words
}

impl Aig {
    /// Simulates the whole AIG and returns one word per output, in output order.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.add_input(2).unwrap();
    /// aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, true)).unwrap();
    /// aig.add_output(AigEdge::new(3, false)).unwrap();
    /// assert_eq!(aig.simulate_outputs(&[0b1100, 0b1010]).unwrap(), vec![0b0100]);
    /// ```
    pub fn simulate_outputs(&self, inputs: &[u64]) -> Result<Vec<u64>> {
        let order = self.build_evaluation_order()?;
        let values = simulate(self, &order, inputs)?;
        Ok(self
            .get_outputs()
            .iter()
            .map(|&id| values.get(id).unwrap_or(0))
            .collect())
    }
}
