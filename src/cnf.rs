//! Tseitin encoding of an AIG as a SAT formula in conjunctive normal form.
//!
//! To prove that two nodes `x` and `y` are equivalent:
//! - encode the AIG with [`Cnf::from_aig`]
//! - add a fresh variable `d` with `d = XOR(x, y)`, see [`Cnf::add_xor`]
//! - check that the formula is **UNSAT** under the assumption `d`.
//!
//! This is implemented by [`EquivOracle`] on top of a [`SatSolver`].
//!
//! [`EquivOracle`]: crate::sat::EquivOracle
//! [`SatSolver`]: crate::sat::SatSolver

use std::{collections::HashMap, ops::Not};

use crate::{Aig, AigEdge, NodeId, NodeKind};

/// A SAT literal, in DIMACS convention: a non null variable index, negative when negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit(i64);

impl Lit {
    /// Index of the variable of the literal, starting at 1.
    pub fn var(&self) -> i64 {
        self.0.abs()
    }

    pub fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub fn to_dimacs(&self) -> i64 {
        self.0
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl From<i64> for Lit {
    fn from(value: i64) -> Self {
        if value == 0 {
            panic!("Tried to create a Lit from 0. 0 is not a valid literal in DIMACS format.");
        }
        Lit(value)
    }
}

/// A SAT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(Vec<Lit>);

impl Clause {
    pub fn lits(&self) -> &[Lit] {
        &self.0
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

/// A SAT CNF that can be passed to a SAT solver, along with the mapping from AIG nodes to variables.
///
/// Every node gets its own variable, including the constant node and the placeholders,
/// which are both forced to false by a unit clause (placeholders are simulated as false too).
/// Outputs do not get a variable, use their fanin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    clauses: Vec<Clause>,
    vars: HashMap<NodeId, Lit>,
    var_count: i64,
}

impl Cnf {
    /// A new empty CNF.
    pub fn new() -> Self {
        Cnf::default()
    }

    /// Encodes the nodes of `order`, which must be an evaluation order of `aig`.
    ///
    /// Each and gate `v = a & b` adds the 3 clauses `(!v | a)`, `(!v | b)` and `(v | !a | !b)`.
    pub fn from_aig(aig: &Aig, order: &[NodeId]) -> Self {
        let mut cnf = Cnf::new();
        let cst = cnf.var_of(0);
        cnf.add_clause(Clause::from(vec![!cst]));

        for &id in order {
            match aig.node(id).get_kind() {
                NodeKind::Input { .. } => {
                    cnf.var_of(id);
                }
                NodeKind::And { fanin0, fanin1 } => {
                    for fanin in [fanin0, fanin1] {
                        if aig.node(fanin.get_node_id()).is_undefined()
                            && !cnf.vars.contains_key(&fanin.get_node_id())
                        {
                            let v = cnf.var_of(fanin.get_node_id());
                            cnf.add_clause(Clause::from(vec![!v]));
                        }
                    }
                    let a = cnf.lit_of_known(*fanin0);
                    let b = cnf.lit_of_known(*fanin1);
                    let v = cnf.var_of(id);
                    cnf.add_and(a, b, v);
                }
                NodeKind::False | NodeKind::Output { .. } | NodeKind::Undefined => (),
            }
        }
        cnf
    }

    /// A fresh variable, numbered after every variable of the CNF.
    pub fn new_var(&mut self) -> Lit {
        self.var_count += 1;
        Lit(self.var_count)
    }

    /// The variable of a node, allocating it if needed.
    fn var_of(&mut self, id: NodeId) -> Lit {
        if let Some(&v) = self.vars.get(&id) {
            return v;
        }
        let v = self.new_var();
        self.vars.insert(id, v);
        v
    }

    fn lit_of_known(&self, edge: AigEdge) -> Lit {
        match self.lit(edge) {
            Some(l) => l,
            None => panic!(
                "node {} is used before being encoded, the order is not topological",
                edge.get_node_id()
            ),
        }
    }

    /// The literal of an edge, if its node was encoded.
    pub fn lit(&self, edge: AigEdge) -> Option<Lit> {
        self.vars
            .get(&edge.get_node_id())
            .map(|&v| if edge.get_complement() { !v } else { v })
    }

    /// Number of variables used so far.
    pub fn var_count(&self) -> i64 {
        self.var_count
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Add the given clause to the CNF.
    pub fn add_clause(&mut self, clause: Clause) {
        for lit in clause.lits() {
            self.var_count = self.var_count.max(lit.var());
        }
        self.clauses.push(clause);
    }

    /// Add clauses that encode `z = AND(a, b)`.
    pub fn add_and(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add_clause(Clause::from(vec![!z, a]));
        self.add_clause(Clause::from(vec![!z, b]));
        self.add_clause(Clause::from(vec![z, !a, !b]));
    }

    /// Add clauses that encode `z = XOR(a, b)`.
    ///
    /// - a is the literal associated with the first node to compare
    /// - b is the literal associated with the second one
    /// - z is a fresh literal, true iff they differ.
    pub fn add_xor(&mut self, a: Lit, b: Lit, z: Lit) {
        self.add_clause(Clause::from(vec![a, b, !z]));
        self.add_clause(Clause::from(vec![a, !b, z]));
        self.add_clause(Clause::from(vec![!a, b, z]));
        self.add_clause(Clause::from(vec![!a, !b, !z]));
    }
}
