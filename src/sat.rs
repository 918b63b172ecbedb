//! SAT based equivalence checking of two nodes of an AIG.
//!
//! The solver sits behind the [`SatSolver`] trait, [`VarisatSolver`] being the default implementation.
//! [`EquivOracle`] loads the CNF of an AIG once, then answers [`EquivOracle::prove`] queries
//! incrementally: each query only adds a few clauses and solves under an assumption.

use thiserror::Error;
use varisat::ExtendFormula;

use crate::{
    Aig, AigEdge, NodeId, Result,
    cnf::{Clause, Cnf, Lit},
};

/// Error returned when the SAT solver itself failed.
#[derive(Debug, Error)]
pub enum SatError {
    #[error("sat solver failure: {0}")]
    Solver(String),

    /// The node was not part of the encoded AIG.
    #[error("node with id={0} was not encoded")]
    NotEncoded(NodeId),
}

/// An incremental SAT solver, working with DIMACS literals.
pub trait SatSolver {
    /// A fresh variable, numbered after every variable already used by the clauses.
    fn new_var(&mut self) -> Lit;

    fn add_clause(&mut self, clause: &Clause);

    /// Solves the clauses added so far, with the given literals assumed true for this call only.
    /// Returns true if satisfiable.
    fn solve_under(&mut self, assumptions: &[Lit]) -> Result<bool>;

    /// Value of a literal in the model of the last satisfiable call.
    fn value_of(&self, lit: Lit) -> Option<bool>;
}

/// [`SatSolver`] on top of [varisat](https://docs.rs/varisat).
pub struct VarisatSolver<'a> {
    solver: varisat::Solver<'a>,
    var_count: i64,
    model: Option<Vec<bool>>,
}

impl Default for VarisatSolver<'_> {
    fn default() -> Self {
        VarisatSolver::new()
    }
}

impl VarisatSolver<'_> {
    pub fn new() -> Self {
        VarisatSolver {
            solver: varisat::Solver::new(),
            var_count: 0,
            model: None,
        }
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_dimacs(lit.to_dimacs() as isize)
}

impl SatSolver for VarisatSolver<'_> {
    fn new_var(&mut self) -> Lit {
        self.var_count += 1;
        Lit::from(self.var_count)
    }

    fn add_clause(&mut self, clause: &Clause) {
        let lits: Vec<varisat::Lit> = clause.lits().iter().map(|&l| to_varisat(l)).collect();
        for lit in clause.lits() {
            self.var_count = self.var_count.max(lit.var());
        }
        self.solver.add_clause(&lits);
    }

    fn solve_under(&mut self, assumptions: &[Lit]) -> Result<bool> {
        let lits: Vec<varisat::Lit> = assumptions.iter().map(|&l| to_varisat(l)).collect();
        self.solver.assume(&lits);
        self.model = None;
        let sat = self
            .solver
            .solve()
            .map_err(|e| SatError::Solver(format!("{:?}", e)))?;
        if sat {
            // Indexed by variable, variables unknown to the solver default to false
            let mut model = vec![false; self.var_count as usize + 1];
            for lit in self.solver.model().unwrap_or_default() {
                let var = lit.to_dimacs().unsigned_abs();
                if var < model.len() {
                    model[var] = lit.is_positive();
                }
            }
            self.model = Some(model);
        }
        Ok(sat)
    }

    fn value_of(&self, lit: Lit) -> Option<bool> {
        let value = *self.model.as_ref()?.get(lit.var() as usize)?;
        Some(value != lit.is_negated())
    }
}

/// Outcome of an equivalence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    /// The two edges always carry the same value.
    Equivalent,
    /// The two edges differ for this input pattern (one bool per input, in input order).
    Distinct(Vec<bool>),
}

/// Proves (or disproves) equivalences between nodes of an AIG, see [`EquivOracle::prove`].
///
/// The oracle is tied to the AIG as it was when created: it must be created again after the AIG changed.
pub struct EquivOracle<S: SatSolver = VarisatSolver<'static>> {
    solver: S,
    cnf: Cnf,
    inputs: Vec<NodeId>,
}

impl EquivOracle {
    /// Loads the CNF of the nodes of `order` (an evaluation order of `aig`) into a [`VarisatSolver`].
    pub fn new(aig: &Aig, order: &[NodeId]) -> Self {
        EquivOracle::with_solver(aig, order, VarisatSolver::new())
    }
}

impl<S: SatSolver> EquivOracle<S> {
    /// Loads the CNF of the nodes of `order` (an evaluation order of `aig`) into the given solver.
    pub fn with_solver(aig: &Aig, order: &[NodeId], mut solver: S) -> Self {
        let cnf = Cnf::from_aig(aig, order);
        for clause in cnf.clauses() {
            solver.add_clause(clause);
        }
        EquivOracle {
            solver,
            cnf,
            inputs: aig.get_inputs().to_vec(),
        }
    }

    /// Checks whether `x` and `y` always carry the same value.
    ///
    /// A fresh variable `d = XOR(x, y)` is added, then the formula is solved under `d`:
    /// UNSAT means equivalence, otherwise the model gives a distinguishing input pattern.
    /// Inputs which are not part of the encoded AIG are reported false.
    ///
    /// ```rust
    /// use fraig::{Aig, AigEdge, sat::{EquivOracle, Proof}};
    /// let mut aig = Aig::new();
    /// aig.add_input(1).unwrap();
    /// aig.add_input(2).unwrap();
    /// // 3 = 1 & 2 and 4 = !(!1 | !2), built in a roundabout way
    /// aig.new_and(3, AigEdge::new(1, false), AigEdge::new(2, false)).unwrap();
    /// aig.new_and(5, AigEdge::new(1, true), AigEdge::new(0, true)).unwrap();
    /// aig.new_and(4, AigEdge::new(5, true), AigEdge::new(2, false)).unwrap();
    /// aig.add_output(AigEdge::new(3, false)).unwrap();
    /// aig.add_output(AigEdge::new(4, false)).unwrap();
    ///
    /// let order = aig.build_evaluation_order().unwrap();
    /// let mut oracle = EquivOracle::new(&aig, &order);
    /// let proof = oracle.prove(AigEdge::new(3, false), AigEdge::new(4, false)).unwrap();
    /// assert_eq!(proof, Proof::Equivalent);
    /// let proof = oracle.prove(AigEdge::new(3, false), AigEdge::new(1, false)).unwrap();
    /// assert_eq!(proof, Proof::Distinct(vec![true, false]));
    /// ```
    pub fn prove(&mut self, x: AigEdge, y: AigEdge) -> Result<Proof> {
        let a = self
            .cnf
            .lit(x)
            .ok_or(SatError::NotEncoded(x.get_node_id()))?;
        let b = self
            .cnf
            .lit(y)
            .ok_or(SatError::NotEncoded(y.get_node_id()))?;

        let d = self.solver.new_var();
        let mut xor = Cnf::new();
        xor.add_xor(a, b, d);
        for clause in xor.clauses() {
            self.solver.add_clause(clause);
        }

        if !self.solver.solve_under(&[d])? {
            return Ok(Proof::Equivalent);
        }

        let cex = self
            .inputs
            .iter()
            .map(|&id| {
                self.cnf
                    .lit(AigEdge::new(id, false))
                    .and_then(|l| self.solver.value_of(l))
                    .unwrap_or(false)
            })
            .collect();
        Ok(Proof::Distinct(cex))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::AigError;

    #[test]
    fn varisat_solver_test() {
        let mut solver = VarisatSolver::new();
        let a = solver.new_var();
        let b = solver.new_var();
        // a | b, !a
        solver.add_clause(&Clause::from(vec![a, b]));
        solver.add_clause(&Clause::from(vec![!a]));
        assert!(solver.solve_under(&[]).unwrap());
        assert_eq!(solver.value_of(a), Some(false));
        assert_eq!(solver.value_of(!a), Some(true));
        assert_eq!(solver.value_of(b), Some(true));

        // Assumptions only hold for one call
        assert!(!solver.solve_under(&[!b]).unwrap());
        assert_eq!(solver.value_of(a), None);
        assert!(solver.solve_under(&[b]).unwrap());
    }

    #[test]
    fn new_var_is_fresh() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&Clause::from(vec![Lit::from(3), Lit::from(-7)]));
        assert_eq!(solver.new_var(), Lit::from(8));
    }

    /// Scenario: `a & b` vs `!a & !b` are distinct, the counterexample shows it.
    #[test]
    fn distinct_nodes_give_counterexample() {
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
        let mut oracle = EquivOracle::new(&aig, &order);

        match oracle
            .prove(AigEdge::new(3, false), AigEdge::new(4, false))
            .unwrap()
        {
            Proof::Equivalent => panic!("3 and 4 are not equivalent"),
            Proof::Distinct(cex) => {
                let words: Vec<u64> = cex.iter().map(|&b| b as u64).collect();
                let outputs = aig.simulate_outputs(&words).unwrap();
                assert_ne!(outputs[0] & 1, outputs[1] & 1);
            }
        }

        // Never both true: 3 and !4 are not equivalent either, but 3 & 4 is constant false
        assert!(matches!(
            oracle
                .prove(AigEdge::new(3, false), AigEdge::new(4, true))
                .unwrap(),
            Proof::Distinct(_)
        ));
        // Queries do not interfere with each other
        assert_eq!(
            oracle
                .prove(AigEdge::new(3, true), AigEdge::new(3, true))
                .unwrap(),
            Proof::Equivalent
        );
    }

    #[test]
    fn constant_and_placeholders() {
        let mut aig = Aig::new();
        aig.add_input(1).unwrap();
        aig.declare(9).unwrap();
        aig.new_and(2, AigEdge::new(1, false), AigEdge::new(1, true))
            .unwrap();
        aig.new_and(3, AigEdge::new(9, false), AigEdge::new(1, false))
            .unwrap();
        aig.add_output(AigEdge::new(2, false)).unwrap();
        aig.add_output(AigEdge::new(3, false)).unwrap();
        let order = aig.build_evaluation_order().unwrap();
        let mut oracle = EquivOracle::new(&aig, &order);

        let zero = AigEdge::new(0, false);
        assert_eq!(
            oracle.prove(zero, AigEdge::new(2, false)).unwrap(),
            Proof::Equivalent
        );
        // Placeholders are false, like in simulation
        assert_eq!(
            oracle.prove(zero, AigEdge::new(3, false)).unwrap(),
            Proof::Equivalent
        );
        assert_eq!(
            oracle.prove(!zero, AigEdge::new(1, false)).unwrap(),
            Proof::Distinct(vec![false])
        );
        assert!(matches!(
            oracle.prove(zero, AigEdge::new(42, false)),
            Err(AigError::SatError(SatError::NotEncoded(42)))
        ));
    }
}
