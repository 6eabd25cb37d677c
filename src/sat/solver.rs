#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The incremental solver interface and its result types.

use crate::sat::literal::{Lbool, Lit, Var};
use std::fmt::Display;

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// A model was found; see [`Solver::model`].
    Satisfiable,
    /// No model exists, either at all (then [`Solver::okay`] is `false`) or
    /// under the given assumptions (then [`Solver::conflict`] explains why).
    Unsatisfiable,
    /// A budget ran out or the search was interrupted.
    Unknown,
}

impl SolveStatus {
    #[must_use]
    pub const fn is_sat(self) -> bool {
        matches!(self, Self::Satisfiable)
    }

    #[must_use]
    pub const fn is_unsat(self) -> bool {
        matches!(self, Self::Unsatisfiable)
    }
}

impl From<Lbool> for SolveStatus {
    fn from(value: Lbool) -> Self {
        match value {
            Lbool::True => Self::Satisfiable,
            Lbool::False => Self::Unsatisfiable,
            Lbool::Undef => Self::Unknown,
        }
    }
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Satisfiable => write!(f, "SATISFIABLE"),
            Self::Unsatisfiable => write!(f, "UNSATISFIABLE"),
            Self::Unknown => write!(f, "INDETERMINATE"),
        }
    }
}

/// Counters accumulated over the lifetime of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolverStats {
    pub solves: u64,
    /// Search attempts, i.e. restarts plus one per solve.
    pub starts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    /// Variables eligible for branching.
    pub dec_vars: u64,
    pub clauses_literals: u64,
    pub learnts_literals: u64,
    /// Literals in learnt clauses before minimization.
    pub max_literals: u64,
    /// Literals in learnt clauses after minimization.
    pub tot_literals: u64,
    pub garbage_collections: u64,
}

impl SolverStats {
    /// Restarts across all solves; the first search attempt of a solve is
    /// not one.
    #[must_use]
    pub const fn restarts(&self) -> u64 {
        self.starts.saturating_sub(self.solves)
    }
}

/// An incremental SAT solver.
pub trait Solver {
    /// Creates a fresh variable that is eligible for branching and has no
    /// preferred polarity.
    fn new_var(&mut self) -> Var {
        self.new_var_with(Lbool::Undef, true)
    }

    /// Creates a fresh variable with a polarity hint (`True` decides positive
    /// first, `False` negative, `Undef` follows the saved phase) and a flag
    /// telling whether the search may branch on it.
    fn new_var_with(&mut self, polarity: Lbool, decision: bool) -> Var;

    fn num_vars(&self) -> usize;

    /// Adds a clause at the root level.
    ///
    /// Returns `false` if the solver is now known to be unsatisfiable.
    fn add_clause(&mut self, lits: &[Lit]) -> bool;

    /// Solves under `assumptions`, honouring any budget and interrupt request.
    fn solve_limited(&mut self, assumptions: &[Lit]) -> SolveStatus;

    /// Solves without assumptions.
    fn solve(&mut self) -> bool {
        self.solve_with_assumptions(&[])
    }

    fn solve_with_assumptions(&mut self, assumptions: &[Lit]) -> bool {
        self.solve_limited(assumptions) == SolveStatus::Satisfiable
    }

    /// Per-variable values of the last model. Empty unless the last solve was
    /// satisfiable.
    fn model(&self) -> &[Lbool];

    /// Negations of the assumptions responsible for the last unsatisfiable
    /// result. Empty when the formula itself is unsatisfiable.
    fn conflict(&self) -> &[Lit];

    /// `false` once the clauses are known to be unsatisfiable.
    fn okay(&self) -> bool;

    fn stats(&self) -> &SolverStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_lbool() {
        assert_eq!(SolveStatus::from(Lbool::True), SolveStatus::Satisfiable);
        assert_eq!(SolveStatus::from(Lbool::False), SolveStatus::Unsatisfiable);
        assert_eq!(SolveStatus::from(Lbool::Undef), SolveStatus::Unknown);
        assert_eq!(SolveStatus::Unsatisfiable.to_string(), "UNSATISFIABLE");
    }

    #[test]
    fn test_restarts_leave_out_first_attempts() {
        let stats = SolverStats {
            solves: 2,
            starts: 7,
            ..SolverStats::default()
        };
        assert_eq!(stats.restarts(), 5);
        assert_eq!(SolverStats::default().restarts(), 0);
    }
}
