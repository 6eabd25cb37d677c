//! A MiniSat-style conflict-driven clause learning SAT solver.
//!
//! The solver is incremental: clauses can be added between solve calls, and
//! each call may take assumptions. When a call fails because of its
//! assumptions, the subset responsible is reported.
//!
//! ```
//! use cdcl_sat::sat::cdcl::Cdcl;
//! use cdcl_sat::sat::solver::Solver;
//!
//! let mut solver = Cdcl::new();
//! let a = solver.new_var();
//! let b = solver.new_var();
//! solver.add_clause(&[a.positive(), b.positive()]);
//! solver.add_clause(&[a.negative()]);
//! assert!(solver.solve());
//! assert!(solver.model_value(b.positive()).is_true());
//! assert!(!solver.solve_with_assumptions(&[b.negative()]));
//! assert_eq!(solver.conflict(), &[b.positive()]);
//! ```

/// The `sat` module implements the CDCL engine, its data structures and the
/// DIMACS reader.
pub mod sat;
