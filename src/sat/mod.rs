#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod cdcl;
pub mod clause;
pub mod clause_management;
pub mod config;
pub mod conflict_analysis;
pub mod dimacs;
pub mod heap;
pub mod literal;
pub mod phase_saving;
pub mod propagation;
pub mod restarter;
pub mod solver;
pub mod trail;
pub mod variable_selection;
pub mod vec;
pub mod watch;
