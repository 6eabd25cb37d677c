#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Tuning knobs of the solver.
//!
//! [`SolverOptions::default`] gives the classic MiniSat settings. Options coming
//! from outside (the command line, a caller) should go through
//! [`SolverOptions::validate`] before a solver is built with them.

use crate::sat::phase_saving::PhaseSaving;
use crate::sat::restarter::RestartStrategy;
use clap::ValueEnum;
use std::fmt::Display;
use thiserror::Error;

/// Conflict clause minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum CcMinMode {
    /// Keep the 1st-UIP clause as is.
    None,
    /// Drop literals whose reason is already covered by the clause.
    Basic,
    /// Drop literals that are implied through chains of reasons.
    #[default]
    Deep,
}

impl Display for CcMinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Basic => write!(f, "basic"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("option `{name}` is {value}, expected a value in {range}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Variable activity decay factor.
    pub var_decay: f64,
    /// Clause activity decay factor.
    pub clause_decay: f64,
    /// Probability of branching on a random variable.
    pub random_var_freq: f64,
    /// Seed of the solver's random number generator.
    pub random_seed: u64,
    pub ccmin_mode: CcMinMode,
    pub phase_saving: PhaseSaving,
    /// Start with small random variable activities.
    pub rnd_init_act: bool,
    /// Pick decision polarities at random.
    pub rnd_pol: bool,
    pub restart_strategy: RestartStrategy,
    /// Conflicts allowed in the first search attempt.
    pub restart_first: u32,
    /// Growth factor of the restart budget.
    pub restart_inc: f64,
    /// Fraction of wasted clause memory that triggers a collection.
    pub garbage_frac: f64,
    /// Lower bound on the learnt clause limit.
    pub min_learnts_lim: u32,
    /// Initial learnt clause limit as a fraction of the original clauses.
    pub learntsize_factor: f64,
    /// Growth factor of the learnt clause limit.
    pub learntsize_inc: f64,
    /// Conflicts before the first growth of the learnt clause limit.
    pub learntsize_adjust_start_confl: u32,
    /// Growth factor of the interval between limit adjustments.
    pub learntsize_adjust_inc: f64,
    /// Also drop satisfied original clauses when simplifying.
    pub remove_satisfied: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91_648_253,
            ccmin_mode: CcMinMode::Deep,
            phase_saving: PhaseSaving::Full,
            rnd_init_act: false,
            rnd_pol: false,
            restart_strategy: RestartStrategy::Luby,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,
            remove_satisfied: true,
        }
    }
}

fn check(
    name: &'static str,
    value: f64,
    range: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, range })
    }
}

impl SolverOptions {
    /// Whether restarts follow the Luby sequence.
    #[must_use]
    pub fn luby_restart(&self) -> bool {
        self.restart_strategy == RestartStrategy::Luby
    }

    /// Checks every numeric option against its admissible range.
    ///
    /// # Errors
    ///
    /// Returns the first option found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("var-decay", self.var_decay, "(0, 1)", |v| v > 0.0 && v < 1.0)?;
        check("cla-decay", self.clause_decay, "(0, 1)", |v| v > 0.0 && v < 1.0)?;
        check("rnd-freq", self.random_var_freq, "[0, 1]", |v| (0.0..=1.0).contains(&v))?;
        check("rfirst", f64::from(self.restart_first), "[1, inf)", |v| v >= 1.0)?;
        check("rinc", self.restart_inc, "(1, inf)", |v| v > 1.0 && v.is_finite())?;
        check("gc-frac", self.garbage_frac, "(0, inf)", |v| v > 0.0 && v.is_finite())?;
        check("learntsize-factor", self.learntsize_factor, "(0, inf)", |v| v > 0.0)?;
        check("learntsize-inc", self.learntsize_inc, "[1, inf)", |v| v >= 1.0)?;
        check("learntsize-adjust-inc", self.learntsize_adjust_inc, "[1, inf)", |v| v >= 1.0)?;
        check(
            "learntsize-adjust-start",
            f64::from(self.learntsize_adjust_start_confl),
            "[1, inf)",
            |v| v >= 1.0,
        )?;
        Ok(())
    }
}
