#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Defines restart strategies for the CDCL search.
//!
//! The search runs in attempts. Each attempt is allowed a number of conflicts,
//! after which the solver backtracks to the root and starts the next attempt with
//! a fresh budget. A restart strategy decides how those budgets grow.
//!
//! This module provides:
//! - The `Restarter` trait, the common interface of every strategy.
//! - `Luby`: budgets follow the Luby sequence scaled by `restart_first`, with
//!   `restart_inc` as the base (`inc = 2` gives `1, 1, 2, 1, 1, 2, 4, ...`).
//! - `Geometric`: budgets grow as `restart_first * restart_inc^k`.
//! - `Restarters`: an enum over the strategies so the solver can pick one from its
//!   options at run time.

use clap::ValueEnum;
use std::fmt::{Debug, Display};

/// Trait defining the interface for restart strategies.
pub trait Restarter: Debug + Clone {
    /// Creates the strategy with the budget of the first attempt (`first`) and
    /// the growth factor (`inc`).
    fn new(first: u32, inc: f64) -> Self;

    /// Returns the conflict budget of the current attempt.
    fn conflicts_allowed(&self) -> u64;

    /// Moves on to the next attempt.
    fn restart(&mut self);

    /// Returns the number of restarts performed so far.
    fn num_restarts(&self) -> usize;
}

/// Returns the `x`-th (0-based) element of the Luby sequence with base `y`.
///
/// For `y = 2` the sequence is `1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, ...`.
#[must_use]
pub fn luby(y: f64, mut x: u32) -> f64 {
    // find the finite subsequence that contains index `x` and its size
    let mut size = 1_u32;
    let mut seq = 0_i32;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }

    while size - 1 != x {
        size = (size - 1) >> 1;
        seq -= 1;
        x %= size;
    }

    y.powi(seq)
}

/// A restart strategy based on the Luby sequence.
///
/// This sequence has the property of being optimal for repeating an experiment with
/// unknown probability distribution of success time. In SAT solvers, it means
/// restarting after `u_1*N, u_2*N, u_3*N, ...` conflicts, where `N` is `restart_first`.
#[derive(Debug, Clone, PartialEq)]
pub struct Luby {
    /// Conflicts allowed by a unit step of the sequence.
    first: f64,
    /// Base of the sequence.
    inc: f64,
    /// Total number of restarts performed.
    restarts: usize,
}

impl Restarter for Luby {
    fn new(first: u32, inc: f64) -> Self {
        Self {
            first: f64::from(first),
            inc,
            restarts: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn conflicts_allowed(&self) -> u64 {
        let x = u32::try_from(self.restarts).unwrap_or(u32::MAX - 1);
        (luby(self.inc, x) * self.first) as u64
    }

    fn restart(&mut self) {
        self.restarts = self.restarts.wrapping_add(1);
    }

    fn num_restarts(&self) -> usize {
        self.restarts
    }
}

/// A geometric restart strategy.
///
/// The sequence of budgets is `first, first*inc, first*inc*inc, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    first: f64,
    inc: f64,
    restarts: usize,
}

impl Restarter for Geometric {
    fn new(first: u32, inc: f64) -> Self {
        Self {
            first: f64::from(first),
            inc,
            restarts: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn conflicts_allowed(&self) -> u64 {
        let k = i32::try_from(self.restarts).unwrap_or(i32::MAX);
        (self.inc.powi(k) * self.first).min(u64::MAX as f64) as u64
    }

    fn restart(&mut self) {
        self.restarts = self.restarts.wrapping_add(1);
    }

    fn num_restarts(&self) -> usize {
        self.restarts
    }
}

/// Enum representing the available restart strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum RestartStrategy {
    /// Luby sequence budgets.
    #[default]
    Luby,
    /// Geometrically growing budgets.
    Geometric,
}

impl Display for RestartStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Luby => write!(f, "luby"),
            Self::Geometric => write!(f, "geometric"),
        }
    }
}

/// A restart strategy chosen at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum Restarters {
    Luby(Luby),
    Geometric(Geometric),
}

impl Restarters {
    /// Builds the strategy named by `strategy`.
    #[must_use]
    pub fn with_strategy(strategy: RestartStrategy, first: u32, inc: f64) -> Self {
        match strategy {
            RestartStrategy::Luby => Self::Luby(Luby::new(first, inc)),
            RestartStrategy::Geometric => Self::Geometric(Geometric::new(first, inc)),
        }
    }
}

impl Restarter for Restarters {
    fn new(first: u32, inc: f64) -> Self {
        Self::with_strategy(RestartStrategy::default(), first, inc)
    }

    fn conflicts_allowed(&self) -> u64 {
        match self {
            Self::Luby(r) => r.conflicts_allowed(),
            Self::Geometric(r) => r.conflicts_allowed(),
        }
    }

    fn restart(&mut self) {
        match self {
            Self::Luby(r) => r.restart(),
            Self::Geometric(r) => r.restart(),
        }
    }

    fn num_restarts(&self) -> usize {
        match self {
            Self::Luby(r) => r.num_restarts(),
            Self::Geometric(r) => r.num_restarts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budgets<R: Restarter>(r: &mut R, n: usize) -> Vec<u64> {
        (0..n)
            .map(|_| {
                let b = r.conflicts_allowed();
                r.restart();
                b
            })
            .collect()
    }

    #[test]
    fn test_luby_sequence() {
        let seq: Vec<f64> = (0..15).map(|x| luby(2.0, x)).collect();
        assert_eq!(
            seq,
            vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 8.0]
        );
    }

    #[test]
    fn test_luby_restarter() {
        let mut r = Luby::new(100, 2.0);
        assert_eq!(budgets(&mut r, 7), vec![100, 100, 200, 100, 100, 200, 400]);
        assert_eq!(r.num_restarts(), 7);
    }

    #[test]
    fn test_geometric_restarter() {
        let mut r = Geometric::new(100, 1.5);
        assert_eq!(budgets(&mut r, 4), vec![100, 150, 225, 337]);
    }

    #[test]
    fn test_runtime_choice() {
        let mut r = Restarters::with_strategy(RestartStrategy::Geometric, 10, 2.0);
        assert_eq!(budgets(&mut r, 3), vec![10, 20, 40]);
        assert_eq!(r.num_restarts(), 3);
    }
}
