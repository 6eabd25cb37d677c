#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Lbool, Lit, Var};
use crate::sat::vec::{BoolVec, VarMap};
use clap::ValueEnum;
use std::fmt::Display;

/// How much of the trail remembers its polarity when it is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum PhaseSaving {
    /// Never remember.
    None,
    /// Remember only what is undone from the deepest level.
    Limited,
    /// Remember every undone assignment.
    #[default]
    Full,
}

impl Display for PhaseSaving {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Limited => write!(f, "limited"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Saved and user-supplied polarities, one entry per variable.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SavedPhases {
    /// `true` when the next decision on the variable should be negative.
    negated: BoolVec,
    /// User preference: `True` decides positive, `False` negative.
    user: VarMap<Lbool>,
}

impl SavedPhases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the next variable. Fresh variables lean negative.
    pub fn push(&mut self, user: Lbool) {
        self.negated.push(true);
        self.user.push(user);
    }

    /// Remembers the sign of `lit` for its variable.
    pub fn save(&mut self, lit: Lit) {
        self.negated.set(lit.var().index(), lit.is_negated());
    }

    pub fn set_user(&mut self, var: Var, value: Lbool) {
        self.user[var] = value;
    }

    /// The literal to decide on for `var`: the user preference if any, else a
    /// coin flip when `coin` is given, else the saved phase.
    #[must_use]
    pub fn next_literal(&self, var: Var, coin: Option<bool>) -> Lit {
        match self.user[var].to_bool() {
            Some(positive) => Lit::new(var, !positive),
            None => Lit::new(var, coin.unwrap_or_else(|| self.negated.get(var.index()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_negative() {
        let mut phases = SavedPhases::new();
        phases.push(Lbool::Undef);
        assert_eq!(phases.next_literal(Var::new(0), None), Var::new(0).negative());
    }

    #[test]
    fn test_save() {
        let mut phases = SavedPhases::new();
        phases.push(Lbool::Undef);
        phases.push(Lbool::Undef);

        phases.save(Var::new(1).positive());
        assert_eq!(phases.next_literal(Var::new(1), None), Var::new(1).positive());
        assert_eq!(phases.next_literal(Var::new(0), None), Var::new(0).negative());
    }

    #[test]
    fn test_user_polarity_wins() {
        let mut phases = SavedPhases::new();
        phases.push(Lbool::True);
        phases.save(Var::new(0).negative());
        assert_eq!(phases.next_literal(Var::new(0), Some(true)), Var::new(0).positive());

        phases.set_user(Var::new(0), Lbool::Undef);
        assert_eq!(phases.next_literal(Var::new(0), Some(true)), Var::new(0).negative());
        assert_eq!(phases.next_literal(Var::new(0), None), Var::new(0).negative());
    }
}
