#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::ClauseRef;
use crate::sat::literal::{Lbool, Lit, Var};
use crate::sat::vec::VarMap;

/// Why and where a variable was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VarData {
    /// The clause that forced the assignment; `None` for decisions and facts
    /// whose clause has been removed.
    pub reason: Option<ClauseRef>,
    pub level: u32,
}

/// Current truth value and [`VarData`] of every variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assignment {
    values: VarMap<Lbool>,
    data: VarMap<VarData>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the next variable, unassigned.
    pub fn push(&mut self) {
        self.values.push(Lbool::Undef);
        self.data.push(VarData::default());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn var_value(&self, var: Var) -> Lbool {
        self.values[var]
    }

    #[must_use]
    pub fn lit_value(&self, lit: Lit) -> Lbool {
        self.values[lit.var()] ^ lit.is_negated()
    }

    /// Makes `lit` true.
    pub fn assign(&mut self, lit: Lit, level: u32, reason: Option<ClauseRef>) {
        debug_assert!(self.lit_value(lit).is_undef());
        self.values[lit.var()] = Lbool::from(lit.polarity());
        self.data[lit.var()] = VarData { reason, level };
    }

    pub fn unassign(&mut self, var: Var) {
        self.values[var] = Lbool::Undef;
    }

    #[must_use]
    pub fn reason(&self, var: Var) -> Option<ClauseRef> {
        self.data[var].reason
    }

    pub fn set_reason(&mut self, var: Var, reason: Option<ClauseRef>) {
        self.data[var].reason = reason;
    }

    #[must_use]
    pub fn level(&self, var: Var) -> u32 {
        self.data[var].level
    }

    /// Per-variable values, indexed by variable.
    #[must_use]
    pub fn values(&self) -> &[Lbool] {
        self.values.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_unassign() {
        let mut a = Assignment::new();
        a.push();
        a.push();
        let x = Var::new(1);

        a.assign(x.negative(), 3, None);
        assert_eq!(a.var_value(x), Lbool::False);
        assert_eq!(a.lit_value(x.negative()), Lbool::True);
        assert_eq!(a.lit_value(x.positive()), Lbool::False);
        assert_eq!(a.level(x), 3);
        assert_eq!(a.values(), &[Lbool::Undef, Lbool::False]);

        a.unassign(x);
        assert_eq!(a.lit_value(x.positive()), Lbool::Undef);
    }
}
