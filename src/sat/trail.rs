#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::Lit;
use crate::sat::vec::PackedVec;

/// Assigned literals in assignment order, split into decision levels.
///
/// `lim[d]` is the position where level `d + 1` starts, so the current decision
/// level is `lim.len()`. `qhead` is the first literal propagation has not
/// processed yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    lits: PackedVec<Lit>,
    lim: PackedVec<u32>,
    pub qhead: usize,
}

impl Trail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Lit {
        self.lits.get(idx)
    }

    pub fn push(&mut self, lit: Lit) {
        self.lits.push(lit);
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn decision_level(&self) -> u32 {
        self.lim.len() as u32
    }

    /// Opens a new decision level at the current end of the trail.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new_decision_level(&mut self) {
        self.lim.push(self.lits.len() as u32);
    }

    /// Position where `level + 1` starts.
    #[must_use]
    pub fn level_start(&self, level: u32) -> usize {
        self.lim.get(level as usize) as usize
    }

    /// Whether the literal at `idx` was implied at the deepest level, after
    /// that level's decision.
    #[must_use]
    pub fn after_last_decision(&self, idx: usize) -> bool {
        !self.lim.is_empty() && idx > self.lim.last() as usize
    }

    /// Literals assigned from position `from` onwards, newest first.
    pub fn rev_from(&self, from: usize) -> impl Iterator<Item = Lit> + '_ {
        self.lits.iter().skip(from).rev()
    }

    /// Forgets every level above `level` and resets `qhead` to the cut.
    ///
    /// Callers unassign the dropped literals first.
    pub fn truncate_to_level(&mut self, level: u32) {
        let start = self.level_start(level);
        self.lits.shrink(self.lits.len() - start);
        self.lim.shrink(self.lim.len() - level as usize);
        self.qhead = start;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Lit> + '_ {
        self.lits.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        let mut trail = Trail::new();
        trail.push(Lit::from_dimacs(1));
        assert_eq!(trail.decision_level(), 0);

        trail.new_decision_level();
        trail.push(Lit::from_dimacs(-2));
        trail.push(Lit::from_dimacs(3));
        trail.new_decision_level();
        trail.push(Lit::from_dimacs(4));
        trail.push(Lit::from_dimacs(5));
        trail.qhead = 5;

        assert_eq!(trail.decision_level(), 2);
        assert_eq!(trail.level_start(0), 1);
        assert_eq!(trail.level_start(1), 3);
        assert!(trail.after_last_decision(4));
        assert!(!trail.after_last_decision(3));
        assert!(!trail.after_last_decision(2));
        assert_eq!(
            trail.rev_from(2).collect::<Vec<_>>(),
            vec![Lit::from_dimacs(5), Lit::from_dimacs(4), Lit::from_dimacs(3)]
        );

        trail.truncate_to_level(0);
        assert_eq!(trail.decision_level(), 0);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.qhead, 1);
    }
}
