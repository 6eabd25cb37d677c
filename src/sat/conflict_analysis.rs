#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::cdcl::Cdcl;
use crate::sat::clause::ClauseRef;
use crate::sat::config::CcMinMode;
use crate::sat::literal::{Lit, Var};

impl Cdcl {
    /// A bit standing for the decision level of `var` in a 32-bit level set.
    fn abstract_level(&self, var: Var) -> u32 {
        1 << (self.assigns.level(var) & 31)
    }

    /// Learns a clause from the conflict `confl`.
    ///
    /// `learnt` is overwritten with the 1st-UIP clause: its first literal is the
    /// asserting one and, if there are more, the second has the highest level
    /// among the rest. Returns the level to backtrack to.
    pub(crate) fn analyze(&mut self, mut confl: ClauseRef, learnt: &mut Vec<Lit>) -> u32 {
        let level = self.trail.decision_level();
        let mut path_c = 0_u32;
        let mut p = Lit::UNDEF;
        let mut index = self.trail.len();

        learnt.clear();
        // slot for the asserting literal
        learnt.push(Lit::UNDEF);

        loop {
            if self.ca[confl].is_learnt() {
                self.cla_bump_activity(confl);
            }

            let start = usize::from(p != Lit::UNDEF);
            for j in start..self.ca[confl].len() {
                let q = self.ca[confl][j];
                let var = q.var();
                if !self.seen.get(var.index()) && self.assigns.level(var) > 0 {
                    self.var_bump_activity(var);
                    self.seen.set(var.index(), true);
                    if self.assigns.level(var) >= level {
                        path_c += 1;
                    } else {
                        learnt.push(q);
                    }
                }
            }

            // next literal of the current level to resolve on
            loop {
                index -= 1;
                if self.seen.get(self.trail.get(index).var().index()) {
                    break;
                }
            }
            p = self.trail.get(index);
            self.seen.set(p.var().index(), false);
            path_c -= 1;
            if path_c == 0 {
                break;
            }
            confl = self
                .assigns
                .reason(p.var())
                .expect("implied literal above the root has a reason");
        }
        learnt[0] = !p;

        self.analyze_toclear.clear();
        self.analyze_toclear.extend(learnt.iter().copied());
        let before = learnt.len();
        match self.opts.ccmin_mode {
            CcMinMode::Deep => {
                let levels = learnt[1..]
                    .iter()
                    .fold(0, |acc, &lit| acc | self.abstract_level(lit.var()));
                let mut j = 1;
                for i in 1..learnt.len() {
                    let lit = learnt[i];
                    if self.assigns.reason(lit.var()).is_none() || !self.lit_redundant(lit, levels) {
                        learnt[j] = lit;
                        j += 1;
                    }
                }
                learnt.truncate(j);
            }
            CcMinMode::Basic => {
                let mut j = 1;
                for i in 1..learnt.len() {
                    let lit = learnt[i];
                    let keep = self.assigns.reason(lit.var()).is_none_or(|r| {
                        self.ca[r].lits()[1..].iter().any(|&q| {
                            !self.seen.get(q.var().index()) && self.assigns.level(q.var()) > 0
                        })
                    });
                    if keep {
                        learnt[j] = lit;
                        j += 1;
                    }
                }
                learnt.truncate(j);
            }
            CcMinMode::None => {}
        }
        self.stats.max_literals += before as u64;
        self.stats.tot_literals += learnt.len() as u64;

        let backtrack_level = if learnt.len() == 1 {
            0
        } else {
            let max_i = (1..learnt.len())
                .max_by_key(|&i| (self.assigns.level(learnt[i].var()), std::cmp::Reverse(i)))
                .unwrap_or(1);
            learnt.swap(1, max_i);
            self.assigns.level(learnt[1].var())
        };

        for lit in self.analyze_toclear.iter() {
            self.seen.set(lit.var().index(), false);
        }
        backtrack_level
    }

    /// Whether `p` follows from the other literals of the learnt clause, which
    /// are the ones marked in `seen`.
    ///
    /// `levels` is the abstraction of the levels in the clause; a literal from
    /// any other level cannot be part of the implication.
    fn lit_redundant(&mut self, p: Lit, levels: u32) -> bool {
        self.analyze_stack.clear();
        self.analyze_stack.push(p);
        let top = self.analyze_toclear.len();

        while !self.analyze_stack.is_empty() {
            let q = self.analyze_stack.pop();
            let Some(cr) = self.assigns.reason(q.var()) else {
                unreachable!("only implied literals are expanded");
            };

            for k in 1..self.ca[cr].len() {
                let lit = self.ca[cr][k];
                let var = lit.var();
                if self.seen.get(var.index()) || self.assigns.level(var) == 0 {
                    continue;
                }
                if self.assigns.reason(var).is_some() && self.abstract_level(var) & levels != 0 {
                    self.seen.set(var.index(), true);
                    self.analyze_stack.push(lit);
                    self.analyze_toclear.push(lit);
                } else {
                    for idx in top..self.analyze_toclear.len() {
                        let marked = self.analyze_toclear.get(idx);
                        self.seen.set(marked.var().index(), false);
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }
        true
    }

    /// Collects the assumptions behind `p` being false into `conflict`.
    ///
    /// The result holds `p` followed by the negations of the decisions (which
    /// are all assumptions at this point) that `!p` was propagated from.
    pub(crate) fn analyze_final(&mut self, p: Lit) {
        self.conflict.clear();
        self.conflict.push(p);
        if self.trail.decision_level() == 0 {
            return;
        }

        self.seen.set(p.var().index(), true);
        for lit in self.trail.rev_from(self.trail.level_start(0)) {
            let var = lit.var();
            if !self.seen.get(var.index()) {
                continue;
            }
            match self.assigns.reason(var) {
                None => {
                    debug_assert!(self.assigns.level(var) > 0);
                    self.conflict.push(!lit);
                }
                Some(cr) => {
                    for &q in &self.ca[cr].lits()[1..] {
                        if self.assigns.level(q.var()) > 0 {
                            self.seen.set(q.var().index(), true);
                        }
                    }
                }
            }
            self.seen.set(var.index(), false);
        }
        self.seen.set(p.var().index(), false);
    }
}

#[cfg(test)]
mod tests {
    use crate::sat::cdcl::Cdcl;
    use crate::sat::config::{CcMinMode, SolverOptions};
    use crate::sat::literal::Lit;
    use crate::sat::solver::Solver;

    fn lit(l: i32) -> Lit {
        Lit::from_dimacs(l)
    }

    fn setup(mode: CcMinMode, num_vars: usize, clauses: &[&[i32]]) -> Cdcl {
        let opts = SolverOptions {
            ccmin_mode: mode,
            ..SolverOptions::default()
        };
        let mut s = Cdcl::with_options(opts).unwrap();
        for _ in 0..num_vars {
            s.new_var();
        }
        for c in clauses {
            let lits: Vec<Lit> = c.iter().map(|&l| lit(l)).collect();
            assert!(s.add_clause(&lits));
        }
        s
    }

    fn decide(s: &mut Cdcl, l: i32) {
        s.trail.new_decision_level();
        s.unchecked_enqueue(lit(l), None);
    }

    fn sorted(lits: &[Lit]) -> Vec<Lit> {
        let mut v = lits.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_first_uip() {
        let mut s = setup(CcMinMode::Deep, 6, &[&[-1, -4, 5], &[-4, 6], &[-5, -6]]);
        decide(&mut s, 1);
        assert_eq!(s.propagate(), None);
        decide(&mut s, 4);
        let confl = s.propagate().expect("conflict");

        let mut learnt = Vec::new();
        let level = s.analyze(confl, &mut learnt);
        assert_eq!(learnt[0], lit(-4));
        assert_eq!(sorted(&learnt), vec![lit(-1), lit(-4)]);
        assert_eq!(level, 1);
        assert!(s.seen.iter().all(|b| !b));
    }

    /// Level 1 decides 1 and implies 2, level 2 decides 3 and implies 4 and 5,
    /// which conflict through ¬1 ∨ ¬2 ∨ ¬4 ∨ ¬5. The literal ¬2 of the learnt
    /// clause is implied by ¬1 and can go.
    fn redundant_literal_conflict(mode: CcMinMode) -> (Cdcl, Vec<Lit>, u32) {
        let mut s = setup(
            mode,
            5,
            &[&[-1, 2], &[-3, 4], &[-3, 5], &[-1, -2, -4, -5]],
        );
        decide(&mut s, 1);
        assert_eq!(s.propagate(), None);
        decide(&mut s, 3);
        let confl = s.propagate().expect("conflict");
        let mut learnt = Vec::new();
        let level = s.analyze(confl, &mut learnt);
        (s, learnt, level)
    }

    #[test]
    fn test_no_minimization_keeps_redundant_literal() {
        let (s, learnt, level) = redundant_literal_conflict(CcMinMode::None);
        assert_eq!(learnt[0], lit(-3));
        assert_eq!(sorted(&learnt), vec![lit(-1), lit(-2), lit(-3)]);
        assert_eq!(level, 1);
        assert_eq!(s.stats.max_literals, 3);
        assert_eq!(s.stats.tot_literals, 3);
    }

    #[test]
    fn test_minimization_drops_implied_literal() {
        for mode in [CcMinMode::Basic, CcMinMode::Deep] {
            let (s, learnt, level) = redundant_literal_conflict(mode);
            assert_eq!(learnt, vec![lit(-3), lit(-1)], "{mode}");
            assert_eq!(level, 1);
            assert_eq!(s.stats.max_literals, 3);
            assert_eq!(s.stats.tot_literals, 2);
            assert!(s.seen.iter().all(|b| !b));
        }
    }

    #[test]
    fn test_second_literal_has_highest_level() {
        let mut s = setup(CcMinMode::Deep, 4, &[&[-1, -2, -3, 4], &[-3, -4]]);
        decide(&mut s, 1);
        decide(&mut s, 2);
        decide(&mut s, 3);
        let confl = s.propagate().expect("conflict");

        let mut learnt = Vec::new();
        let level = s.analyze(confl, &mut learnt);
        assert_eq!(learnt[0], lit(-3));
        assert_eq!(learnt[1], lit(-2));
        assert_eq!(level, 2);
    }

    #[test]
    fn test_analyze_final_collects_assumptions() {
        let mut s = setup(CcMinMode::Deep, 4, &[&[-1, 3], &[-2, -3]]);
        decide(&mut s, 4);
        assert_eq!(s.propagate(), None);
        decide(&mut s, 1);
        assert_eq!(s.propagate(), None);

        // with 1 assumed, 2 is false
        assert!(s.value_lit(lit(2)).is_false());
        s.analyze_final(lit(-2));
        assert_eq!(s.conflict[0], lit(-2));
        assert_eq!(sorted(&s.conflict), vec![lit(-1), lit(-2)]);
        assert!(s.seen.iter().all(|b| !b));
    }

    #[test]
    fn test_analyze_final_at_root() {
        let mut s = setup(CcMinMode::Deep, 1, &[&[1]]);
        s.analyze_final(lit(1));
        assert_eq!(s.conflict, vec![lit(1)]);
    }
}
