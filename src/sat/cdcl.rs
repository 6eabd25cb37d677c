#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The CDCL engine.
//!
//! [`Cdcl`] owns every piece of solver state. The algorithms working on that state
//! are spread over sibling modules as further `impl Cdcl` blocks:
//! - [`crate::sat::propagation`]: two-watched-literal unit propagation.
//! - [`crate::sat::conflict_analysis`]: 1st-UIP learning, clause minimization and
//!   the final analysis of failed assumptions.
//! - [`crate::sat::clause_management`]: clause activities, database reduction,
//!   removal of satisfied clauses and garbage collection.
//! - [`crate::sat::variable_selection`]: VSIDS activities and branching.
//!
//! This module ties them together in the restart loop and exposes the
//! incremental [`Solver`] interface.

use crate::sat::assignment::Assignment;
use crate::sat::clause::{ClauseAllocator, ClauseRef};
use crate::sat::config::{ConfigError, SolverOptions};
use crate::sat::heap::VarOrderHeap;
use crate::sat::literal::{Lbool, Lit, Var};
use crate::sat::phase_saving::{PhaseSaving, SavedPhases};
use crate::sat::restarter::{Restarter, Restarters};
use crate::sat::solver::{SolveStatus, Solver, SolverStats};
use crate::sat::trail::Trail;
use crate::sat::vec::{BoolVec, PackedVec, VarMap};
use crate::sat::watch::{WatchLists, Watcher};
use itertools::Itertools;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// A MiniSat-style CDCL solver.
#[derive(Debug, Clone)]
pub struct Cdcl {
    pub(crate) opts: SolverOptions,
    pub(crate) stats: SolverStats,

    model: Vec<Lbool>,
    pub(crate) conflict: Vec<Lit>,
    /// `false` once the clauses are known to be unsatisfiable.
    pub(crate) ok: bool,

    pub(crate) ca: ClauseAllocator,
    pub(crate) clauses: Vec<ClauseRef>,
    pub(crate) learnts: Vec<ClauseRef>,
    pub(crate) watches: WatchLists,

    pub(crate) assigns: Assignment,
    pub(crate) trail: Trail,
    pub(crate) assumptions: PackedVec<Lit>,

    pub(crate) phases: SavedPhases,
    pub(crate) decision: BoolVec,
    pub(crate) activity: VarMap<f64>,
    pub(crate) order_heap: VarOrderHeap,
    pub(crate) var_inc: f64,
    pub(crate) cla_inc: f64,

    // scratch space of conflict analysis
    pub(crate) seen: BoolVec,
    pub(crate) analyze_stack: PackedVec<Lit>,
    pub(crate) analyze_toclear: PackedVec<Lit>,

    /// Trail size at the last `simplify`; it only runs again once more facts exist.
    pub(crate) simp_db_assigns: Option<usize>,
    /// Propagations left before `simplify` is worth running again.
    pub(crate) simp_db_props: i64,

    pub(crate) max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i64,
    progress_estimate: f64,

    conflict_budget: Option<u64>,
    propagation_budget: Option<u64>,
    interrupt: Arc<AtomicBool>,

    pub(crate) rng: fastrand::Rng,
}

impl Default for Cdcl {
    fn default() -> Self {
        Self::build(SolverOptions::default())
    }
}

impl Cdcl {
    /// A solver with the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A solver with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is out of range.
    pub fn with_options(opts: SolverOptions) -> Result<Self, ConfigError> {
        opts.validate()?;
        Ok(Self::build(opts))
    }

    fn build(opts: SolverOptions) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(opts.random_seed),
            opts,
            stats: SolverStats::default(),
            model: Vec::new(),
            conflict: Vec::new(),
            ok: true,
            ca: ClauseAllocator::new(),
            clauses: Vec::new(),
            learnts: Vec::new(),
            watches: WatchLists::new(),
            assigns: Assignment::new(),
            trail: Trail::new(),
            assumptions: PackedVec::new(),
            phases: SavedPhases::new(),
            decision: BoolVec::new(),
            activity: VarMap::new(),
            order_heap: VarOrderHeap::new(),
            var_inc: 1.0,
            cla_inc: 1.0,
            seen: BoolVec::new(),
            analyze_stack: PackedVec::new(),
            analyze_toclear: PackedVec::new(),
            simp_db_assigns: None,
            simp_db_props: 0,
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,
            progress_estimate: 0.0,
            conflict_budget: None,
            propagation_budget: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &SolverOptions {
        &self.opts
    }

    /// Current value of `var`.
    #[must_use]
    pub fn value(&self, var: Var) -> Lbool {
        self.assigns.var_value(var)
    }

    /// Current value of `lit`.
    #[must_use]
    pub fn value_lit(&self, lit: Lit) -> Lbool {
        self.assigns.lit_value(lit)
    }

    /// Value of `lit` in the last model.
    #[must_use]
    pub fn model_value(&self, lit: Lit) -> Lbool {
        self.model
            .get(lit.var().index())
            .map_or(Lbool::Undef, |&value| value ^ lit.is_negated())
    }

    /// Number of assigned variables.
    #[must_use]
    pub fn num_assigns(&self) -> usize {
        self.trail.len()
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn num_learnts(&self) -> usize {
        self.learnts.len()
    }

    /// Branching variables not fixed at the root level.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_free_vars(&self) -> usize {
        let fixed = if self.trail.decision_level() == 0 {
            self.trail.len()
        } else {
            self.trail.level_start(0)
        };
        (self.stats.dec_vars as usize).saturating_sub(fixed)
    }

    #[must_use]
    pub fn decision_level(&self) -> u32 {
        self.trail.decision_level()
    }

    /// Rough fraction of the search space covered when the last search attempt
    /// gave up.
    #[must_use]
    pub const fn progress_estimate(&self) -> f64 {
        self.progress_estimate
    }

    /// Sets the preferred polarity of `var`: `True` decides positive first,
    /// `False` negative, `Undef` falls back to the saved phase.
    pub fn set_polarity(&mut self, var: Var, polarity: Lbool) {
        self.phases.set_user(var, polarity);
    }

    /// Marks whether the search may branch on `var`.
    pub fn set_decision_var(&mut self, var: Var, eligible: bool) {
        let was = self.decision.get(var.index());
        if eligible && !was {
            self.stats.dec_vars += 1;
        } else if !eligible && was {
            self.stats.dec_vars -= 1;
        }
        self.decision.set(var.index(), eligible);
        self.insert_var_order(var);
    }

    /// Allows `n` more conflicts from now on.
    pub const fn set_conf_budget(&mut self, n: u64) {
        self.conflict_budget = Some(self.stats.conflicts + n);
    }

    /// Allows `n` more propagations from now on.
    pub const fn set_prop_budget(&mut self, n: u64) {
        self.propagation_budget = Some(self.stats.propagations + n);
    }

    pub const fn budget_off(&mut self) {
        self.conflict_budget = None;
        self.propagation_budget = None;
    }

    /// Asks a running search to stop; it returns [`SolveStatus::Unknown`].
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    pub fn clear_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }

    /// A flag that interrupts the search when set, usable from another thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    fn within_budget(&self) -> bool {
        !self.interrupt.load(Ordering::Relaxed)
            && self.conflict_budget.is_none_or(|b| self.stats.conflicts < b)
            && self.propagation_budget.is_none_or(|b| self.stats.propagations < b)
    }

    pub(crate) fn unchecked_enqueue(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        self.assigns.assign(lit, self.trail.decision_level(), reason);
        self.trail.push(lit);
    }

    /// Undoes every level above `level`.
    pub(crate) fn cancel_until(&mut self, level: u32) {
        if self.trail.decision_level() <= level {
            return;
        }

        let start = self.trail.level_start(level);
        for idx in (start..self.trail.len()).rev() {
            let lit = self.trail.get(idx);
            self.assigns.unassign(lit.var());
            match self.opts.phase_saving {
                PhaseSaving::Full => self.phases.save(lit),
                PhaseSaving::Limited if self.trail.after_last_decision(idx) => self.phases.save(lit),
                _ => {}
            }
            self.insert_var_order(lit.var());
        }
        self.trail.truncate_to_level(level);
    }

    pub(crate) fn attach_clause(&mut self, cr: ClauseRef) {
        let c = &self.ca[cr];
        debug_assert!(c.len() > 1);
        let (c0, c1) = (c[0], c[1]);
        let len = c.len() as u64;

        if c.is_learnt() {
            self.stats.learnts_literals += len;
        } else {
            self.stats.clauses_literals += len;
        }
        self.watches.push(!c0, Watcher::new(cr, c1));
        self.watches.push(!c1, Watcher::new(cr, c0));
    }

    /// Unhooks a clause from its watch lists lazily.
    pub(crate) fn detach_clause(&mut self, cr: ClauseRef) {
        let c = &self.ca[cr];
        let (c0, c1) = (c[0], c[1]);
        let len = c.len() as u64;

        if c.is_learnt() {
            self.stats.learnts_literals -= len;
        } else {
            self.stats.clauses_literals -= len;
        }
        self.watches.smudge(!c0);
        self.watches.smudge(!c1);
    }

    /// Detaches and frees a clause, clearing the reason it may still serve as.
    pub(crate) fn remove_clause(&mut self, cr: ClauseRef) {
        self.detach_clause(cr);
        if self.locked(cr) {
            let var = self.ca[cr][0].var();
            self.assigns.set_reason(var, None);
        }
        self.ca.free(cr);
    }

    /// Whether `cr` is the reason of its first literal's current assignment.
    pub(crate) fn locked(&self, cr: ClauseRef) -> bool {
        let first = self.ca[cr][0];
        self.value_lit(first).is_true() && self.assigns.reason(first.var()) == Some(cr)
    }

    pub(crate) fn satisfied(&self, cr: ClauseRef) -> bool {
        self.ca[cr].iter().any(|&lit| self.value_lit(lit).is_true())
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn compute_progress_estimate(&self) -> f64 {
        let n = self.num_vars() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let f = 1.0 / n;
        let levels = self.trail.decision_level();

        let mut progress = 0.0;
        for level in 0..=levels {
            let beg = if level == 0 { 0 } else { self.trail.level_start(level - 1) };
            let end = if level == levels {
                self.trail.len()
            } else {
                self.trail.level_start(level)
            };
            progress += f.powi(level as i32) * (end - beg) as f64;
        }
        progress / n
    }

    #[allow(clippy::cast_precision_loss)]
    fn log_progress(&self) {
        let learnts = self.num_learnts();
        debug!(
            conflicts = self.stats.conflicts,
            free_vars = self.num_free_vars(),
            clauses = self.num_clauses(),
            clause_lits = self.stats.clauses_literals,
            max_learnts = self.max_learnts as u64,
            learnts,
            lits_per_learnt = if learnts == 0 {
                0.0
            } else {
                self.stats.learnts_literals as f64 / learnts as f64
            },
            progress = %format!("{:.3}%", self.progress_estimate * 100.0),
            "search progress"
        );
    }

    /// Runs CDCL until a model or a conflict at the root (or under assumptions)
    /// is found, or until `nof_conflicts` conflicts have happened.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn search(&mut self, nof_conflicts: u64) -> Lbool {
        debug_assert!(self.ok);
        let mut conflicts_here = 0_u64;
        let mut learnt = Vec::new();
        self.stats.starts += 1;

        loop {
            if let Some(confl) = self.propagate() {
                self.stats.conflicts += 1;
                conflicts_here += 1;
                if self.trail.decision_level() == 0 {
                    return Lbool::False;
                }

                let backtrack_level = self.analyze(confl, &mut learnt);
                self.cancel_until(backtrack_level);

                if let [unit] = learnt.as_slice() {
                    self.unchecked_enqueue(*unit, None);
                } else {
                    let cr = self.ca.alloc(&learnt, true);
                    self.learnts.push(cr);
                    self.attach_clause(cr);
                    self.cla_bump_activity(cr);
                    self.unchecked_enqueue(learnt[0], Some(cr));
                }

                self.var_decay_activity();
                self.cla_decay_activity();

                self.learntsize_adjust_cnt -= 1;
                if self.learntsize_adjust_cnt <= 0 {
                    self.learntsize_adjust_confl *= self.opts.learntsize_adjust_inc;
                    self.learntsize_adjust_cnt = self.learntsize_adjust_confl as i64;
                    self.max_learnts *= self.opts.learntsize_inc;
                    self.log_progress();
                }
            } else {
                if conflicts_here >= nof_conflicts || !self.within_budget() {
                    self.progress_estimate = self.compute_progress_estimate();
                    self.cancel_until(0);
                    return Lbool::Undef;
                }

                if self.trail.decision_level() == 0 && !self.simplify() {
                    return Lbool::False;
                }

                if self.learnts.len() as f64 - self.num_assigns() as f64 >= self.max_learnts {
                    self.reduce_db();
                }

                let mut next = None;
                while (self.trail.decision_level() as usize) < self.assumptions.len() {
                    let p = self.assumptions.get(self.trail.decision_level() as usize);
                    match self.value_lit(p) {
                        // already implied: open an empty level to keep levels aligned
                        Lbool::True => self.trail.new_decision_level(),
                        Lbool::False => {
                            self.analyze_final(!p);
                            return Lbool::False;
                        }
                        Lbool::Undef => {
                            next = Some(p);
                            break;
                        }
                    }
                }

                let next = match next {
                    Some(p) => p,
                    None => {
                        self.stats.decisions += 1;
                        match self.pick_branch_lit() {
                            Some(lit) => lit,
                            None => return Lbool::True,
                        }
                    }
                };

                self.trail.new_decision_level();
                self.unchecked_enqueue(next, None);
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn solve_(&mut self) -> Lbool {
        self.model.clear();
        self.conflict.clear();
        if !self.ok {
            return Lbool::False;
        }
        self.stats.solves += 1;

        self.max_learnts = (self.num_clauses() as f64 * self.opts.learntsize_factor)
            .max(f64::from(self.opts.min_learnts_lim));
        self.learntsize_adjust_confl = f64::from(self.opts.learntsize_adjust_start_confl);
        self.learntsize_adjust_cnt = i64::from(self.opts.learntsize_adjust_start_confl);

        info!(
            vars = self.num_vars(),
            clauses = self.num_clauses(),
            assumptions = self.assumptions.len(),
            restarts = %self.opts.restart_strategy,
            "solving"
        );

        let mut restarter = Restarters::with_strategy(
            self.opts.restart_strategy,
            self.opts.restart_first,
            self.opts.restart_inc,
        );
        let mut status = Lbool::Undef;
        while status.is_undef() {
            status = self.search(restarter.conflicts_allowed());
            if !self.within_budget() {
                break;
            }
            restarter.restart();
        }

        match status {
            Lbool::True => self.model = self.assigns.values().to_vec(),
            Lbool::False if self.conflict.is_empty() => self.ok = false,
            _ => {}
        }
        self.cancel_until(0);

        info!(
            status = %SolveStatus::from(status),
            conflicts = self.stats.conflicts,
            decisions = self.stats.decisions,
            restarts = restarter.num_restarts(),
            "search finished"
        );
        status
    }

    /// Removes satisfied clauses at the root level.
    ///
    /// Returns `false` if the clauses are unsatisfiable.
    ///
    /// # Panics
    ///
    /// Panics if called above the root level.
    #[allow(clippy::cast_possible_wrap)]
    pub fn simplify(&mut self) -> bool {
        assert_eq!(self.trail.decision_level(), 0, "simplify runs at the root level only");

        if !self.ok || self.propagate().is_some() {
            self.ok = false;
            return false;
        }

        if self.simp_db_assigns == Some(self.num_assigns()) || self.simp_db_props > 0 {
            return true;
        }

        let learnts = std::mem::take(&mut self.learnts);
        self.learnts = self.remove_satisfied(learnts);
        if self.opts.remove_satisfied {
            let clauses = std::mem::take(&mut self.clauses);
            self.clauses = self.remove_satisfied(clauses);
        }
        self.check_garbage();
        self.rebuild_order_heap();

        self.simp_db_assigns = Some(self.num_assigns());
        self.simp_db_props = (self.stats.clauses_literals + self.stats.learnts_literals) as i64;
        true
    }

    /// Literals implied by unit propagation of `assumptions`, not counting the
    /// assumptions themselves, or `None` if they conflict.
    ///
    /// # Panics
    ///
    /// Panics if called above the root level.
    pub fn implies(&mut self, assumptions: &[Lit]) -> Option<Vec<Lit>> {
        assert_eq!(self.trail.decision_level(), 0, "implies runs at the root level only");
        if !self.ok {
            return None;
        }

        self.trail.new_decision_level();
        for &lit in assumptions {
            match self.value_lit(lit) {
                Lbool::False => {
                    self.cancel_until(0);
                    return None;
                }
                Lbool::Undef => self.unchecked_enqueue(lit, None),
                Lbool::True => {}
            }
        }

        let before = self.trail.len();
        let implied = if self.propagate().is_none() {
            Some((before..self.trail.len()).map(|i| self.trail.get(i)).collect())
        } else {
            None
        };
        self.cancel_until(0);
        implied
    }

    /// Writes the current problem in DIMACS form, with `assumptions` as unit
    /// clauses.
    ///
    /// Satisfied clauses, false literals and assumptions that already hold are
    /// left out and variables are renumbered densely, so the output is
    /// equisatisfiable rather than equal to the input.
    ///
    /// # Errors
    ///
    /// Propagates write errors of `out`.
    pub fn write_dimacs<W: Write>(&self, out: &mut W, assumptions: &[Lit]) -> io::Result<()> {
        if !self.ok || assumptions.iter().any(|&lit| self.value_lit(lit).is_false()) {
            return writeln!(out, "p cnf 1 2\n1 0\n-1 0");
        }

        let mut map: Vec<Option<u32>> = vec![None; self.num_vars()];
        let mut next = 0_u32;
        let mut map_var = |var: Var| -> u32 {
            *map[var.index()].get_or_insert_with(|| {
                next += 1;
                next
            })
        };

        let live = self
            .clauses
            .iter()
            .copied()
            .filter(|&cr| !self.satisfied(cr))
            .collect_vec();
        let lines = live
            .iter()
            .map(|&cr| {
                self.ca[cr]
                    .iter()
                    .filter(|&&lit| !self.value_lit(lit).is_false())
                    .map(|&lit| mapped(lit, map_var(lit.var())))
                    .chain(std::iter::once("0".to_string()))
                    .join(" ")
            })
            .collect_vec();
        let units = assumptions
            .iter()
            .filter(|&&lit| self.value_lit(lit).is_undef())
            .map(|&lit| format!("{} 0", mapped(lit, map_var(lit.var()))))
            .collect_vec();

        writeln!(out, "p cnf {} {}", next, live.len() + units.len())?;
        for line in units.iter().chain(&lines) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

fn mapped(lit: Lit, var: u32) -> String {
    if lit.is_negated() { format!("-{var}") } else { var.to_string() }
}

impl Solver for Cdcl {
    fn new_var_with(&mut self, polarity: Lbool, decision: bool) -> Var {
        let idx = u32::try_from(self.num_vars()).unwrap_or(u32::MAX);
        assert!(idx <= Var::MAX_INDEX, "variable limit reached");
        let var = Var::new(idx);

        self.watches.init(var.positive());
        self.watches.init(var.negative());
        self.assigns.push();
        let act = if self.opts.rnd_init_act {
            self.rng.f64() * 0.00001
        } else {
            0.0
        };
        self.activity.push(act);
        self.seen.push(false);
        self.phases.push(polarity);
        self.decision.push(false);
        self.set_decision_var(var, decision);
        var
    }

    fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    /// # Panics
    ///
    /// Panics above the root level or if a literal names an unknown variable.
    fn add_clause(&mut self, lits: &[Lit]) -> bool {
        assert_eq!(
            self.trail.decision_level(),
            0,
            "clauses can only be added at the root level"
        );
        if !self.ok {
            return false;
        }

        let mut ps = lits.to_vec();
        ps.sort_unstable();
        for lit in &ps {
            assert!(
                lit.var().index() < self.num_vars(),
                "{lit:?} refers to an unknown variable"
            );
        }

        // drop duplicates and root-level false literals, accept tautologies and
        // satisfied clauses silently
        let mut kept: Vec<Lit> = Vec::with_capacity(ps.len());
        for lit in ps {
            let value = self.value_lit(lit);
            let last = kept.last().copied();
            if value.is_true() || last == Some(!lit) {
                return true;
            }
            if !value.is_false() && last != Some(lit) {
                kept.push(lit);
            }
        }

        match kept.as_slice() {
            [] => {
                self.ok = false;
            }
            [unit] => {
                self.unchecked_enqueue(*unit, None);
                self.ok = self.propagate().is_none();
            }
            _ => {
                let cr = self.ca.alloc(&kept, false);
                self.clauses.push(cr);
                self.attach_clause(cr);
            }
        }
        self.ok
    }

    fn solve_limited(&mut self, assumptions: &[Lit]) -> SolveStatus {
        for lit in assumptions {
            assert!(
                lit.var().index() < self.num_vars(),
                "assumption {lit:?} refers to an unknown variable"
            );
        }
        self.assumptions.clear();
        self.assumptions.extend(assumptions.iter().copied());
        SolveStatus::from(self.solve_())
    }

    fn model(&self) -> &[Lbool] {
        &self.model
    }

    fn conflict(&self) -> &[Lit] {
        &self.conflict
    }

    fn okay(&self) -> bool {
        self.ok
    }

    fn stats(&self) -> &SolverStats {
        &self.stats
    }
}
