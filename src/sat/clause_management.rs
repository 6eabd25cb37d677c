#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Maintenance of the clause database.
//!
//! Learnt clauses carry an activity that is bumped whenever they take part in
//! conflict analysis and decays geometrically otherwise. Once there are more
//! learnt clauses than the solver allows, [`Cdcl::reduce_db`] drops the less
//! active half. Removed clauses stay in the arena until enough of it is
//! garbage, at which point it is compacted and every handle rewritten.

use crate::sat::cdcl::Cdcl;
use crate::sat::clause::ClauseRef;
use ordered_float::OrderedFloat;
use tracing::debug;

/// Activities above this are rescaled.
const RESCALE_LIMIT: f64 = 1e20;

impl Cdcl {
    pub(crate) fn cla_bump_activity(&mut self, cr: ClauseRef) {
        let act = self.ca[cr].activity() + self.cla_inc;
        self.ca[cr].set_activity(act);

        if act > RESCALE_LIMIT {
            for &learnt in &self.learnts {
                let c = &mut self.ca[learnt];
                c.set_activity(c.activity() / RESCALE_LIMIT);
            }
            self.cla_inc /= RESCALE_LIMIT;
        }
    }

    pub(crate) fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.opts.clause_decay;
    }

    /// Removes the less active half of the learnt clauses, plus any whose
    /// activity is below `cla_inc / learnts`.
    ///
    /// Binary clauses and clauses that are the reason of an assignment stay.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn reduce_db(&mut self) {
        let mut learnts = std::mem::take(&mut self.learnts);
        let total = learnts.len();
        let extra_lim = self.cla_inc / total as f64;

        learnts.sort_by_key(|&cr| {
            let c = &self.ca[cr];
            (c.len() <= 2, OrderedFloat(c.activity()))
        });

        let mut i = 0;
        learnts.retain(|&cr| {
            let c = &self.ca[cr];
            let remove = c.len() > 2
                && !self.locked(cr)
                && (i < total / 2 || c.activity() < extra_lim);
            i += 1;
            if remove {
                self.remove_clause(cr);
            }
            !remove
        });

        debug!(before = total, after = learnts.len(), "reduced learnt clauses");
        self.learnts = learnts;
        self.check_garbage();
    }

    /// Removes the clauses of `crs` that are satisfied at the root level and
    /// returns the rest.
    pub(crate) fn remove_satisfied(&mut self, mut crs: Vec<ClauseRef>) -> Vec<ClauseRef> {
        crs.retain(|&cr| {
            if self.satisfied(cr) {
                self.remove_clause(cr);
                false
            } else {
                true
            }
        });
        crs
    }

    /// Collects garbage once removed clauses make up more than `garbage_frac`
    /// of the arena.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn check_garbage(&mut self) {
        if self.ca.wasted() as f64 > self.ca.size() as f64 * self.opts.garbage_frac {
            self.garbage_collect();
        }
    }

    /// Compacts the clause arena and rewrites every handle into it.
    pub(crate) fn garbage_collect(&mut self) {
        let before = self.ca.size();
        self.watches.clean_all(&self.ca);
        let reloc = self.ca.compact();
        self.watches.remap(&reloc);

        for lit in self.trail.iter() {
            let var = lit.var();
            if let Some(reason) = self.assigns.reason(var) {
                self.assigns.set_reason(var, reloc.get(reason));
            }
        }
        for crs in [&mut self.clauses, &mut self.learnts] {
            crs.retain_mut(|cr| match reloc.get(*cr) {
                Some(new) => {
                    *cr = new;
                    true
                }
                None => false,
            });
        }

        self.stats.garbage_collections += 1;
        debug!(before, after = self.ca.size(), "collected garbage");
    }
}
