#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! VSIDS branching.
//!
//! Every variable met during conflict analysis has its activity bumped by
//! `var_inc`, and `var_inc` grows after each conflict, which makes older bumps
//! decay relative to newer ones. Decisions go to the unassigned decision
//! variable with the highest activity, occasionally to a random one.

use crate::sat::cdcl::Cdcl;
use crate::sat::literal::{Lit, Var};
use crate::sat::solver::Solver;

/// Activities above this are rescaled.
const RESCALE_LIMIT: f64 = 1e100;

impl Cdcl {
    pub(crate) fn var_bump_activity(&mut self, var: Var) {
        self.activity[var] += self.var_inc;
        if self.activity[var] > RESCALE_LIMIT {
            for act in self.activity.iter_mut() {
                *act /= RESCALE_LIMIT;
            }
            self.var_inc /= RESCALE_LIMIT;
        }

        if self.order_heap.in_heap(var) {
            self.order_heap.decrease(var, &self.activity);
        }
    }

    pub(crate) fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.opts.var_decay;
    }

    /// Puts `var` back among the branching candidates if it is one.
    pub(crate) fn insert_var_order(&mut self, var: Var) {
        if !self.order_heap.in_heap(var) && self.decision.get(var.index()) {
            self.order_heap.insert(var, &self.activity);
        }
    }

    /// Rebuilds the heap from the unassigned decision variables.
    pub(crate) fn rebuild_order_heap(&mut self) {
        let vars = (0..self.num_vars())
            .map(|i| Var::new(u32::try_from(i).unwrap_or(u32::MAX)))
            .filter(|&var| self.decision.get(var.index()) && self.value(var).is_undef())
            .collect::<Vec<_>>();
        self.order_heap.build(&vars, &self.activity);
    }

    /// Chooses the next decision literal, or `None` once every decision
    /// variable is assigned.
    pub(crate) fn pick_branch_lit(&mut self) -> Option<Lit> {
        let mut next = None;

        if self.rng.f64() < self.opts.random_var_freq && !self.order_heap.is_empty() {
            let var = self.order_heap.get(self.rng.usize(..self.order_heap.len()));
            if self.value(var).is_undef() && self.decision.get(var.index()) {
                self.stats.rnd_decisions += 1;
            }
            next = Some(var);
        }

        let var = loop {
            match next {
                Some(var) if self.value(var).is_undef() && self.decision.get(var.index()) => {
                    break var;
                }
                _ if self.order_heap.is_empty() => return None,
                _ => next = Some(self.order_heap.remove_min(&self.activity)),
            }
        };

        let coin = self.opts.rnd_pol.then(|| self.rng.f64() < 0.5);
        Some(self.phases.next_literal(var, coin))
    }
}
