#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::cdcl::Cdcl;
use crate::sat::clause::ClauseRef;
use crate::sat::literal::Lbool;
use crate::sat::watch::Watcher;

impl Cdcl {
    /// Propagates every enqueued fact.
    ///
    /// Returns the conflicting clause, if any. On conflict the rest of the queue
    /// is skipped and `qhead` jumps to the end of the trail.
    pub(crate) fn propagate(&mut self) -> Option<ClauseRef> {
        let mut confl = None;
        let mut num_props = 0_u64;
        self.watches.clean_all(&self.ca);

        while self.trail.qhead < self.trail.len() {
            let p = self.trail.get(self.trail.qhead);
            self.trail.qhead += 1;
            num_props += 1;

            // nothing is pushed onto the list of `p` while it is out: new watches
            // go to the negation of a non-false literal, and `!p` is false
            let mut ws = self.watches.take(p);
            let false_lit = !p;
            let end = ws.len();
            let (mut i, mut j) = (0, 0);

            while i < end {
                let w = ws[i];
                if self.assigns.lit_value(w.blocker) == Lbool::True {
                    ws[j] = w;
                    i += 1;
                    j += 1;
                    continue;
                }

                // make sure the false literal sits in slot 1
                let cr = w.cref;
                let c = &mut self.ca[cr];
                if c[0] == false_lit {
                    c.swap(0, 1);
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // satisfied through the other watch
                let first = c[0];
                let nw = Watcher::new(cr, first);
                if first != w.blocker && self.assigns.lit_value(first) == Lbool::True {
                    ws[j] = nw;
                    j += 1;
                    continue;
                }

                // look for a new literal to watch
                let replacement =
                    (2..c.len()).find(|&k| self.assigns.lit_value(c[k]) != Lbool::False);
                if let Some(k) = replacement {
                    c.swap(1, k);
                    let watch = !c[1];
                    self.watches.push(watch, nw);
                    continue;
                }

                // unit or conflicting under the current assignment
                ws[j] = nw;
                j += 1;
                if self.assigns.lit_value(first) == Lbool::False {
                    confl = Some(cr);
                    self.trail.qhead = self.trail.len();
                    while i < end {
                        ws[j] = ws[i];
                        i += 1;
                        j += 1;
                    }
                } else {
                    self.unchecked_enqueue(first, Some(cr));
                }
            }

            ws.truncate(j);
            self.watches.restore(p, ws);
        }

        self.stats.propagations += num_props;
        self.simp_db_props -= i64::try_from(num_props).unwrap_or(i64::MAX);
        confl
    }
}
