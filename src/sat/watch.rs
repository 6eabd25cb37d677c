#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Per-literal watch lists with lazy deletion.
//!
//! A clause is watched from the lists of the negations of its first two
//! literals. Detaching a clause only *smudges* those two lists; watchers whose
//! clause has been removed are dropped the next time the list is cleaned,
//! either explicitly or through [`WatchLists::lookup`] / [`WatchLists::clean_all`].

use crate::sat::clause::{ClauseAllocator, ClauseRef, Relocation};
use crate::sat::literal::Lit;
use crate::sat::vec::BoolVec;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// A clause together with a literal whose truth lets propagation skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watcher {
    pub cref: ClauseRef,
    pub blocker: Lit,
}

impl Watcher {
    #[must_use]
    pub const fn new(cref: ClauseRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

pub type WatchList = SmallVec<[Watcher; 4]>;

#[derive(Debug, Clone, Default)]
pub struct WatchLists {
    occs: Vec<WatchList>,
    dirty: BoolVec,
    dirties: Vec<Lit>,
}

impl WatchLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure `lit` has a (possibly empty) list.
    pub fn init(&mut self, lit: Lit) {
        let size = lit.index() + 1;
        if self.occs.len() < size {
            self.occs.resize_with(size, WatchList::new);
            self.dirty.grow_to(size, false);
        }
    }

    pub fn push(&mut self, lit: Lit, watcher: Watcher) {
        self.occs[lit.index()].push(watcher);
    }

    /// Flags the list of `lit` as holding watchers of removed clauses.
    pub fn smudge(&mut self, lit: Lit) {
        if !self.dirty.get(lit.index()) {
            self.dirty.set(lit.index(), true);
            self.dirties.push(lit);
        }
    }

    #[must_use]
    pub fn is_dirty(&self, lit: Lit) -> bool {
        self.dirty.get(lit.index())
    }

    /// Drops watchers of removed clauses from the list of `lit`.
    pub fn clean(&mut self, lit: Lit, ca: &ClauseAllocator) {
        self.occs[lit.index()].retain(|w| !ca[w.cref].is_removed());
        self.dirty.set(lit.index(), false);
    }

    /// Cleans every smudged list.
    pub fn clean_all(&mut self, ca: &ClauseAllocator) {
        let dirties = std::mem::take(&mut self.dirties);
        for &lit in &dirties {
            // a list may have been cleaned through `lookup` since it was smudged
            if self.dirty.get(lit.index()) {
                self.clean(lit, ca);
            }
        }
        self.dirties = dirties;
        self.dirties.clear();
    }

    /// The list of `lit`, cleaned first if it is dirty.
    pub fn lookup(&mut self, lit: Lit, ca: &ClauseAllocator) -> &mut WatchList {
        if self.dirty.get(lit.index()) {
            self.clean(lit, ca);
        }
        &mut self.occs[lit.index()]
    }

    /// Removes the watcher of `cref` from the list of `lit` right away.
    pub fn remove_strict(&mut self, lit: Lit, cref: ClauseRef) {
        let ws = &mut self.occs[lit.index()];
        if let Some(pos) = ws.iter().position(|w| w.cref == cref) {
            ws.remove(pos);
        }
    }

    /// Rewrites every handle after the clause arena has been compacted.
    ///
    /// Callers run [`WatchLists::clean_all`] first, so every watcher refers
    /// to a surviving clause.
    pub fn remap(&mut self, reloc: &Relocation) {
        for ws in &mut self.occs {
            ws.retain(|w| match reloc.get(w.cref) {
                Some(cref) => {
                    w.cref = cref;
                    true
                }
                None => false,
            });
        }
    }

    /// Takes the list of `lit` out, leaving an empty one in its place.
    pub(crate) fn take(&mut self, lit: Lit) -> WatchList {
        std::mem::take(&mut self.occs[lit.index()])
    }

    /// Puts back a list obtained from [`WatchLists::take`].
    pub(crate) fn restore(&mut self, lit: Lit, ws: WatchList) {
        let slot = &mut self.occs[lit.index()];
        debug_assert!(slot.is_empty());
        *slot = ws;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Lit, &WatchList)> {
        self.occs
            .iter()
            .enumerate()
            .map(|(i, ws)| (Lit::from_code(u32::try_from(i).unwrap_or(u32::MAX)), ws))
    }
}

impl Index<Lit> for WatchLists {
    type Output = WatchList;

    fn index(&self, lit: Lit) -> &Self::Output {
        &self.occs[lit.index()]
    }
}

impl IndexMut<Lit> for WatchLists {
    fn index_mut(&mut self, lit: Lit) -> &mut Self::Output {
        &mut self.occs[lit.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Var;

    fn setup() -> (WatchLists, ClauseAllocator, Vec<ClauseRef>) {
        let mut ca = ClauseAllocator::new();
        let mut watches = WatchLists::new();
        let x = Var::new(0);
        let y = Var::new(1);
        let z = Var::new(2);
        for v in [x, y, z] {
            watches.init(v.positive());
            watches.init(v.negative());
        }

        let a = ca.alloc(&[x.positive(), y.positive()], false);
        let b = ca.alloc(&[x.positive(), z.positive()], false);
        watches.push(x.negative(), Watcher::new(a, y.positive()));
        watches.push(x.negative(), Watcher::new(b, z.positive()));
        (watches, ca, vec![a, b])
    }

    #[test]
    fn test_smudge_is_lazy() {
        let (mut watches, mut ca, crs) = setup();
        let lit = Var::new(0).negative();

        ca.free(crs[0]);
        watches.smudge(lit);
        assert!(watches.is_dirty(lit));
        assert_eq!(watches[lit].len(), 2);

        assert_eq!(watches.lookup(lit, &ca).len(), 1);
        assert!(!watches.is_dirty(lit));
        assert_eq!(watches[lit][0].cref, crs[1]);
    }

    #[test]
    fn test_clean_all() {
        let (mut watches, mut ca, crs) = setup();
        let lit = Var::new(0).negative();

        ca.free(crs[1]);
        watches.smudge(lit);
        watches.smudge(lit);
        watches.clean_all(&ca);

        assert_eq!(watches[lit].len(), 1);
        assert!(!watches.is_dirty(lit));
    }

    #[test]
    fn test_remove_strict() {
        let (mut watches, _, crs) = setup();
        let lit = Var::new(0).negative();
        watches.remove_strict(lit, crs[0]);
        assert_eq!(watches[lit].len(), 1);
        assert_eq!(watches[lit][0].cref, crs[1]);
    }

    #[test]
    fn test_remap_after_compact() {
        let (mut watches, mut ca, crs) = setup();
        let lit = Var::new(0).negative();

        ca.free(crs[0]);
        watches.smudge(lit);
        watches.clean_all(&ca);
        let reloc = ca.compact();
        watches.remap(&reloc);

        assert_eq!(watches[lit].len(), 1);
        assert_eq!(ca[watches[lit][0].cref].lits()[1], Var::new(2).positive());
    }
}
