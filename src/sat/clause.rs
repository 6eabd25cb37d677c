#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses and the arena that owns them.
//!
//! Every clause lives in a [`ClauseAllocator`] and is referred to by a
//! [`ClauseRef`] handle from watch lists, the learnt/original clause lists and
//! the `reason` slot of implied variables. Removing a clause only marks it;
//! storage is reclaimed by [`ClauseAllocator::compact`], which hands back a
//! relocation table so the owner can rewrite its handles.

use crate::sat::literal::Lit;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;

/// Inline literal storage; most learnt clauses are short.
pub type ClauseLits = SmallVec<[Lit; 6]>;

/// Handle to a clause in a [`ClauseAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseRef(u32);

impl ClauseRef {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Metadata that exists only for one kind of clause.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Extra {
    /// Learnt clauses carry an activity.
    Activity(f64),
    /// Original clauses carry their abstraction.
    Abstraction(u32),
}

/// Result of [`Clause::subsumes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsumption {
    /// No subset relation.
    None,
    /// Every literal of `self` occurs in `other`.
    Subsumes,
    /// `self` is a subset of `other` except that `other` holds the negation of
    /// this literal, so `other` may drop that negation.
    Strengthen(Lit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    lits: ClauseLits,
    learnt: bool,
    removed: bool,
    extra: Extra,
}

/// 32-bit signature: bit `var & 31` set for every variable of the clause.
#[must_use]
pub fn calc_abstraction(lits: &[Lit]) -> u32 {
    lits.iter()
        .fold(0, |abs, lit| abs | 1 << (lit.var().idx() & 31))
}

impl Clause {
    #[must_use]
    pub fn new(lits: &[Lit], learnt: bool) -> Self {
        let extra = if learnt {
            Extra::Activity(0.0)
        } else {
            Extra::Abstraction(calc_abstraction(lits))
        };
        Self {
            lits: SmallVec::from_slice(lits),
            learnt,
            removed: false,
            extra,
        }
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
    pub const fn is_learnt(&self) -> bool {
        self.learnt
    }

    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    pub const fn mark_removed(&mut self) {
        self.removed = true;
    }

    #[must_use]
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lit> {
        self.lits.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.lits.swap(i, j);
    }

    /// # Panics
    ///
    /// Panics if the clause is not learnt.
    #[must_use]
    pub fn activity(&self) -> f64 {
        match self.extra {
            Extra::Activity(act) => act,
            Extra::Abstraction(_) => panic!("original clauses carry no activity"),
        }
    }

    /// # Panics
    ///
    /// Panics if the clause is not learnt.
    pub fn set_activity(&mut self, act: f64) {
        match &mut self.extra {
            Extra::Activity(slot) => *slot = act,
            Extra::Abstraction(_) => panic!("original clauses carry no activity"),
        }
    }

    /// # Panics
    ///
    /// Panics if the clause is learnt.
    #[must_use]
    pub fn abstraction(&self) -> u32 {
        match self.extra {
            Extra::Abstraction(abs) => abs,
            Extra::Activity(_) => panic!("learnt clauses carry no abstraction"),
        }
    }

    /// Recomputes the stored abstraction from the current literals.
    pub fn calc_abstraction(&mut self) {
        assert!(!self.learnt, "learnt clauses carry no abstraction");
        self.extra = Extra::Abstraction(calc_abstraction(&self.lits));
    }

    /// Checks whether `self` subsumes `other`, or subsumes it after one
    /// self-subsuming resolution step.
    ///
    /// Both clauses must be original clauses.
    #[must_use]
    pub fn subsumes(&self, other: &Self) -> Subsumption {
        if other.len() < self.len() || self.abstraction() & !other.abstraction() != 0 {
            return Subsumption::None;
        }

        let mut result = Subsumption::Subsumes;
        for &lit in &self.lits {
            if other.lits.contains(&lit) {
                continue;
            }
            if result == Subsumption::Subsumes && other.lits.contains(&!lit) {
                result = Subsumption::Strengthen(lit);
                continue;
            }
            return Subsumption::None;
        }
        result
    }

    /// Removes `lit` from the clause and refreshes the abstraction.
    pub fn strengthen(&mut self, lit: Lit) {
        if let Some(pos) = self.lits.iter().position(|&l| l == lit) {
            self.lits.remove(pos);
            if !self.learnt {
                self.calc_abstraction();
            }
        }
    }
}

impl Index<usize> for Clause {
    type Output = Lit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.lits[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.lits[index]
    }
}

/// Owns every clause of a solver.
#[derive(Debug, Clone, Default)]
pub struct ClauseAllocator {
    clauses: Vec<Clause>,
    size: usize,
    wasted: usize,
}

impl ClauseAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clauses: Vec::new(),
            size: 0,
            wasted: 0,
        }
    }

    /// Stores a new clause.
    ///
    /// # Panics
    ///
    /// Panics if the arena outgrows `u32` handles.
    pub fn alloc(&mut self, lits: &[Lit], learnt: bool) -> ClauseRef {
        let cr = ClauseRef(u32::try_from(self.clauses.len()).expect("clause arena overflow"));
        self.size += lits.len();
        self.clauses.push(Clause::new(lits, learnt));
        cr
    }

    /// Marks a clause removed and accounts for its literals as garbage.
    pub fn free(&mut self, cr: ClauseRef) {
        let clause = &mut self.clauses[cr.index()];
        clause.mark_removed();
        self.wasted += clause.len();
    }

    /// Total literals held, live or not.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Literals held by removed clauses.
    #[must_use]
    pub const fn wasted(&self) -> usize {
        self.wasted
    }

    /// Number of clause slots, removed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Drops every removed clause and renumbers the survivors.
    ///
    /// The returned table maps each old handle to its new handle, or to `None`
    /// if the clause was removed.
    pub fn compact(&mut self) -> Relocation {
        let old = std::mem::take(&mut self.clauses);
        let mut map = Vec::with_capacity(old.len());
        self.size = 0;
        self.wasted = 0;

        for clause in old {
            if clause.is_removed() {
                map.push(None);
            } else {
                let cr = ClauseRef(u32::try_from(self.clauses.len()).expect("clause arena overflow"));
                self.size += clause.len();
                self.clauses.push(clause);
                map.push(Some(cr));
            }
        }
        Relocation(map)
    }
}

impl Index<ClauseRef> for ClauseAllocator {
    type Output = Clause;

    fn index(&self, cr: ClauseRef) -> &Self::Output {
        &self.clauses[cr.index()]
    }
}

impl IndexMut<ClauseRef> for ClauseAllocator {
    fn index_mut(&mut self, cr: ClauseRef) -> &mut Self::Output {
        &mut self.clauses[cr.index()]
    }
}

/// Old-to-new handle table produced by [`ClauseAllocator::compact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation(Vec<Option<ClauseRef>>);

impl Relocation {
    #[must_use]
    pub fn get(&self, cr: ClauseRef) -> Option<ClauseRef> {
        self.0.get(cr.index()).copied().flatten()
    }
}
