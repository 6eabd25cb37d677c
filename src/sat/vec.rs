#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Growable per-kind vectors used throughout the engine.
//!
//! - [`PackedVec`] keeps values that have an integer encoding (literals,
//!   variables, truth values, plain counters) in a flat `Vec<u32>` and decodes
//!   on read.
//! - [`VarMap`] is a plain per-variable table for everything else.
//! - [`BoolVec`] is a bitset of per-variable flags.
//!
//! Indexing past the end is a bug and panics.

use crate::sat::literal::{Lbool, Lit, Var};
use bit_vec::BitVec;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A value with a lossless `u32` encoding.
pub trait Packed: Copy {
    fn pack(self) -> u32;
    fn unpack(raw: u32) -> Self;
}

impl Packed for u32 {
    fn pack(self) -> u32 {
        self
    }

    fn unpack(raw: u32) -> Self {
        raw
    }
}

impl Packed for Var {
    fn pack(self) -> u32 {
        self.idx()
    }

    fn unpack(raw: u32) -> Self {
        Self::new(raw)
    }
}

impl Packed for Lit {
    fn pack(self) -> u32 {
        self.code()
    }

    fn unpack(raw: u32) -> Self {
        Self::from_code(raw)
    }
}

impl Packed for Lbool {
    fn pack(self) -> u32 {
        self.code()
    }

    fn unpack(raw: u32) -> Self {
        Self::from_code(raw)
    }
}

/// A vector of [`Packed`] values stored by their encoding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PackedVec<T: Packed> {
    data: Vec<u32>,
    _marker: PhantomData<T>,
}

impl<T: Packed> Default for PackedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Packed> PackedVec<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value.pack());
    }

    /// Removes and returns the last element.
    ///
    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn pop(&mut self) -> T {
        match self.data.pop() {
            Some(raw) => T::unpack(raw),
            None => panic!("pop on empty vector"),
        }
    }

    /// The last element.
    ///
    /// # Panics
    ///
    /// Panics if the vector is empty.
    #[must_use]
    pub fn last(&self) -> T {
        self.get(self.len() - 1)
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> T {
        T::unpack(self.data[idx])
    }

    pub fn set(&mut self, idx: usize, value: T) {
        self.data[idx] = value.pack();
    }

    /// Pads with `pad` until the vector holds at least `size` elements.
    pub fn grow_to(&mut self, size: usize, pad: T) {
        if self.data.len() < size {
            self.data.resize(size, pad.pack());
        }
    }

    /// Drops the last `n` elements.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the length.
    pub fn shrink(&mut self, n: usize) {
        assert!(n <= self.data.len(), "shrink past the start of the vector");
        self.data.truncate(self.data.len() - n);
    }

    /// Keeps the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Overwrites `other` with a copy of this vector.
    pub fn copy_to(&self, other: &mut Self) {
        other.data.clear();
        other.data.extend_from_slice(&self.data);
    }

    /// Hands the backing storage to `other`, leaving this vector empty.
    pub fn move_to(&mut self, other: &mut Self) {
        other.data = std::mem::take(&mut self.data);
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + ExactSizeIterator + '_ {
        self.data.iter().map(|&raw| T::unpack(raw))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: Packed + Ord> PackedVec<T> {
    /// Sorts in place.
    pub fn sort(&mut self) {
        let mut values = self.to_vec();
        values.sort_unstable();
        for (slot, value) in self.data.iter_mut().zip(values) {
            *slot = value.pack();
        }
    }
}

impl<T: Packed + Debug> Debug for PackedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Packed> FromIterator<T> for PackedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(Packed::pack).collect(),
            _marker: PhantomData,
        }
    }
}

impl<T: Packed> Extend<T> for PackedVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.data.extend(iter.into_iter().map(Packed::pack));
    }
}

/// A table with one entry per variable.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VarMap<V>(Vec<V>);

impl<V> VarMap<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends the entry for the next variable.
    pub fn push(&mut self, value: V) {
        self.0.push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.0.iter_mut()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[V] {
        &self.0
    }
}

impl<V: Clone> VarMap<V> {
    /// Ensures `var` has an entry, padding with `pad`.
    pub fn reserve(&mut self, var: Var, pad: V) {
        if self.0.len() <= var.index() {
            self.0.resize(var.index() + 1, pad);
        }
    }
}

impl<V> Index<Var> for VarMap<V> {
    type Output = V;

    fn index(&self, var: Var) -> &Self::Output {
        &self.0[var.index()]
    }
}

impl<V> IndexMut<Var> for VarMap<V> {
    fn index_mut(&mut self, var: Var) -> &mut Self::Output {
        &mut self.0[var.index()]
    }
}

/// One bit per entry, backed by [`BitVec`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BoolVec(BitVec);

impl BoolVec {
    #[must_use]
    pub fn new() -> Self {
        Self(BitVec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, value: bool) {
        self.0.push(value);
    }

    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        match self.0.get(idx) {
            Some(bit) => bit,
            None => panic!("index {idx} out of bounds for BoolVec of length {}", self.0.len()),
        }
    }

    pub fn set(&mut self, idx: usize, value: bool) {
        self.0.set(idx, value);
    }

    pub fn grow_to(&mut self, size: usize, pad: bool) {
        if self.0.len() < size {
            self.0.grow(size - self.0.len(), pad);
        }
    }

    pub fn clear(&mut self) {
        self.0.truncate(0);
    }

    /// Resets every bit to `false`, keeping the length.
    pub fn clear_bits(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(dimacs: &[i32]) -> PackedVec<Lit> {
        dimacs.iter().map(|&l| Lit::from_dimacs(l)).collect()
    }

    #[test]
    fn test_push_pop_get_set() {
        let mut v = lits(&[1, -2]);
        v.push(Lit::from_dimacs(3));
        assert_eq!(v.len(), 3);
        assert_eq!(v.get(1), Lit::from_dimacs(-2));

        v.set(1, Lit::from_dimacs(2));
        assert_eq!(v.get(1), Lit::from_dimacs(2));
        assert_eq!(v.pop(), Lit::from_dimacs(3));
        assert_eq!(v.last(), Lit::from_dimacs(2));
    }

    #[test]
    fn test_grow_and_shrink() {
        let mut v: PackedVec<u32> = PackedVec::new();
        v.grow_to(4, 7);
        assert_eq!(v.to_vec(), vec![7, 7, 7, 7]);

        v.grow_to(2, 0);
        assert_eq!(v.len(), 4);

        v.shrink(3);
        assert_eq!(v.to_vec(), vec![7]);
    }

    #[test]
    #[should_panic(expected = "pop on empty vector")]
    fn test_pop_empty_panics() {
        let mut v: PackedVec<Var> = PackedVec::new();
        let _ = v.pop();
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let v = lits(&[1]);
        let _ = v.get(1);
    }

    #[test]
    fn test_copy_and_move() {
        let mut a = lits(&[4, -1, 2]);
        let mut b = lits(&[9]);

        a.copy_to(&mut b);
        assert_eq!(a, b);

        let mut c = PackedVec::new();
        a.move_to(&mut c);
        assert!(a.is_empty());
        assert_eq!(c, b);
    }

    #[test]
    fn test_sort_orders_by_encoding() {
        let mut v = lits(&[3, -1, 1, -3]);
        v.sort();
        assert_eq!(v, lits(&[1, -1, 3, -3]));
    }

    #[test]
    fn test_lbool_round_trip_through_storage() {
        let v: PackedVec<Lbool> = [Lbool::Undef, Lbool::False, Lbool::True].into_iter().collect();
        assert_eq!(v.to_vec(), vec![Lbool::Undef, Lbool::False, Lbool::True]);
    }

    #[test]
    fn test_var_map_reserve() {
        let mut map: VarMap<f64> = VarMap::new();
        map.reserve(Var::new(2), 0.5);
        assert_eq!(map.len(), 3);
        map[Var::new(1)] = 2.0;
        assert!((map[Var::new(1)] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bool_vec() {
        let mut bits = BoolVec::new();
        bits.grow_to(10, false);
        bits.set(3, true);
        assert!(bits.get(3));
        assert!(!bits.get(4));

        bits.clear_bits();
        assert_eq!(bits.len(), 10);
        assert!(!bits.get(3));
    }
}
