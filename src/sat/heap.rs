#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Binary heap of variables ordered by decreasing activity.
//!
//! The heap does not own the activities; every operation that compares
//! entries borrows the activity table. After bumping a variable's activity
//! the caller restores the heap property with [`VarOrderHeap::decrease`].

use crate::sat::literal::Var;
use crate::sat::vec::VarMap;

#[derive(Debug, Clone, Default)]
pub struct VarOrderHeap {
    heap: Vec<Var>,
    indices: VarMap<Option<usize>>,
}

const fn parent(i: usize) -> usize {
    (i - 1) >> 1
}

const fn left(i: usize) -> usize {
    i * 2 + 1
}

const fn right(i: usize) -> usize {
    (i + 1) * 2
}

impl VarOrderHeap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: Vec::new(),
            indices: VarMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub fn in_heap(&self, var: Var) -> bool {
        var.index() < self.indices.len() && self.indices[var].is_some()
    }

    /// The entry at heap position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Var {
        self.heap[i]
    }

    fn position(&self, var: Var) -> usize {
        match self.indices[var] {
            Some(i) => i,
            None => panic!("{var:?} is not in the heap"),
        }
    }

    fn percolate_up(&mut self, mut i: usize, act: &VarMap<f64>) {
        let var = self.heap[i];
        while i != 0 {
            let p = parent(i);
            let up = self.heap[p];
            if act[var] <= act[up] {
                break;
            }
            self.heap[i] = up;
            self.indices[up] = Some(i);
            i = p;
        }
        self.heap[i] = var;
        self.indices[var] = Some(i);
    }

    fn percolate_down(&mut self, mut i: usize, act: &VarMap<f64>) {
        let var = self.heap[i];
        while left(i) < self.heap.len() {
            let l = left(i);
            let r = right(i);
            let child = if r < self.heap.len() && act[self.heap[r]] > act[self.heap[l]] {
                r
            } else {
                l
            };
            let down = self.heap[child];
            if act[down] <= act[var] {
                break;
            }
            self.heap[i] = down;
            self.indices[down] = Some(i);
            i = child;
        }
        self.heap[i] = var;
        self.indices[var] = Some(i);
    }

    /// # Panics
    ///
    /// Panics if `var` is already in the heap.
    pub fn insert(&mut self, var: Var, act: &VarMap<f64>) {
        self.indices.reserve(var, None);
        assert!(!self.in_heap(var), "{var:?} is already in the heap");

        self.indices[var] = Some(self.heap.len());
        self.heap.push(var);
        self.percolate_up(self.heap.len() - 1, act);
    }

    /// Restores the order after the activity of `var` went up.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not in the heap.
    pub fn decrease(&mut self, var: Var, act: &VarMap<f64>) {
        let i = self.position(var);
        self.percolate_up(i, act);
    }

    /// Restores the order after the activity of `var` went down.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not in the heap.
    pub fn increase(&mut self, var: Var, act: &VarMap<f64>) {
        let i = self.position(var);
        self.percolate_down(i, act);
    }

    /// Inserts `var`, or fixes its position if it is already present.
    pub fn update(&mut self, var: Var, act: &VarMap<f64>) {
        if self.in_heap(var) {
            let i = self.position(var);
            self.percolate_up(i, act);
            let i = self.position(var);
            self.percolate_down(i, act);
        } else {
            self.insert(var, act);
        }
    }

    /// Pops the variable with the highest activity.
    ///
    /// # Panics
    ///
    /// Panics if the heap is empty.
    pub fn remove_min(&mut self, act: &VarMap<f64>) -> Var {
        let top = self.heap.swap_remove(0);
        self.indices[top] = None;
        if let Some(&first) = self.heap.first() {
            self.indices[first] = Some(0);
            if self.heap.len() > 1 {
                self.percolate_down(0, act);
            }
        }
        top
    }

    /// Replaces the content with `vars` and heapifies in one pass.
    pub fn build(&mut self, vars: &[Var], act: &VarMap<f64>) {
        for &var in &self.heap {
            self.indices[var] = None;
        }
        self.heap.clear();

        for (i, &var) in vars.iter().enumerate() {
            self.indices.reserve(var, None);
            self.indices[var] = Some(i);
            self.heap.push(var);
        }
        for i in (0..self.heap.len() / 2).rev() {
            self.percolate_down(i, act);
        }
    }

    pub fn clear(&mut self) {
        for &var in &self.heap {
            self.indices[var] = None;
        }
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activities(values: &[f64]) -> VarMap<f64> {
        let mut act = VarMap::new();
        for &v in values {
            act.push(v);
        }
        act
    }

    fn drain(heap: &mut VarOrderHeap, act: &VarMap<f64>) -> Vec<u32> {
        let mut out = Vec::new();
        while !heap.is_empty() {
            out.push(heap.remove_min(act).idx());
        }
        out
    }

    #[test]
    fn test_remove_min_returns_highest_activity() {
        let act = activities(&[1.0, 5.0, 3.0, 4.0, 2.0]);
        let mut heap = VarOrderHeap::new();
        for i in 0..5 {
            heap.insert(Var::new(i), &act);
        }
        assert_eq!(drain(&mut heap, &act), vec![1, 3, 2, 4, 0]);
    }

    #[test]
    fn test_decrease_after_bump() {
        let mut act = activities(&[1.0, 2.0, 3.0]);
        let mut heap = VarOrderHeap::new();
        for i in 0..3 {
            heap.insert(Var::new(i), &act);
        }

        act[Var::new(0)] = 10.0;
        heap.decrease(Var::new(0), &act);
        assert_eq!(heap.remove_min(&act), Var::new(0));
        assert!(!heap.in_heap(Var::new(0)));
        assert!(heap.in_heap(Var::new(2)));
    }

    #[test]
    fn test_increase_after_drop() {
        let mut act = activities(&[5.0, 2.0, 3.0]);
        let mut heap = VarOrderHeap::new();
        for i in 0..3 {
            heap.insert(Var::new(i), &act);
        }

        act[Var::new(0)] = 0.0;
        heap.increase(Var::new(0), &act);
        assert_eq!(drain(&mut heap, &act), vec![2, 1, 0]);
    }

    #[test]
    fn test_update_inserts_missing() {
        let act = activities(&[1.0, 2.0]);
        let mut heap = VarOrderHeap::new();
        heap.update(Var::new(1), &act);
        heap.update(Var::new(1), &act);
        heap.update(Var::new(0), &act);
        assert_eq!(heap.len(), 2);
        assert_eq!(drain(&mut heap, &act), vec![1, 0]);
    }

    #[test]
    fn test_build() {
        let act = activities(&[0.5, 9.0, 3.0, 7.0]);
        let mut heap = VarOrderHeap::new();
        heap.insert(Var::new(0), &act);

        heap.build(&[Var::new(1), Var::new(2), Var::new(3)], &act);
        assert!(!heap.in_heap(Var::new(0)));
        assert_eq!(drain(&mut heap, &act), vec![1, 3, 2]);
    }

    #[test]
    #[should_panic(expected = "is not in the heap")]
    fn test_decrease_missing_panics() {
        let act = activities(&[1.0, 2.0]);
        let mut heap = VarOrderHeap::new();
        heap.insert(Var::new(1), &act);
        heap.decrease(Var::new(0), &act);
    }
}
