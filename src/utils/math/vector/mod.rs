pub mod math;

use num::Num;
use serde::{Deserialize, Serialize};

/// ZeroSpVec is a sparse vector where zero is the implicit value.
/// It keeps `indices` and `values` side by side plus the logical length.
///
/// Indices are always kept in ascending order and unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZeroSpVec<N> {
    inds: Vec<usize>,
    vals: Vec<N>,
    len: usize,
}

impl<N> ZeroSpVec<N>
where
    N: Num + Copy,
{
    #[inline]
    pub fn new() -> Self {
        ZeroSpVec {
            inds: Vec::new(),
            vals: Vec::new(),
            len: 0,
        }
    }

    /// All-zero vector of logical length `len`.
    #[inline]
    pub fn zeros(len: usize) -> Self {
        ZeroSpVec {
            inds: Vec::new(),
            vals: Vec::new(),
            len,
        }
    }

    /// Build from `(index, value)` pairs. Repeated indices are summed,
    /// indices beyond `len` are ignored.
    pub fn from_pairs<I>(len: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, N)>,
    {
        let mut v = Self::zeros(len);
        for (idx, val) in pairs {
            v.add_at(idx, val);
        }
        v
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored (non-zero) elements.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inds.len()
    }

    /// Append one dimension, storing the value only when it is non-zero.
    #[inline]
    pub fn push(&mut self, elem: N) {
        if elem != N::zero() {
            self.inds.push(self.len);
            self.vals.push(elem);
        }
        self.len += 1;
    }

    /// Add `value` at `index`, keeping the indices sorted.
    pub fn add_at(&mut self, index: usize, value: N) {
        if index >= self.len || value == N::zero() {
            return;
        }
        match self.inds.binary_search(&index) {
            Ok(pos) => {
                let sum = self.vals[pos] + value;
                if sum == N::zero() {
                    self.inds.remove(pos);
                    self.vals.remove(pos);
                } else {
                    self.vals[pos] = sum;
                }
            }
            Err(pos) => {
                self.inds.insert(pos, index);
                self.vals.insert(pos, value);
            }
        }
    }

    /// Value at `index`; `None` when out of range, zero when not stored.
    #[inline]
    pub fn get(&self, index: usize) -> Option<N> {
        if index >= self.len {
            return None;
        }
        Some(match self.inds.binary_search(&index) {
            Ok(pos) => self.vals[pos],
            Err(_) => N::zero(),
        })
    }

    /// Iterate over stored `(index, value)` pairs in index order.
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, &N)> + '_ {
        self.inds.iter().copied().zip(self.vals.iter())
    }

    /// Apply `f` to every stored value, dropping the ones that become zero.
    pub fn map_values<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, N) -> N,
    {
        let mut out = Self::zeros(self.len);
        for (idx, &val) in self.raw_iter() {
            let v = f(idx, val);
            if v != N::zero() {
                out.inds.push(idx);
                out.vals.push(v);
            }
        }
        out
    }

    /// Dense copy, mainly for debugging and tests.
    pub fn to_dense(&self) -> Vec<N> {
        let mut dense = vec![N::zero(); self.len];
        for (idx, &val) in self.raw_iter() {
            dense[idx] = val;
        }
        dense
    }
}

impl<N> From<Vec<N>> for ZeroSpVec<N>
where
    N: Num + Copy,
{
    fn from(dense: Vec<N>) -> Self {
        let mut v = ZeroSpVec::new();
        for elem in dense {
            v.push(elem);
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_only_non_zero() {
        let v: ZeroSpVec<f64> = ZeroSpVec::from(vec![0.0, 2.0, 0.0, 3.0]);
        assert_eq!(v.len(), 4);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(1), Some(2.0));
        assert_eq!(v.get(2), Some(0.0));
        assert_eq!(v.get(4), None);
    }

    #[test]
    fn from_pairs_sums_and_sorts() {
        let v: ZeroSpVec<u32> = ZeroSpVec::from_pairs(5, [(3, 1), (0, 2), (3, 4), (9, 1)]);
        assert_eq!(v.to_dense(), vec![2, 0, 0, 5, 0]);
        let inds: Vec<usize> = v.raw_iter().map(|(i, _)| i).collect();
        assert_eq!(inds, vec![0, 3]);
    }
}
