use std::{cmp::Ordering, ops::AddAssign};

use num::{Float, Num};

use super::ZeroSpVec;

impl<N> ZeroSpVec<N>
where
    N: Num + Copy,
{
    /// Dot product, merging both index lists.
    #[inline]
    pub fn dot<R>(&self, other: &Self) -> R
    where
        R: Num + AddAssign,
        N: Into<R>,
    {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Vectors must be of the same length to compute dot product."
        );
        let mut result = R::zero();
        let mut a = self.raw_iter().peekable();
        let mut b = other.raw_iter().peekable();
        while let (Some(&(ia, va)), Some(&(ib, vb))) = (a.peek(), b.peek()) {
            match ia.cmp(&ib) {
                Ordering::Equal => {
                    result += (*va).into() * (*vb).into();
                    a.next();
                    b.next();
                }
                Ordering::Less => {
                    a.next();
                }
                Ordering::Greater => {
                    b.next();
                }
            }
        }
        result
    }

    #[inline]
    pub fn norm_sq<R>(&self) -> R
    where
        R: Num + AddAssign + Copy,
        N: Into<R>,
    {
        let mut result = R::zero();
        for (_, &v) in self.raw_iter() {
            let v: R = v.into();
            result += v * v;
        }
        result
    }
}

impl<F> ZeroSpVec<F>
where
    F: Float + AddAssign,
{
    #[inline]
    pub fn norm(&self) -> F {
        self.norm_sq::<F>().sqrt()
    }

    /// Unit-length copy. The zero vector stays zero.
    pub fn l2_normalized(&self) -> Self {
        let norm = self.norm();
        if norm == F::zero() {
            return self.clone();
        }
        self.map_values(|_, v| v / norm)
    }

    /// cosθ = A・B / (|A||B|), zero when either side is the zero vector.
    pub fn cosine_similarity(&self, other: &Self) -> F {
        let denom = self.norm() * other.norm();
        if denom == F::zero() {
            return F::zero();
        }
        self.dot::<F>(other) / denom
    }
}
