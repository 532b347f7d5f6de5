//! Lifting an algebra over `E` to fixed-length lists `Vec<E>`.
//!
//! Objects are combined element by element. Scalars are the **sum** of the element-wise base
//! scalars, for distances as well: `distance(xs, ys) = Σ base.distance(xs[i], ys[i])`, and
//! `distance_sq(xs, ys) = Σ base.distance_sq(xs[i], ys[i])`. The squared form is the one the
//! clustering kernels use, so the weighted-mean prototype update stays correct for the lifted
//! space whenever it is correct for the base.
//!
//! Every list handed to a `ListSpace` must have exactly `len` elements. Shorter lists are a
//! caller bug and index out of bounds.

use super::{Dimension, Metric, Norm, ScalarProduct, VectorSpace};

/// Algebra over `Vec<E>` of fixed length, built from an algebra `S` over `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpace<S> {
    base: S,
    len: usize,
}

impl<S> ListSpace<S> {
    /// Lift `base` to lists of exactly `len` elements.
    pub fn new(base: S, len: usize) -> Self {
        Self { base, len }
    }

    /// The element algebra.
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Required list length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the lifted lists are empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<E, S: VectorSpace<E>> VectorSpace<Vec<E>> for ListSpace<S> {
    fn dimension(&self) -> Dimension {
        match self.base.dimension() {
            Dimension::Finite(d) => Dimension::Finite(d * self.len),
            Dimension::Infinite => Dimension::Infinite,
        }
    }

    fn null_vector(&self) -> Vec<E> {
        (0..self.len).map(|_| self.base.null_vector()).collect()
    }

    fn reset_to_null(&self, x: &mut Vec<E>) {
        for i in 0..self.len {
            self.base.reset_to_null(&mut x[i]);
        }
    }

    fn copy(&self, target: &mut Vec<E>, source: &Vec<E>) {
        for i in 0..self.len {
            self.base.copy(&mut target[i], &source[i]);
        }
    }

    fn copy_new(&self, x: &Vec<E>) -> Vec<E> {
        (0..self.len).map(|i| self.base.copy_new(&x[i])).collect()
    }

    fn add(&self, x: &mut Vec<E>, y: &Vec<E>) {
        for i in 0..self.len {
            self.base.add(&mut x[i], &y[i]);
        }
    }

    fn sub(&self, x: &mut Vec<E>, y: &Vec<E>) {
        for i in 0..self.len {
            self.base.sub(&mut x[i], &y[i]);
        }
    }

    fn invert(&self, x: &mut Vec<E>) {
        for i in 0..self.len {
            self.base.invert(&mut x[i]);
        }
    }

    fn mul(&self, x: &mut Vec<E>, a: f64) {
        for i in 0..self.len {
            self.base.mul(&mut x[i], a);
        }
    }

    fn add_multiple(&self, x: &mut Vec<E>, y: &Vec<E>, a: f64) {
        for i in 0..self.len {
            self.base.add_multiple(&mut x[i], &y[i], a);
        }
    }
}

impl<E, S: Metric<E>> Metric<Vec<E>> for ListSpace<S> {
    fn distance(&self, x: &Vec<E>, y: &Vec<E>) -> f64 {
        (0..self.len).map(|i| self.base.distance(&x[i], &y[i])).sum()
    }

    fn distance_sq(&self, x: &Vec<E>, y: &Vec<E>) -> f64 {
        (0..self.len).map(|i| self.base.distance_sq(&x[i], &y[i])).sum()
    }
}

impl<E, S: Norm<E>> Norm<Vec<E>> for ListSpace<S> {
    fn length(&self, x: &Vec<E>) -> f64 {
        (0..self.len).map(|i| self.base.length(&x[i])).sum()
    }

    fn length_sq(&self, x: &Vec<E>) -> f64 {
        (0..self.len).map(|i| self.base.length_sq(&x[i])).sum()
    }
}

impl<E, S: ScalarProduct<E>> ScalarProduct<Vec<E>> for ListSpace<S> {
    fn scalar_product(&self, x: &Vec<E>, y: &Vec<E>) -> f64 {
        (0..self.len)
            .map(|i| self.base.scalar_product(&x[i], &y[i]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;

    fn pairs() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            vec![vec![3.0, 4.0], vec![1.0, 2.0]],
        )
    }

    #[test]
    fn scalars_are_summed() {
        let s = ListSpace::new(RealSpace::new(2), 2);
        let (x, y) = pairs();
        assert_eq!(s.distance(&x, &y), 5.0 + 1.0);
        assert_eq!(s.distance_sq(&x, &y), 25.0 + 1.0);
        assert_eq!(s.scalar_product(&x, &y), 0.0 + 3.0);
        assert_eq!(s.length_sq(&y), 25.0 + 5.0);
    }

    #[test]
    fn objects_are_element_wise() {
        let s = ListSpace::new(RealSpace::new(2), 2);
        let (x, y) = pairs();
        let mut z = s.copy_new(&x);
        s.add_multiple(&mut z, &y, 2.0);
        assert_eq!(z, vec![vec![6.0, 8.0], vec![3.0, 5.0]]);
        s.reset_to_null(&mut z);
        assert_eq!(z, s.null_vector());
        assert_eq!(s.dimension(), Dimension::Finite(4));
    }

    #[test]
    fn lists_of_lists() {
        let inner = ListSpace::new(RealSpace::new(1), 2);
        let outer = ListSpace::new(inner, 2);
        let x = vec![vec![vec![0.0], vec![1.0]], vec![vec![2.0], vec![3.0]]];
        let y = outer.null_vector();
        assert_eq!(outer.distance_sq(&x, &y), 0.0 + 1.0 + 4.0 + 9.0);
        assert_eq!(outer.dimension(), Dimension::Finite(4));
    }
}
