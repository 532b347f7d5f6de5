//! Algebraic contracts the clustering engines are written against.
//!
//! Algorithms never look inside an element. Everything they do with a data object or a
//! prototype position goes through four small capabilities:
//!
//! - [`VectorSpace`]: null vector, in-place `add`/`sub`/`invert`/`mul`, allocating `*_new` variants
//! - [`Metric`]: `distance` and `distance_sq`
//! - [`Norm`]: `length` and `length_sq`
//! - [`ScalarProduct`]: `scalar_product`
//!
//! [`EuclideanVectorSpace`] is the conjunction of all four and is implemented automatically.
//!
//! ## Contract between the metric and the prototype update
//!
//! Every prototype update in [`crate::cluster`] is a weighted mean. That mean is the optimizer of
//! the clustering objective only if the squared distance `distance_sq(x, y)` has gradient
//! `2 (y - x)` in `y`. Nothing checks this; a metric that violates it still runs, it just
//! optimizes something else.
//!
//! ## In-place vs allocating
//!
//! In-place operations mutate their first argument, which the caller borrows exclusively for the
//! duration of the call. The `*_new` variants leave both operands untouched and return a fresh
//! value. Hot loops use the in-place forms.
//!
//! ```rust
//! use edmoal::algebra::{Metric, RealSpace, VectorSpace};
//!
//! let space = RealSpace::new(2);
//! let mut x = vec![1.0, 2.0];
//! space.add_multiple(&mut x, &vec![3.0, -1.0], 2.0);
//! assert_eq!(x, vec![7.0, 0.0]);
//! assert_eq!(space.distance_sq(&x, &vec![7.0, 1.0]), 1.0);
//! ```

mod list;
mod real;

pub use list::ListSpace;
pub use real::RealSpace;

/// Dimension of a vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// A finite number of coordinates.
    Finite(usize),
    /// Function spaces and the like.
    Infinite,
}

impl Dimension {
    /// The finite dimension, if any.
    pub fn finite(self) -> Option<usize> {
        match self {
            Dimension::Finite(d) => Some(d),
            Dimension::Infinite => None,
        }
    }
}

/// Real vector space over an opaque element type `T`.
pub trait VectorSpace<T> {
    /// Dimension of the space.
    fn dimension(&self) -> Dimension;

    /// A fresh additive identity.
    fn null_vector(&self) -> T;

    /// Overwrite `x` with the additive identity.
    fn reset_to_null(&self, x: &mut T);

    /// Overwrite `target` with the value of `source`.
    fn copy(&self, target: &mut T, source: &T);

    /// A fresh copy of `x`.
    fn copy_new(&self, x: &T) -> T;

    /// `x += y`
    fn add(&self, x: &mut T, y: &T);

    /// `x -= y`
    fn sub(&self, x: &mut T, y: &T);

    /// `x = -x`
    fn invert(&self, x: &mut T);

    /// `x *= a`
    fn mul(&self, x: &mut T, a: f64);

    /// `x += a * y`
    ///
    /// The default goes through a temporary; concrete spaces should override it because weighted
    /// sums are the inner loop of every prototype update.
    fn add_multiple(&self, x: &mut T, y: &T, a: f64) {
        let scaled = self.mul_new(y, a);
        self.add(x, &scaled);
    }

    /// `x + y`
    fn add_new(&self, x: &T, y: &T) -> T {
        let mut out = self.copy_new(x);
        self.add(&mut out, y);
        out
    }

    /// `x - y`
    fn sub_new(&self, x: &T, y: &T) -> T {
        let mut out = self.copy_new(x);
        self.sub(&mut out, y);
        out
    }

    /// `-x`
    fn invert_new(&self, x: &T) -> T {
        let mut out = self.copy_new(x);
        self.invert(&mut out);
        out
    }

    /// `a * x`
    fn mul_new(&self, x: &T, a: f64) -> T {
        let mut out = self.copy_new(x);
        self.mul(&mut out, a);
        out
    }
}

/// Distance function.
///
/// `distance_sq(x, y)` must equal `distance(x, y)^2`; it exists separately because the clustering
/// kernels work on squared distances and should not pay for a square root.
pub trait Metric<T> {
    /// Distance between `x` and `y`.
    fn distance(&self, x: &T, y: &T) -> f64;

    /// Squared distance between `x` and `y`.
    fn distance_sq(&self, x: &T, y: &T) -> f64;
}

/// Length of an element.
pub trait Norm<T> {
    /// Length of `x`.
    fn length(&self, x: &T) -> f64;

    /// Squared length of `x`.
    fn length_sq(&self, x: &T) -> f64;
}

/// Inner product.
///
/// When defined over the same space as a [`Metric`], `distance_sq(x, y)` equals
/// `scalar_product(x - y, x - y)`.
pub trait ScalarProduct<T> {
    /// Scalar product of `x` and `y`.
    fn scalar_product(&self, x: &T, y: &T) -> f64;
}

/// A vector space with a metric, a norm and a scalar product that agree with each other.
pub trait EuclideanVectorSpace<T>: VectorSpace<T> + Metric<T> + Norm<T> + ScalarProduct<T> {}

impl<T, S> EuclideanVectorSpace<T> for S where
    S: VectorSpace<T> + Metric<T> + Norm<T> + ScalarProduct<T> + ?Sized
{
}

impl<T, S: VectorSpace<T> + ?Sized> VectorSpace<T> for &S {
    fn dimension(&self) -> Dimension {
        (**self).dimension()
    }
    fn null_vector(&self) -> T {
        (**self).null_vector()
    }
    fn reset_to_null(&self, x: &mut T) {
        (**self).reset_to_null(x)
    }
    fn copy(&self, target: &mut T, source: &T) {
        (**self).copy(target, source)
    }
    fn copy_new(&self, x: &T) -> T {
        (**self).copy_new(x)
    }
    fn add(&self, x: &mut T, y: &T) {
        (**self).add(x, y)
    }
    fn sub(&self, x: &mut T, y: &T) {
        (**self).sub(x, y)
    }
    fn invert(&self, x: &mut T) {
        (**self).invert(x)
    }
    fn mul(&self, x: &mut T, a: f64) {
        (**self).mul(x, a)
    }
    fn add_multiple(&self, x: &mut T, y: &T, a: f64) {
        (**self).add_multiple(x, y, a)
    }
    fn add_new(&self, x: &T, y: &T) -> T {
        (**self).add_new(x, y)
    }
    fn sub_new(&self, x: &T, y: &T) -> T {
        (**self).sub_new(x, y)
    }
    fn invert_new(&self, x: &T) -> T {
        (**self).invert_new(x)
    }
    fn mul_new(&self, x: &T, a: f64) -> T {
        (**self).mul_new(x, a)
    }
}

impl<T, S: Metric<T> + ?Sized> Metric<T> for &S {
    fn distance(&self, x: &T, y: &T) -> f64 {
        (**self).distance(x, y)
    }
    fn distance_sq(&self, x: &T, y: &T) -> f64 {
        (**self).distance_sq(x, y)
    }
}

impl<T, S: Norm<T> + ?Sized> Norm<T> for &S {
    fn length(&self, x: &T) -> f64 {
        (**self).length(x)
    }
    fn length_sq(&self, x: &T) -> f64 {
        (**self).length_sq(x)
    }
}

impl<T, S: ScalarProduct<T> + ?Sized> ScalarProduct<T> for &S {
    fn scalar_product(&self, x: &T, y: &T) -> f64 {
        (**self).scalar_product(x, y)
    }
}
