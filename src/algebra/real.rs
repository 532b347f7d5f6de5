use super::{Dimension, Metric, Norm, ScalarProduct, VectorSpace};

/// Euclidean space `R^dim` over `Vec<f64>`.
///
/// All operations assume both operands have length `dim`; this is only checked in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealSpace {
    dim: usize,
}

impl RealSpace {
    /// Create `R^dim`.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Number of coordinates.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl VectorSpace<Vec<f64>> for RealSpace {
    fn dimension(&self) -> Dimension {
        Dimension::Finite(self.dim)
    }

    fn null_vector(&self) -> Vec<f64> {
        vec![0.0; self.dim]
    }

    fn reset_to_null(&self, x: &mut Vec<f64>) {
        x.clear();
        x.resize(self.dim, 0.0);
    }

    fn copy(&self, target: &mut Vec<f64>, source: &Vec<f64>) {
        target.clear();
        target.extend_from_slice(source);
    }

    fn copy_new(&self, x: &Vec<f64>) -> Vec<f64> {
        x.clone()
    }

    fn add(&self, x: &mut Vec<f64>, y: &Vec<f64>) {
        debug_assert_eq!(x.len(), y.len());
        for (a, b) in x.iter_mut().zip(y) {
            *a += b;
        }
    }

    fn sub(&self, x: &mut Vec<f64>, y: &Vec<f64>) {
        debug_assert_eq!(x.len(), y.len());
        for (a, b) in x.iter_mut().zip(y) {
            *a -= b;
        }
    }

    fn invert(&self, x: &mut Vec<f64>) {
        for a in x.iter_mut() {
            *a = -*a;
        }
    }

    fn mul(&self, x: &mut Vec<f64>, a: f64) {
        for v in x.iter_mut() {
            *v *= a;
        }
    }

    fn add_multiple(&self, x: &mut Vec<f64>, y: &Vec<f64>, a: f64) {
        debug_assert_eq!(x.len(), y.len());
        for (v, w) in x.iter_mut().zip(y) {
            *v += a * w;
        }
    }
}

impl Metric<Vec<f64>> for RealSpace {
    #[inline]
    fn distance(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        self.distance_sq(x, y).sqrt()
    }

    #[inline]
    fn distance_sq(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        debug_assert_eq!(x.len(), y.len());
        x.iter()
            .zip(y.iter())
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum()
    }
}

impl Norm<Vec<f64>> for RealSpace {
    fn length(&self, x: &Vec<f64>) -> f64 {
        self.length_sq(x).sqrt()
    }

    fn length_sq(&self, x: &Vec<f64>) -> f64 {
        x.iter().map(|a| a * a).sum()
    }
}

impl ScalarProduct<Vec<f64>> for RealSpace {
    #[inline]
    fn scalar_product(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        debug_assert_eq!(x.len(), y.len());
        x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
    }
}
