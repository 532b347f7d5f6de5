//! Hard c-Means (Lloyd's algorithm over an arbitrary vector space).
//!
//! Each data object belongs to exactly one prototype, the nearest active one; each prototype then
//! moves to the plain mean of its objects.
//!
//! ```text
//! J = Σ_j d(x_j, p_{a(j)})²      a(j) = argmin_i d(x_j, p_i)
//! ```
//!
//! Unlike the fuzzy variants, convergence is decided on the partition, not on prototype movement:
//! `apply` stops as soon as an iteration reproduces the assignment of the iteration before it.
//! Ties go to the lower prototype index.

use super::engine::{AoCore, IterationConfig};
use super::prototype::Centroid;
use super::traits::{PrototypeClustering, UNASSIGNED};
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::Result;

const NAME: &str = "hard_c_means";

/// Crisp c-Means clustering.
#[derive(Debug, Clone)]
pub struct HardCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    /// Assignment found by the previous iteration; empty right after initialization.
    previous: Vec<usize>,
}

impl<'a, T, S> HardCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Create an uninitialized instance over a sealed data set.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            previous: Vec::new(),
        })
    }

    /// Replace the iteration configuration. Only the learning factor and the minimum iteration
    /// count apply; convergence is decided on the partition.
    pub fn with_iteration_config(mut self, config: IterationConfig) -> Self {
        self.core.config = config;
        self
    }

    /// Nearest active prototype and its squared distance.
    fn nearest(&self, x: &T) -> (usize, f64) {
        let mut best = (UNASSIGNED, f64::INFINITY);
        for (i, p) in self.core.prototypes.iter().enumerate() {
            if !p.is_activated() {
                continue;
            }
            let d = self.core.space.distance_sq(x, p.position());
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }
}

impl<'a, T, S> PrototypeClustering<T> for HardCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn initialize_with_positions(&mut self, positions: &[T]) -> Result<()> {
        self.core.initialize_with_positions(positions)?;
        self.previous.clear();
        Ok(())
    }

    fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<T>]) -> Result<()> {
        self.core.initialize_with_prototypes(prototypes)?;
        self.previous.clear();
        Ok(())
    }

    /// Runs until an iteration reproduces the previous iteration's assignment.
    ///
    /// Initialization forgets the previous assignment, so a fresh run takes at least two
    /// iterations even when the first one already lands on the optimum (a single object, say).
    /// A further `apply` on a converged state stops after one.
    fn apply(&mut self, steps: usize) -> Result<usize> {
        self.core.ensure_initialized()?;
        let c = self.core.prototypes.len();
        let min_iterations = self.core.config.min_iterations();
        let mut done = 0;
        let mut converged = false;

        while done < steps {
            let mut sums: Vec<T> = (0..c).map(|_| self.core.space.null_vector()).collect();
            let mut counts = vec![0.0; c];
            let mut labels = Vec::with_capacity(self.core.data.len());
            for obj in self.core.data {
                let (i, _) = self.nearest(&obj.x);
                if i != UNASSIGNED {
                    self.core.space.add(&mut sums[i], &obj.x);
                    counts[i] += 1.0;
                }
                labels.push(i);
            }
            let movement = self.core.update_prototypes(sums, &counts);
            let unchanged = labels == self.previous;
            self.previous = labels;

            done += 1;
            self.core.record_iteration(NAME, movement);
            if unchanged && done >= min_iterations {
                converged = true;
                break;
            }
        }
        self.core.log_finished(NAME, done, converged);
        Ok(done)
    }

    fn is_initialized(&self) -> bool {
        self.core.is_initialized()
    }

    fn iteration_count(&self) -> usize {
        self.core.iteration_count()
    }

    fn convergence_history(&self) -> &[f64] {
        self.core.history()
    }

    fn prototypes(&self) -> Result<&[Centroid<T>]> {
        self.core.prototypes()
    }

    fn objective_function(&self) -> Result<f64> {
        self.core.ensure_initialized()?;
        Ok(self
            .core
            .data
            .iter()
            .map(|obj| self.nearest(&obj.x).1)
            .filter(|d| d.is_finite())
            .sum())
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        self.core.ensure_initialized()?;
        Ok(self
            .core
            .data
            .iter()
            .map(|obj| self.nearest(&obj.x).0)
            .collect())
    }
}
