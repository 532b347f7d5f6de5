use super::prototype::Centroid;
use crate::error::Result;

/// Crisp label of a data object that belongs to no cluster (noise, or no active prototype).
pub const UNASSIGNED: usize = usize::MAX;

/// Common interface of the alternating-optimization algorithms.
///
/// The lifecycle is: construct over a sealed data set, `initialize_with_*`, then any number of
/// `apply` calls. Every query reads the state left by the most recent `apply` (or by the
/// initialization, if `apply` has not run yet). All methods except the two initializers and the
/// counters fail with [`Error::NotInitialized`](crate::Error::NotInitialized) before the first
/// successful initialization.
pub trait PrototypeClustering<T> {
    /// Place one prototype at each of `positions`. Resets counters and history.
    fn initialize_with_positions(&mut self, positions: &[T]) -> Result<()>;

    /// Copy positions and activation flags from another algorithm's prototypes, e.g. to refine the
    /// result of a fast approximate run with an exact one. Resets counters and history.
    fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<T>]) -> Result<()>;

    /// Run at most `steps` iterations and return how many were run.
    ///
    /// Stops early once the largest squared prototype movement of an iteration drops below
    /// `epsilon²` (and the configured minimum iteration count has been reached).
    fn apply(&mut self, steps: usize) -> Result<usize>;

    /// Whether an `initialize_with_*` call has succeeded.
    fn is_initialized(&self) -> bool;

    /// Iterations completed since the last initialization.
    fn iteration_count(&self) -> usize;

    /// Largest squared prototype movement of every completed iteration, oldest first.
    fn convergence_history(&self) -> &[f64];

    /// All prototypes, including deactivated ones, in cluster-index order.
    fn prototypes(&self) -> Result<&[Centroid<T>]>;

    /// Copies of all prototype positions.
    fn prototype_positions(&self) -> Result<Vec<T>>
    where
        T: Clone,
    {
        Ok(self
            .prototypes()?
            .iter()
            .map(|p| p.position().clone())
            .collect())
    }

    /// Objective function value at the current prototype positions, recomputed from scratch.
    fn objective_function(&self) -> Result<f64>;

    /// One cluster index per data object, [`UNASSIGNED`] where no cluster applies.
    fn crisp_assignments(&self) -> Result<Vec<usize>>;
}

/// Algorithms that assign every data object a degree of membership to every prototype.
pub trait FuzzyClustering<T>: PrototypeClustering<T> {
    /// Membership vector of an arbitrary element, one entry per prototype.
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>>;

    /// Membership vectors of all data objects in ID order.
    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>>;

    /// Membership mass per prototype, summed over all data objects.
    fn membership_sums(&self) -> Result<Vec<f64>> {
        let assignments = self.fuzzy_assignments()?;
        let c = self.prototypes()?.len();
        let mut sums = vec![0.0; c];
        for row in &assignments {
            for (s, u) in sums.iter_mut().zip(row) {
                *s += u;
            }
        }
        Ok(sums)
    }
}

/// Fuzzy algorithms with a virtual noise cluster that absorbs part of the membership mass.
pub trait NoiseClustering<T>: FuzzyClustering<T> {
    /// Noise membership of an arbitrary element.
    fn noise_membership_of(&self, x: &T) -> Result<f64>;

    /// Noise memberships of all data objects in ID order.
    fn noise_memberships(&self) -> Result<Vec<f64>>;
}
