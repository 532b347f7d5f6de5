//! Expectation-Maximization for mixtures of spherical Gaussians.
//!
//! Each component `i` is an isotropic normal distribution with mean `μ_i`, variance `σ_i²` per
//! coordinate and mixture weight `π_i`:
//!
//! ```text
//! p(x) = Σ_i π_i · (2π σ_i²)^{-D/2} · exp(-‖x - μ_i‖² / (2σ_i²))
//! ```
//!
//! - **E-step**: conditional probabilities `P(i | x_j)` by Bayes' rule, computed in log space with
//!   the log-sum-exp trick so that far-away components underflow to 0 instead of producing NaN.
//! - **M-step**: `π_i = Σ_j P(i|x_j) / n`, `μ_i` the probability-weighted mean,
//!   `σ_i² = Σ_j P(i|x_j) ‖x_j - μ_i‖² / (D · Σ_j P(i|x_j))` with the *new* mean.
//!
//! The objective is the log-likelihood `Σ_j ln p(x_j)`, which never decreases from one iteration
//! to the next (without damping and bounds). Variances are clamped into configurable bounds and
//! kept above a tiny floor, so a component collapsing onto a single object keeps a finite density.
//!
//! Unlike the fuzzy c-Means family this algorithm is fixed to `R^D`: the density needs the
//! dimension, and the variance update needs Euclidean geometry.
//!
//! # References
//!
//! Dempster, Laird & Rubin (1977). "Maximum likelihood from incomplete data via the EM algorithm."

use super::engine::{AoCore, IterationConfig};
use super::prototype::{Centroid, SphericalNormalDistributionPrototype};
use super::traits::{FuzzyClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, RealSpace, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Error, Result};

const NAME: &str = "spherical_gaussian_em";

/// Smallest variance a component can take, whatever the bounds say.
const MIN_VARIANCE: f64 = 1e-12;

/// EM clustering with spherical Gaussian components over `Vec<f64>`.
///
/// ```rust
/// use edmoal::cluster::{PrototypeClustering, SphericalGaussianEm};
/// use edmoal::data::IndexedDataSet;
///
/// let data = IndexedDataSet::from_elements(vec![
///     vec![0.0], vec![0.2], vec![-0.2], vec![5.0], vec![5.2], vec![4.8],
/// ]);
/// let mut em = SphericalGaussianEm::new(&data).unwrap();
/// em.initialize_with_positions(&[vec![1.0], vec![4.0]]).unwrap();
/// em.apply(100).unwrap();
///
/// let weights = em.mixture_weights().unwrap();
/// assert!((weights[0] - 0.5).abs() < 1e-6);
/// assert_eq!(em.crisp_assignments().unwrap(), vec![0, 0, 0, 1, 1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct SphericalGaussianEm<'a> {
    core: AoCore<'a, Vec<f64>, RealSpace>,
    variances: Vec<f64>,
    weights: Vec<f64>,
    /// `probabilities[j][i] = P(i | x_j)` for the current parameters.
    probabilities: Vec<Vec<f64>>,
    variance_lower: f64,
    variance_upper: f64,
}

impl<'a> SphericalGaussianEm<'a> {
    /// Create an uninitialized instance. All data vectors must have the same length.
    pub fn new(data: &'a IndexedDataSet<Vec<f64>>) -> Result<Self> {
        data.ensure_clusterable()?;
        let dim = data[0].x.len();
        if let Some(bad) = data.elements().find(|x| x.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: bad.len(),
            });
        }
        Ok(Self {
            core: AoCore::new(data, RealSpace::new(dim))?,
            variances: Vec::new(),
            weights: Vec::new(),
            probabilities: Vec::new(),
            variance_lower: 0.0,
            variance_upper: f64::INFINITY,
        })
    }

    /// Clamp every variance into `[lower, upper]`.
    pub fn with_variance_bounds(mut self, lower: f64, upper: f64) -> Result<Self> {
        if !(lower >= 0.0 && lower.is_finite()) {
            return Err(invalid("variance_lower_bound", "must be finite and non-negative"));
        }
        if !(upper >= lower) {
            return Err(invalid(
                "variance_upper_bound",
                "must not be smaller than the lower bound",
            ));
        }
        self.variance_lower = lower;
        self.variance_upper = upper;
        Ok(self)
    }

    /// Set the convergence threshold on mean movement.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        self.core.config = self.core.config.with_epsilon(epsilon)?;
        Ok(self)
    }

    /// Replace the whole iteration configuration.
    pub fn with_iteration_config(mut self, config: IterationConfig) -> Self {
        self.core.config = config;
        self
    }

    /// Number of coordinates of the data.
    pub fn dimension(&self) -> usize {
        self.core.space.dim()
    }

    /// Start from explicit components. Mixture weights start uniform over the active ones.
    pub fn initialize_with_gaussians(
        &mut self,
        gaussians: &[SphericalNormalDistributionPrototype<Vec<f64>>],
    ) -> Result<()> {
        for g in gaussians {
            self.check_dimension(g.position())?;
            if !(g.variance >= 0.0) {
                return Err(invalid("variance", "must be non-negative"));
            }
        }
        let centroids: Vec<Centroid<Vec<f64>>> =
            gaussians.iter().map(|g| g.centroid.clone()).collect();
        self.core.initialize_with_prototypes(&centroids)?;
        self.variances = gaussians
            .iter()
            .map(|g| self.clamp_variance(g.variance))
            .collect();
        self.finish_initialization();
        Ok(())
    }

    /// Current components: means, variances and activation.
    pub fn gaussians(&self) -> Result<Vec<SphericalNormalDistributionPrototype<Vec<f64>>>> {
        let prototypes = self.core.prototypes()?;
        Ok(prototypes
            .iter()
            .zip(&self.variances)
            .map(|(p, &variance)| SphericalNormalDistributionPrototype {
                centroid: p.clone(),
                variance,
            })
            .collect())
    }

    /// Mixture weights, 0 for deactivated components.
    pub fn mixture_weights(&self) -> Result<&[f64]> {
        self.core.ensure_initialized()?;
        Ok(&self.weights)
    }

    /// Conditional probabilities `P(i | x_j)`, one row per data object in ID order.
    pub fn conditional_probabilities(&self) -> Result<&[Vec<f64>]> {
        self.core.ensure_initialized()?;
        Ok(&self.probabilities)
    }

    fn check_dimension(&self, x: &[f64]) -> Result<()> {
        let expected = self.dimension();
        if x.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: x.len(),
            });
        }
        Ok(())
    }

    fn clamp_variance(&self, variance: f64) -> f64 {
        clamp_variance(variance, self.variance_lower, self.variance_upper)
    }

    /// Uniform weights, then an E-step so every query is valid right away.
    fn finish_initialization(&mut self) {
        let active = self.core.active_count().max(1) as f64;
        self.weights = self
            .core
            .prototypes
            .iter()
            .map(|p| if p.is_activated() { 1.0 / active } else { 0.0 })
            .collect();
        e_step(
            &self.core,
            &self.weights,
            &self.variances,
            &mut self.probabilities,
        );
    }

    /// Pooled variance `Σ_j min_i d_ij / (n · D)` used when only positions are given.
    fn pooled_variance(&self) -> f64 {
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut total = 0.0;
        for obj in self.core.data {
            self.core.distances_sq_into(&obj.x, &mut d);
            total += d.iter().copied().fold(f64::INFINITY, f64::min);
        }
        let n = self.core.data.len() as f64;
        self.clamp_variance(total / (n * self.dimension().max(1) as f64))
    }
}

fn clamp_variance(variance: f64, lower: f64, upper: f64) -> f64 {
    variance.clamp(lower, upper).max(MIN_VARIANCE)
}

fn log_density(distance_sq: f64, variance: f64, dim: f64) -> f64 {
    -0.5 * dim * (2.0 * std::f64::consts::PI * variance).ln() - distance_sq / (2.0 * variance)
}

/// Posterior probabilities of `x` into `out`. Returns `ln p(x)`.
fn posterior(
    core: &AoCore<'_, Vec<f64>, RealSpace>,
    weights: &[f64],
    variances: &[f64],
    x: &Vec<f64>,
    out: &mut [f64],
) -> f64 {
    let dim = core.space.dim() as f64;
    let mut max = f64::NEG_INFINITY;
    for (i, (p, o)) in core.prototypes.iter().zip(out.iter_mut()).enumerate() {
        *o = if p.is_activated() && weights[i] > 0.0 {
            weights[i].ln() + log_density(core.space.distance_sq(x, p.position()), variances[i], dim)
        } else {
            f64::NEG_INFINITY
        };
        max = max.max(*o);
    }
    if !max.is_finite() {
        out.fill(0.0);
        return f64::NEG_INFINITY;
    }
    let mut sum = 0.0;
    for o in out.iter_mut() {
        *o = (*o - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
    max + sum.ln()
}

/// Recompute all conditional probabilities. Returns the log-likelihood.
fn e_step(
    core: &AoCore<'_, Vec<f64>, RealSpace>,
    weights: &[f64],
    variances: &[f64],
    probabilities: &mut Vec<Vec<f64>>,
) -> f64 {
    let c = core.prototypes.len();
    probabilities.resize_with(core.data.len(), Vec::new);
    let mut log_likelihood = 0.0;
    for (obj, row) in core.data.iter().zip(probabilities.iter_mut()) {
        row.resize(c, 0.0);
        log_likelihood += posterior(core, weights, variances, &obj.x, row);
    }
    log_likelihood
}

/// Update weights, means and variances from the current probabilities. Returns the largest
/// squared mean movement.
fn m_step(
    core: &mut AoCore<'_, Vec<f64>, RealSpace>,
    weights: &mut [f64],
    variances: &mut [f64],
    probabilities: &[Vec<f64>],
    bounds: (f64, f64),
) -> f64 {
    let c = core.prototypes.len();
    let mut sums: Vec<Vec<f64>> = (0..c).map(|_| core.space.null_vector()).collect();
    let mut mass = vec![0.0; c];
    for (obj, row) in core.data.iter().zip(probabilities) {
        for i in 0..c {
            if row[i] > 0.0 {
                core.space.add_multiple(&mut sums[i], &obj.x, row[i]);
                mass[i] += row[i];
            }
        }
    }
    let movement = core.update_prototypes(sums, &mass);

    let n = core.data.len() as f64;
    let dim = core.space.dim().max(1) as f64;
    for i in 0..c {
        if !core.prototypes[i].is_activated() {
            continue;
        }
        weights[i] = mass[i] / n;
        if mass[i] <= 0.0 {
            continue;
        }
        let mean = core.prototypes[i].position();
        let spread: f64 = core
            .data
            .iter()
            .zip(probabilities)
            .map(|(obj, row)| row[i] * core.space.distance_sq(&obj.x, mean))
            .sum();
        variances[i] = clamp_variance(spread / (mass[i] * dim), bounds.0, bounds.1);
    }
    movement
}

impl<'a> PrototypeClustering<Vec<f64>> for SphericalGaussianEm<'a> {
    fn initialize_with_positions(&mut self, positions: &[Vec<f64>]) -> Result<()> {
        for p in positions {
            self.check_dimension(p)?;
        }
        self.core.initialize_with_positions(positions)?;
        let variance = self.pooled_variance();
        self.variances = vec![variance; positions.len()];
        self.finish_initialization();
        Ok(())
    }

    fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<Vec<f64>>]) -> Result<()> {
        for p in prototypes {
            self.check_dimension(p.position())?;
        }
        self.core.initialize_with_prototypes(prototypes)?;
        let variance = self.pooled_variance();
        self.variances = vec![variance; prototypes.len()];
        self.finish_initialization();
        Ok(())
    }

    fn apply(&mut self, steps: usize) -> Result<usize> {
        let bounds = (self.variance_lower, self.variance_upper);
        let weights = &mut self.weights;
        let variances = &mut self.variances;
        let probabilities = &mut self.probabilities;
        self.core.run(NAME, steps, |core| {
            let movement = m_step(core, weights, variances, probabilities, bounds);
            e_step(core, weights, variances, probabilities);
            movement
        })
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

    fn prototypes(&self) -> Result<&[Centroid<Vec<f64>>]> {
        self.core.prototypes()
    }

    /// Log-likelihood of the data under the current mixture.
    fn objective_function(&self) -> Result<f64> {
        self.core.ensure_initialized()?;
        let mut row = vec![0.0; self.core.prototypes.len()];
        Ok(self
            .core
            .data
            .iter()
            .map(|obj| posterior(&self.core, &self.weights, &self.variances, &obj.x, &mut row))
            .sum())
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        self.core.ensure_initialized()?;
        Ok(self
            .probabilities
            .iter()
            .map(|row| util::crisp_label(row, 0.0))
            .collect())
    }
}

impl<'a> FuzzyClustering<Vec<f64>> for SphericalGaussianEm<'a> {
    fn memberships_of(&self, x: &Vec<f64>) -> Result<Vec<f64>> {
        self.core.ensure_initialized()?;
        self.check_dimension(x)?;
        let mut row = vec![0.0; self.core.prototypes.len()];
        posterior(&self.core, &self.weights, &self.variances, x, &mut row);
        Ok(row)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        self.core.ensure_initialized()?;
        Ok(self.probabilities.clone())
    }
}
