//! Fuzzy c-Means with a polynomial fuzzifier function (Klawonn & Höppner).
//!
//! Standard FCM raises memberships to a power `m`, which gives every prototype a strictly positive
//! membership for every object. Replacing `u^m` by
//!
//! ```text
//! g(u) = (1-β)/(1+β) · u² + 2β/(1+β) · u,      β ∈ [0, 1]
//! ```
//!
//! restores crisp boundaries: an object only has membership to its `ĉ` nearest prototypes, all
//! others get exactly 0. `β = 0` coincides with FCM at `m = 2`; `β = 1` is Hard c-Means.
//!
//! Computing `ĉ` requires sorting the prototypes by distance, so the E-step costs
//! `O(c log c)` per object.
//!
//! # References
//!
//! Klawonn & Höppner (2003). "What is fuzzy about fuzzy clustering? Understanding and improving
//! the concept of the fuzzifier." IDA 2003.

use super::engine::{AoCore, IterationConfig, NoiseDistance};
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, NoiseClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};

const NAME: &str = "polynomial_fuzzy_c_means";

/// Fuzzy c-Means with the polynomial fuzzifier `g(u)`.
#[derive(Debug, Clone)]
pub struct PolynomialFuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    beta: f64,
    noise: Option<NoiseDistance>,
}

impl<'a, T, S> PolynomialFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Create an uninitialized instance over a sealed data set. `β` defaults to 0.5.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            beta: 0.5,
            noise: None,
        })
    }

    /// Set `β ∈ [0, 1]`.
    pub fn with_beta(mut self, beta: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&beta) {
            return Err(invalid("beta", "must be in [0, 1]"));
        }
        self.beta = beta;
        Ok(self)
    }

    /// Add a noise cluster. It takes part in the sorting like any other prototype.
    pub fn with_noise(mut self, noise: NoiseDistance) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Set the convergence threshold on prototype movement.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        self.core.config = self.core.config.with_epsilon(epsilon)?;
        Ok(self)
    }

    /// Replace the whole iteration configuration.
    pub fn with_iteration_config(mut self, config: IterationConfig) -> Self {
        self.core.config = config;
        self
    }

    /// The polynomial fuzzifier parameter.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    fn noise_sq(&self) -> Option<f64> {
        self.noise.map(|n| n.squared_at(self.core.last_iteration()))
    }
}

fn memberships<T, S>(
    core: &AoCore<'_, T, S>,
    x: &T,
    u: &mut [f64],
    beta: f64,
    noise_sq: Option<f64>,
) -> f64
where
    S: VectorSpace<T> + Metric<T>,
{
    core.distances_sq_into(x, u);
    util::polynomial_memberships(u, beta, noise_sq)
}

impl<'a, T, S> PrototypeClustering<T> for PolynomialFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn initialize_with_positions(&mut self, positions: &[T]) -> Result<()> {
        self.core.initialize_with_positions(positions)
    }

    fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<T>]) -> Result<()> {
        self.core.initialize_with_prototypes(prototypes)
    }

    fn apply(&mut self, steps: usize) -> Result<usize> {
        let beta = self.beta;
        let noise = self.noise;
        self.core.run(NAME, steps, |core| {
            let noise_sq = noise.map(|n| n.squared_at(core.iteration_count()));
            core.fuzzy_step(
                |c, x, u| memberships(c, x, u, beta, noise_sq),
                |u| util::polynomial_fuzzifier(u, beta),
            )
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

    fn prototypes(&self) -> Result<&[Centroid<T>]> {
        self.core.prototypes()
    }

    fn objective_function(&self) -> Result<f64> {
        self.core.ensure_initialized()?;
        let beta = self.beta;
        let noise_sq = self.noise_sq();
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut u = vec![0.0; c];
        let mut objective = 0.0;
        for obj in self.core.data {
            self.core.distances_sq_into(&obj.x, &mut d);
            u.copy_from_slice(&d);
            let noise_u = util::polynomial_memberships(&mut u, beta, noise_sq);
            for (&ui, &di) in u.iter().zip(&d) {
                if ui > 0.0 {
                    objective += util::polynomial_fuzzifier(ui, beta) * di;
                }
            }
            if let Some(delta_sq) = noise_sq {
                objective += util::polynomial_fuzzifier(noise_u, beta) * delta_sq;
            }
        }
        Ok(objective)
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        let (beta, noise_sq) = (self.beta, self.noise_sq());
        self.core
            .crisp_assignments(|c, x, u| memberships(c, x, u, beta, noise_sq))
    }
}

impl<'a, T, S> FuzzyClustering<T> for PolynomialFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>> {
        let (beta, noise_sq) = (self.beta, self.noise_sq());
        let (u, _) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, beta, noise_sq))?;
        Ok(u)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        let (beta, noise_sq) = (self.beta, self.noise_sq());
        let (rows, _) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, beta, noise_sq))?;
        Ok(rows)
    }
}

impl<'a, T, S> NoiseClustering<T> for PolynomialFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn noise_membership_of(&self, x: &T) -> Result<f64> {
        let (beta, noise_sq) = (self.beta, self.noise_sq());
        let (_, noise) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, beta, noise_sq))?;
        Ok(noise)
    }

    fn noise_memberships(&self) -> Result<Vec<f64>> {
        let (beta, noise_sq) = (self.beta, self.noise_sq());
        let (_, noise) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, beta, noise_sq))?;
        Ok(noise)
    }
}
