//! Fuzzy c-Means with rewarded crisp memberships (Höppner & Klawonn).
//!
//! Standard FCM with `m = 2` penalizes crisp memberships: even an object sitting on a prototype
//! keeps some membership to every other one. This variant adds a reward for memberships close to
//! 0 or 1:
//!
//! ```text
//! J = Σ_j Σ_i u_ij² d_ij  -  Σ_j η_j Σ_i (u_ij - 1/2)²,      η_j = ω · min_i d_ij
//! ```
//!
//! The optimal memberships are those of FCM (`m = 2`) on the shifted distances `d_ij - η_j`:
//!
//! ```text
//! u_ij = (1 / (d_ij - η_j)) / Σ_k 1 / (d_kj - η_j)
//! ```
//!
//! With `ω = 0` this is plain FCM; with `ω = 1` the nearest prototype sits at shifted distance 0
//! and wins the object outright. With a noise cluster at squared distance `δ²`, the shift is
//! `ω · min(min_i d_ij, δ²)` so the noise cluster is shifted like any prototype.
//!
//! # References
//!
//! Höppner & Klawonn (2003). "Improved fuzzy partitions for fuzzy regression models."
//! International Journal of Approximate Reasoning 32.

use super::engine::{AoCore, IterationConfig, NoiseDistance};
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, NoiseClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};

const NAME: &str = "rewarding_crisp_fuzzy_c_means";

/// Fuzzy c-Means (`m = 2`) with a reward for crisp memberships.
#[derive(Debug, Clone)]
pub struct RewardingCrispFuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    distance_multiplier: f64,
    noise: Option<NoiseDistance>,
}

impl<'a, T, S> RewardingCrispFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Create an uninitialized instance. `ω` defaults to 0.5.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            distance_multiplier: 0.5,
            noise: None,
        })
    }

    /// Set `ω ∈ [0, 1]`, the fraction of the smallest squared distance subtracted from all.
    pub fn with_distance_multiplier(mut self, omega: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&omega) {
            return Err(invalid("distance_multiplier", "must be in [0, 1]"));
        }
        self.distance_multiplier = omega;
        Ok(self)
    }

    /// Add a noise cluster.
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

    /// Share `ω` of the smallest distance subtracted from every distance.
    pub fn distance_multiplier(&self) -> f64 {
        self.distance_multiplier
    }

    fn noise_sq(&self) -> Option<f64> {
        self.noise.map(|n| n.squared_at(self.core.last_iteration()))
    }
}

/// Shift `values` (squared distances) by `η` and compute memberships in place. Returns the noise
/// membership and `η`.
fn shifted_memberships(values: &mut [f64], omega: f64, noise_sq: Option<f64>) -> (f64, f64) {
    let nearest = values
        .iter()
        .copied()
        .chain(noise_sq)
        .fold(f64::INFINITY, f64::min);
    let eta = if nearest.is_finite() {
        omega * nearest
    } else {
        0.0
    };
    for v in values.iter_mut() {
        *v -= eta;
    }
    let noise = util::fcm_memberships(values, 2.0, noise_sq.map(|n| n - eta));
    (noise, eta)
}

fn memberships<T, S>(
    core: &AoCore<'_, T, S>,
    x: &T,
    u: &mut [f64],
    omega: f64,
    noise_sq: Option<f64>,
) -> f64
where
    S: VectorSpace<T> + Metric<T>,
{
    core.distances_sq_into(x, u);
    shifted_memberships(u, omega, noise_sq).0
}

impl<'a, T, S> PrototypeClustering<T> for RewardingCrispFuzzyCMeans<'a, T, S>
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
        let omega = self.distance_multiplier;
        let noise = self.noise;
        self.core.run(NAME, steps, |core| {
            let noise_sq = noise.map(|n| n.squared_at(core.iteration_count()));
            core.fuzzy_step(|c, x, u| memberships(c, x, u, omega, noise_sq), |u| u * u)
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
        let omega = self.distance_multiplier;
        let noise_sq = self.noise_sq();
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut u = vec![0.0; c];
        let mut objective = 0.0;
        for obj in self.core.data {
            self.core.distances_sq_into(&obj.x, &mut d);
            u.copy_from_slice(&d);
            let (noise_u, eta) = shifted_memberships(&mut u, omega, noise_sq);
            for (&ui, &di) in u.iter().zip(&d) {
                if di.is_finite() {
                    objective += ui * ui * di - eta * (ui - 0.5) * (ui - 0.5);
                }
            }
            if let Some(delta_sq) = noise_sq {
                objective += noise_u * noise_u * delta_sq - eta * (noise_u - 0.5) * (noise_u - 0.5);
            }
        }
        Ok(objective)
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        let (omega, noise_sq) = (self.distance_multiplier, self.noise_sq());
        self.core
            .crisp_assignments(|c, x, u| memberships(c, x, u, omega, noise_sq))
    }
}

impl<'a, T, S> FuzzyClustering<T> for RewardingCrispFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>> {
        let (omega, noise_sq) = (self.distance_multiplier, self.noise_sq());
        let (u, _) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, omega, noise_sq))?;
        Ok(u)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        let (omega, noise_sq) = (self.distance_multiplier, self.noise_sq());
        let (rows, _) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, omega, noise_sq))?;
        Ok(rows)
    }
}

impl<'a, T, S> NoiseClustering<T> for RewardingCrispFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn noise_membership_of(&self, x: &T) -> Result<f64> {
        let (omega, noise_sq) = (self.distance_multiplier, self.noise_sq());
        let (_, noise) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, omega, noise_sq))?;
        Ok(noise)
    }

    fn noise_memberships(&self) -> Result<Vec<f64>> {
        let (omega, noise_sq) = (self.distance_multiplier, self.noise_sq());
        let (_, noise) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, omega, noise_sq))?;
        Ok(noise)
    }
}
