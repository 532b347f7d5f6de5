//! Distance-adapted Fuzzy c-Means with prototype merging and removal.
//!
//! FCM assumes every cluster has the same extent. This variant measures, once per iteration, how
//! far the data lies from each prototype and shrinks that prototype's squared distances by
//!
//! ```text
//! r_i = max(0, mean_j d(x_j, p_i) - k · std_j d(x_j, p_i))
//! d'_ij = max(0, d_ij - r_i²)
//! ```
//!
//! before applying the standard FCM kernel. Objects inside the radius `r_i` end up at distance 0
//! and are split by the zero-distance rule among all prototypes that cover them.
//!
//! After each `apply` call the prototype set can be reduced without resizing anything:
//!
//! - **merging**: of two active prototypes closer than the merging distance, the one with the
//!   smaller membership mass is deactivated;
//! - **removal**: active prototypes with a membership mass below the removal threshold are
//!   deactivated.
//!
//! At least one prototype always stays active.

use tracing::debug;

use super::engine::{AoCore, IterationConfig};
use super::fcm::validate_fuzzifier;
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};

const NAME: &str = "distance_adapted_fuzzy_c_means";

/// Fuzzy c-Means on distances reduced by a per-prototype radius.
#[derive(Debug, Clone)]
pub struct DistanceAdaptedFuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    fuzzifier: f64,
    spread_factor: f64,
    merging_distance: Option<f64>,
    removal_threshold: Option<f64>,
}

impl<'a, T, S> DistanceAdaptedFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Create an uninitialized instance. Fuzzifier 2, spread factor 1, no merging, no removal.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            fuzzifier: 2.0,
            spread_factor: 1.0,
            merging_distance: None,
            removal_threshold: None,
        })
    }

    /// Set the fuzzifier `m > 1`.
    pub fn with_fuzzifier(mut self, fuzzifier: f64) -> Result<Self> {
        self.fuzzifier = validate_fuzzifier(fuzzifier)?;
        Ok(self)
    }

    /// Set `k`, the number of standard deviations subtracted from the mean distance.
    pub fn with_spread_factor(mut self, k: f64) -> Result<Self> {
        if !(k >= 0.0 && k.is_finite()) {
            return Err(invalid("spread_factor", "must be finite and non-negative"));
        }
        self.spread_factor = k;
        Ok(self)
    }

    /// Merge prototypes closer than `distance` after every `apply`.
    pub fn with_merging_distance(mut self, distance: f64) -> Result<Self> {
        if !(distance >= 0.0) {
            return Err(invalid("merging_distance", "must be non-negative"));
        }
        self.merging_distance = Some(distance);
        Ok(self)
    }

    /// Deactivate prototypes whose membership mass drops below `threshold` after every `apply`.
    pub fn with_removal_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(threshold >= 0.0) {
            return Err(invalid("removal_threshold", "must be non-negative"));
        }
        self.removal_threshold = Some(threshold);
        Ok(self)
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

    /// The fuzzifier.
    pub fn fuzzifier(&self) -> f64 {
        self.fuzzifier
    }

    /// Multiple of the standard deviation subtracted from the mean distance.
    pub fn spread_factor(&self) -> f64 {
        self.spread_factor
    }

    /// Squared radius subtracted from each prototype's squared distances at the current
    /// positions; 0 for deactivated prototypes.
    pub fn distance_offsets(&self) -> Result<Vec<f64>> {
        self.core.ensure_initialized()?;
        Ok(offsets(&self.core, self.spread_factor))
    }

    fn merge(&mut self, distance: f64, mass: &[f64]) {
        let c = self.core.prototypes.len();
        for i in 0..c {
            for j in (i + 1)..c {
                let (pi, pj) = (&self.core.prototypes[i], &self.core.prototypes[j]);
                if !pi.is_activated() || !pj.is_activated() {
                    continue;
                }
                if self.core.space.distance(pi.position(), pj.position()) >= distance {
                    continue;
                }
                let loser = if mass[j] > mass[i] { i } else { j };
                debug!(
                    algorithm = NAME,
                    kept = i + j - loser,
                    deactivated = loser,
                    "merging prototypes"
                );
                self.core.prototypes[loser].deactivate();
            }
        }
    }

    fn remove(&mut self, threshold: f64, mass: &[f64]) {
        let keep = self
            .core
            .prototypes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_activated())
            .map(|(i, _)| i)
            .fold(None, |best: Option<usize>, i| match best {
                Some(b) if mass[b] >= mass[i] => Some(b),
                _ => Some(i),
            });
        for (i, p) in self.core.prototypes.iter_mut().enumerate() {
            if p.is_activated() && mass[i] < threshold && Some(i) != keep {
                debug!(algorithm = NAME, prototype = i, mass = mass[i], "removing prototype");
                p.deactivate();
            }
        }
    }

    fn membership_mass(&self) -> Vec<f64> {
        let (m, k) = (self.fuzzifier, self.spread_factor);
        let offsets = offsets(&self.core, k);
        let c = self.core.prototypes.len();
        let mut mass = vec![0.0; c];
        let mut u = vec![0.0; c];
        for obj in self.core.data {
            memberships(&self.core, &obj.x, &mut u, m, &offsets);
            for (s, ui) in mass.iter_mut().zip(&u) {
                *s += ui;
            }
        }
        mass
    }
}

/// Per-prototype squared radius `max(0, mean - k·std)²` over all data objects.
fn offsets<T, S>(core: &AoCore<'_, T, S>, k: f64) -> Vec<f64>
where
    S: VectorSpace<T> + Metric<T>,
{
    core.prototypes
        .iter()
        .map(|p| {
            if !p.is_activated() {
                return 0.0;
            }
            let (mean, std) = util::mean_and_std(
                core.data
                    .elements()
                    .map(|x| core.space.distance(x, p.position())),
            );
            let radius = (mean - k * std).max(0.0);
            radius * radius
        })
        .collect()
}

fn adapted_distances<T, S>(core: &AoCore<'_, T, S>, x: &T, out: &mut [f64], offsets: &[f64])
where
    S: VectorSpace<T> + Metric<T>,
{
    core.distances_sq_into(x, out);
    for (d, r) in out.iter_mut().zip(offsets) {
        *d = (*d - r).max(0.0);
    }
}

fn memberships<T, S>(
    core: &AoCore<'_, T, S>,
    x: &T,
    u: &mut [f64],
    fuzzifier: f64,
    offsets: &[f64],
) -> f64
where
    S: VectorSpace<T> + Metric<T>,
{
    adapted_distances(core, x, u, offsets);
    util::fcm_memberships(u, fuzzifier, None)
}

impl<'a, T, S> PrototypeClustering<T> for DistanceAdaptedFuzzyCMeans<'a, T, S>
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
        let (m, k) = (self.fuzzifier, self.spread_factor);
        let done = self.core.run(NAME, steps, |core| {
            let offsets = offsets(core, k);
            core.fuzzy_step(|c, x, u| memberships(c, x, u, m, &offsets), |u| u.powf(m))
        })?;

        if self.merging_distance.is_some() || self.removal_threshold.is_some() {
            if let Some(distance) = self.merging_distance {
                let mass = self.membership_mass();
                self.merge(distance, &mass);
            }
            if let Some(threshold) = self.removal_threshold {
                let mass = self.membership_mass();
                self.remove(threshold, &mass);
            }
        }
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
        let m = self.fuzzifier;
        let offsets = offsets(&self.core, self.spread_factor);
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut u = vec![0.0; c];
        let mut objective = 0.0;
        for obj in self.core.data {
            adapted_distances(&self.core, &obj.x, &mut d, &offsets);
            u.copy_from_slice(&d);
            util::fcm_memberships(&mut u, m, None);
            for (&ui, &di) in u.iter().zip(&d) {
                if ui > 0.0 {
                    objective += ui.powf(m) * di;
                }
            }
        }
        Ok(objective)
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        self.core.ensure_initialized()?;
        let m = self.fuzzifier;
        let offsets = offsets(&self.core, self.spread_factor);
        self.core
            .crisp_assignments(|c, x, u| memberships(c, x, u, m, &offsets))
    }
}

impl<'a, T, S> FuzzyClustering<T> for DistanceAdaptedFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>> {
        self.core.ensure_initialized()?;
        let m = self.fuzzifier;
        let offsets = offsets(&self.core, self.spread_factor);
        let (u, _) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, m, &offsets))?;
        Ok(u)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        self.core.ensure_initialized()?;
        let m = self.fuzzifier;
        let offsets = offsets(&self.core, self.spread_factor);
        let (rows, _) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, m, &offsets))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;

    fn two_groups() -> IndexedDataSet<Vec<f64>> {
        IndexedDataSet::from_elements(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![10.0, 10.0],
            vec![11.0, 10.0],
            vec![10.0, 11.0],
            vec![11.0, 11.0],
        ])
    }

    #[test]
    fn offsets_follow_mean_minus_std() {
        let data = IndexedDataSet::from_elements(vec![vec![1.0], vec![3.0]]);
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(1))
            .unwrap()
            .with_spread_factor(0.5)
            .unwrap();
        da.initialize_with_positions(&[vec![0.0], vec![2.0]]).unwrap();
        // Prototype 0: distances 1 and 3, mean 2, std 1, radius 1.5.
        // Prototype 1: distances 1 and 1, mean 1, std 0, radius 1.
        assert_eq!(da.distance_offsets().unwrap(), vec![2.25, 1.0]);
    }

    #[test]
    fn large_spread_clamps_radius() {
        let data = IndexedDataSet::from_elements(vec![vec![0.0], vec![10.0]]);
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(1))
            .unwrap()
            .with_spread_factor(5.0)
            .unwrap();
        da.initialize_with_positions(&[vec![1.0]]).unwrap();
        assert_eq!(da.distance_offsets().unwrap(), vec![0.0]);
    }

    #[test]
    fn clusters_and_normalizes() {
        let data = two_groups();
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        da.initialize_with_positions(&[vec![2.0, 2.0], vec![8.0, 8.0]])
            .unwrap();
        da.apply(100).unwrap();
        assert_eq!(
            da.crisp_assignments().unwrap(),
            vec![0, 0, 0, 0, 1, 1, 1, 1]
        );
        for row in da.fuzzy_assignments().unwrap() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn merging_keeps_the_heavier_prototype() {
        let data = two_groups();
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_merging_distance(1.0)
            .unwrap();
        da.initialize_with_positions(&[
            vec![0.5, 0.5],
            vec![0.5, 0.6],
            vec![10.5, 10.5],
        ])
        .unwrap();
        da.apply(1).unwrap();
        let active: Vec<bool> = da
            .prototypes()
            .unwrap()
            .iter()
            .map(|p| p.is_activated())
            .collect();
        assert_eq!(active.iter().filter(|&&a| a).count(), 2);
        assert!(active[2]);
        assert_eq!(da.memberships_of(&vec![0.5, 0.5]).unwrap().len(), 3);
    }

    #[test]
    fn removal_never_empties_the_set() {
        let data = two_groups();
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_removal_threshold(100.0)
            .unwrap();
        da.initialize_with_positions(&[vec![0.5, 0.5], vec![10.5, 10.5]])
            .unwrap();
        da.apply(3).unwrap();
        let active = da
            .prototypes()
            .unwrap()
            .iter()
            .filter(|p| p.is_activated())
            .count();
        assert_eq!(active, 1);
    }

    #[test]
    fn removal_drops_light_prototypes() {
        let data = two_groups();
        let mut da = DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        da.initialize_with_positions(&[
            vec![0.5, 0.5],
            vec![10.5, 10.5],
            vec![5.0, 5.0],
        ])
        .unwrap();
        da.remove(0.5, &[3.9, 4.0, 0.1]);
        let p = da.prototypes().unwrap();
        assert!(p[0].is_activated());
        assert!(p[1].is_activated());
        assert!(!p[2].is_activated());
        assert_eq!(da.memberships_of(&vec![5.0, 5.0]).unwrap()[2], 0.0);
    }

    #[test]
    fn invalid_parameters() {
        let data = two_groups();
        let make = || DistanceAdaptedFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        assert!(make().with_spread_factor(-1.0).is_err());
        assert!(make().with_merging_distance(-0.1).is_err());
        assert!(make().with_removal_threshold(f64::NAN).is_err());
        assert!(make().with_fuzzifier(0.5).is_err());
    }
}
