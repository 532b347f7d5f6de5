//! Fuzzy c-Means (Bezdek), optionally with a noise cluster (Davé).
//!
//! # Objective
//!
//! ```text
//! J = Σ_j Σ_i u_ij^m d_ij  (+ Σ_j u_noise,j^m δ²)      subject to  Σ_i u_ij (+ u_noise,j) = 1
//! ```
//!
//! with `d_ij` the squared distance of object `j` to prototype `i`, `m > 1` the fuzzifier and
//! `δ` the noise distance.
//!
//! # Alternating optimization
//!
//! - memberships: `u_ij = d_ij^{1/(1-m)} / (Σ_k d_kj^{1/(1-m)} + δ^{2/(1-m)})`
//! - prototypes: `p_i = Σ_j u_ij^m x_j / Σ_j u_ij^m`
//!
//! An object that coincides with one or more prototypes is split evenly among exactly those
//! prototypes. The noise cluster has no position; the mass it absorbs simply does not pull any
//! prototype, which makes the result robust against outliers.
//!
//! # References
//!
//! Bezdek (1981). "Pattern Recognition with Fuzzy Objective Function Algorithms."
//! Davé (1991). "Characterization and detection of noise in clustering."

use super::engine::{AoCore, IterationConfig, NoiseDistance};
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, NoiseClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};

const NAME: &str = "fuzzy_c_means";

/// Fuzzy c-Means clustering over any vector space with a metric.
///
/// ```rust
/// use edmoal::algebra::RealSpace;
/// use edmoal::cluster::{FuzzyCMeans, FuzzyClustering, PrototypeClustering};
/// use edmoal::data::IndexedDataSet;
///
/// let data = IndexedDataSet::from_elements(vec![
///     vec![0.0, 0.0], vec![0.1, 0.1], vec![5.0, 5.0], vec![5.1, 5.1],
/// ]);
/// let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap()
///     .with_fuzzifier(2.0).unwrap();
/// fcm.initialize_with_positions(&[vec![1.0, 1.0], vec![4.0, 4.0]]).unwrap();
/// fcm.apply(100).unwrap();
///
/// let labels = fcm.crisp_assignments().unwrap();
/// assert_eq!(labels[0], labels[1]);
/// assert_ne!(labels[0], labels[2]);
/// let u = fcm.memberships_of(&vec![0.05, 0.05]).unwrap();
/// assert!(u[0] > 0.99);
/// ```
#[derive(Debug, Clone)]
pub struct FuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    fuzzifier: f64,
    noise: Option<NoiseDistance>,
}

impl<'a, T, S> FuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Create an uninitialized instance over a sealed data set. Fuzzifier defaults to 2.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            fuzzifier: 2.0,
            noise: None,
        })
    }

    /// Set the fuzzifier `m > 1`. Larger values give softer partitions.
    pub fn with_fuzzifier(mut self, fuzzifier: f64) -> Result<Self> {
        self.fuzzifier = validate_fuzzifier(fuzzifier)?;
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

    /// The fuzzifier.
    pub fn fuzzifier(&self) -> f64 {
        self.fuzzifier
    }

    /// The noise cluster, if any.
    pub fn noise(&self) -> Option<NoiseDistance> {
        self.noise
    }

    /// Squared noise distance of the last completed iteration.
    fn noise_sq(&self) -> Option<f64> {
        self.noise.map(|n| n.squared_at(self.core.last_iteration()))
    }
}

pub(crate) fn validate_fuzzifier(fuzzifier: f64) -> Result<f64> {
    if !(fuzzifier > 1.0 && fuzzifier.is_finite()) {
        return Err(invalid("fuzzifier", "must be finite and greater than 1"));
    }
    Ok(fuzzifier)
}

fn memberships<T, S>(
    core: &AoCore<'_, T, S>,
    x: &T,
    u: &mut [f64],
    fuzzifier: f64,
    noise_sq: Option<f64>,
) -> f64
where
    S: VectorSpace<T> + Metric<T>,
{
    core.distances_sq_into(x, u);
    util::fcm_memberships(u, fuzzifier, noise_sq)
}

impl<'a, T, S> PrototypeClustering<T> for FuzzyCMeans<'a, T, S>
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
        let m = self.fuzzifier;
        let noise = self.noise;
        self.core.run(NAME, steps, |core| {
            let noise_sq = noise.map(|n| n.squared_at(core.iteration_count()));
            core.fuzzy_step(
                |c, x, u| memberships(c, x, u, m, noise_sq),
                |u| u.powf(m),
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
        let m = self.fuzzifier;
        let noise_sq = self.noise_sq();
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut u = vec![0.0; c];
        let mut objective = 0.0;
        for obj in self.core.data {
            self.core.distances_sq_into(&obj.x, &mut d);
            u.copy_from_slice(&d);
            let noise_u = util::fcm_memberships(&mut u, m, noise_sq);
            for (&ui, &di) in u.iter().zip(&d) {
                if ui > 0.0 {
                    objective += ui.powf(m) * di;
                }
            }
            if let Some(delta_sq) = noise_sq {
                objective += noise_u.powf(m) * delta_sq;
            }
        }
        Ok(objective)
    }

    fn crisp_assignments(&self) -> Result<Vec<usize>> {
        let (m, noise_sq) = (self.fuzzifier, self.noise_sq());
        self.core
            .crisp_assignments(|c, x, u| memberships(c, x, u, m, noise_sq))
    }
}

impl<'a, T, S> FuzzyClustering<T> for FuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>> {
        let (m, noise_sq) = (self.fuzzifier, self.noise_sq());
        let (u, _) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, m, noise_sq))?;
        Ok(u)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        let (m, noise_sq) = (self.fuzzifier, self.noise_sq());
        let (rows, _) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, m, noise_sq))?;
        Ok(rows)
    }
}

impl<'a, T, S> NoiseClustering<T> for FuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn noise_membership_of(&self, x: &T) -> Result<f64> {
        let (m, noise_sq) = (self.fuzzifier, self.noise_sq());
        let (_, noise) = self
            .core
            .memberships_of(x, |c, x, u| memberships(c, x, u, m, noise_sq))?;
        Ok(noise)
    }

    fn noise_memberships(&self) -> Result<Vec<f64>> {
        let (m, noise_sq) = (self.fuzzifier, self.noise_sq());
        let (_, noise) = self
            .core
            .all_memberships(|c, x, u| memberships(c, x, u, m, noise_sq))?;
        Ok(noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;
    use crate::error::Error;

    fn two_groups() -> IndexedDataSet<Vec<f64>> {
        IndexedDataSet::from_elements(vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![0.0, 0.2],
            vec![4.0, 4.0],
            vec![4.2, 4.0],
            vec![4.0, 4.2],
        ])
    }

    #[test]
    fn finds_two_groups() {
        let data = two_groups();
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_epsilon(1e-9)
            .unwrap();
        fcm.initialize_with_positions(&[vec![1.0, 1.0], vec![3.0, 3.0]])
            .unwrap();
        let iterations = fcm.apply(200).unwrap();
        assert!(iterations < 200);
        assert_eq!(fcm.iteration_count(), iterations);
        assert_eq!(fcm.convergence_history().len(), iterations);

        let labels = fcm.crisp_assignments().unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);
        for row in fcm.fuzzy_assignments().unwrap() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        let sums = fcm.membership_sums().unwrap();
        assert!((sums.iter().sum::<f64>() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_converges_in_one_iteration() {
        let data = IndexedDataSet::from_elements(vec![vec![3.0, -1.0]]);
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        fcm.initialize_with_positions(&[vec![3.0, -1.0]]).unwrap();
        assert_eq!(fcm.apply(10).unwrap(), 1);
        assert_eq!(fcm.convergence_history(), &[0.0]);
        assert_eq!(fcm.objective_function().unwrap(), 0.0);
    }

    #[test]
    fn coincident_prototypes_share_membership() {
        let data = two_groups();
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        fcm.initialize_with_positions(&[vec![0.0, 0.0], vec![0.0, 0.0], vec![4.0, 4.0]])
            .unwrap();
        let u = fcm.fuzzy_assignments().unwrap();
        assert_eq!(u[0], vec![0.5, 0.5, 0.0]);
        assert_eq!(u[3], vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn noise_absorbs_outlier() {
        let mut points = two_groups().elements().cloned().collect::<Vec<_>>();
        points.push(vec![100.0, -100.0]);
        let data = IndexedDataSet::from_elements(points);
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_noise(NoiseDistance::new(1.0).unwrap());
        fcm.initialize_with_positions(&[vec![1.0, 1.0], vec![3.0, 3.0]])
            .unwrap();
        fcm.apply(100).unwrap();

        let noise = fcm.noise_memberships().unwrap();
        assert!(noise[6] > 0.99);
        assert!(noise[0] < 0.1);
        let rows = fcm.fuzzy_assignments().unwrap();
        for (row, n) in rows.iter().zip(&noise) {
            assert!((row.iter().sum::<f64>() + n - 1.0).abs() < 1e-12);
        }
        assert_eq!(fcm.crisp_assignments().unwrap()[6], crate::cluster::UNASSIGNED);

        // The outlier does not drag the prototypes away from their groups.
        let p = fcm.prototype_positions().unwrap();
        assert!(RealSpace::new(2).distance(&p[0], &vec![0.0667, 0.0667]) < 0.05);
    }

    #[test]
    fn deactivated_prototype_is_ignored() {
        let data = two_groups();
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        let mut protos = vec![
            Centroid::new(0, vec![0.0, 0.0]),
            Centroid::new(1, vec![4.0, 4.0]),
        ];
        protos[1].deactivate();
        fcm.initialize_with_prototypes(&protos).unwrap();
        fcm.apply(20).unwrap();

        let p = fcm.prototypes().unwrap();
        assert_eq!(p[1].position(), &vec![4.0, 4.0]);
        for row in fcm.fuzzy_assignments().unwrap() {
            assert_eq!(row, vec![1.0, 0.0]);
        }
    }

    #[test]
    fn not_initialized() {
        let data = two_groups();
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        assert_eq!(fcm.apply(1), Err(Error::NotInitialized));
        assert_eq!(fcm.objective_function(), Err(Error::NotInitialized));
        assert_eq!(fcm.fuzzy_assignments(), Err(Error::NotInitialized));
        assert_eq!(fcm.memberships_of(&vec![0.0, 0.0]), Err(Error::NotInitialized));
        assert!(!fcm.is_initialized());
    }

    #[test]
    fn invalid_parameters() {
        let data = two_groups();
        assert!(FuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_fuzzifier(1.0)
            .is_err());
        assert!(FuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_fuzzifier(f64::NAN)
            .is_err());

        let mut open = IndexedDataSet::new();
        open.push(vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            FuzzyCMeans::new(&open, RealSpace::new(2)),
            Err(Error::DataSetNotSealed)
        ));
    }
}
