//! Fuzzy c-Means restricted to the Voronoi neighbourhood of each object.
//!
//! For an object `x`, a prototype `p_far` lies "behind" a nearer prototype `p_near` when
//!
//! ```text
//! ⟨p_near - x, p_far - x⟩ > ‖p_near - x‖²
//! ```
//!
//! i.e. `p_far` is on the far side of the hyperplane through `p_near` orthogonal to `p_near - x`.
//! Such prototypes get membership exactly 0. The prototypes are visited in order of increasing
//! distance and each is tested against the prototypes already kept, so the E-step costs
//! `O(c²)` scalar products per object in the worst case but far fewer when most prototypes are
//! hidden. The surviving prototypes are weighted with the standard FCM kernel.
//!
//! A noise cluster, when configured, is always a candidate: it has no position, so it can neither
//! hide a prototype nor be hidden.

use super::engine::{AoCore, IterationConfig, NoiseDistance};
use super::fcm::validate_fuzzifier;
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, NoiseClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, ScalarProduct, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::Result;

const NAME: &str = "voronoi_fuzzy_c_means";

/// Fuzzy c-Means with Voronoi pruning of hidden prototypes.
#[derive(Debug, Clone)]
pub struct VoronoiFuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    fuzzifier: f64,
    noise: Option<NoiseDistance>,
}

impl<'a, T, S> VoronoiFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
{
    /// Create an uninitialized instance. Fuzzifier defaults to 2.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        Ok(Self {
            core: AoCore::new(data, space)?,
            fuzzifier: 2.0,
            noise: None,
        })
    }

    /// Set the fuzzifier `m > 1`.
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

    /// Which prototypes are visible from `x`, one flag per prototype.
    pub fn visible_prototypes(&self, x: &T) -> Result<Vec<bool>> {
        self.core.ensure_initialized()?;
        let mut d = vec![0.0; self.core.prototypes.len()];
        prune_hidden(&self.core, x, &mut d);
        Ok(d.iter().map(|v| v.is_finite()).collect())
    }

    fn noise_sq(&self) -> Option<f64> {
        self.noise.map(|n| n.squared_at(self.core.last_iteration()))
    }
}

/// Fill `out` with squared distances from `x`, `INFINITY` for deactivated and hidden prototypes.
///
/// Only prototypes take part in the sort and the hiding test. The noise cluster has no position,
/// so it is added by the caller afterwards and is never hidden.
fn prune_hidden<T, S>(core: &AoCore<'_, T, S>, x: &T, out: &mut [f64])
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
{
    core.distances_sq_into(x, out);
    let mut order: Vec<usize> = (0..out.len()).filter(|&i| out[i].is_finite()).collect();
    order.sort_by(|&a, &b| out[a].total_cmp(&out[b]).then(a.cmp(&b)));

    let relative: Vec<Option<T>> = core
        .prototypes
        .iter()
        .map(|p| {
            p.is_activated()
                .then(|| core.space.sub_new(p.position(), x))
        })
        .collect();

    let mut kept: Vec<usize> = Vec::with_capacity(order.len());
    for &far in &order {
        let Some(r_far) = relative[far].as_ref() else {
            continue;
        };
        let hidden = kept.iter().any(|&near| {
            relative[near]
                .as_ref()
                .is_some_and(|r_near| core.space.scalar_product(r_near, r_far) > out[near])
        });
        if hidden {
            out[far] = f64::INFINITY;
        } else {
            kept.push(far);
        }
    }
}

fn memberships<T, S>(
    core: &AoCore<'_, T, S>,
    x: &T,
    u: &mut [f64],
    fuzzifier: f64,
    noise_sq: Option<f64>,
) -> f64
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
{
    prune_hidden(core, x, u);
    util::fcm_memberships(u, fuzzifier, noise_sq)
}

impl<'a, T, S> PrototypeClustering<T> for VoronoiFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
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
            prune_hidden(&self.core, &obj.x, &mut d);
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

impl<'a, T, S> FuzzyClustering<T> for VoronoiFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
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

impl<'a, T, S> NoiseClustering<T> for VoronoiFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + ScalarProduct<T>,
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

    fn line_data() -> IndexedDataSet<Vec<f64>> {
        IndexedDataSet::from_elements(vec![vec![0.0, 0.0], vec![3.0, 1.0]])
    }

    #[test]
    fn collinear_prototypes_are_hidden() {
        let data = line_data();
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        vfcm.initialize_with_positions(&[vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]])
            .unwrap();
        let query = vec![0.0, 0.0];
        assert_eq!(vfcm.visible_prototypes(&query).unwrap(), vec![true, false, false]);
        assert_eq!(vfcm.memberships_of(&query).unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn side_by_side_prototypes_share() {
        let data = line_data();
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        // Both at distance 1, orthogonal: neither hides the other.
        vfcm.initialize_with_positions(&[vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let u = vfcm.memberships_of(&vec![0.0, 0.0]).unwrap();
        assert!((u[0] - 0.5).abs() < 1e-12);
        assert!((u[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn noise_is_never_hidden() {
        let data = line_data();
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_noise(NoiseDistance::new(1.0).unwrap());
        vfcm.initialize_with_positions(&[vec![1.0, 0.0], vec![2.0, 0.0]])
            .unwrap();
        let query = vec![0.0, 0.0];
        let u = vfcm.memberships_of(&query).unwrap();
        let noise = vfcm.noise_membership_of(&query).unwrap();
        assert_eq!(u[1], 0.0);
        assert!((u[0] - 0.5).abs() < 1e-12);
        assert!((noise - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nearer_noise_hides_no_prototype() {
        let data = line_data();
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_noise(NoiseDistance::new(0.5).unwrap());
        vfcm.initialize_with_positions(&[vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let query = vec![0.0, 0.0];
        assert_eq!(vfcm.visible_prototypes(&query).unwrap(), vec![true, true]);
        let u = vfcm.memberships_of(&query).unwrap();
        let noise = vfcm.noise_membership_of(&query).unwrap();
        // Kernels 1, 1 and 4 for the noise distance 0.25.
        assert!((u[0] - 1.0 / 6.0).abs() < 1e-12);
        assert!((u[1] - 1.0 / 6.0).abs() < 1e-12);
        assert!((noise - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn agrees_with_fcm_when_nothing_is_hidden() {
        use crate::cluster::FuzzyCMeans;
        let data = IndexedDataSet::from_elements(vec![vec![0.0], vec![1.0], vec![10.0]]);
        let init = [vec![0.5], vec![9.0]];
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(1)).unwrap();
        vfcm.initialize_with_positions(&init).unwrap();
        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(1)).unwrap();
        fcm.initialize_with_positions(&init).unwrap();
        // Seen from x = 1 the prototypes lie on opposite sides, so nothing is hidden.
        let a = vfcm.memberships_of(&vec![1.0]).unwrap();
        let b = fcm.memberships_of(&vec![1.0]).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-12);
    }

    #[test]
    fn converges_on_two_groups() {
        let data = IndexedDataSet::from_elements(vec![
            vec![0.0, 0.0],
            vec![0.2, 0.1],
            vec![5.0, 5.0],
            vec![5.2, 5.1],
        ]);
        let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        vfcm.initialize_with_positions(&[vec![1.0, 1.0], vec![4.0, 4.0]])
            .unwrap();
        let iterations = vfcm.apply(100).unwrap();
        assert!(iterations < 100);
        assert_eq!(vfcm.crisp_assignments().unwrap(), vec![0, 0, 1, 1]);
    }
}
