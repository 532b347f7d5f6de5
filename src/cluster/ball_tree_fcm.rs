//! Fuzzy c-Means accelerated by a centered ball tree.
//!
//! The M-step of FCM needs, per prototype, `Σ_j u_ij^m x_j` and `Σ_j u_ij^m`. For a whole subtree
//! with centroid `c`, radius `r` around `c` and `n` objects, every member `x` satisfies
//! `D_i - r ≤ d(x, p_i) ≤ D_i + r` with `D_i = d(c, p_i)`. Plugging these bounds into the FCM
//! membership formula gives an interval that contains the membership of every member:
//!
//! ```text
//! lo_i = max(0, D_i - r),  hi_i = D_i + r
//! u_i ∈ [ 1 / (1 + Σ_{k≠i} (hi_i² / lo_k²)^{1/(m-1)}),
//!         1 / (1 + Σ_{k≠i} (lo_i² / hi_k²)^{1/(m-1)}) ]
//! ```
//!
//! If every interval is at most `maximal_membership_interval_length` wide, the subtree is treated
//! as `n` copies of its centroid and contributes `n · u_i(c)^m · c`. Otherwise the traversal
//! descends; leaves that are still too loose are processed object by object.
//!
//! Only the prototype update is approximated. Memberships, crisp assignments and the objective
//! are always computed exactly per object. A tolerance of 0 reproduces plain FCM.
//!
//! # References
//!
//! Moore (1999). "Very fast EM-based mixture model clustering using multiresolution kd-trees."
//! NIPS 11.

use tracing::trace;

use super::engine::{AoCore, IterationConfig};
use super::fcm::validate_fuzzifier;
use super::prototype::Centroid;
use super::traits::{FuzzyClustering, PrototypeClustering};
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};
use crate::tree::{CenteredBallTree, NodeId};

const NAME: &str = "ball_tree_fuzzy_c_means";

/// Fuzzy c-Means whose prototype update traverses a [`CenteredBallTree`].
#[derive(Debug, Clone)]
pub struct BallTreeFuzzyCMeans<'a, T, S> {
    core: AoCore<'a, T, S>,
    tree: CenteredBallTree<'a, T, S>,
    fuzzifier: f64,
    tolerance: f64,
}

impl<'a, T, S> BallTreeFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + Clone,
{
    /// Build the tree (leaf size 16) and create an uninitialized instance. Fuzzifier 2, interval
    /// tolerance 0.05.
    pub fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        let core = AoCore::new(data, space.clone())?;
        let tree = CenteredBallTree::build(data, space, 16)?;
        Ok(Self {
            core,
            tree,
            fuzzifier: 2.0,
            tolerance: 0.05,
        })
    }

    /// Rebuild the tree with leaves of at most `leaf_size` objects.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Result<Self> {
        self.tree = CenteredBallTree::build(self.core.data, self.core.space.clone(), leaf_size)?;
        Ok(self)
    }

    /// Set the fuzzifier `m > 1`.
    pub fn with_fuzzifier(mut self, fuzzifier: f64) -> Result<Self> {
        self.fuzzifier = validate_fuzzifier(fuzzifier)?;
        Ok(self)
    }

    /// Widest membership interval for which a subtree may be replaced by its centroid.
    pub fn with_maximal_membership_interval_length(mut self, length: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&length) {
            return Err(invalid("maximal_membership_interval_length", "must be in [0, 1]"));
        }
        self.tolerance = length;
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

    /// The fuzzifier `m`.
    pub fn fuzzifier(&self) -> f64 {
        self.fuzzifier
    }

    /// Widest membership interval a node may have and still be aggregated.
    pub fn maximal_membership_interval_length(&self) -> f64 {
        self.tolerance
    }

    /// The tree the prototype update traverses.
    pub fn tree(&self) -> &CenteredBallTree<'a, T, S> {
        &self.tree
    }
}

/// Weighted sums collected during one traversal.
struct Accumulator<T> {
    sums: Vec<T>,
    weights: Vec<f64>,
    /// Subtrees replaced by their centroid.
    aggregated: usize,
    /// Objects processed one by one.
    exact: usize,
}

/// Per-iteration constants of the traversal.
struct Traversal<'t, 'a, T, S> {
    tree: &'t CenteredBallTree<'a, T, S>,
    fuzzifier: f64,
    tolerance: f64,
}

impl<T, S> Traversal<'_, '_, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    fn run(&self, core: &AoCore<'_, T, S>) -> Accumulator<T> {
        let c = core.prototypes.len();
        let mut acc = Accumulator {
            sums: (0..c).map(|_| core.space.null_vector()).collect(),
            weights: vec![0.0; c],
            aggregated: 0,
            exact: 0,
        };
        let mut d = vec![0.0; c];
        // Degenerate data can make the tree as deep as it is large, so no recursion.
        let mut pending: Vec<NodeId> = self.tree.tree().root().into_iter().collect();
        while let Some(id) = pending.pop() {
            if let Some((left, right)) = self.visit(core, id, &mut d, &mut acc) {
                pending.push(right);
                pending.push(left);
            }
        }
        acc
    }

    /// Process one node. Returns its children when it has to be opened.
    fn visit(
        &self,
        core: &AoCore<'_, T, S>,
        id: NodeId,
        d: &mut [f64],
        acc: &mut Accumulator<T>,
    ) -> Option<(NodeId, NodeId)> {
        let node = self.tree.tree().node(id);
        let center = self.tree.center(id);
        let radius = self.tree.center_radius(id);
        core.distances_sq_into(center, d);

        if widest_interval(d, radius, self.fuzzifier) <= self.tolerance {
            let n = node.size() as f64;
            util::fcm_memberships(d, self.fuzzifier, None);
            for (i, &u) in d.iter().enumerate() {
                if u > 0.0 {
                    let w = n * u.powf(self.fuzzifier);
                    core.space.add_multiple(&mut acc.sums[i], center, w);
                    acc.weights[i] += w;
                }
            }
            acc.aggregated += 1;
            return None;
        }

        if let (Some(left), Some(right)) = (node.left(), node.right()) {
            return Some((left, right));
        }
        for &o in self.tree.tree().objects(id) {
            let x = &core.data[o].x;
            core.distances_sq_into(x, d);
            util::fcm_memberships(d, self.fuzzifier, None);
            for (i, &u) in d.iter().enumerate() {
                if u > 0.0 {
                    let w = u.powf(self.fuzzifier);
                    core.space.add_multiple(&mut acc.sums[i], x, w);
                    acc.weights[i] += w;
                }
            }
            acc.exact += 1;
        }
        None
    }
}

/// Width of the widest membership interval over all active prototypes for a ball of `radius`
/// whose center has squared distances `center_sq` (`INFINITY` for inactive prototypes).
fn widest_interval(center_sq: &[f64], radius: f64, fuzzifier: f64) -> f64 {
    let exponent = 1.0 / (fuzzifier - 1.0);
    let bounds: Vec<(f64, f64)> = center_sq
        .iter()
        .filter(|d| d.is_finite())
        .map(|&d| {
            let dist = d.sqrt();
            let lo = (dist - radius).max(0.0);
            let hi = dist + radius;
            (lo * lo, hi * hi)
        })
        .collect();

    let mut widest: f64 = 0.0;
    for (i, &(lo_i, hi_i)) in bounds.iter().enumerate() {
        let mut lower_denominator = 1.0;
        let mut upper_denominator = 1.0;
        for (k, &(lo_k, hi_k)) in bounds.iter().enumerate() {
            if k == i {
                continue;
            }
            lower_denominator += if lo_k > 0.0 {
                (hi_i / lo_k).powf(exponent)
            } else {
                f64::INFINITY
            };
            if lo_i > 0.0 {
                upper_denominator += (lo_i / hi_k).powf(exponent);
            }
        }
        let width = 1.0 / upper_denominator - 1.0 / lower_denominator;
        widest = widest.max(width);
    }
    widest
}

fn memberships<T, S>(core: &AoCore<'_, T, S>, x: &T, u: &mut [f64], fuzzifier: f64) -> f64
where
    S: VectorSpace<T> + Metric<T>,
{
    core.distances_sq_into(x, u);
    util::fcm_memberships(u, fuzzifier, None)
}

impl<'a, T, S> PrototypeClustering<T> for BallTreeFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + Clone,
{
    fn initialize_with_positions(&mut self, positions: &[T]) -> Result<()> {
        self.core.initialize_with_positions(positions)
    }

    fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<T>]) -> Result<()> {
        self.core.initialize_with_prototypes(prototypes)
    }

    fn apply(&mut self, steps: usize) -> Result<usize> {
        let traversal = Traversal {
            tree: &self.tree,
            fuzzifier: self.fuzzifier,
            tolerance: self.tolerance,
        };
        self.core.run(NAME, steps, |core| {
            let acc = traversal.run(core);
            trace!(
                algorithm = NAME,
                aggregated_nodes = acc.aggregated,
                exact_objects = acc.exact,
                "tree traversal"
            );
            core.update_prototypes(acc.sums, &acc.weights)
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
        let c = self.core.prototypes.len();
        let mut d = vec![0.0; c];
        let mut u = vec![0.0; c];
        let mut objective = 0.0;
        for obj in self.core.data {
            self.core.distances_sq_into(&obj.x, &mut d);
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
        let m = self.fuzzifier;
        self.core.crisp_assignments(|c, x, u| memberships(c, x, u, m))
    }
}

impl<'a, T, S> FuzzyClustering<T> for BallTreeFuzzyCMeans<'a, T, S>
where
    S: VectorSpace<T> + Metric<T> + Clone,
{
    fn memberships_of(&self, x: &T) -> Result<Vec<f64>> {
        let m = self.fuzzifier;
        let (u, _) = self.core.memberships_of(x, |c, x, u| memberships(c, x, u, m))?;
        Ok(u)
    }

    fn fuzzy_assignments(&self) -> Result<Vec<Vec<f64>>> {
        let m = self.fuzzifier;
        let (rows, _) = self.core.all_memberships(|c, x, u| memberships(c, x, u, m))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;
    use crate::cluster::FuzzyCMeans;

    fn grid_groups() -> IndexedDataSet<Vec<f64>> {
        let mut points = Vec::new();
        for (cx, cy) in [(0.0, 0.0), (10.0, 0.0), (5.0, 9.0)] {
            for i in 0..6 {
                for j in 0..6 {
                    points.push(vec![cx + i as f64 * 0.1, cy + j as f64 * 0.1]);
                }
            }
        }
        IndexedDataSet::from_elements(points)
    }

    fn initial() -> Vec<Vec<f64>> {
        vec![vec![1.0, 1.0], vec![9.0, 1.0], vec![5.0, 8.0]]
    }

    #[test]
    fn single_prototype_interval_is_degenerate() {
        assert_eq!(widest_interval(&[4.0, f64::INFINITY], 3.0, 2.0), 0.0);
    }

    #[test]
    fn interval_covers_prototype_inside_ball() {
        // Both prototypes lie inside the ball: either membership can be anything in [0, 1].
        let width = widest_interval(&[0.25, 0.25], 1.0, 2.0);
        assert_eq!(width, 1.0);
        // Only prototype 0 inside: its membership stays near 1, the other near 0.
        let width = widest_interval(&[0.25, 100.0], 1.0, 2.0);
        assert!(width > 0.0 && width < 0.05);
        // A tiny ball far from both prototypes has a narrow interval.
        let width = widest_interval(&[100.0, 400.0], 0.01, 2.0);
        assert!(width < 0.01);
    }

    #[test]
    fn zero_tolerance_matches_fcm() {
        let data = grid_groups();
        let mut bt = BallTreeFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_leaf_size(4)
            .unwrap()
            .with_maximal_membership_interval_length(0.0)
            .unwrap();
        bt.initialize_with_positions(&initial()).unwrap();
        bt.apply(10).unwrap();

        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        fcm.initialize_with_positions(&initial()).unwrap();
        fcm.apply(10).unwrap();

        let a = bt.prototype_positions().unwrap();
        let b = fcm.prototype_positions().unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert!(RealSpace::new(2).distance(pa, pb) < 1e-9);
        }
    }

    #[test]
    fn deep_tree_is_traversed_without_recursion() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                // Doubling gaps: every split peels off the largest few objects.
                let data: IndexedDataSet<Vec<f64>> =
                    (0..300).map(|i| vec![2f64.powi(i)]).collect();
                let mut bt = BallTreeFuzzyCMeans::new(&data, RealSpace::new(1))
                    .unwrap()
                    .with_leaf_size(1)
                    .unwrap()
                    .with_maximal_membership_interval_length(0.0)
                    .unwrap();
                assert!(bt.tree().tree().height() > 150);

                bt.initialize_with_positions(&[vec![1.0], vec![2f64.powi(299)]])
                    .unwrap();
                assert!(bt.apply(3).unwrap() >= 1);
                for p in bt.prototype_positions().unwrap() {
                    assert!(p[0].is_finite());
                }
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn default_tolerance_stays_close_to_fcm() {
        let data = grid_groups();
        let mut bt = BallTreeFuzzyCMeans::new(&data, RealSpace::new(2))
            .unwrap()
            .with_leaf_size(4)
            .unwrap();
        bt.initialize_with_positions(&initial()).unwrap();
        bt.apply(50).unwrap();

        let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        fcm.initialize_with_positions(&initial()).unwrap();
        fcm.apply(50).unwrap();

        let a = bt.prototype_positions().unwrap();
        let b = fcm.prototype_positions().unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert!(RealSpace::new(2).distance(pa, pb) < 0.05);
        }
        assert_eq!(bt.crisp_assignments().unwrap(), fcm.crisp_assignments().unwrap());
        for row in bt.fuzzy_assignments().unwrap() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_parameters() {
        let data = grid_groups();
        let make = || BallTreeFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
        assert!(make().with_leaf_size(0).is_err());
        assert!(make().with_maximal_membership_interval_length(1.5).is_err());
        assert!(make().with_fuzzifier(1.0).is_err());
    }
}
