//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups objects by neighbourhood density. Unlike the prototype-based algorithms it:
//!
//! - Discovers clusters of arbitrary shape
//! - Determines the number of clusters itself
//! - Identifies noise objects (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two objects to be neighbours.
//! - **MinPts**: Minimum neighbours within ε (the object itself included) for a core object.
//! - **Core object**: Has at least MinPts neighbours within ε.
//! - **Border object**: Within ε of a core object but not core itself.
//! - **Noise object**: Neither core nor border.
//!
//! ## Neighbourhood queries
//!
//! Region queries go through a [`BallTree`] built over the data set with the caller's metric, so
//! any [`Metric`] works, not only Euclidean distance on vectors.
//!
//! ## Complexity
//!
//! - **Time**: one sphere query per object; O(n log n) when the tree prunes well, O(n²) at worst.
//! - **Space**: O(n) for labels plus the tree.
//!
//! ## Limitations
//!
//! - Struggles with varying densities
//! - ε is sensitive and dataset-dependent
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use tracing::debug;

use super::traits::UNASSIGNED;
use crate::algebra::Metric;
use crate::data::IndexedDataSet;
use crate::error::{invalid, Result};
use crate::tree::BallTree;

/// Label of a noise object in [`Dbscan::fit_predict`].
pub const NOISE: usize = UNASSIGNED;

// Internal label encoding.
// - UNCLASSIFIED: never assigned yet
// - NOISE_LABEL: visited, but not density-reachable from any core object (may be promoted later)
const UNCLASSIFIED: i64 = -2;
const NOISE_LABEL: i64 = -1;

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighbourhood.
    epsilon: f64,
    /// Minimum objects for core classification.
    min_pts: usize,
    /// Leaf size of the ball tree used for region queries.
    leaf_size: usize,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - Maximum distance between two objects to be neighbours.
    /// * `min_pts` - Minimum number of objects to form a dense region.
    ///
    /// # Typical Values
    ///
    /// - `epsilon`: Often determined by k-distance plot (k = min_pts - 1).
    /// - `min_pts`: 2 * dimension is a common heuristic. Minimum is 3.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self {
            epsilon,
            min_pts,
            leaf_size: 16,
        }
    }

    /// Set epsilon (neighbourhood radius).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set minimum objects for core classification.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Set the leaf size of the ball tree built for region queries.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Check if a label represents noise.
    pub fn is_noise(label: usize) -> bool {
        label == NOISE
    }

    /// Cluster labels `0..k` in order of discovery, [`NOISE`] for noise objects.
    pub fn fit_predict<T, M: Metric<T>>(
        &self,
        data: &IndexedDataSet<T>,
        metric: M,
    ) -> Result<Vec<usize>> {
        Ok(self
            .fit(data, metric)?
            .into_iter()
            .map(|l| if l >= 0 { l as usize } else { NOISE })
            .collect())
    }

    /// Cluster labels with noise as `None`.
    pub fn fit_predict_with_noise<T, M: Metric<T>>(
        &self,
        data: &IndexedDataSet<T>,
        metric: M,
    ) -> Result<Vec<Option<usize>>> {
        Ok(self
            .fit(data, metric)?
            .into_iter()
            .map(|l| if l >= 0 { Some(l as usize) } else { None })
            .collect())
    }

    fn fit<T, M: Metric<T>>(&self, data: &IndexedDataSet<T>, metric: M) -> Result<Vec<i64>> {
        if !(self.epsilon > 0.0) {
            return Err(invalid("epsilon", "must be positive"));
        }
        if self.min_pts == 0 {
            return Err(invalid("min_pts", "must be at least 1"));
        }
        data.ensure_clusterable()?;
        let tree = BallTree::build(data, metric, self.leaf_size)?;

        let n = data.len();
        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: i64 = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(&tree, point_idx);

            // MinPts includes the object itself
            if neighbors.len() + 1 < self.min_pts {
                // Not enough neighbours: mark as noise (might be border later)
                labels[point_idx] = NOISE_LABEL;
                continue;
            }

            self.expand_cluster(
                &tree,
                point_idx,
                &neighbors,
                &mut labels,
                cluster_id,
                &mut visited,
            );
            cluster_id += 1;
        }

        debug!(
            clusters = cluster_id,
            noise = labels.iter().filter(|&&l| l < 0).count(),
            "dbscan finished"
        );
        Ok(labels)
    }

    /// IDs of all other objects within epsilon, ascending.
    fn region_query<T, M: Metric<T>>(
        &self,
        tree: &BallTree<'_, T, M>,
        point_idx: usize,
    ) -> Vec<usize> {
        let mut neighbors = tree.sphere_query(&tree.data()[point_idx].x, self.epsilon);
        neighbors.retain(|&i| i != point_idx);
        neighbors.sort_unstable();
        neighbors
    }

    /// Expand cluster from a core object.
    fn expand_cluster<T, M: Metric<T>>(
        &self,
        tree: &BallTree<'_, T, M>,
        point_idx: usize,
        neighbors: &[usize],
        labels: &mut [i64],
        cluster_id: i64,
        visited: &mut [bool],
    ) {
        labels[point_idx] = cluster_id;

        // Use a queue for iterative expansion (avoid deep recursion)
        let mut to_process: Vec<usize> = neighbors.to_vec();

        while let Some(neighbor_idx) = to_process.pop() {
            // A previously visited noise object can still become a border object, so the label
            // is assigned before the `visited` check.
            if labels[neighbor_idx] == UNCLASSIFIED || labels[neighbor_idx] == NOISE_LABEL {
                labels[neighbor_idx] = cluster_id;
            }

            if visited[neighbor_idx] {
                continue;
            }
            visited[neighbor_idx] = true;

            let neighbor_neighbors = self.region_query(tree, neighbor_idx);

            if neighbor_neighbors.len() + 1 >= self.min_pts {
                for nn in neighbor_neighbors {
                    if !visited[nn] {
                        to_process.push(nn);
                    }
                }
            }
        }
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}
