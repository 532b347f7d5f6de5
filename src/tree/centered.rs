use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::Result;

use super::{BallTree, NodeId};

/// A [`BallTree`] that additionally stores, per node, the centroid of its objects and the
/// distance from that centroid to the furthest object.
///
/// The centroid is in general not a data object, so building one needs a [`VectorSpace`], not
/// only a metric.
#[derive(Debug, Clone)]
pub struct CenteredBallTree<'a, T, S> {
    tree: BallTree<'a, T, S>,
    centers: Vec<T>,
    center_radii: Vec<f64>,
}

impl<'a, T, S> CenteredBallTree<'a, T, S>
where
    S: VectorSpace<T> + Metric<T>,
{
    /// Build the underlying ball tree and compute all subtree centroids bottom-up.
    pub fn build(data: &'a IndexedDataSet<T>, space: S, leaf_size: usize) -> Result<Self> {
        let tree = BallTree::build(data, space, leaf_size)?;
        let space = tree.metric();
        let count = tree.nodes().len();

        let mut centers: Vec<T> = (0..count).map(|_| space.null_vector()).collect();
        // Children have larger IDs than parents, so a reverse sweep sees children first.
        for id in (0..count).rev() {
            let node = tree.node(id);
            let center = match (node.left(), node.right()) {
                (Some(l), Some(r)) => {
                    let mut c = space.mul_new(&centers[l], tree.node(l).size() as f64);
                    space.add_multiple(&mut c, &centers[r], tree.node(r).size() as f64);
                    space.mul(&mut c, 1.0 / node.size() as f64);
                    c
                }
                _ => {
                    let mut c = space.null_vector();
                    for &o in tree.objects(id) {
                        space.add(&mut c, &data[o].x);
                    }
                    space.mul(&mut c, 1.0 / node.size() as f64);
                    c
                }
            };
            centers[id] = center;
        }

        let center_radii = (0..count)
            .map(|id| {
                tree.objects(id)
                    .iter()
                    .map(|&o| space.distance(&centers[id], &data[o].x))
                    .fold(0.0, f64::max)
            })
            .collect();

        Ok(Self {
            tree,
            centers,
            center_radii,
        })
    }
}

impl<'a, T, S> CenteredBallTree<'a, T, S> {
    /// The underlying ball tree (queries, structure).
    pub fn tree(&self) -> &BallTree<'a, T, S> {
        &self.tree
    }

    /// Centroid of the objects below `node`.
    pub fn center(&self, node: NodeId) -> &T {
        &self.centers[node]
    }

    /// Distance from [`center`](Self::center) to the furthest object below `node`.
    pub fn center_radius(&self, node: NodeId) -> f64 {
        self.center_radii[node]
    }
}
