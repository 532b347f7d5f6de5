use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::algebra::Metric;
use crate::data::IndexedDataSet;
use crate::error::{invalid, Error, Result};

/// Index of a node in a tree's node arena.
pub type NodeId = usize;

/// One ball of a [`BallTree`].
///
/// The objects below a node occupy the contiguous range `start..end` of the tree's object order,
/// so listing a subtree is a slice, not a traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct BallNode {
    representative: usize,
    radius: f64,
    start: usize,
    end: usize,
    depth: usize,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl BallNode {
    /// ID of the data object the ball is centered on.
    pub fn representative(&self) -> usize {
        self.representative
    }

    /// Distance from the representative to the furthest object in the subtree.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of objects in the subtree.
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    /// Depth of the node; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Left child, `None` at leaves.
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child, `None` at leaves.
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// Binary ball tree over a sealed [`IndexedDataSet`] and any [`Metric`].
///
/// Construction is the naive furthest-pair split: starting from an arbitrary object `a`, take the
/// object `b` furthest from `a`, then `c` furthest from `b`, and send every object to the closer
/// of `b` and `c` (ties go to `b`). A node stops splitting once it holds at most `leaf_size`
/// objects or all of its objects coincide.
///
/// ```rust
/// use edmoal::algebra::RealSpace;
/// use edmoal::data::IndexedDataSet;
/// use edmoal::tree::BallTree;
///
/// let data: IndexedDataSet<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.0]).collect();
/// let tree = BallTree::build(&data, RealSpace::new(2), 4).unwrap();
///
/// let mut hits = tree.sphere_query(&vec![10.0, 0.0], 1.5);
/// hits.sort();
/// assert_eq!(hits, vec![9, 10, 11]);
///
/// let nearest = tree.knn_query(&vec![3.2, 0.0], 2);
/// assert_eq!(nearest[0].0, 3);
/// assert_eq!(nearest[1].0, 4);
/// ```
#[derive(Debug, Clone)]
pub struct BallTree<'a, T, M> {
    data: &'a IndexedDataSet<T>,
    metric: M,
    nodes: Vec<BallNode>,
    order: Vec<usize>,
    leaf_size: usize,
}

impl<'a, T, M: Metric<T>> BallTree<'a, T, M> {
    /// Build a tree over `data` whose leaves hold at most `leaf_size` objects.
    ///
    /// An empty data set gives an empty tree whose queries return nothing.
    pub fn build(data: &'a IndexedDataSet<T>, metric: M, leaf_size: usize) -> Result<Self> {
        if !data.is_sealed() {
            return Err(Error::DataSetNotSealed);
        }
        if leaf_size == 0 {
            return Err(invalid("leaf_size", "must be at least 1"));
        }

        let n = data.len();
        let mut tree = Self {
            data,
            metric,
            nodes: Vec::with_capacity((2 * n / leaf_size).max(1)),
            order: (0..n).collect(),
            leaf_size,
        };
        if n > 0 {
            tree.build_node(0, n, 0);
        }

        debug!(
            objects = n,
            nodes = tree.nodes.len(),
            height = tree.height(),
            leaf_size,
            "built ball tree"
        );
        Ok(tree)
    }

    /// Build the subtree over `order[start..end]` in preorder, so children get larger IDs than
    /// their parent. Degenerate data can make the tree as deep as it is large, so pending ranges
    /// live on an explicit stack.
    fn build_node(&mut self, start: usize, end: usize, depth: usize) {
        // (start, end, depth, parent and whether this is its left child)
        let mut pending: Vec<(usize, usize, usize, Option<(usize, bool)>)> = vec![(start, end, depth, None)];
        while let Some((start, end, depth, parent)) = pending.pop() {
            let id = self.nodes.len();
            let (representative, radius, split) = self.partition(start, end);
            self.nodes.push(BallNode {
                representative,
                radius,
                start,
                end,
                depth,
                left: None,
                right: None,
            });
            match parent {
                Some((p, true)) => self.nodes[p].left = Some(id),
                Some((p, false)) => self.nodes[p].right = Some(id),
                None => {}
            }

            if let Some(mid) = split {
                // Right first so the left subtree is numbered before it.
                pending.push((mid, end, depth + 1, Some((id, false))));
                pending.push((start, mid, depth + 1, Some((id, true))));
            }
        }
    }

    /// Pick the representative and radius of `order[start..end]`, and reorder the range into two
    /// halves if it should be split. Returns the split point.
    fn partition(&mut self, start: usize, end: usize) -> (usize, f64, Option<usize>) {
        let ids = &self.order[start..end];
        if ids.len() == 1 {
            return (ids[0], 0.0, None);
        }

        let b = self.furthest_from(ids, ids[0]);
        let c = self.furthest_from(ids, b);
        let to_b: Vec<f64> = ids.iter().map(|&i| self.dist(b, i)).collect();
        let to_c: Vec<f64> = ids.iter().map(|&i| self.dist(c, i)).collect();

        // The member closest to both pivots sits near the middle of the ball.
        let mut best = 0;
        for k in 1..ids.len() {
            if to_b[k].max(to_c[k]) < to_b[best].max(to_c[best]) {
                best = k;
            }
        }
        let representative = ids[best];
        let radius = ids
            .iter()
            .map(|&i| self.dist(representative, i))
            .fold(0.0, f64::max);

        if ids.len() <= self.leaf_size || self.dist(b, c) <= 0.0 {
            return (representative, radius, None);
        }

        let mut left = Vec::with_capacity(ids.len());
        let mut right = Vec::with_capacity(ids.len());
        for (k, &i) in ids.iter().enumerate() {
            if to_b[k] <= to_c[k] {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        let mid = start + left.len();
        self.order[start..mid].copy_from_slice(&left);
        self.order[mid..end].copy_from_slice(&right);
        (representative, radius, Some(mid))
    }

    fn furthest_from(&self, ids: &[usize], from: usize) -> usize {
        let mut best = from;
        let mut best_d = 0.0;
        for &i in ids {
            let d = self.dist(from, i);
            if d > best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    #[inline]
    fn dist(&self, i: usize, j: usize) -> f64 {
        self.metric.distance(&self.data[i].x, &self.data[j].x)
    }

    /// IDs of all objects within distance `radius` of `query` (inclusive), in no particular order.
    pub fn sphere_query(&self, query: &T, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = pending.pop() {
            let n = &self.nodes[id];
            let d = self
                .metric
                .distance(query, &self.data[n.representative].x);
            if d - n.radius > radius {
                continue;
            }
            match (n.left, n.right) {
                (Some(l), Some(r)) => {
                    pending.push(r);
                    pending.push(l);
                }
                _ => {
                    for &i in &self.order[n.start..n.end] {
                        if self.metric.distance(query, &self.data[i].x) <= radius {
                            out.push(i);
                        }
                    }
                }
            }
        }
        out
    }

    /// The `k` objects nearest to `query` as `(id, distance)`, sorted by distance, then ID.
    ///
    /// Ties at the k-th distance are resolved in favor of smaller IDs, so the result equals the
    /// first `k` entries of a brute-force sort by `(distance, id)`.
    pub fn knn_query(&self, query: &T, k: usize) -> Vec<(usize, f64)> {
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        let mut pending: Vec<NodeId> = if k > 0 {
            self.root().into_iter().collect()
        } else {
            Vec::new()
        };

        while let Some(id) = pending.pop() {
            let n = &self.nodes[id];
            if heap.len() == k {
                let worst = heap.peek().map_or(f64::INFINITY, |c| c.distance);
                let d = self
                    .metric
                    .distance(query, &self.data[n.representative].x);
                if d - n.radius > worst {
                    continue;
                }
            }

            match (n.left, n.right) {
                (Some(l), Some(r)) => {
                    let dl = self
                        .metric
                        .distance(query, &self.data[self.nodes[l].representative].x);
                    let dr = self
                        .metric
                        .distance(query, &self.data[self.nodes[r].representative].x);
                    // The nearer child is popped first.
                    let (first, second) = if dl <= dr { (l, r) } else { (r, l) };
                    pending.push(second);
                    pending.push(first);
                }
                _ => {
                    for &i in &self.order[n.start..n.end] {
                        let candidate = Candidate {
                            distance: self.metric.distance(query, &self.data[i].x),
                            id: i,
                        };
                        if heap.len() < k {
                            heap.push(candidate);
                        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                            heap.pop();
                            heap.push(candidate);
                        }
                    }
                }
            }
        }

        let mut out: Vec<(usize, f64)> = heap.into_iter().map(|c| (c.id, c.distance)).collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        out
    }
}

impl<'a, T, M> BallTree<'a, T, M> {
    /// Root node, `None` for an empty tree.
    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(0)
    }

    /// Node by ID. Children always have larger IDs than their parent.
    pub fn node(&self, id: NodeId) -> &BallNode {
        &self.nodes[id]
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[BallNode] {
        &self.nodes
    }

    /// IDs of the data objects below `node`.
    pub fn objects(&self, node: NodeId) -> &[usize] {
        let n = &self.nodes[node];
        &self.order[n.start..n.end]
    }

    /// Number of levels (0 for an empty tree, 1 for a single leaf).
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n| n.depth + 1).max().unwrap_or(0)
    }

    /// IDs of all nodes at depth `level`, left to right.
    pub fn nodes_at_level(&self, level: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(root) = self.root() {
            let mut frontier = vec![root];
            while let Some(id) = frontier.pop() {
                let n = &self.nodes[id];
                if n.depth == level {
                    out.push(id);
                } else if let (Some(l), Some(r)) = (n.left, n.right) {
                    // Right first so the stack yields left-to-right order.
                    frontier.push(r);
                    frontier.push(l);
                }
            }
        }
        out
    }

    /// IDs of all leaves.
    pub fn leaves(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].is_leaf())
            .collect()
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tree indexes no objects.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of objects per leaf.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// The metric the tree was built with.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// The indexed data set.
    pub fn data(&self) -> &'a IndexedDataSet<T> {
        self.data
    }
}

/// kNN heap entry, ordered by `(distance, id)` so the heap top is the current worst.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    id: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}
