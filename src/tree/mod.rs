//! Spatial indexes over indexed data sets.
//!
//! - [`BallTree`]: sphere and k-nearest-neighbor queries for any [`Metric`](crate::algebra::Metric).
//! - [`CenteredBallTree`]: a ball tree that also knows the center of gravity of every subtree,
//!   which is what the ball-tree accelerated Fuzzy c-Means aggregates over.

mod ball_tree;
mod centered;

pub use ball_tree::{BallNode, BallTree, NodeId};
pub use centered::CenteredBallTree;
