//! Clustering algorithms over abstract vector spaces.
//!
//! Every algorithm here is written against the traits in [`crate::algebra`], so the same code
//! clusters `Vec<f64>`, lists of vectors via [`ListSpace`](crate::algebra::ListSpace), or any
//! type a caller provides a [`VectorSpace`](crate::algebra::VectorSpace) and
//! [`Metric`](crate::algebra::Metric) for.
//!
//! ## Hard vs Fuzzy Clustering
//!
//! **Hard clustering** assigns each object to exactly one cluster. Simple, but loses information
//! when objects genuinely sit between groups.
//!
//! **Fuzzy clustering** gives each object a degree of membership to every prototype, summing to 1
//! (or to less than 1 when a noise cluster takes its share). Crisp labels are recovered by
//! taking the largest membership.
//!
//! ## Alternating optimization
//!
//! All prototype-based algorithms alternate two steps until the prototypes stop moving:
//!
//! 1. compute memberships from the current prototypes
//! 2. move each prototype to the membership-weighted mean of the data
//!
//! ```text
//! J = Σ_j Σ_i w(u_ij) d(x_j, p_i)²
//! ```
//!
//! The variants differ only in how memberships are derived from distances:
//!
//! | Algorithm | Memberships |
//! |---|---|
//! | [`HardCMeans`] | nearest prototype gets 1 |
//! | [`FuzzyCMeans`] | inverse-distance ratio with fuzzifier `m` |
//! | [`PolynomialFuzzyCMeans`] | FCM with far prototypes cut to exactly 0 |
//! | [`DistanceAdaptedFuzzyCMeans`] | FCM on distances shrunk by the cluster spread |
//! | [`RewardingCrispFuzzyCMeans`] | FCM on distances shifted toward crispness |
//! | [`VoronoiFuzzyCMeans`] | FCM over the prototypes not hidden behind a nearer one |
//! | [`BallTreeFuzzyCMeans`] | FCM, aggregated over ball-tree nodes with narrow membership intervals |
//! | [`SphericalGaussianEm`] | posterior probabilities of a spherical Gaussian mixture |
//!
//! ### DBSCAN
//!
//! Density-based clustering that discovers non-convex clusters and identifies outliers (noise
//! objects). DBSCAN does not require specifying the number of clusters in advance, nor
//! prototypes.
//!
//! ## Usage
//!
//! ```rust
//! use edmoal::algebra::RealSpace;
//! use edmoal::cluster::{seeding, Dbscan, FuzzyCMeans, HardCMeans, PrototypeClustering};
//! use edmoal::data::IndexedDataSet;
//!
//! let data = IndexedDataSet::from_elements(vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ]);
//! let space = RealSpace::new(2);
//!
//! // Hard clustering, seeded with k-means++
//! let seeds = seeding::kmeanspp_positions(&data, &space, 2, Some(42)).unwrap();
//! let mut hcm = HardCMeans::new(&data, space).unwrap();
//! hcm.initialize_with_positions(&seeds).unwrap();
//! hcm.apply(100).unwrap();
//! let labels = hcm.crisp_assignments().unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//!
//! // Refine with Fuzzy c-Means, starting from the hard result
//! let mut fcm = FuzzyCMeans::new(&data, space).unwrap();
//! fcm.initialize_with_prototypes(hcm.prototypes().unwrap()).unwrap();
//! fcm.apply(100).unwrap();
//! assert_eq!(fcm.crisp_assignments().unwrap(), labels);
//!
//! // Density-based clustering with DBSCAN
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data, space).unwrap();
//! assert_eq!(labels, vec![0, 0, 1, 1]);
//! ```

mod ball_tree_fcm;
mod dbscan;
mod distance_adapted;
mod em;
mod engine;
mod fcm;
mod hcm;
mod polynomial;
mod prototype;
mod rewarding_crisp;
pub mod seeding;
mod traits;
mod util;
mod voronoi;

pub use ball_tree_fcm::BallTreeFuzzyCMeans;
pub use dbscan::{Dbscan, NOISE};
pub use distance_adapted::DistanceAdaptedFuzzyCMeans;
pub use em::SphericalGaussianEm;
pub use engine::{IterationConfig, NoiseDistance};
pub use fcm::FuzzyCMeans;
pub use hcm::HardCMeans;
pub use polynomial::PolynomialFuzzyCMeans;
pub use prototype::{Centroid, SphericalNormalDistributionPrototype};
pub use rewarding_crisp::RewardingCrispFuzzyCMeans;
pub use traits::{FuzzyClustering, NoiseClustering, PrototypeClustering, UNASSIGNED};
pub use voronoi::VoronoiFuzzyCMeans;
