//! Fuzzy clustering over abstract vector spaces.
//!
//! `edmoal` is a small library of alternating-optimization clustering algorithms that never
//! look inside a data object. Objects live in an [`IndexedDataSet`](data::IndexedDataSet); all
//! arithmetic on them goes through the traits in [`algebra`].
//!
//! - [`algebra`]: vector space, metric, norm and scalar product contracts, with implementations
//!   for real vectors and fixed-length lists
//! - [`data`]: indexed, sealable data sets
//! - [`tree`]: ball trees for neighbourhood queries and for aggregating over subtrees
//! - [`cluster`]: hard, fuzzy, noise and probabilistic c-Means variants, EM for spherical
//!   Gaussian mixtures, DBSCAN, and seeding
//!
//! ```rust
//! use edmoal::algebra::RealSpace;
//! use edmoal::cluster::{FuzzyCMeans, FuzzyClustering, NoiseDistance, PrototypeClustering};
//! use edmoal::data::IndexedDataSet;
//!
//! let data: IndexedDataSet<Vec<f64>> =
//!     vec![vec![0.0], vec![0.2], vec![4.0], vec![4.2], vec![100.0]].into_iter().collect();
//!
//! let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(1))
//!     .unwrap()
//!     .with_noise(NoiseDistance::new(2.0).unwrap());
//! fcm.initialize_with_positions(&[vec![1.0], vec![3.0]]).unwrap();
//! fcm.apply(100).unwrap();
//!
//! // The outlier ends up in the noise cluster instead of dragging a prototype.
//! let labels = fcm.crisp_assignments().unwrap();
//! assert_eq!(labels[4], edmoal::cluster::UNASSIGNED);
//! let u = fcm.fuzzy_assignments().unwrap();
//! assert!(u[4].iter().sum::<f64>() < 0.01);
//! ```

#![forbid(unsafe_code)]

pub mod algebra;
pub mod cluster;
pub mod data;
pub mod error;
pub mod tree;

pub use cluster::{
    BallTreeFuzzyCMeans, Dbscan, DistanceAdaptedFuzzyCMeans, FuzzyCMeans, FuzzyClustering,
    HardCMeans, NoiseClustering, PolynomialFuzzyCMeans, PrototypeClustering,
    RewardingCrispFuzzyCMeans, SphericalGaussianEm, VoronoiFuzzyCMeans, NOISE, UNASSIGNED,
};
pub use error::{Error, Result};
