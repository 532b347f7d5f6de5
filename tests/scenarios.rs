//! End-to-end runs on a seeded three-blob data set.
//!
//! Plain and polynomial FCM minimize their objective exactly in every step, so it never increases.
//! The rewarding-crisp shift `η` and the Voronoi visible sets move with the prototypes, so those
//! two objectives may rise slightly in the first few steps and are checked once the run has
//! settled. `DistanceAdaptedFuzzyCMeans` is left out: its distance offsets are recomputed from
//! the moved prototypes in every step, so consecutive values are not values of one objective.

use edmoal::algebra::{Metric, RealSpace};
use edmoal::cluster::{
    Dbscan, FuzzyCMeans, FuzzyClustering, HardCMeans, PolynomialFuzzyCMeans,
    PrototypeClustering, RewardingCrispFuzzyCMeans, SphericalGaussianEm, VoronoiFuzzyCMeans,
};
use edmoal::data::IndexedDataSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const CENTERS: [[f64; 2]; 3] = [[0.2, 0.2], [0.8, 0.2], [0.5, 0.8]];
const PER_BLOB: usize = 100;

/// 300 points, 100 per center, σ = 0.05. Object `j` belongs to blob `j / 100`.
fn blobs() -> IndexedDataSet<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.05).unwrap();
    CENTERS
        .iter()
        .flat_map(|c| (0..PER_BLOB).map(move |_| *c))
        .map(|c| vec![c[0] + noise.sample(&mut rng), c[1] + noise.sample(&mut rng)])
        .collect()
}

fn start() -> Vec<Vec<f64>> {
    vec![vec![0.3, 0.3], vec![0.7, 0.3], vec![0.5, 0.6]]
}

/// Initialization far from the blobs, two prototypes almost on top of each other.
fn poor_start() -> Vec<Vec<f64>> {
    vec![vec![0.0, 0.0], vec![0.1, 0.0], vec![1.0, 1.0]]
}

/// Run `steps` single iterations and check the objective never increases between them.
fn assert_objective_never_increases<A>(alg: &mut A, steps: usize)
where
    A: PrototypeClustering<Vec<f64>>,
{
    let mut previous = alg.objective_function().unwrap();
    for _ in 0..steps {
        alg.apply(1).unwrap();
        let current = alg.objective_function().unwrap();
        assert!(current <= previous * (1.0 + 1e-12) + 1e-12, "{current} > {previous}");
        previous = current;
    }
}

fn nearest_center(space: &RealSpace, p: &Vec<f64>) -> usize {
    (0..CENTERS.len())
        .min_by(|&a, &b| {
            let da = space.distance_sq(p, &CENTERS[a].to_vec());
            let db = space.distance_sq(p, &CENTERS[b].to_vec());
            da.total_cmp(&db)
        })
        .unwrap()
}

#[test]
fn fuzzy_c_means_recovers_centers() {
    let data = blobs();
    let space = RealSpace::new(2);
    let mut fcm = FuzzyCMeans::new(&data, space)
        .unwrap()
        .with_fuzzifier(2.0)
        .unwrap()
        .with_epsilon(0.001)
        .unwrap();
    fcm.initialize_with_positions(&start()).unwrap();

    let steps = fcm.apply(1000).unwrap();
    assert!(steps <= 50, "took {steps} iterations");

    let positions = fcm.prototype_positions().unwrap();
    for (p, c) in positions.iter().zip(CENTERS) {
        assert!(space.distance(p, &c.to_vec()) < 0.05, "{p:?} vs {c:?}");
    }
}

#[test]
fn hard_c_means_labels_match_blobs() {
    let data = blobs();
    let space = RealSpace::new(2);
    let mut hcm = HardCMeans::new(&data, space).unwrap();
    hcm.initialize_with_positions(&start()).unwrap();
    hcm.apply(100).unwrap();

    let positions = hcm.prototype_positions().unwrap();
    let blob_of_prototype: Vec<usize> =
        positions.iter().map(|p| nearest_center(&space, p)).collect();
    let mut sorted = blob_of_prototype.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2]);

    let labels = hcm.crisp_assignments().unwrap();
    let correct = labels
        .iter()
        .enumerate()
        .filter(|&(j, &l)| blob_of_prototype[l] == j / PER_BLOB)
        .count();
    assert!(correct * 100 >= 95 * labels.len(), "{correct} of {}", labels.len());
}

#[test]
fn fuzzy_c_means_objective_is_monotone() {
    let data = blobs();
    let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    fcm.initialize_with_positions(&poor_start()).unwrap();
    assert_objective_never_increases(&mut fcm, 30);
}

#[test]
fn polynomial_objective_is_monotone() {
    let data = blobs();
    let mut pfcm = PolynomialFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    pfcm.initialize_with_positions(&poor_start()).unwrap();
    assert_objective_never_increases(&mut pfcm, 30);
}

#[test]
fn rewarding_crisp_objective_is_monotone_once_settled() {
    let data = blobs();
    let mut rcfcm = RewardingCrispFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    rcfcm.initialize_with_positions(&start()).unwrap();
    let initial = rcfcm.objective_function().unwrap();
    for _ in 0..10 {
        rcfcm.apply(1).unwrap();
    }
    assert!(rcfcm.objective_function().unwrap() < initial);
    assert_objective_never_increases(&mut rcfcm, 30);
}

#[test]
fn voronoi_objective_is_monotone_once_settled() {
    let data = blobs();
    let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    vfcm.initialize_with_positions(&start()).unwrap();
    let initial = vfcm.objective_function().unwrap();
    for _ in 0..10 {
        vfcm.apply(1).unwrap();
    }
    assert!(vfcm.objective_function().unwrap() < initial);
    assert_objective_never_increases(&mut vfcm, 30);
}

#[test]
fn em_log_likelihood_is_monotone() {
    let data = blobs();
    let mut em = SphericalGaussianEm::new(&data).unwrap();
    em.initialize_with_positions(&start()).unwrap();
    let mut previous = em.objective_function().unwrap();
    for _ in 0..30 {
        em.apply(1).unwrap();
        let current = em.objective_function().unwrap();
        assert!(current >= previous - 1e-9 * previous.abs(), "{current} < {previous}");
        previous = current;
    }

    let weights = em.mixture_weights().unwrap();
    for w in weights {
        assert!((w - 1.0 / 3.0).abs() < 0.05);
    }
}

#[test]
fn converged_run_is_idempotent() {
    let data = blobs();
    let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    fcm.initialize_with_positions(&start()).unwrap();
    let first = fcm.apply(1000).unwrap();
    assert!(first < 1000);
    let before = fcm.prototype_positions().unwrap();

    assert_eq!(fcm.apply(50).unwrap(), 1);
    assert_eq!(fcm.iteration_count(), first + 1);
    let after = fcm.prototype_positions().unwrap();
    let space = RealSpace::new(2);
    for (a, b) in before.iter().zip(&after) {
        assert!(space.distance(a, b) < 1e-6);
    }
}

#[test]
fn single_point_is_reached_in_one_iteration() {
    let data = IndexedDataSet::from_elements(vec![vec![0.4, 0.7]]);
    let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    fcm.initialize_with_positions(&[vec![5.0, -3.0]]).unwrap();

    assert_eq!(fcm.apply(1).unwrap(), 1);
    assert_eq!(fcm.prototype_positions().unwrap(), vec![vec![0.4, 0.7]]);
    assert_eq!(fcm.apply(10).unwrap(), 1);
    assert_eq!(fcm.fuzzy_assignments().unwrap(), vec![vec![1.0]]);
}

#[test]
fn voronoi_hides_collinear_prototypes() {
    let data = blobs();
    let mut vfcm = VoronoiFuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    // Seen from the first center, the second prototype sits behind the first one.
    vfcm.initialize_with_positions(&[vec![0.5, 0.2], vec![0.8, 0.2], vec![0.4, 0.8]])
        .unwrap();
    let query = vec![0.2, 0.2];
    let visible = vfcm.visible_prototypes(&query).unwrap();
    assert_eq!(visible, vec![true, false, true]);
    let u = vfcm.memberships_of(&query).unwrap();
    assert_eq!(u[1], 0.0);
    assert!((u[0] + u[2] - 1.0).abs() < 1e-12);

    let mut fcm = FuzzyCMeans::new(&data, RealSpace::new(2)).unwrap();
    fcm.initialize_with_positions(&[vec![0.5, 0.2], vec![0.8, 0.2], vec![0.4, 0.8]])
        .unwrap();
    assert!(fcm.memberships_of(&query).unwrap()[1] > 0.0);
}

#[test]
fn dbscan_finds_the_blobs() {
    let data = blobs();
    let labels = Dbscan::new(0.08, 5)
        .fit_predict_with_noise(&data, RealSpace::new(2))
        .unwrap();
    let clustered = labels.iter().filter(|l| l.is_some()).count();
    assert!(clustered * 100 >= 90 * labels.len());
    // The blobs are far apart compared to epsilon, so no cluster spans two of them.
    for blob in 0..CENTERS.len() {
        for j in blob * PER_BLOB..(blob + 1) * PER_BLOB {
            for k in 0..labels.len() {
                if k / PER_BLOB != blob {
                    if let (Some(a), Some(b)) = (labels[j], labels[k]) {
                        assert_ne!(a, b);
                    }
                }
            }
        }
    }
}
