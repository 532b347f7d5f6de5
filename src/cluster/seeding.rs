//! Initial prototype positions drawn from a data set.
//!
//! Every alternating-optimization algorithm needs starting positions. Two strategies:
//!
//! - [`random_positions`]: `k` distinct data objects chosen uniformly.
//! - [`kmeanspp_positions`]: k-means++ D² sampling (Arthur & Vassilvitskii, 2007). The first
//!   position is uniform; every further one is a data object drawn with probability proportional
//!   to its squared distance from the nearest position chosen so far. This spreads the seeds out
//!   and makes a bad local optimum much less likely.
//!
//! Both take an optional seed. With `Some(seed)` the result is reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::algebra::Metric;
use crate::data::IndexedDataSet;
use crate::error::{Error, Result};

fn rng_for(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(rand::rng()),
    }
}

fn check_count<T>(data: &IndexedDataSet<T>, k: usize) -> Result<()> {
    data.ensure_clusterable()?;
    if k == 0 || k > data.len() {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: data.len(),
        });
    }
    Ok(())
}

/// `k` distinct data objects, chosen uniformly at random.
pub fn random_positions<T: Clone>(
    data: &IndexedDataSet<T>,
    k: usize,
    seed: Option<u64>,
) -> Result<Vec<T>> {
    check_count(data, k)?;
    let mut rng = rng_for(seed);
    Ok(rand::seq::index::sample(&mut *rng, data.len(), k)
        .into_iter()
        .map(|id| data[id].x.clone())
        .collect())
}

/// `k` data objects chosen by k-means++ D² sampling under `metric`.
pub fn kmeanspp_positions<T, M>(
    data: &IndexedDataSet<T>,
    metric: &M,
    k: usize,
    seed: Option<u64>,
) -> Result<Vec<T>>
where
    T: Clone,
    M: Metric<T>,
{
    check_count(data, k)?;
    let n = data.len();
    let mut rng = rng_for(seed);

    let mut chosen = Vec::with_capacity(k);
    let mut taken = vec![false; n];
    let first = rng.random_range(0..n);
    chosen.push(first);
    taken[first] = true;

    let mut nearest: Vec<f64> = data
        .elements()
        .map(|x| metric.distance_sq(x, &data[first].x))
        .collect();

    while chosen.len() < k {
        let total: f64 = nearest
            .iter()
            .zip(&taken)
            .filter(|&(_, &t)| !t)
            .map(|(&d, _)| d)
            .sum();

        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = None;
            for (i, &d) in nearest.iter().enumerate() {
                if taken[i] || d <= 0.0 {
                    continue;
                }
                cumulative += d;
                pick = Some(i);
                if cumulative >= target {
                    break;
                }
            }
            pick
        } else {
            // Every remaining object coincides with a chosen one.
            let remaining: Vec<usize> = (0..n).filter(|&i| !taken[i]).collect();
            remaining.choose(&mut *rng).copied()
        };
        let Some(next) = next else {
            break;
        };

        chosen.push(next);
        taken[next] = true;
        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(metric.distance_sq(&data[i].x, &data[next].x));
        }
    }

    Ok(chosen.into_iter().map(|id| data[id].x.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;

    fn data() -> IndexedDataSet<Vec<f64>> {
        (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect()
    }

    #[test]
    fn random_positions_are_distinct_objects() {
        let data = data();
        let positions = random_positions(&data, 5, Some(7)).unwrap();
        assert_eq!(positions.len(), 5);
        for (a, p) in positions.iter().enumerate() {
            assert!(data.elements().any(|x| x == p));
            for q in &positions[a + 1..] {
                assert_ne!(p, q);
            }
        }
        assert_eq!(positions, random_positions(&data, 5, Some(7)).unwrap());
    }

    #[test]
    fn kmeanspp_spreads_out() {
        let data: IndexedDataSet<Vec<f64>> = [0.0, 0.01, 0.02, 100.0, 100.01, 200.0]
            .iter()
            .map(|&v| vec![v])
            .collect();
        let positions = kmeanspp_positions(&data, &RealSpace::new(1), 3, Some(1)).unwrap();
        let mut buckets: Vec<i64> = positions
            .iter()
            .map(|p| (p[0] / 100.0).round() as i64)
            .collect();
        buckets.sort();
        assert_eq!(buckets, vec![0, 1, 2]);
    }

    #[test]
    fn kmeanspp_handles_duplicates() {
        let data: IndexedDataSet<Vec<f64>> = (0..4).map(|_| vec![1.0]).collect();
        let positions = kmeanspp_positions(&data, &RealSpace::new(1), 3, Some(3)).unwrap();
        assert_eq!(positions, vec![vec![1.0]; 3]);
    }

    #[test]
    fn cluster_count_is_checked() {
        let data = data();
        assert_eq!(
            random_positions(&data, 0, None),
            Err(Error::InvalidClusterCount {
                requested: 0,
                n_items: 20
            })
        );
        assert!(kmeanspp_positions(&data, &RealSpace::new(2), 21, None).is_err());
    }
}
