//! Membership kernels and small numeric helpers shared by the fuzzy algorithms.
//!
//! Kernels work in place on a slice of squared distances, one slot per prototype. A slot holding
//! `f64::INFINITY` stands for a prototype that must not receive membership (deactivated, or
//! hidden by Voronoi pruning); it comes out as exactly `0.0`. The optional `noise` argument is the
//! squared distance of the virtual noise cluster; kernels return its membership.

use super::traits::UNASSIGNED;

/// Karush-Kuhn-Tucker boundary case: if any candidate has a non-positive squared distance, all
/// membership is split evenly among those candidates and every other candidate gets 0.
///
/// Returns the noise share when the case applies, `None` otherwise.
pub(crate) fn split_coincident(values: &mut [f64], noise: Option<f64>) -> Option<f64> {
    let noise_zero = noise.is_some_and(|n| n <= 0.0);
    let zeros = values.iter().filter(|&&v| v <= 0.0).count() + usize::from(noise_zero);
    if zeros == 0 {
        return None;
    }
    let share = 1.0 / zeros as f64;
    for v in values.iter_mut() {
        *v = if *v <= 0.0 { share } else { 0.0 };
    }
    Some(if noise_zero { share } else { 0.0 })
}

/// Standard Fuzzy c-Means memberships `u_i = d_i^{1/(1-m)} / Σ_k d_k^{1/(1-m)}`.
///
/// Distances are scaled by the smallest candidate before exponentiation so the kernel values lie
/// in `(0, 1]` and the sum cannot overflow, however large the fuzzifier.
pub(crate) fn fcm_memberships(values: &mut [f64], fuzzifier: f64, noise: Option<f64>) -> f64 {
    if let Some(noise_share) = split_coincident(values, noise) {
        return noise_share;
    }

    let smallest = values
        .iter()
        .copied()
        .chain(noise)
        .fold(f64::INFINITY, f64::min);
    if !smallest.is_finite() {
        values.iter_mut().for_each(|v| *v = 0.0);
        return 0.0;
    }

    let exponent = 1.0 / (1.0 - fuzzifier);
    let kernel = |d: f64| {
        if d.is_finite() {
            (d / smallest).powf(exponent)
        } else {
            0.0
        }
    };

    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = kernel(*v);
        sum += *v;
    }
    let noise_kernel = noise.map_or(0.0, kernel);
    sum += noise_kernel;

    for v in values.iter_mut() {
        *v /= sum;
    }
    noise_kernel / sum
}

/// Polynomial fuzzifier memberships (Klawonn & Höppner).
///
/// Candidates are sorted by distance; only the `ĉ` nearest receive membership
///
/// ```text
/// u_i = 1/(1-β) · ( (1 + (ĉ-1)β) / (d_i · Σ_{k≤ĉ} 1/d_k) - β )
/// ```
///
/// where `ĉ` is the largest prefix whose last member still gets a positive value. Everything
/// beyond the prefix gets exactly 0. `β = 1` always yields `ĉ = 1`, i.e. a crisp assignment.
pub(crate) fn polynomial_memberships(values: &mut [f64], beta: f64, noise: Option<f64>) -> f64 {
    if let Some(noise_share) = split_coincident(values, noise) {
        return noise_share;
    }

    let c = values.len();
    let dist = |k: usize, values: &[f64]| {
        if k == c {
            noise.unwrap_or(f64::INFINITY)
        } else {
            values[k]
        }
    };

    let mut order: Vec<usize> = (0..c).filter(|&i| values[i].is_finite()).collect();
    if noise.is_some() {
        order.push(c);
    }
    order.sort_by(|&a, &b| dist(a, values).total_cmp(&dist(b, values)).then(a.cmp(&b)));

    let mut inv_sum = 0.0;
    let mut included = 0;
    for (k, &idx) in order.iter().enumerate() {
        let d = dist(idx, values);
        let s = inv_sum + 1.0 / d;
        if k > 0 && (1.0 + k as f64 * beta) / (d * s) <= beta {
            break;
        }
        inv_sum = s;
        included = k + 1;
    }

    let distances: Vec<f64> = order[..included].iter().map(|&i| dist(i, values)).collect();
    values.iter_mut().for_each(|v| *v = 0.0);
    let mut noise_u = 0.0;
    let numerator = 1.0 + (included as f64 - 1.0) * beta;
    for (&idx, &d) in order[..included].iter().zip(&distances) {
        let u = if included == 1 {
            1.0
        } else {
            ((numerator / (d * inv_sum) - beta) / (1.0 - beta)).max(0.0)
        };
        if idx == c {
            noise_u = u;
        } else {
            values[idx] = u;
        }
    }
    noise_u
}

/// The polynomial fuzzifier function `g(u) = (1-β)/(1+β) u² + 2β/(1+β) u`.
#[inline]
pub(crate) fn polynomial_fuzzifier(u: f64, beta: f64) -> f64 {
    ((1.0 - beta) * u * u + 2.0 * beta * u) / (1.0 + beta)
}

/// Crisp label from a membership vector: the first prototype with maximal membership, or
/// [`UNASSIGNED`] if the noise cluster wins or nothing has membership.
pub(crate) fn crisp_label(memberships: &[f64], noise: f64) -> usize {
    let mut best = UNASSIGNED;
    let mut best_u = 0.0;
    for (i, &u) in memberships.iter().enumerate() {
        if u > best_u {
            best_u = u;
            best = i;
        }
    }
    if noise > best_u {
        UNASSIGNED
    } else {
        best
    }
}

/// Mean and population standard deviation.
pub(crate) fn mean_and_std(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let var = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean, var.sqrt())
}

/// Index of the first minimum among finite values.
pub(crate) fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() && best.map_or(true, |b| v < values[b]) {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn fcm_two_prototypes() {
        // d = 1 and 4, m = 2: kernels 1 and 1/4.
        let mut u = vec![1.0, 4.0];
        let noise = fcm_memberships(&mut u, 2.0, None);
        assert_close(u[0], 0.8);
        assert_close(u[1], 0.2);
        assert_eq!(noise, 0.0);
    }

    #[test]
    fn fcm_with_noise_and_inactive() {
        let mut u = vec![1.0, f64::INFINITY, 1.0];
        let noise = fcm_memberships(&mut u, 2.0, Some(2.0));
        assert_close(u[0], 0.4);
        assert_eq!(u[1], 0.0);
        assert_close(u[2], 0.4);
        assert_close(noise, 0.2);
    }

    #[test]
    fn coincident_split() {
        let mut u = vec![0.0, 3.0, 0.0, f64::INFINITY];
        let noise = fcm_memberships(&mut u, 3.0, Some(1.0));
        assert_eq!(u, vec![0.5, 0.0, 0.5, 0.0]);
        assert_eq!(noise, 0.0);

        let mut u = vec![2.0, 3.0];
        let noise = fcm_memberships(&mut u, 2.0, Some(0.0));
        assert_eq!(u, vec![0.0, 0.0]);
        assert_eq!(noise, 1.0);
    }

    #[test]
    fn fcm_large_fuzzifier_stays_finite() {
        let mut u = vec![1e-300, 1.0, 1e300];
        fcm_memberships(&mut u, 1.0001, None);
        assert!(u.iter().all(|v| v.is_finite()));
        assert_close(u.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn polynomial_excludes_far_prototypes() {
        // β = 0.5: second prototype at 10x the distance does not qualify.
        let mut u = vec![1.0, 10.0];
        polynomial_memberships(&mut u, 0.5, None);
        assert_eq!(u, vec![1.0, 0.0]);

        // Equal distances share evenly.
        let mut u = vec![2.0, 2.0, 2.0];
        polynomial_memberships(&mut u, 0.5, None);
        for v in &u {
            assert_close(*v, 1.0 / 3.0);
        }
    }

    #[test]
    fn polynomial_beta_zero_is_fcm_with_m2() {
        let mut p = vec![1.0, 2.0, 4.0];
        let mut f = p.clone();
        polynomial_memberships(&mut p, 0.0, None);
        fcm_memberships(&mut f, 2.0, None);
        for (a, b) in p.iter().zip(&f) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn polynomial_beta_one_is_crisp() {
        let mut u = vec![3.0, 1.0, 1.5];
        let noise = polynomial_memberships(&mut u, 1.0, Some(5.0));
        assert_eq!(u, vec![0.0, 1.0, 0.0]);
        assert_eq!(noise, 0.0);
    }

    #[test]
    fn polynomial_noise_takes_part() {
        let mut u = vec![1.0, 1.0];
        let noise = polynomial_memberships(&mut u, 0.2, Some(1.0));
        for v in &u {
            assert_close(*v, 1.0 / 3.0);
        }
        assert_close(noise, 1.0 / 3.0);
    }

    #[test]
    fn fuzzifier_function_endpoints() {
        assert_close(polynomial_fuzzifier(0.0, 0.3), 0.0);
        assert_close(polynomial_fuzzifier(1.0, 0.3), 1.0);
        assert_close(polynomial_fuzzifier(0.5, 0.0), 0.25);
    }

    #[test]
    fn crisp_labels() {
        assert_eq!(crisp_label(&[0.2, 0.5, 0.3], 0.0), 1);
        assert_eq!(crisp_label(&[0.4, 0.4, 0.2], 0.0), 0);
        assert_eq!(crisp_label(&[0.2, 0.3], 0.5), UNASSIGNED);
        assert_eq!(crisp_label(&[0.0, 0.0], 0.0), UNASSIGNED);
    }

    #[test]
    fn statistics() {
        let (m, s) = mean_and_std([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter());
        assert_close(m, 5.0);
        assert_close(s, 2.0);
        assert_eq!(argmin(&[3.0, f64::INFINITY, 1.0, 1.0]), Some(2));
        assert_eq!(argmin(&[f64::INFINITY]), None);
    }
}
