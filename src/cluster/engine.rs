//! Shared state and driver of the alternating-optimization algorithms.
//!
//! Every algorithm in this module family alternates two steps until the prototypes stop moving:
//!
//! 1. **E-step**: membership of every data object to every active prototype, from the current
//!    prototype positions.
//! 2. **M-step**: each prototype moves to the membership-weighted mean of the data,
//!    `p_i = Σ_j w_ij x_j / Σ_j w_ij`, optionally damped by a learning factor.
//!
//! What differs between variants is only how memberships are computed and how they are turned
//! into weights; [`AoCore`] carries everything else: data, algebra, prototypes, iteration
//! counters, the convergence history and the stopping rule.

use tracing::{debug, trace};

use super::prototype::Centroid;
use super::util;
use crate::algebra::{Metric, VectorSpace};
use crate::data::IndexedDataSet;
use crate::error::{invalid, Error, Result};

/// Stopping rule and damping shared by all alternating-optimization algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationConfig {
    epsilon: f64,
    learning_factor: f64,
    min_iterations: usize,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            learning_factor: 1.0,
            min_iterations: 0,
        }
    }
}

impl IterationConfig {
    /// Defaults: `epsilon = 1e-6`, `learning_factor = 1`, `min_iterations = 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once no prototype moved by `epsilon` or more in an iteration.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !(epsilon >= 0.0 && epsilon.is_finite()) {
            return Err(invalid("epsilon", "must be finite and non-negative"));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    /// Move prototypes only this fraction of the way to their new position
    /// (`pos + factor · (new - pos)`). `1` means no damping.
    pub fn with_learning_factor(mut self, learning_factor: f64) -> Result<Self> {
        if !(learning_factor > 0.0 && learning_factor.is_finite()) {
            return Err(invalid("learning_factor", "must be finite and positive"));
        }
        self.learning_factor = learning_factor;
        Ok(self)
    }

    /// Never stop on convergence before this many iterations of one `apply` call.
    pub fn with_min_iterations(mut self, min_iterations: usize) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    /// Convergence threshold on prototype movement.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Damping factor of the prototype update.
    pub fn learning_factor(&self) -> f64 {
        self.learning_factor
    }

    /// Minimum iterations per `apply` call.
    pub fn min_iterations(&self) -> usize {
        self.min_iterations
    }
}

/// Distance of the virtual noise cluster.
///
/// The noise cluster sits at the same distance from every data object. It can stay fixed or shrink
/// exponentially from `initial` toward `terminal`: in iteration `t` (counted from 0 since
/// initialization) the distance is `terminal + (initial - terminal) · factor^t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseDistance {
    initial: f64,
    terminal: f64,
    factor: f64,
}

impl NoiseDistance {
    /// A constant noise distance.
    pub fn new(distance: f64) -> Result<Self> {
        Self::decaying(distance, distance, 1.0)
    }

    /// A noise distance decaying from `initial` to `terminal` by `factor` per iteration.
    pub fn decaying(initial: f64, terminal: f64, factor: f64) -> Result<Self> {
        if !(initial > 0.0 && initial.is_finite()) {
            return Err(invalid("noise_distance", "must be finite and positive"));
        }
        if !(terminal > 0.0 && terminal <= initial) {
            return Err(invalid(
                "terminal_noise_distance",
                "must be positive and not exceed the initial noise distance",
            ));
        }
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(invalid("noise_degradation_factor", "must be in (0, 1]"));
        }
        Ok(Self {
            initial,
            terminal,
            factor,
        })
    }

    /// Noise distance used in iteration `iteration`.
    pub fn at(&self, iteration: usize) -> f64 {
        if self.factor == 1.0 || self.initial == self.terminal {
            return self.initial;
        }
        let exponent = i32::try_from(iteration).unwrap_or(i32::MAX);
        self.terminal + (self.initial - self.terminal) * self.factor.powi(exponent)
    }

    /// Squared noise distance used in iteration `iteration`.
    pub fn squared_at(&self, iteration: usize) -> f64 {
        let d = self.at(iteration);
        d * d
    }

    /// Distance at initialization.
    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Limit of the decay.
    pub fn terminal(&self) -> f64 {
        self.terminal
    }
}

/// Data, algebra, prototypes and iteration bookkeeping of one algorithm instance.
#[derive(Debug, Clone)]
pub(crate) struct AoCore<'a, T, S> {
    pub(crate) data: &'a IndexedDataSet<T>,
    pub(crate) space: S,
    pub(crate) prototypes: Vec<Centroid<T>>,
    pub(crate) config: IterationConfig,
    iteration_count: usize,
    history: Vec<f64>,
    initialized: bool,
}

impl<'a, T, S> AoCore<'a, T, S> {
    pub(crate) fn new(data: &'a IndexedDataSet<T>, space: S) -> Result<Self> {
        data.ensure_clusterable()?;
        Ok(Self {
            data,
            space,
            prototypes: Vec::new(),
            config: IterationConfig::default(),
            iteration_count: 0,
            history: Vec::new(),
            initialized: false,
        })
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// Index of the last completed iteration, or 0 before the first one.
    pub(crate) fn last_iteration(&self) -> usize {
        self.iteration_count.saturating_sub(1)
    }

    pub(crate) fn history(&self) -> &[f64] {
        &self.history
    }

    pub(crate) fn prototypes(&self) -> Result<&[Centroid<T>]> {
        self.ensure_initialized()?;
        Ok(&self.prototypes)
    }

    pub(crate) fn active_count(&self) -> usize {
        self.prototypes.iter().filter(|p| p.is_activated()).count()
    }

    fn reset(&mut self) {
        self.iteration_count = 0;
        self.history.clear();
        self.initialized = true;
    }

    /// Count one finished iteration.
    pub(crate) fn record_iteration(&mut self, algorithm: &'static str, max_movement: f64) {
        self.iteration_count += 1;
        self.history.push(max_movement);
        trace!(
            algorithm,
            iteration = self.iteration_count,
            max_movement,
            "iteration complete"
        );
    }

    pub(crate) fn log_finished(&self, algorithm: &'static str, iterations: usize, converged: bool) {
        debug!(
            algorithm,
            iterations,
            total_iterations = self.iteration_count,
            active_prototypes = self.active_count(),
            converged,
            "apply finished"
        );
    }
}

impl<'a, T, S: VectorSpace<T>> AoCore<'a, T, S> {
    pub(crate) fn initialize_with_positions(&mut self, positions: &[T]) -> Result<()> {
        if positions.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.prototypes = positions
            .iter()
            .enumerate()
            .map(|(i, p)| Centroid::new(i, self.space.copy_new(p)))
            .collect();
        self.reset();
        Ok(())
    }

    pub(crate) fn initialize_with_prototypes(&mut self, prototypes: &[Centroid<T>]) -> Result<()> {
        if prototypes.is_empty() {
            return Err(Error::EmptyInput);
        }
        if !prototypes.iter().any(Centroid::is_activated) {
            return Err(invalid("prototypes", "at least one prototype must be activated"));
        }
        self.prototypes = prototypes
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut copy = Centroid::new(i, self.space.copy_new(p.position()));
                if !p.is_activated() {
                    copy.deactivate();
                }
                copy
            })
            .collect();
        self.reset();
        Ok(())
    }
}

impl<'a, T, S: VectorSpace<T> + Metric<T>> AoCore<'a, T, S> {
    /// Squared distances from `x` to every prototype, `INFINITY` for deactivated ones.
    pub(crate) fn distances_sq_into(&self, x: &T, out: &mut [f64]) {
        for (d, p) in out.iter_mut().zip(&self.prototypes) {
            *d = if p.is_activated() {
                self.space.distance_sq(x, p.position())
            } else {
                f64::INFINITY
            };
        }
    }

    /// Run up to `steps` iterations of `step`, which performs one E/M cycle and returns the
    /// largest squared prototype movement. Stops on `movement < epsilon²`.
    pub(crate) fn run(
        &mut self,
        algorithm: &'static str,
        steps: usize,
        mut step: impl FnMut(&mut Self) -> f64,
    ) -> Result<usize> {
        self.ensure_initialized()?;
        let threshold = self.config.epsilon * self.config.epsilon;
        let mut done = 0;
        let mut converged = false;
        while done < steps {
            let movement = step(self);
            done += 1;
            self.record_iteration(algorithm, movement);
            if movement < threshold && done >= self.config.min_iterations {
                converged = true;
                break;
            }
        }
        self.log_finished(algorithm, done, converged);
        Ok(done)
    }

    /// One fuzzy E/M cycle.
    ///
    /// `memberships` fills one slot per prototype for an element and returns its noise membership;
    /// `weight` maps a membership to its weight in the prototype update.
    pub(crate) fn fuzzy_step(
        &mut self,
        memberships: impl Fn(&Self, &T, &mut [f64]) -> f64,
        weight: impl Fn(f64) -> f64,
    ) -> f64 {
        let c = self.prototypes.len();
        let mut sums: Vec<T> = (0..c).map(|_| self.space.null_vector()).collect();
        let mut weights = vec![0.0; c];
        let mut u = vec![0.0; c];

        for obj in self.data {
            memberships(self, &obj.x, &mut u);
            for i in 0..c {
                if u[i] > 0.0 {
                    let w = weight(u[i]);
                    self.space.add_multiple(&mut sums[i], &obj.x, w);
                    weights[i] += w;
                }
            }
        }
        self.update_prototypes(sums, &weights)
    }

    /// Move every active prototype with positive accumulated weight to `sum / weight`, damped by
    /// the learning factor. Returns the largest squared movement.
    pub(crate) fn update_prototypes(&mut self, sums: Vec<T>, weights: &[f64]) -> f64 {
        let factor = self.config.learning_factor;
        let mut max_movement: f64 = 0.0;
        for ((proto, mut target), &w) in self.prototypes.iter_mut().zip(sums).zip(weights) {
            if !proto.is_activated() || w <= 0.0 {
                continue;
            }
            self.space.mul(&mut target, 1.0 / w);
            if factor != 1.0 {
                self.space.sub(&mut target, proto.position());
                self.space.mul(&mut target, factor);
                self.space.add(&mut target, proto.position());
            }
            max_movement = max_movement.max(self.space.distance_sq(proto.position(), &target));
            proto.set_position(target);
        }
        max_movement
    }

    pub(crate) fn memberships_of(
        &self,
        x: &T,
        memberships: impl Fn(&Self, &T, &mut [f64]) -> f64,
    ) -> Result<(Vec<f64>, f64)> {
        self.ensure_initialized()?;
        let mut u = vec![0.0; self.prototypes.len()];
        let noise = memberships(self, x, &mut u);
        Ok((u, noise))
    }

    /// Membership vectors and noise memberships of all data objects in ID order.
    pub(crate) fn all_memberships(
        &self,
        memberships: impl Fn(&Self, &T, &mut [f64]) -> f64,
    ) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
        self.ensure_initialized()?;
        let c = self.prototypes.len();
        let mut rows = Vec::with_capacity(self.data.len());
        let mut noise = Vec::with_capacity(self.data.len());
        for obj in self.data {
            let mut u = vec![0.0; c];
            noise.push(memberships(self, &obj.x, &mut u));
            rows.push(u);
        }
        Ok((rows, noise))
    }

    pub(crate) fn crisp_assignments(
        &self,
        memberships: impl Fn(&Self, &T, &mut [f64]) -> f64,
    ) -> Result<Vec<usize>> {
        self.ensure_initialized()?;
        let mut u = vec![0.0; self.prototypes.len()];
        Ok(self
            .data
            .iter()
            .map(|obj| {
                let noise = memberships(self, &obj.x, &mut u);
                util::crisp_label(&u, noise)
            })
            .collect())
    }
}
