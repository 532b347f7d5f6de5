use crate::algebra::VectorSpace;

/// A movable cluster representative.
///
/// Prototypes are never removed from an algorithm while it runs. Reducing the number of clusters
/// deactivates a prototype instead: it keeps its slot and its index, so every per-cluster array
/// stays valid, but it takes no part in distance or membership computations any more.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroid<T> {
    position: T,
    activated: bool,
    cluster_index: usize,
}

impl<T> Centroid<T> {
    /// An activated prototype at `position`.
    pub fn new(cluster_index: usize, position: T) -> Self {
        Self {
            position,
            activated: true,
            cluster_index,
        }
    }

    /// Current position.
    pub fn position(&self) -> &T {
        &self.position
    }

    /// Index of the cluster this prototype represents.
    pub fn cluster_index(&self) -> usize {
        self.cluster_index
    }

    /// Whether the prototype takes part in the computation.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Include the prototype again.
    pub fn activate(&mut self) {
        self.activated = true;
    }

    /// Exclude the prototype from all further computations.
    pub fn deactivate(&mut self) {
        self.activated = false;
    }

    /// Copy `target` into the current position, reusing its storage.
    pub fn move_to<S: VectorSpace<T>>(&mut self, space: &S, target: &T) {
        space.copy(&mut self.position, target);
    }

    /// Replace the position.
    pub fn set_position(&mut self, position: T) {
        self.position = position;
    }

    /// Take the position out of the prototype.
    pub fn into_position(self) -> T {
        self.position
    }
}

/// An isotropic Gaussian component: a [`Centroid`] as mean plus one scalar variance.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalNormalDistributionPrototype<T> {
    /// Mean of the distribution.
    pub centroid: Centroid<T>,
    /// Variance per coordinate.
    pub variance: f64,
}

impl<T> SphericalNormalDistributionPrototype<T> {
    /// Component `cluster_index` with mean `position` and variance `variance`.
    pub fn new(cluster_index: usize, position: T, variance: f64) -> Self {
        Self {
            centroid: Centroid::new(cluster_index, position),
            variance,
        }
    }

    /// Mean of the distribution.
    pub fn position(&self) -> &T {
        self.centroid.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::RealSpace;

    #[test]
    fn deactivation_keeps_index_and_position() {
        let mut c = Centroid::new(3, vec![1.0, 2.0]);
        c.deactivate();
        assert!(!c.is_activated());
        assert_eq!(c.cluster_index(), 3);
        assert_eq!(c.position(), &vec![1.0, 2.0]);
        c.activate();
        assert!(c.is_activated());
    }

    #[test]
    fn move_to_copies() {
        let space = RealSpace::new(2);
        let mut c = Centroid::new(0, vec![0.0, 0.0]);
        let target = vec![5.0, 6.0];
        c.move_to(&space, &target);
        assert_eq!(c.position(), &target);
        assert_eq!(c.into_position(), vec![5.0, 6.0]);
    }
}
