//! Indexed data sets.
//!
//! Clustering results are plain arrays indexed by data object ID: one crisp label or one membership
//! vector per object. That only works if IDs are dense and never change, so an
//! [`IndexedDataSet`] is append-only until it is sealed, and every consumer in this crate refuses
//! an unsealed set.
//!
//! ```rust
//! use edmoal::data::IndexedDataSet;
//!
//! let mut data = IndexedDataSet::new();
//! assert_eq!(data.push(vec![0.0, 1.0]).unwrap(), 0);
//! assert_eq!(data.push(vec![2.0, 3.0]).unwrap(), 1);
//! data.seal();
//! assert!(data.push(vec![4.0, 5.0]).is_err());
//! assert_eq!(data[1].x, vec![2.0, 3.0]);
//! ```

use std::ops::Index;

use crate::error::{Error, Result};

/// One element of an [`IndexedDataSet`] together with its ID.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDataObject<T> {
    id: usize,
    /// The payload.
    pub x: T,
}

impl<T> IndexedDataObject<T> {
    /// Position of this object in its data set.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The payload.
    pub fn element(&self) -> &T {
        &self.x
    }
}

/// Ordered collection of data objects with IDs `0..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDataSet<T> {
    objects: Vec<IndexedDataObject<T>>,
    sealed: bool,
}

impl<T> Default for IndexedDataSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedDataSet<T> {
    /// An empty, open data set.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            sealed: false,
        }
    }

    /// An empty, open data set with room for `capacity` objects.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
            sealed: false,
        }
    }

    /// A sealed data set holding `elements` in order.
    pub fn from_elements(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }

    /// Append an element and return its ID.
    pub fn push(&mut self, x: T) -> Result<usize> {
        if self.sealed {
            return Err(Error::DataSetSealed);
        }
        let id = self.objects.len();
        self.objects.push(IndexedDataObject { id, x });
        Ok(id)
    }

    /// Forbid further insertions. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the set has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object with the given ID.
    pub fn get(&self, id: usize) -> Option<&IndexedDataObject<T>> {
        self.objects.get(id)
    }

    /// Objects in ID order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexedDataObject<T>> {
        self.objects.iter()
    }

    /// Payloads in ID order.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.objects.iter().map(|o| &o.x)
    }

    /// Fail unless the set is sealed and non-empty.
    pub(crate) fn ensure_clusterable(&self) -> Result<()> {
        if !self.sealed {
            return Err(Error::DataSetNotSealed);
        }
        if self.objects.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(())
    }
}

impl<T> Index<usize> for IndexedDataSet<T> {
    type Output = IndexedDataObject<T>;

    fn index(&self, id: usize) -> &Self::Output {
        &self.objects[id]
    }
}

impl<T> FromIterator<T> for IndexedDataSet<T> {
    /// Collects into a **sealed** data set.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let objects = iter
            .into_iter()
            .enumerate()
            .map(|(id, x)| IndexedDataObject { id, x })
            .collect();
        Self {
            objects,
            sealed: true,
        }
    }
}

impl<'a, T> IntoIterator for &'a IndexedDataSet<T> {
    type Item = &'a IndexedDataObject<T>;
    type IntoIter = std::slice::Iter<'a, IndexedDataObject<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_insertion_order() {
        let mut data = IndexedDataSet::with_capacity(3);
        for i in 0..3 {
            assert_eq!(data.push(i * 10).unwrap(), i);
        }
        data.seal();
        for (i, obj) in data.iter().enumerate() {
            assert_eq!(obj.id(), i);
            assert_eq!(*obj.element(), i * 10);
        }
    }

    #[test]
    fn sealed_rejects_push() {
        let mut data = IndexedDataSet::new();
        data.push(1.0).unwrap();
        data.seal();
        data.seal();
        assert_eq!(data.push(2.0), Err(Error::DataSetSealed));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn collected_sets_are_sealed() {
        let data: IndexedDataSet<u8> = vec![1, 2, 3].into_iter().collect();
        assert!(data.is_sealed());
        assert_eq!(data.elements().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(data[2].id(), 2);
    }

    #[test]
    fn clusterable_requires_seal_and_content() {
        let mut open: IndexedDataSet<f64> = IndexedDataSet::new();
        open.push(0.0).unwrap();
        assert_eq!(open.ensure_clusterable(), Err(Error::DataSetNotSealed));

        let empty = IndexedDataSet::<f64>::from_elements(Vec::new());
        assert_eq!(empty.ensure_clusterable(), Err(Error::EmptyInput));
    }
}
