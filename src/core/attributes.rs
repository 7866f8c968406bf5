//! Sparse boolean relation between entities and attributes

use std::collections::{BTreeMap, BTreeSet};

/// Entity index to the set of attribute indices it has
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseBooleanMatrix {
    rows: BTreeMap<usize, BTreeSet<usize>>,
}

impl SparseBooleanMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `attribute` as present for `entity`
    pub fn set(&mut self, entity: usize, attribute: usize) {
        self.rows.entry(entity).or_default().insert(attribute);
    }

    /// Whether `entity` has `attribute`
    pub fn get(&self, entity: usize, attribute: usize) -> bool {
        self.rows
            .get(&entity)
            .is_some_and(|row| row.contains(&attribute))
    }

    /// Attributes of `entity` in ascending order
    pub fn row(&self, entity: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows.get(&entity).into_iter().flatten().copied()
    }

    /// One past the highest entity index with an entry
    pub fn num_rows(&self) -> usize {
        self.rows.keys().next_back().map_or(0, |last| last + 1)
    }

    /// Total number of set entries
    pub fn num_entries(&self) -> usize {
        self.rows.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut matrix = SparseBooleanMatrix::new();
        matrix.set(3, 7);
        matrix.set(3, 1);
        matrix.set(3, 7);
        matrix.set(0, 2);

        assert!(matrix.get(3, 7));
        assert!(matrix.get(0, 2));
        assert!(!matrix.get(0, 7));
        assert!(!matrix.get(9, 1));
        assert_eq!(matrix.num_entries(), 3);
        assert_eq!(matrix.num_rows(), 4);
    }

    #[test]
    fn test_row_iteration() {
        let mut matrix = SparseBooleanMatrix::new();
        for attribute in [5, 2, 9] {
            matrix.set(1, attribute);
        }
        assert_eq!(matrix.row(1).collect::<Vec<_>>(), vec![2, 5, 9]);
        assert_eq!(matrix.row(4).count(), 0);
    }

    #[test]
    fn test_empty() {
        let matrix = SparseBooleanMatrix::new();
        assert_eq!(matrix.num_rows(), 0);
        assert_eq!(matrix.num_entries(), 0);
    }
}
