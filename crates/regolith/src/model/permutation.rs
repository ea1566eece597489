//! Bidirectional natural/display index mapping.
//!
//! [`PermutationIndex`] owns two inverse arrays over `0..n`:
//!
//! - `display_of[natural]`: where a record appears on screen
//! - `natural_of[display]`: which record is shown at a screen row
//!
//! Both lookups are O(1). The mapping is never patched incrementally: a change
//! in row count resets it to identity ([`reallocate`](PermutationIndex::reallocate))
//! and every sort request recomputes it in full ([`resort`](PermutationIndex::resort)).

use std::cmp::Ordering;

use regolith_core::PerfSpan;
use regolith_core::logging::targets;

use super::collection::BackingCollection;
use super::compare::{compare_with_nulls, CompareFn};
use super::value::Value;
use crate::error::IndexError;

/// Maximum number of simultaneous sort keys (primary and secondary).
pub const MAX_SORT_KEYS: usize = 2;

/// A column and direction to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    /// Column index in the backing collection.
    pub column: usize,
    /// `true` for ascending order.
    pub ascending: bool,
}

impl SortKey {
    /// Creates an ascending sort key.
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Creates a descending sort key.
    pub fn descending(column: usize) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Returns the same column with the opposite direction.
    pub fn reversed(self) -> Self {
        Self {
            ascending: !self.ascending,
            ..self
        }
    }
}

/// A sort key paired with the comparator resolved for its column.
#[derive(Clone)]
pub struct ActiveKey {
    key: SortKey,
    compare: CompareFn,
}

impl ActiveKey {
    /// Pairs a key with its column comparator.
    pub fn new(key: SortKey, compare: CompareFn) -> Self {
        Self { key, compare }
    }

    /// Returns the sort key.
    pub fn key(&self) -> SortKey {
        self.key
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = compare_with_nulls(self.compare.as_ref(), a, b);
        if self.key.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl std::fmt::Debug for ActiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ActiveKey").field(&self.key).finish()
    }
}

/// The natural/display permutation and the keys that produced it.
#[derive(Debug, Default)]
pub struct PermutationIndex {
    display_of: Vec<usize>,
    natural_of: Vec<usize>,
    keys: Vec<ActiveKey>,
}

impl PermutationIndex {
    /// Creates an empty, unsorted index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an identity index over `len` rows.
    pub fn with_len(len: usize) -> Self {
        let mut index = Self::new();
        index.reallocate(len);
        index
    }

    /// Returns the number of rows covered.
    pub fn len(&self) -> usize {
        self.natural_of.len()
    }

    /// Returns `true` if the index covers no rows.
    pub fn is_empty(&self) -> bool {
        self.natural_of.is_empty()
    }

    /// Returns `true` if sort keys are active.
    pub fn is_sorted(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Returns the active sort keys, primary first.
    pub fn keys(&self) -> Vec<SortKey> {
        self.keys.iter().map(ActiveKey::key).collect()
    }

    /// Returns natural indices in display order.
    pub fn display_order(&self) -> &[usize] {
        &self.natural_of
    }

    /// Replaces the active keys and re-derives the display order.
    ///
    /// An empty key list resets to identity order.
    pub fn set_keys<C>(&mut self, keys: Vec<ActiveKey>, source: &C)
    where
        C: BackingCollection + ?Sized,
    {
        debug_assert!(keys.len() <= MAX_SORT_KEYS);
        tracing::debug!(target: targets::PERMUTATION, keys = ?keys, "sort keys replaced");
        self.keys = keys;
        self.resort(source);
    }

    /// Resets to identity order over `len` rows. Active keys are kept.
    pub fn reallocate(&mut self, len: usize) {
        tracing::trace!(target: targets::PERMUTATION, from = self.len(), to = len, "reallocating");
        self.natural_of = (0..len).collect();
        self.display_of = (0..len).collect();
    }

    /// Resets to identity order and clears the active keys.
    pub fn unsort(&mut self) {
        self.keys.clear();
        let len = self.len();
        self.reallocate(len);
    }

    /// Recomputes the display order from the active keys.
    ///
    /// The sort is stable: records that tie on every key keep their natural
    /// relative order. The index is resized to the source's row count first.
    pub fn resort<C>(&mut self, source: &C)
    where
        C: BackingCollection + ?Sized,
    {
        let len = source.row_count();
        let _span = PerfSpan::with_rows("resort", len);

        let mut order: Vec<usize> = (0..len).collect();
        if !self.keys.is_empty() {
            // Key columns are read once up front rather than per comparison.
            let columns: Vec<Vec<Value>> = self
                .keys
                .iter()
                .map(|active| source.column_values(active.key.column))
                .collect();
            let keys = &self.keys;

            order.sort_by(|&a, &b| {
                keys.iter()
                    .zip(&columns)
                    .map(|(active, values)| active.compare(&values[a], &values[b]))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let mut display_of = vec![0; len];
        for (display, &natural) in order.iter().enumerate() {
            display_of[natural] = display;
        }
        self.natural_of = order;
        self.display_of = display_of;

        debug_assert!(self.is_consistent());
        tracing::trace!(
            target: targets::PERMUTATION,
            rows = len,
            sorted = self.is_sorted(),
            "resorted"
        );
    }

    /// Translates a natural index to its display index.
    pub fn to_display(&self, natural: usize) -> Result<usize, IndexError> {
        self.display_of
            .get(natural)
            .copied()
            .ok_or(IndexError::out_of_range(natural, self.len()))
    }

    /// Translates a display index to its natural index.
    pub fn to_natural(&self, display: usize) -> Result<usize, IndexError> {
        self.natural_of
            .get(display)
            .copied()
            .ok_or(IndexError::out_of_range(display, self.len()))
    }

    /// Checks that the index covers exactly `row_count` rows.
    pub fn check_len(&self, row_count: usize) -> Result<(), IndexError> {
        if self.len() == row_count {
            Ok(())
        } else {
            Err(IndexError::Desynchronized {
                permutation_len: self.len(),
                row_count,
            })
        }
    }

    /// Detects a row-count mismatch with `source` and repairs it.
    ///
    /// On mismatch the index is rebuilt from scratch (identity, then a full
    /// resort if keys are active) and the `Desynchronized` error is still
    /// returned so the caller knows its previous view of display positions
    /// is stale.
    pub fn synchronize<C>(&mut self, source: &C) -> Result<(), IndexError>
    where
        C: BackingCollection + ?Sized,
    {
        let row_count = source.row_count();
        let result = self.check_len(row_count);
        if let Err(err) = &result {
            tracing::warn!(
                target: targets::PERMUTATION,
                %err,
                "missed structural notification, rebuilding permutation"
            );
            self.reallocate(row_count);
            if self.is_sorted() {
                self.resort(source);
            }
        }
        result
    }

    /// Returns `true` if both arrays are inverse permutations of each other.
    pub fn is_consistent(&self) -> bool {
        self.display_of.len() == self.natural_of.len()
            && self
                .natural_of
                .iter()
                .enumerate()
                .all(|(display, &natural)| self.display_of.get(natural) == Some(&display))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ComparatorRegistry, RecordTable, TypeTag};
    use proptest::prelude::*;

    fn active(registry: &ComparatorRegistry, table: &RecordTable, key: SortKey) -> ActiveKey {
        let tag = table.column_type(key.column).unwrap();
        ActiveKey::new(key, registry.resolve(key.column, tag).unwrap())
    }

    /// Name, class, magnitude. Classes tie on purpose.
    fn craters() -> RecordTable {
        RecordTable::with_records(
            vec![
                Column::new("name", TypeTag::Text),
                Column::new("class", TypeTag::Text),
                Column::new("depth", TypeTag::Number),
            ],
            vec![
                vec!["Tycho".into(), "complex".into(), 4.8.into()],
                vec!["Linne".into(), "simple".into(), 0.6.into()],
                vec!["Copernicus".into(), "complex".into(), 3.8.into()],
                vec!["Moltke".into(), "simple".into(), 1.3.into()],
                vec!["Clavius".into(), "complex".into(), 3.5.into()],
                vec!["Bessel".into(), "simple".into(), Value::Null],
            ],
        )
    }

    #[test]
    fn test_identity() {
        let index = PermutationIndex::with_len(4);
        assert_eq!(index.display_order(), &[0, 1, 2, 3]);
        assert_eq!(index.to_display(2), Ok(2));
        assert_eq!(index.to_natural(3), Ok(3));
        assert!(!index.is_sorted());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_out_of_range() {
        let index = PermutationIndex::with_len(3);
        assert_eq!(index.to_display(3), Err(IndexError::OutOfRange { index: 3, len: 3 }));
        assert_eq!(index.to_natural(10), Err(IndexError::OutOfRange { index: 10, len: 3 }));
    }

    #[test]
    fn test_sort_by_number_with_null_first() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());

        index.set_keys(vec![active(&registry, &table, SortKey::ascending(2))], &table);
        // Bessel (null), Linne, Moltke, Clavius, Copernicus, Tycho
        assert_eq!(index.display_order(), &[5, 1, 3, 4, 2, 0]);
        assert_eq!(index.to_display(5), Ok(0));
        assert_eq!(index.to_natural(5), Ok(0));
    }

    #[test]
    fn test_stable_on_ties() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());

        index.set_keys(vec![active(&registry, &table, SortKey::ascending(1))], &table);
        // complex rows keep natural order 0, 2, 4; simple rows 1, 3, 5.
        assert_eq!(index.display_order(), &[0, 2, 4, 1, 3, 5]);

        index.set_keys(vec![active(&registry, &table, SortKey::descending(1))], &table);
        assert_eq!(index.display_order(), &[1, 3, 5, 0, 2, 4]);
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());

        index.set_keys(
            vec![
                active(&registry, &table, SortKey::ascending(1)),
                active(&registry, &table, SortKey::descending(0)),
            ],
            &table,
        );
        // complex: Tycho, Copernicus, Clavius; simple: Moltke, Linne, Bessel
        assert_eq!(index.display_order(), &[0, 2, 4, 3, 1, 5]);
        assert_eq!(index.keys(), vec![SortKey::ascending(1), SortKey::descending(0)]);
    }

    #[test]
    fn test_descending_is_exact_reverse_for_distinct_keys() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());

        index.set_keys(vec![active(&registry, &table, SortKey::ascending(0))], &table);
        let ascending = index.display_order().to_vec();

        index.set_keys(vec![active(&registry, &table, SortKey::descending(0))], &table);
        let mut descending = index.display_order().to_vec();
        descending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_unsort_and_reallocate() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());
        index.set_keys(vec![active(&registry, &table, SortKey::ascending(0))], &table);

        index.reallocate(8);
        assert_eq!(index.len(), 8);
        assert!(index.is_sorted());
        assert_eq!(index.display_order(), &[0, 1, 2, 3, 4, 5, 6, 7]);

        index.unsort();
        assert!(!index.is_sorted());
        assert_eq!(index.len(), 8);
    }

    #[test]
    fn test_synchronize_repairs_desync() {
        let table = craters();
        let registry = ComparatorRegistry::new();
        let mut index = PermutationIndex::with_len(table.row_count());
        index.set_keys(vec![active(&registry, &table, SortKey::ascending(0))], &table);

        table.events().set_blocked(true);
        table.push(vec!["Aristarchus".into(), "complex".into(), 2.7.into()]);
        table.events().set_blocked(false);

        assert_eq!(
            index.synchronize(&table),
            Err(IndexError::Desynchronized {
                permutation_len: 6,
                row_count: 7
            })
        );
        assert_eq!(index.len(), 7);
        assert_eq!(index.to_display(6), Ok(0));
        assert_eq!(index.synchronize(&table), Ok(()));
    }

    proptest! {
        #[test]
        fn prop_bijection_holds(
            values in proptest::collection::vec(proptest::option::of(-50i64..50), 0..40),
            ops in proptest::collection::vec((0u8..4, 0usize..3, any::<bool>()), 0..12),
        ) {
            let table = RecordTable::with_records(
                vec![Column::new("n", TypeTag::Number), Column::new("s", TypeTag::Text)],
                values
                    .iter()
                    .map(|v| vec![Value::from(*v), Value::from(v.map(|n| format!("{n:03}")))])
                    .collect(),
            );
            let registry = ComparatorRegistry::new();
            let mut index = PermutationIndex::with_len(table.row_count());

            for (op, column, ascending) in ops {
                match op {
                    0 => {
                        let key = SortKey { column, ascending };
                        index.set_keys(vec![active(&registry, &table, key)], &table);
                    }
                    1 => index.resort(&table),
                    2 => index.reallocate(table.row_count()),
                    _ => index.unsort(),
                }

                prop_assert!(index.is_consistent());
                for i in 0..index.len() {
                    let display = index.to_display(i).unwrap();
                    prop_assert_eq!(index.to_natural(display).unwrap(), i);
                }
            }
        }

        #[test]
        fn prop_sorted_output_is_ordered_and_stable(
            values in proptest::collection::vec(0i64..5, 0..40),
        ) {
            let table = RecordTable::with_records(
                vec![Column::new("n", TypeTag::Number)],
                values.iter().map(|v| vec![Value::from(*v)]).collect(),
            );
            let registry = ComparatorRegistry::new();
            let mut index = PermutationIndex::with_len(table.row_count());
            index.set_keys(vec![active(&registry, &table, SortKey::ascending(0))], &table);

            for pair in index.display_order().windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(values[a] <= values[b]);
                if values[a] == values[b] {
                    prop_assert!(a < b);
                }
            }
        }
    }
}
