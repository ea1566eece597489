//! In-memory record table implementing [`BackingCollection`].
//!
//! `RecordTable` stores records as rows of [`Value`]s under a fixed set of
//! typed columns. A trailing Boolean `selected` column is always appended to
//! the registered columns and holds each record's selection flag.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use regolith_core::Signal;
use regolith_core::logging::targets;

use super::collection::{BackingCollection, CollectionEvent};
use super::value::{Column, TypeTag, Value};
use crate::error::IndexError;

/// Name of the implicit selection column.
pub const SELECTED_COLUMN: &str = "selected";

/// A table of records with typed columns and a per-record selection flag.
///
/// # Example
///
/// ```
/// use regolith::model::{BackingCollection, Column, RecordTable, TypeTag, Value};
///
/// let table = RecordTable::new(vec![
///     Column::new("name", TypeTag::Text),
///     Column::new("diameter_km", TypeTag::Number),
/// ]);
/// table.push(vec!["Vesta".into(), 525.4.into()]);
/// table.push(vec!["Ceres".into(), 939.4.into()]);
///
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.value_at(1, 0), Value::from("Ceres"));
/// assert!(!table.is_selected(0));
/// ```
pub struct RecordTable {
    columns: Vec<Column>,
    rows: RwLock<Vec<Vec<Value>>>,
    dispatching: AtomicBool,
    events: Signal<CollectionEvent>,
}

/// Marks the table as dispatching a structural event until dropped.
struct DispatchGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

impl RecordTable {
    /// Creates an empty table with the given data columns.
    ///
    /// The selection column is appended after them.
    pub fn new(columns: Vec<Column>) -> Self {
        let mut columns = columns;
        columns.push(Column::new(SELECTED_COLUMN, TypeTag::Boolean));
        Self {
            columns,
            rows: RwLock::new(Vec::new()),
            dispatching: AtomicBool::new(false),
            events: Signal::new(),
        }
    }

    /// Creates a table pre-filled with unselected records.
    pub fn with_records(columns: Vec<Column>, records: Vec<Vec<Value>>) -> Self {
        let table = Self::new(columns);
        let rows: Vec<_> = records
            .into_iter()
            .map(|values| table.make_row(values, false))
            .collect();
        *table.rows.write() = rows;
        table
    }

    /// Returns all columns, including the selection column.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the index of the column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns `true` if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Appends an unselected record and returns its natural index.
    pub fn push(&self, values: Vec<Value>) -> usize {
        self.push_with_selection(values, false)
    }

    /// Appends a record with the given selection flag and returns its natural index.
    pub fn push_with_selection(&self, values: Vec<Value>, selected: bool) -> usize {
        let row = self.make_row(values, selected);
        let index = {
            let mut rows = self.rows.write();
            rows.push(row);
            rows.len() - 1
        };
        self.emit_structural(CollectionEvent::Inserted {
            first: index,
            last: index,
        });
        index
    }

    /// Inserts an unselected record at `index`, shifting later records.
    pub fn insert(&self, index: usize, values: Vec<Value>) -> Result<(), IndexError> {
        let row = self.make_row(values, false);
        {
            let mut rows = self.rows.write();
            if index > rows.len() {
                return Err(IndexError::out_of_range(index, rows.len()));
            }
            rows.insert(index, row);
        }
        self.emit_structural(CollectionEvent::Inserted {
            first: index,
            last: index,
        });
        Ok(())
    }

    /// Appends several records as one insertion.
    ///
    /// Each entry is the record's values and its selection flag. Returns the
    /// natural index of the first appended record.
    pub fn extend(&self, records: Vec<(Vec<Value>, bool)>) -> usize {
        let count = records.len();
        let new_rows: Vec<_> = records
            .into_iter()
            .map(|(values, selected)| self.make_row(values, selected))
            .collect();
        let first = {
            let mut rows = self.rows.write();
            let first = rows.len();
            rows.extend(new_rows);
            first
        };
        if count > 0 {
            self.emit_structural(CollectionEvent::Inserted {
                first,
                last: first + count - 1,
            });
        }
        first
    }

    /// Removes a record and returns its data values (without the selection flag).
    pub fn remove(&self, index: usize) -> Result<Vec<Value>, IndexError> {
        let mut row = {
            let mut rows = self.rows.write();
            if index >= rows.len() {
                return Err(IndexError::out_of_range(index, rows.len()));
            }
            rows.remove(index)
        };
        row.pop();
        self.emit_structural(CollectionEvent::Removed {
            first: index,
            last: index,
        });
        Ok(row)
    }

    /// Replaces the whole content with unselected records.
    pub fn set_records(&self, records: Vec<Vec<Value>>) {
        let new_rows: Vec<_> = records
            .into_iter()
            .map(|values| self.make_row(values, false))
            .collect();
        *self.rows.write() = new_rows;
        self.emit_structural(CollectionEvent::Reset);
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.rows.write().clear();
        self.emit_structural(CollectionEvent::Reset);
    }

    /// Sets one cell and emits `AttributeChanged` if the value differs.
    ///
    /// Writing the selection column requires a `Value::Bool`. Returns `Ok(true)`
    /// if the cell changed.
    pub fn set_value(&self, row: usize, column: usize, value: Value) -> Result<bool, IndexError> {
        if column >= self.columns.len() {
            return Err(IndexError::out_of_range(column, self.columns.len()));
        }
        if column == self.selection_column() && value.as_bool().is_none() {
            tracing::warn!(
                target: targets::COLLECTION,
                row,
                ?value,
                "ignoring non-boolean write to the selection column"
            );
            return Ok(false);
        }
        {
            let mut rows = self.rows.write();
            let len = rows.len();
            let record = rows
                .get_mut(row)
                .ok_or(IndexError::out_of_range(row, len))?;
            if record[column] == value {
                return Ok(false);
            }
            record[column] = value;
        }
        self.events.emit(CollectionEvent::AttributeChanged {
            rows: vec![row],
            column,
        });
        Ok(true)
    }

    fn make_row(&self, mut values: Vec<Value>, selected: bool) -> Vec<Value> {
        values.resize(self.columns.len() - 1, Value::Null);
        values.push(Value::Bool(selected));
        values
    }

    fn emit_structural(&self, event: CollectionEvent) {
        tracing::trace!(target: targets::COLLECTION, ?event, "dispatching structural event");
        let _guard = DispatchGuard::enter(&self.dispatching);
        self.events.emit(event);
    }
}

impl BackingCollection for RecordTable {
    fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn value_at(&self, row: usize, column: usize) -> Value {
        self.rows
            .read()
            .get(row)
            .and_then(|record| record.get(column))
            .cloned()
            .unwrap_or_default()
    }

    fn column_type(&self, column: usize) -> Option<TypeTag> {
        self.columns.get(column).map(Column::type_tag)
    }

    fn selection_column(&self) -> usize {
        self.columns.len() - 1
    }

    fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::SeqCst)
    }

    fn events(&self) -> &Signal<CollectionEvent> {
        &self.events
    }

    fn set_selected(&self, changes: &[(usize, bool)]) {
        let column = self.selection_column();
        let changed: Vec<usize> = {
            let mut rows = self.rows.write();
            changes
                .iter()
                .filter_map(|&(row, selected)| {
                    let record = rows.get_mut(row)?;
                    let flag = Value::Bool(selected);
                    if record[column] == flag {
                        None
                    } else {
                        record[column] = flag;
                        Some(row)
                    }
                })
                .collect()
        };

        if changed.is_empty() {
            return;
        }
        tracing::debug!(
            target: targets::COLLECTION,
            count = changed.len(),
            "selection flags written"
        );
        self.events.emit(CollectionEvent::AttributeChanged {
            rows: changed,
            column,
        });
    }

    fn is_selected(&self, row: usize) -> bool {
        let column = self.selection_column();
        self.rows
            .read()
            .get(row)
            .is_some_and(|record| record[column] == Value::Bool(true))
    }

    fn column_values(&self, column: usize) -> Vec<Value> {
        self.rows
            .read()
            .iter()
            .map(|record| record.get(column).cloned().unwrap_or_default())
            .collect()
    }
}

static_assertions::assert_impl_all!(RecordTable: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn bodies() -> RecordTable {
        RecordTable::with_records(
            vec![
                Column::new("name", TypeTag::Text),
                Column::new("diameter_km", TypeTag::Number),
            ],
            vec![
                vec!["Vesta".into(), 525.4.into()],
                vec!["Ceres".into(), 939.4.into()],
                vec!["Pallas".into(), 512.0.into()],
            ],
        )
    }

    fn record_events(table: &RecordTable) -> Arc<Mutex<Vec<CollectionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        table.events().connect(move |event| {
            events_clone.lock().push(event.clone());
        });
        events
    }

    #[test]
    fn test_columns() {
        let table = bodies();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.selection_column(), 2);
        assert_eq!(table.column_index("diameter_km"), Some(1));
        assert_eq!(table.column_index(SELECTED_COLUMN), Some(2));
        assert_eq!(table.column_type(2), Some(TypeTag::Boolean));
        assert_eq!(table.column_type(3), None);
    }

    #[test]
    fn test_value_at_out_of_range_is_null() {
        let table = bodies();
        assert_eq!(table.value_at(0, 0), Value::from("Vesta"));
        assert!(table.value_at(10, 0).is_null());
        assert!(table.value_at(0, 10).is_null());
    }

    #[test]
    fn test_short_records_are_padded() {
        let table = bodies();
        table.push(vec!["Hygiea".into()]);
        assert!(table.value_at(3, 1).is_null());
        assert!(!table.is_selected(3));
    }

    #[test]
    fn test_push_and_remove_emit_structural_events() {
        let table = bodies();
        let events = record_events(&table);

        let index = table.push_with_selection(vec!["Juno".into(), 246.6.into()], true);
        assert_eq!(index, 3);
        assert!(table.is_selected(3));

        let removed = table.remove(0).unwrap();
        assert_eq!(removed, vec![Value::from("Vesta"), Value::from(525.4)]);
        assert!(table.remove(10).is_err());

        assert_eq!(
            *events.lock(),
            vec![
                CollectionEvent::Inserted { first: 3, last: 3 },
                CollectionEvent::Removed { first: 0, last: 0 },
            ]
        );
    }

    #[test]
    fn test_insert_bounds() {
        let table = bodies();
        assert!(table.insert(3, vec!["Eros".into()]).is_ok());
        assert_eq!(
            table.insert(9, vec!["Ida".into()]),
            Err(IndexError::OutOfRange { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_extend() {
        let table = bodies();
        let events = record_events(&table);

        let first = table.extend(vec![
            (vec!["Juno".into()], false),
            (vec!["Eros".into()], true),
        ]);
        assert_eq!(first, 3);
        assert_eq!(table.selected_rows(), vec![4]);
        assert_eq!(
            *events.lock(),
            vec![CollectionEvent::Inserted { first: 3, last: 4 }]
        );

        assert_eq!(table.extend(Vec::new()), 5);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_dispatching_flag_during_structural_emit() {
        let table = Arc::new(bodies());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&table);
        let observed_clone = observed.clone();
        table.events().connect(move |_| {
            if let Some(table) = weak.upgrade() {
                observed_clone.lock().push(table.is_dispatching());
            }
        });

        table.push(vec!["Juno".into()]);
        table.set_selected(&[(0, true)]);

        assert_eq!(*observed.lock(), vec![true, false]);
        assert!(!table.is_dispatching());
    }

    #[test]
    fn test_set_selected_emits_only_changes() {
        let table = bodies();
        table.set_selected(&[(1, true)]);
        let events = record_events(&table);

        table.set_selected(&[(0, true), (1, true), (2, false), (99, true)]);
        assert_eq!(table.selected_rows(), vec![0, 1]);
        assert_eq!(
            *events.lock(),
            vec![CollectionEvent::AttributeChanged {
                rows: vec![0],
                column: 2
            }]
        );

        table.set_selected(&[(0, true)]);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_set_value() {
        let table = bodies();
        let events = record_events(&table);

        assert_eq!(table.set_value(2, 1, 513.0.into()), Ok(true));
        assert_eq!(table.set_value(2, 1, 513.0.into()), Ok(false));
        assert_eq!(table.set_value(2, 2, "yes".into()), Ok(false));
        assert_eq!(table.set_value(2, 2, true.into()), Ok(true));
        assert!(table.set_value(9, 1, Value::Null).is_err());
        assert!(table.set_value(0, 9, Value::Null).is_err());

        assert_eq!(events.lock().len(), 2);
        assert!(table.is_selected(2));
    }

    #[test]
    fn test_set_records_and_clear() {
        let table = bodies();
        table.set_selected(&[(0, true)]);
        let events = record_events(&table);

        table.set_records(vec![vec!["Psyche".into(), 226.0.into()]]);
        assert_eq!(table.len(), 1);
        assert!(table.selected_rows().is_empty());

        table.clear();
        assert!(table.is_empty());
        assert_eq!(
            *events.lock(),
            vec![CollectionEvent::Reset, CollectionEvent::Reset]
        );
    }

    #[test]
    fn test_column_values() {
        let table = bodies();
        assert_eq!(
            table.column_values(0),
            vec![Value::from("Vesta"), Value::from("Ceres"), Value::from("Pallas")]
        );
    }
}
