//! The backing collection interface.
//!
//! A backing collection owns the records shown by a sorted view. It is the
//! single source of truth for record content and for each record's selection
//! flag; the view derives display order from it and never copies records.
//!
//! Records are addressed by their *natural* index: their position in the
//! collection's insertion order.

use regolith_core::Signal;

use super::value::{TypeTag, Value};

/// Structural and content notifications raised by a backing collection.
///
/// All indices are natural indices, and ranges are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    /// Records `first..=last` were inserted.
    Inserted { first: usize, last: usize },
    /// Records `first..=last` were removed.
    Removed { first: usize, last: usize },
    /// An attribute of the listed records changed in place.
    AttributeChanged { rows: Vec<usize>, column: usize },
    /// The whole content was replaced.
    Reset,
}

impl CollectionEvent {
    /// Returns `true` if the event changes the row count or invalidates every
    /// natural index.
    pub fn is_structural(&self) -> bool {
        !matches!(self, CollectionEvent::AttributeChanged { .. })
    }
}

/// The trait a record collection implements to be presented by a sorted view.
///
/// # Implementation Requirements
///
/// - Emit [`CollectionEvent`]s on [`events`](BackingCollection::events) after
///   every mutation, with no internal lock held.
/// - Report [`is_dispatching`](BackingCollection::is_dispatching) as `true`
///   for the whole duration of a structural emit.
/// - [`set_selected`](BackingCollection::set_selected) applies a whole batch
///   and emits a single `AttributeChanged` for the selection column.
pub trait BackingCollection: Send + Sync {
    /// Returns the number of records.
    fn row_count(&self) -> usize;

    /// Returns the number of columns, including the selection column.
    fn column_count(&self) -> usize;

    /// Returns the cell value of a record, or `Value::Null` out of range.
    fn value_at(&self, row: usize, column: usize) -> Value;

    /// Returns the declared type of a column, or `None` for an unknown column.
    fn column_type(&self, column: usize) -> Option<TypeTag>;

    /// Returns the column holding each record's selection flag.
    fn selection_column(&self) -> usize;

    /// Returns `true` while the collection is emitting a structural event.
    fn is_dispatching(&self) -> bool;

    /// Returns the signal carrying this collection's change notifications.
    fn events(&self) -> &Signal<CollectionEvent>;

    /// Writes the selection flag of several records in one batch.
    ///
    /// Each entry is `(natural_index, selected)`.
    fn set_selected(&self, changes: &[(usize, bool)]);

    // -------------------------------------------------------------------------
    // Provided methods
    // -------------------------------------------------------------------------

    /// Returns `true` if the record's selection flag is set.
    fn is_selected(&self, row: usize) -> bool {
        self.value_at(row, self.selection_column()).as_bool() == Some(true)
    }

    /// Returns the natural indices of all selected records, ascending.
    fn selected_rows(&self) -> Vec<usize> {
        (0..self.row_count()).filter(|&row| self.is_selected(row)).collect()
    }

    /// Returns every value of one column in natural order.
    ///
    /// Implementations backed by a lock should override this to read the
    /// column under a single acquisition.
    fn column_values(&self, column: usize) -> Vec<Value> {
        (0..self.row_count())
            .map(|row| self.value_at(row, column))
            .collect()
    }
}
