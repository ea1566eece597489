//! Sorted view over a backing collection.
//!
//! [`SortedView`] ties the pieces together: it owns the [`PermutationIndex`]
//! and the [`SelectionMirror`], listens to the collection and the external
//! selection, and exposes the sort request and index translation APIs used
//! by a table widget.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use regolith::model::{
//!     BackingCollection, Column, RangeSelection, RecordTable, SelectionModel, SortKey,
//!     SortedView, TypeTag,
//! };
//!
//! let table = Arc::new(RecordTable::new(vec![
//!     Column::new("name", TypeTag::Text),
//!     Column::new("albedo", TypeTag::Number),
//! ]));
//! table.push(vec!["Enceladus".into(), 0.99.into()]);
//! table.push(vec!["Phoebe".into(), 0.06.into()]);
//! table.push(vec!["Europa".into(), 0.67.into()]);
//!
//! let selection = Arc::new(SelectionModel::new());
//! let view = SortedView::new(table.clone(), selection.clone());
//!
//! view.set_sort(Some(SortKey::ascending(1)), None).unwrap();
//! assert_eq!(view.display_order(), vec![1, 2, 0]);
//! assert_eq!(view.to_display(0), Ok(2));
//!
//! // Selecting a record highlights its display row.
//! table.set_selected(&[(0, true)]);
//! assert!(selection.is_selected(2));
//! ```

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use regolith_core::logging::targets;
use regolith_core::{ConnectionGuard, Signal};

use super::collection::{BackingCollection, CollectionEvent};
use super::compare::ComparatorRegistry;
use super::mirror::SelectionMirror;
use super::permutation::{ActiveKey, PermutationIndex, SortKey, MAX_SORT_KEYS};
use super::selection::{RangeChange, RangeSelection};
use super::value::Value;
use crate::config::ViewConfig;
use crate::error::{IndexError, SortError};

/// A stably sorted, selection-synchronized view of a backing collection.
///
/// Created behind an `Arc`; the view subscribes to its collaborators with
/// weak references and unsubscribes when dropped.
pub struct SortedView<C, M> {
    collection: Arc<C>,
    selection: Arc<M>,
    registry: ComparatorRegistry,
    config: ViewConfig,
    permutation: Arc<RwLock<PermutationIndex>>,
    mirror: SelectionMirror<C, M>,

    /// Emitted after display positions of existing rows may have moved.
    layout_changed: Signal<()>,

    _collection_connection: ConnectionGuard<CollectionEvent>,
    _selection_connection: ConnectionGuard<RangeChange>,
}

impl<C, M> SortedView<C, M>
where
    C: BackingCollection + 'static,
    M: RangeSelection + 'static,
{
    /// Creates an unsorted view with the default configuration.
    pub fn new(collection: Arc<C>, selection: Arc<M>) -> Arc<Self> {
        Self::with_config(collection, selection, ViewConfig::default())
    }

    /// Creates an unsorted view with the given configuration.
    pub fn with_config(collection: Arc<C>, selection: Arc<M>, config: ViewConfig) -> Arc<Self> {
        let registry = ComparatorRegistry::from_config(&config);
        Self::with_registry(collection, selection, registry, config)
    }

    /// Creates an unsorted view with a custom comparator registry.
    pub fn with_registry(
        collection: Arc<C>,
        selection: Arc<M>,
        registry: ComparatorRegistry,
        config: ViewConfig,
    ) -> Arc<Self> {
        let permutation = Arc::new(RwLock::new(PermutationIndex::with_len(
            collection.row_count(),
        )));
        let mirror =
            SelectionMirror::new(collection.clone(), selection.clone(), permutation.clone())
                .with_scroll_to_selection(config.scroll_to_selection);

        let view = Arc::new_cyclic(|weak: &Weak<Self>| {
            let view = weak.clone();
            let collection_connection = collection.events().connect_scoped(move |event| {
                if let Some(view) = view.upgrade() {
                    view.on_collection_event(event);
                }
            });

            let view = weak.clone();
            let selection_connection = selection.range_changed().connect_scoped(move |change| {
                if let Some(view) = view.upgrade() {
                    view.on_selection_changed(change);
                }
            });

            Self {
                collection,
                selection,
                registry,
                config,
                permutation,
                mirror,
                layout_changed: Signal::new(),
                _collection_connection: collection_connection,
                _selection_connection: selection_connection,
            }
        });

        tracing::debug!(target: targets::VIEW, rows = view.row_count(), "sorted view created");
        view.mirror.push_to_external();
        view
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the backing collection.
    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    /// Returns the external selection model.
    pub fn selection(&self) -> &Arc<M> {
        &self.selection
    }

    /// Returns the selection mirror.
    pub fn mirror(&self) -> &SelectionMirror<C, M> {
        &self.mirror
    }

    /// Returns the comparator registry used to validate sort keys.
    pub fn registry(&self) -> &ComparatorRegistry {
        &self.registry
    }

    /// Returns the view configuration.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Signal emitted after the display order is recomputed.
    pub fn layout_changed(&self) -> &Signal<()> {
        &self.layout_changed
    }

    /// Returns the collection's row count.
    pub fn row_count(&self) -> usize {
        self.collection.row_count()
    }

    // =========================================================================
    // Sort Requests
    // =========================================================================

    /// Sorts by up to two keys.
    ///
    /// A secondary key without a primary becomes the primary. Passing `None`
    /// for both is equivalent to [`clear_sort`](Self::clear_sort).
    pub fn set_sort(
        &self,
        primary: Option<SortKey>,
        secondary: Option<SortKey>,
    ) -> Result<(), SortError> {
        let keys: Vec<SortKey> = primary.into_iter().chain(secondary).collect();
        self.set_sort_keys(&keys)
    }

    /// Sorts by an ordered list of keys, primary first.
    ///
    /// Every key is validated before the current order is touched; on error
    /// the previous sort stays in effect. A repeated column is ignored after
    /// its first occurrence.
    pub fn set_sort_keys(&self, keys: &[SortKey]) -> Result<(), SortError> {
        if keys.len() > MAX_SORT_KEYS {
            return Err(SortError::TooManyKeys {
                requested: keys.len(),
                max: MAX_SORT_KEYS,
            });
        }

        let mut active: Vec<ActiveKey> = Vec::with_capacity(keys.len());
        for &key in keys {
            if active.iter().any(|a| a.key().column == key.column) {
                tracing::debug!(
                    target: targets::VIEW,
                    column = key.column,
                    "ignoring repeated sort column"
                );
                continue;
            }
            active.push(self.resolve(key)?);
        }

        tracing::debug!(target: targets::VIEW, ?keys, "sort requested");
        self.permutation
            .write()
            .set_keys(active, self.collection.as_ref());
        self.relayout();
        Ok(())
    }

    /// Header-click behaviour for a column.
    ///
    /// Clicking the primary column flips its direction. Clicking any other
    /// column makes it the ascending primary and demotes the previous primary
    /// to secondary.
    pub fn toggle_sort_order(&self, column: usize) -> Result<(), SortError> {
        let keys = self.sort_keys();
        let next = match keys.first() {
            Some(primary) if primary.column == column => {
                let mut next = keys.clone();
                next[0] = primary.reversed();
                next
            }
            Some(&primary) => vec![SortKey::ascending(column), primary],
            None => vec![SortKey::ascending(column)],
        };
        self.set_sort_keys(&next)
    }

    /// Removes all sort keys and restores natural order.
    pub fn clear_sort(&self) {
        tracing::debug!(target: targets::VIEW, "sort cleared");
        self.permutation.write().unsort();
        self.relayout();
    }

    /// Returns the active sort keys, primary first.
    pub fn sort_keys(&self) -> Vec<SortKey> {
        self.permutation.read().keys()
    }

    /// Returns `true` if any sort key is active.
    pub fn is_sorted(&self) -> bool {
        self.permutation.read().is_sorted()
    }

    /// Re-derives the display order from the active keys.
    pub fn resort(&self) {
        self.permutation.write().resort(self.collection.as_ref());
        self.relayout();
    }

    /// Resets the permutation to the collection's current row count, then
    /// resorts if keys are active.
    pub fn reallocate(&self) {
        {
            let mut permutation = self.permutation.write();
            permutation.reallocate(self.collection.row_count());
            if permutation.is_sorted() {
                permutation.resort(self.collection.as_ref());
            }
        }
        self.relayout();
    }

    fn resolve(&self, key: SortKey) -> Result<ActiveKey, SortError> {
        let type_tag = self
            .collection
            .column_type(key.column)
            .ok_or(SortError::UnknownColumn { column: key.column })?;
        let compare = self.registry.resolve(key.column, type_tag)?;
        Ok(ActiveKey::new(key, compare))
    }

    // =========================================================================
    // Index Translation
    // =========================================================================

    /// Returns the display row of a record.
    ///
    /// Returns [`IndexError::Desynchronized`] once if the permutation missed a
    /// structural change; the view is rebuilt before returning, so the next
    /// call succeeds.
    pub fn to_display(&self, natural: usize) -> Result<usize, IndexError> {
        self.synchronize()?;
        self.permutation.read().to_display(natural)
    }

    /// Returns the record shown at a display row.
    ///
    /// Desynchronization is handled as in [`to_display`](Self::to_display).
    pub fn to_natural(&self, display: usize) -> Result<usize, IndexError> {
        self.synchronize()?;
        self.permutation.read().to_natural(display)
    }

    /// Returns the cell shown at a display row.
    pub fn value_at_display(&self, display: usize, column: usize) -> Result<Value, IndexError> {
        let natural = self.to_natural(display)?;
        Ok(self.collection.value_at(natural, column))
    }

    /// Returns natural indices in display order.
    pub fn display_order(&self) -> Vec<usize> {
        self.permutation.read().display_order().to_vec()
    }

    /// Heals a missed structural change and relays out if one was found.
    fn synchronize(&self) -> Result<(), IndexError> {
        let result = self.heal();
        if result.is_err() {
            self.relayout();
        }
        result
    }

    /// Rebuilds the permutation if its length no longer matches the
    /// collection. Emits nothing.
    fn heal(&self) -> Result<(), IndexError> {
        let row_count = self.collection.row_count();
        if self.permutation.read().check_len(row_count).is_ok() {
            return Ok(());
        }
        self.permutation
            .write()
            .synchronize(self.collection.as_ref())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Replaces the external selection with the records' selection flags.
    pub fn push_selection(&self) {
        // A desynchronized view already pushed while relaying out.
        if self.synchronize().is_ok() {
            self.mirror.push_to_external();
        }
    }

    /// Writes the external selection of display rows `first..=last` back to
    /// the records.
    ///
    /// The rows are read against the current display order; a permutation
    /// that missed a structural change is rebuilt first.
    pub fn pull_selection(&self, first: usize, last: usize) {
        // A dispatching collection is about to deliver the structural event.
        let healed = !self.collection.is_dispatching() && self.heal().is_err();
        self.mirror.pull_from_external(first, last);
        if healed {
            self.relayout();
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    fn relayout(&self) {
        self.layout_changed.emit(());
        self.mirror.push_to_external();
    }

    fn on_collection_event(&self, event: &CollectionEvent) {
        tracing::trace!(target: targets::VIEW, ?event, "collection event");
        match event {
            CollectionEvent::Inserted { first, last } if self.is_identity_append(*first, *last) => {
                self.permutation
                    .write()
                    .reallocate(self.collection.row_count());
                self.mirror.on_record_event(event);
            }
            CollectionEvent::AttributeChanged { column, .. } => {
                if self.synchronize().is_err() {
                    return;
                }
                if self.config.resort_on_update && self.is_sort_column(*column) {
                    self.resort();
                } else {
                    self.mirror.on_record_event(event);
                }
            }
            _ => self.reallocate(),
        }
    }

    /// Records appended to an unsorted view keep every existing display row.
    fn is_identity_append(&self, first: usize, last: usize) -> bool {
        let permutation = self.permutation.read();
        !permutation.is_sorted()
            && first == permutation.len()
            && last + 1 == self.collection.row_count()
    }

    fn is_sort_column(&self, column: usize) -> bool {
        self.sort_keys().iter().any(|key| key.column == column)
    }

    fn on_selection_changed(&self, change: &RangeChange) {
        if change.still_adjusting {
            return;
        }
        self.pull_selection(change.first, change.last);
    }
}

impl<C, M> std::fmt::Debug for SortedView<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedView")
            .field("permutation", &*self.permutation.read())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
