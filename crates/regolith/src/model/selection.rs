//! Range-based selection models.
//!
//! A view's selection is owned by the UI toolkit, not by the sorted view. The
//! engine reaches it only through [`RangeSelection`]: contiguous range
//! operations over *display* indices, a membership query, and a change signal.
//!
//! [`SelectionModel`] is the in-process implementation used by Regolith's own
//! table widgets and tests.
//!
//! # Example
//!
//! ```
//! use regolith::model::{RangeSelection, SelectionModel};
//!
//! let selection = SelectionModel::new();
//! selection.range_changed().connect(|change| {
//!     println!("rows {}..={} changed", change.first, change.last);
//! });
//!
//! selection.add_range(2, 4);
//! assert!(selection.is_selected(3));
//! assert_eq!(selection.selected_ranges(), vec![(2, 4)]);
//! ```

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use regolith_core::Signal;
use regolith_core::logging::targets;

use super::ranges::coalesce;

/// Notification that the selection state of display rows `first..=last` may
/// have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeChange {
    /// First display row affected.
    pub first: usize,
    /// Last display row affected (inclusive).
    pub last: usize,
    /// `true` for intermediate notifications during an ongoing gesture.
    pub still_adjusting: bool,
}

/// The interface of an externally owned, range-based selection model.
///
/// All indices are display indices. Ranges are inclusive and may be given in
/// either order.
pub trait RangeSelection: Send + Sync {
    /// Replaces the whole selection with the given ranges in one batch.
    fn replace_selection(&self, ranges: &[(usize, usize)]);

    /// Adds a range to the selection.
    fn add_range(&self, start: usize, end: usize);

    /// Removes a range from the selection.
    fn remove_range(&self, start: usize, end: usize);

    /// Returns `true` if the display row is selected.
    fn is_selected(&self, index: usize) -> bool;

    /// Returns the signal emitted after the selection changes.
    fn range_changed(&self) -> &Signal<RangeChange>;
}

/// An ordered-set selection model with "value is adjusting" support.
///
/// While [`set_adjusting(true)`](SelectionModel::set_adjusting) is in effect
/// (e.g. during a mouse drag), every change is announced with
/// `still_adjusting = true`. Ending the adjustment announces one settled
/// change spanning every row touched since it began.
pub struct SelectionModel {
    selected: RwLock<BTreeSet<usize>>,
    adjusting: AtomicBool,
    /// Span touched while adjusting, announced when adjustment ends.
    pending: Mutex<Option<(usize, usize)>>,
    range_changed: Signal<RangeChange>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    /// Creates an empty selection model.
    pub fn new() -> Self {
        Self {
            selected: RwLock::new(BTreeSet::new()),
            adjusting: AtomicBool::new(false),
            pending: Mutex::new(None),
            range_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Selection Queries
    // =========================================================================

    /// Returns true if any rows are selected.
    pub fn has_selection(&self) -> bool {
        !self.selected.read().is_empty()
    }

    /// Returns the number of selected rows.
    pub fn selected_count(&self) -> usize {
        self.selected.read().len()
    }

    /// Returns the selected rows, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selected.read().iter().copied().collect()
    }

    /// Returns the selection as the minimal list of inclusive ranges.
    pub fn selected_ranges(&self) -> Vec<(usize, usize)> {
        coalesce(&self.selected_rows())
    }

    // =========================================================================
    // Adjustment
    // =========================================================================

    /// Returns `true` while an adjustment gesture is in progress.
    pub fn is_adjusting(&self) -> bool {
        self.adjusting.load(Ordering::SeqCst)
    }

    /// Starts or ends an adjustment gesture.
    ///
    /// Ending a gesture that touched rows emits one settled [`RangeChange`].
    pub fn set_adjusting(&self, adjusting: bool) {
        let was_adjusting = self.adjusting.swap(adjusting, Ordering::SeqCst);
        if was_adjusting && !adjusting {
            let pending = self.pending.lock().take();
            if let Some((first, last)) = pending {
                self.range_changed.emit(RangeChange {
                    first,
                    last,
                    still_adjusting: false,
                });
            }
        }
    }

    // =========================================================================
    // Selection Operations
    // =========================================================================

    /// Selects all rows `0..row_count`.
    pub fn select_all(&self, row_count: usize) {
        if row_count > 0 {
            self.add_range(0, row_count - 1);
        }
    }

    /// Clears all selection.
    pub fn clear_selection(&self) {
        let span = {
            let mut selected = self.selected.write();
            let span = selected.first().copied().zip(selected.last().copied());
            selected.clear();
            span
        };
        if let Some((first, last)) = span {
            self.notify(first, last);
        }
    }

    /// Announces a change over `first..=last`, honouring adjustment mode.
    fn notify(&self, first: usize, last: usize) {
        let still_adjusting = self.is_adjusting();
        if still_adjusting {
            let mut pending = self.pending.lock();
            *pending = Some(match *pending {
                Some((a, b)) => (a.min(first), b.max(last)),
                None => (first, last),
            });
        }
        tracing::trace!(
            target: targets::SELECTION,
            first,
            last,
            still_adjusting,
            "selection changed"
        );
        self.range_changed.emit(RangeChange {
            first,
            last,
            still_adjusting,
        });
    }
}

/// Widens `span` to include `index`.
fn widen(span: &mut Option<(usize, usize)>, index: usize) {
    *span = Some(match *span {
        Some((a, b)) => (a.min(index), b.max(index)),
        None => (index, index),
    });
}

fn ordered(start: usize, end: usize) -> (usize, usize) {
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

impl RangeSelection for SelectionModel {
    fn replace_selection(&self, ranges: &[(usize, usize)]) {
        let span = {
            let mut selected = self.selected.write();
            let mut next = BTreeSet::new();
            for &(start, end) in ranges {
                let (first, last) = ordered(start, end);
                next.extend(first..=last);
            }

            let mut span = None;
            for &index in selected.symmetric_difference(&next) {
                widen(&mut span, index);
            }
            *selected = next;
            span
        };
        if let Some((first, last)) = span {
            self.notify(first, last);
        }
    }

    fn add_range(&self, start: usize, end: usize) {
        let (first, last) = ordered(start, end);
        let span = {
            let mut selected = self.selected.write();
            let mut span = None;
            for index in first..=last {
                if selected.insert(index) {
                    widen(&mut span, index);
                }
            }
            span
        };
        if let Some((first, last)) = span {
            self.notify(first, last);
        }
    }

    fn remove_range(&self, start: usize, end: usize) {
        let (first, last) = ordered(start, end);
        let span = {
            let mut selected = self.selected.write();
            let removed: Vec<usize> = selected.range(first..=last).copied().collect();
            for index in &removed {
                selected.remove(index);
            }
            removed.first().copied().zip(removed.last().copied())
        };
        if let Some((first, last)) = span {
            self.notify(first, last);
        }
    }

    fn is_selected(&self, index: usize) -> bool {
        self.selected.read().contains(&index)
    }

    fn range_changed(&self) -> &Signal<RangeChange> {
        &self.range_changed
    }
}

static_assertions::assert_impl_all!(SelectionModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record_changes(model: &SelectionModel) -> Arc<Mutex<Vec<RangeChange>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        model.range_changed().connect(move |change| {
            changes_clone.lock().push(*change);
        });
        changes
    }

    fn settled(first: usize, last: usize) -> RangeChange {
        RangeChange {
            first,
            last,
            still_adjusting: false,
        }
    }

    #[test]
    fn test_selection_model_creation() {
        let model = SelectionModel::new();
        assert!(!model.has_selection());
        assert!(!model.is_adjusting());
        assert_eq!(model.selected_count(), 0);
    }

    #[test]
    fn test_add_and_remove_range() {
        let model = SelectionModel::new();
        let changes = record_changes(&model);

        model.add_range(5, 2);
        assert_eq!(model.selected_rows(), vec![2, 3, 4, 5]);

        model.remove_range(3, 4);
        assert_eq!(model.selected_ranges(), vec![(2, 2), (5, 5)]);

        assert_eq!(*changes.lock(), vec![settled(2, 5), settled(3, 4)]);
    }

    #[test]
    fn test_no_signal_without_change() {
        let model = SelectionModel::new();
        model.add_range(1, 3);
        let changes = record_changes(&model);

        model.add_range(2, 3);
        model.remove_range(7, 9);
        model.replace_selection(&[(1, 3)]);
        assert!(changes.lock().is_empty());
    }

    #[test]
    fn test_replace_selection_reports_difference_span() {
        let model = SelectionModel::new();
        model.add_range(0, 1);
        let changes = record_changes(&model);

        model.replace_selection(&[(0, 0), (6, 7)]);
        assert_eq!(model.selected_ranges(), vec![(0, 0), (6, 7)]);
        assert_eq!(*changes.lock(), vec![settled(1, 7)]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let model = SelectionModel::new();
        model.select_all(10);
        assert_eq!(model.selected_count(), 10);

        let changes = record_changes(&model);
        model.clear_selection();
        assert!(!model.has_selection());
        assert_eq!(*changes.lock(), vec![settled(0, 9)]);

        model.select_all(0);
        assert!(!model.has_selection());
    }

    #[test]
    fn test_adjusting_emits_settled_span() {
        let model = SelectionModel::new();
        let changes = record_changes(&model);

        model.set_adjusting(true);
        model.add_range(4, 4);
        model.add_range(5, 6);
        model.remove_range(4, 4);
        model.set_adjusting(false);

        let changes = changes.lock();
        assert_eq!(changes.len(), 4);
        assert!(changes[..3].iter().all(|c| c.still_adjusting));
        assert_eq!(changes[3], settled(4, 6));
        assert_eq!(model.selected_rows(), vec![5, 6]);
    }

    #[test]
    fn test_adjusting_without_change_emits_nothing() {
        let model = SelectionModel::new();
        let changes = record_changes(&model);

        model.set_adjusting(true);
        model.set_adjusting(false);
        assert!(changes.lock().is_empty());
    }
}
