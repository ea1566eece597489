//! Two-way synchronization of record selection flags with a range selection.
//!
//! The backing collection's per-record flag and the external [`RangeSelection`]
//! are two mutable views of one boolean per record. [`SelectionMirror`] keeps
//! them equal by translating changes from either side through the shared
//! [`PermutationIndex`].
//!
//! Every write the mirror makes to a collaborator can synchronously come back
//! to it as a notification. Two checks stop those echoes:
//!
//! - the mirror's own *listening* flag, lowered for the duration of every
//!   write it authors and restored by a scoped guard
//! - the collection's [`is_dispatching`](BackingCollection::is_dispatching)
//!   flag, raised while it emits a structural event
//!
//! Before translating in either direction the mirror checks the permutation
//! against the collection's row count and rebuilds it on a mismatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use regolith_core::logging::targets;
use regolith_core::{PerfSpan, Signal};

use super::collection::{BackingCollection, CollectionEvent};
use super::permutation::PermutationIndex;
use super::ranges::coalesce_unsorted;
use super::selection::RangeSelection;

/// Lowers a listening flag until dropped, then restores its previous value.
struct ListeningGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> ListeningGuard<'a> {
    fn mute(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(false, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for ListeningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

/// Mirrors selection state between a backing collection and a range selection.
pub struct SelectionMirror<C, M> {
    collection: Arc<C>,
    selection: Arc<M>,
    permutation: Arc<RwLock<PermutationIndex>>,
    listening: AtomicBool,
    scroll_to_selection: bool,
    /// Emitted with the display range the view should scroll into sight.
    scroll_requested: Signal<(usize, usize)>,
}

impl<C, M> SelectionMirror<C, M>
where
    C: BackingCollection,
    M: RangeSelection,
{
    /// Creates a mirror over shared collaborators.
    pub fn new(
        collection: Arc<C>,
        selection: Arc<M>,
        permutation: Arc<RwLock<PermutationIndex>>,
    ) -> Self {
        Self {
            collection,
            selection,
            permutation,
            listening: AtomicBool::new(true),
            scroll_to_selection: true,
            scroll_requested: Signal::new(),
        }
    }

    /// Enables or disables scroll requests after selection additions.
    pub fn with_scroll_to_selection(mut self, enabled: bool) -> Self {
        self.scroll_to_selection = enabled;
        self
    }

    /// Returns `false` while the mirror is writing to a collaborator.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Signal carrying `(first, last)` display ranges to bring into view.
    pub fn scroll_requested(&self) -> &Signal<(usize, usize)> {
        &self.scroll_requested
    }

    // =========================================================================
    // Collection -> selection
    // =========================================================================

    /// Replaces the external selection with the collection's selected records.
    ///
    /// Issues exactly one [`replace_selection`](RangeSelection::replace_selection)
    /// call with coalesced display ranges.
    pub fn push_to_external(&self) {
        let _span = PerfSpan::new("push_selection");
        self.synchronize();
        let selected = self.collection.selected_rows();
        let mut displays = self.to_display_all(&selected);
        let ranges = coalesce_unsorted(&mut displays);

        tracing::debug!(
            target: targets::SELECTION,
            records = selected.len(),
            ranges = ranges.len(),
            "pushing selection"
        );
        let _guard = ListeningGuard::mute(&self.listening);
        self.selection.replace_selection(&ranges);
    }

    /// Reflects a collection event onto the external selection.
    ///
    /// Inserted selected records extend the selection. Changes to the
    /// selection column add and remove the matching display ranges. Removals
    /// need no action.
    ///
    /// A permutation that does not yet cover the inserted records is rebuilt
    /// before translating.
    pub fn on_record_event(&self, event: &CollectionEvent) {
        if !self.is_listening() {
            return;
        }
        self.synchronize();

        match event {
            CollectionEvent::Inserted { first, last } => {
                let added: Vec<usize> = (*first..=*last)
                    .filter(|&row| self.collection.is_selected(row))
                    .collect();
                if added.is_empty() {
                    return;
                }
                let mut displays = self.to_display_all(&added);
                let ranges = coalesce_unsorted(&mut displays);
                self.apply(&ranges, &[]);
            }
            CollectionEvent::AttributeChanged { rows, column }
                if *column == self.collection.selection_column() =>
            {
                let (added, removed): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .copied()
                    .partition(|&row| self.collection.is_selected(row));
                let added = coalesce_unsorted(&mut self.to_display_all(&added));
                let removed = coalesce_unsorted(&mut self.to_display_all(&removed));
                self.apply(&added, &removed);
            }
            _ => {}
        }
    }

    fn apply(&self, added: &[(usize, usize)], removed: &[(usize, usize)]) {
        tracing::trace!(target: targets::SELECTION, ?added, ?removed, "mirroring record selection");
        {
            let _guard = ListeningGuard::mute(&self.listening);
            for &(start, end) in removed {
                self.selection.remove_range(start, end);
            }
            for &(start, end) in added {
                self.selection.add_range(start, end);
            }
        }

        if self.scroll_to_selection {
            if let Some(&last) = added.last() {
                self.scroll_requested.emit(last);
            }
        }
    }

    // =========================================================================
    // Selection -> collection
    // =========================================================================

    /// Writes external selection state for display rows `first..=last` back to
    /// the collection.
    ///
    /// Only records whose flag differs are written, in one batch. Does nothing
    /// while the mirror is itself writing or while the collection is
    /// dispatching a structural event.
    pub fn pull_from_external(&self, first: usize, last: usize) {
        if !self.is_listening() || self.collection.is_dispatching() {
            tracing::trace!(target: targets::SELECTION, first, last, "suppressed selection echo");
            return;
        }
        let (first, last) = if first <= last { (first, last) } else { (last, first) };
        self.synchronize();

        let rows: Vec<(usize, usize)> = {
            let permutation = self.permutation.read();
            let end = last.min(permutation.len().saturating_sub(1));
            if permutation.is_empty() || first > end {
                return;
            }
            permutation.display_order()[first..=end]
                .iter()
                .enumerate()
                .map(|(offset, &natural)| (first + offset, natural))
                .collect()
        };

        let changes: Vec<(usize, bool)> = rows
            .into_iter()
            .filter_map(|(display, natural)| {
                let wanted = self.selection.is_selected(display);
                (self.collection.is_selected(natural) != wanted).then_some((natural, wanted))
            })
            .collect();

        if changes.is_empty() {
            return;
        }
        tracing::debug!(
            target: targets::SELECTION,
            first,
            last,
            changed = changes.len(),
            "pulling selection"
        );
        let _guard = ListeningGuard::mute(&self.listening);
        self.collection.set_selected(&changes);
    }

    /// Rebuilds the shared permutation if it no longer covers the collection.
    fn synchronize(&self) {
        let row_count = self.collection.row_count();
        if self.permutation.read().check_len(row_count).is_ok() {
            return;
        }
        // The mismatch is logged by the permutation itself.
        let _ = self.permutation.write().synchronize(self.collection.as_ref());
    }

    /// Translates natural indices, dropping any the permutation does not cover.
    fn to_display_all(&self, naturals: &[usize]) -> Vec<usize> {
        let permutation = self.permutation.read();
        naturals
            .iter()
            .filter_map(|&natural| match permutation.to_display(natural) {
                Ok(display) => Some(display),
                Err(err) => {
                    tracing::warn!(
                        target: targets::SELECTION,
                        %err,
                        "selected record outside the permutation"
                    );
                    None
                }
            })
            .collect()
    }
}

impl<C, M> std::fmt::Debug for SelectionMirror<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionMirror")
            .field("listening", &self.listening.load(Ordering::SeqCst))
            .field("scroll_to_selection", &self.scroll_to_selection)
            .finish_non_exhaustive()
    }
}
