//! Sorted table views with selection synchronization.
//!
//! A table of records is shown in an order the user picks by clicking column
//! headers, while each record keeps its own `selected` flag that has to stay
//! in step with the range-based selection of the table widget.
//!
//! # Core Types
//!
//! - [`Value`], [`TypeTag`], [`Column`]: cell values and column declarations
//! - [`BackingCollection`]: the trait record collections implement
//! - [`ComparatorRegistry`]: per-type comparison rules
//! - [`PermutationIndex`]: the natural/display index mapping
//! - [`RangeSelection`]: the trait range-based selection models implement
//! - [`SelectionMirror`]: keeps record flags and the range selection equal
//! - [`SortedView`]: wires everything together behind one API
//!
//! # Implementations
//!
//! - [`RecordTable`]: in-memory backing collection
//! - [`SelectionModel`]: in-memory range selection with adjustment support
//!
//! # Architecture Overview
//!
//! ```text
//! ┌───────────────────┐  events        ┌────────────┐  range_changed  ┌────────────────┐
//! │ BackingCollection │───────────────>│ SortedView │<────────────────│ RangeSelection │
//! │  (natural order)  │<───────────────│            │────────────────>│ (display order)│
//! └───────────────────┘  set_selected  └────────────┘  replace/add/   └────────────────┘
//!                                         │      │      remove
//!                                         v      v
//!                          ┌──────────────────┐ ┌─────────────────┐
//!                          │ PermutationIndex │<│ SelectionMirror │
//!                          └──────────────────┘ └─────────────────┘
//! ```
//!
//! The collection addresses records in *natural* order (insertion order); the
//! selection addresses rows in *display* order. Every exchange between them
//! passes through the permutation.

mod collection;
mod compare;
mod mirror;
mod permutation;
mod ranges;
mod record_table;
pub mod selection;
mod sorted_view;
mod value;

pub use collection::{BackingCollection, CollectionEvent};
pub use compare::{compare_with_nulls, BooleanOrder, ComparatorRegistry, CompareFn};
pub use mirror::SelectionMirror;
pub use permutation::{ActiveKey, PermutationIndex, SortKey, MAX_SORT_KEYS};
pub use ranges::{coalesce, coalesce_unsorted};
pub use record_table::{RecordTable, SELECTED_COLUMN};
pub use selection::{RangeChange, RangeSelection, SelectionModel};
pub use sorted_view::SortedView;
pub use value::{Column, TypeTag, Value};
