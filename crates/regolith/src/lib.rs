//! Regolith - sorted, selection-synchronized table views for planetary data.
//!
//! Regolith presents a collection of feature records (craters, landing sites,
//! observation footprints) in a user-chosen sort order, translates between a
//! record's position in its collection and its row on screen, and keeps each
//! record's `selected` flag in step with the table widget's range selection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use regolith::model::{
//!     Column, RecordTable, SelectionModel, SortKey, SortedView, TypeTag,
//! };
//!
//! fn main() -> regolith::Result<()> {
//!     let craters = Arc::new(RecordTable::new(vec![
//!         Column::new("name", TypeTag::Text),
//!         Column::new("diameter_km", TypeTag::Number),
//!     ]));
//!     craters.push(vec!["Tycho".into(), 85.0.into()]);
//!     craters.push(vec!["Copernicus".into(), 93.0.into()]);
//!
//!     let view = SortedView::new(craters.clone(), Arc::new(SelectionModel::new()));
//!     view.set_sort(Some(SortKey::descending(1)), None)?;
//!     assert_eq!(view.to_natural(0)?, 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;

pub use config::ViewConfig;
pub use error::{ConfigError, Error, IndexError, Result, SortError};
pub use regolith_core::{logging, ConnectionGuard, ConnectionId, PerfSpan, Signal};
