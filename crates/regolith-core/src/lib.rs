//! Shared primitives for the Regolith table views.
//!
//! - [`Signal`]: change notification between a view and its collaborators.
//!   Slots may emit or connect from inside an emission.
//! - [`logging`]: `tracing` targets per subsystem and [`PerfSpan`].
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use regolith_core::Signal;
//!
//! let rows_inserted = Signal::<(usize, usize)>::new();
//! let inserted = Arc::new(AtomicUsize::new(0));
//!
//! let counter = inserted.clone();
//! let id = rows_inserted.connect(move |&(first, last)| {
//!     counter.fetch_add(last - first + 1, Ordering::SeqCst);
//! });
//!
//! rows_inserted.emit((4, 6));
//! rows_inserted.disconnect(id);
//! rows_inserted.emit((7, 7));
//! assert_eq!(inserted.load(Ordering::SeqCst), 3);
//! ```

pub mod logging;
pub mod signal;

pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
