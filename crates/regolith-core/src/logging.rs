//! Logging facilities for Regolith.
//!
//! Regolith uses the `tracing` crate for instrumentation. To see logs, install
//! a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("regolith=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "regolith_core::signal";
    /// Performance spans.
    pub const PERF: &str = "regolith::perf";
    /// Permutation index (sorting and index translation).
    pub const PERMUTATION: &str = "regolith::permutation";
    /// Selection mirror and selection models.
    pub const SELECTION: &str = "regolith::selection";
    /// Backing collections.
    pub const COLLECTION: &str = "regolith::collection";
    /// Sorted view orchestration.
    pub const VIEW: &str = "regolith::view";
}

/// A guard that records an `info`-level span for the duration of an operation.
///
/// ```
/// use regolith_core::logging::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("resort");
///     // ... timed work ...
/// } // span closes here
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }

    /// Create a span that also records the number of rows processed.
    pub fn with_rows(name: &'static str, rows: usize) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name, rows);
        Self {
            span: span.entered(),
        }
    }
}
