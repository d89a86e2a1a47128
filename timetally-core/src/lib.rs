//! Core types and the aggregation engine for timetally.
//!
//! This crate is pure: it performs no I/O and holds no shared state. The
//! CLI fetches raw events from the Google Calendar API and hands them to
//! [`analysis::aggregate`], which produces an [`analysis::AnalysisResult`]
//! consumed by the terminal renderers and the export serializers.

pub mod analysis;
pub mod calendar;
pub mod date_range;
pub mod error;
pub mod event;
pub mod export;

// Re-export the main types at crate root for convenience
pub use analysis::*;
pub use calendar::*;
pub use date_range::DateRange;
pub use error::{TallyError, TallyResult};
pub use event::*;
