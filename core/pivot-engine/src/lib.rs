//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot subsystem: hierarchical grouping with incremental rollups.
//!
//! This crate turns a stream of records into a nested row tree crossed with
//! optional column dimensions. It depends on `engine` for the record model,
//! path resolution, label formatting and the aggregator library.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot table IS)
//! - `cache`: Accumulator tree built while records stream in (HOW we compute)
//! - `view`: Output document for the host (WHAT we display)
//! - `engine`: Calculation engine (HOW we calculate)

pub mod cache;
pub mod definition;
pub mod engine;
pub mod view;

pub use definition::*;
pub use view::*;
pub use engine::{build_pivot, validate_fields, PivotCalculator};
