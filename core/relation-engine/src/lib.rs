//! FILENAME: core/relation-engine/src/lib.rs
//! Relation subsystem: nested joins across datasets of one record stream.
//!
//! Records arrive tagged with the dataset they belong to. A relation joins a
//! child dataset into its parent by key and writes the aggregated children
//! into each parent record. Relations nest, and the innermost are resolved
//! first so that outer aggregators can read what inner ones produced.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the join IS)
//! - `dataset`: Records partitioned by dataset tag
//! - `engine`: Bottom-up resolution (HOW we join)

pub mod dataset;
pub mod definition;
pub mod engine;

pub use dataset::Datasets;
pub use definition::*;
pub use engine::{aggregate_relations, run_join, ChildGroups, RelationProcessor};
