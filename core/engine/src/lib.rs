//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Shared record primitives for the grouping and aggregation engines.
//! CONTEXT: Re-exports the record model, path resolution, flattening, label
//! formatting and the aggregator library used by `pivot-engine` and
//! `relation-engine`.

pub mod aggregate;
pub mod dates;
pub mod error;
pub mod flatten;
pub mod format;
pub mod kpi;
pub mod path;
pub mod value;

// Re-export commonly used types at the crate root
pub use aggregate::{AggregateAccumulator, AggregatorKind, AggregatorSpec};
pub use dates::{parse_date, BucketedDate, DateBucket, INVALID_DATE_LABEL};
pub use error::{EngineError, EngineResult};
pub use flatten::{column_names, flatten, flatten_all, MAX_FLATTEN_DEPTH};
pub use format::{
    apply_picklist, format_lookup, format_scalar, scalar_text, FormatContext, LookupDisplay,
    PicklistOption,
};
pub use kpi::{compute_kpi, validate_kpi, KpiConfig, KpiResult};
pub use path::{resolve, FieldPath};
pub use value::{
    canonical_json, coerce_number, key_string, number_value, strip_internal, Record, DATASET_TAG,
    ID_FIELD,
};
