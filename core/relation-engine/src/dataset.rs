//! FILENAME: core/relation-engine/src/dataset.rs
//! Record sets of a join request, partitioned by their `_dataset` tag.

use rustc_hash::FxHashMap;
use serde_json::Value;

use engine::{Record, DATASET_TAG};

/// Records grouped by dataset name, in arrival order within each dataset.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    by_name: FxHashMap<String, Vec<Record>>,
}

impl Datasets {
    pub fn new() -> Self {
        Datasets::default()
    }

    /// Adds one record under its tag. Untagged records belong to `default_dataset`
    /// and are tagged with it.
    pub fn insert(&mut self, mut record: Record, default_dataset: &str) {
        let name = match record.get(DATASET_TAG) {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => {
                record.insert(DATASET_TAG.to_string(), Value::String(default_dataset.to_string()));
                default_dataset.to_string()
            }
        };
        self.by_name.entry(name).or_default().push(record);
    }

    /// Groups a record stream by tag.
    pub fn from_records<I>(records: I, default_dataset: &str) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut datasets = Datasets::new();
        for record in records {
            datasets.insert(record, default_dataset);
        }
        datasets
    }

    /// Records of a dataset; empty when the dataset never appeared.
    pub fn records(&self, name: &str) -> &[Record] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable records of a dataset, for in-place annotation.
    pub fn records_mut(&mut self, name: &str) -> Option<&mut Vec<Record>> {
        self.by_name.get_mut(name)
    }

    /// `(dataset, record count)` pairs, sorted by name.
    pub fn summary(&self) -> Vec<(&str, usize)> {
        let mut summary: Vec<(&str, usize)> = self
            .by_name
            .iter()
            .map(|(name, records)| (name.as_str(), records.len()))
            .collect();
        summary.sort();
        summary
    }
}
