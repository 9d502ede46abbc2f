//! FILENAME: core/relation-engine/src/engine.rs
//! Relation Engine - Bottom-up nested joins with per-parent aggregation.
//!
//! For each relation:
//! 1. Group the child dataset by the string form of its child key
//! 2. Concatenate the groups (first-seen key order) into one child pool
//! 3. Resolve nested relations against that pool and write the annotated
//!    children back into their dataset
//! 4. Aggregate each parent's group into the declared output fields
//!
//! Keys compare by string form, so `7`, `7.0` and `"7"` join together.

use std::ops::Range;

use rustc_hash::FxHashMap;
use serde_json::Value;

use engine::{key_string, strip_internal, EngineResult, FieldPath, Record};

use crate::dataset::Datasets;
use crate::definition::{RelationConfig, RelationDeclaration};

// ============================================================================
// GROUPING
// ============================================================================

/// Child records of one relation, grouped by key.
/// `members` holds indices into the child dataset, one contiguous range per
/// key, keys in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ChildGroups {
    pub members: Vec<usize>,
    ranges: FxHashMap<String, Range<usize>>,
}

impl ChildGroups {
    /// Groups `records` by the string form of `key`. Records whose key is
    /// absent or null join nothing and are left out.
    pub fn build(records: &[Record], key: &FieldPath) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (index, record) in records.iter().enumerate() {
            let Some(k) = key.resolve(record).and_then(key_string) else {
                continue;
            };
            buckets
                .entry(k)
                .or_insert_with_key(|k| {
                    order.push(k.clone());
                    Vec::new()
                })
                .push(index);
        }

        let mut members = Vec::with_capacity(records.len());
        let mut ranges = FxHashMap::default();
        for k in order {
            let group = buckets.remove(&k).unwrap_or_default();
            let start = members.len();
            members.extend(group);
            ranges.insert(k, start..members.len());
        }
        ChildGroups { members, ranges }
    }

    /// The group for `key` within `records`; empty when no child matched.
    pub fn group<'s, 'r: 's>(&'s self, records: &'r [Record], key: &str) -> impl Iterator<Item = &'r Record> + 's {
        let indices: &[usize] = match self.ranges.get(key) {
            Some(range) => &self.members[range.clone()],
            None => &[],
        };
        indices.iter().filter_map(move |&i| records.get(i))
    }

    /// Copies the grouped records, in pool order.
    pub fn pool(&self, records: &[Record]) -> Vec<Record> {
        self.members.iter().filter_map(|&i| records.get(i)).cloned().collect()
    }

    pub fn group_count(&self) -> usize {
        self.ranges.len()
    }
}

// ============================================================================
// RELATION PROCESSOR
// ============================================================================

/// Request-scoped context resolving relation declarations against datasets.
/// Nested relations annotate the records held in `datasets`, so later
/// relations over the same dataset see those annotations.
pub struct RelationProcessor<'a> {
    datasets: &'a mut Datasets,
}

impl<'a> RelationProcessor<'a> {
    pub fn new(datasets: &'a mut Datasets) -> Self {
        RelationProcessor { datasets }
    }

    /// Resolves `relation` (and its nested relations, first) into `parents`.
    pub fn process(&mut self, parents: &mut [Record], relation: &RelationDeclaration) {
        let groups = ChildGroups::build(self.datasets.records(&relation.dataset), &relation.child_key);
        log::debug!(
            "relation {}: {} child records in {} groups, {} parents",
            relation.dataset,
            groups.members.len(),
            groups.group_count(),
            parents.len()
        );

        if !relation.relations.is_empty() {
            let mut pool = groups.pool(self.datasets.records(&relation.dataset));
            for nested in &relation.relations {
                self.process(&mut pool, nested);
            }
            if let Some(records) = self.datasets.records_mut(&relation.dataset) {
                for (&index, annotated) in groups.members.iter().zip(pool) {
                    records[index] = annotated;
                }
            }
        }

        let children = self.datasets.records(&relation.dataset);
        for parent in parents.iter_mut() {
            let key = relation.parent_key.resolve(parent).and_then(key_string);
            match key {
                Some(key) => {
                    for (name, spec) in relation.aggregators.iter() {
                        parent.insert(name.clone(), spec.reduce(groups.group(children, &key)));
                    }
                }
                None => {
                    for name in relation.aggregators.names() {
                        parent.insert(name.clone(), Value::Null);
                    }
                }
            }
        }
    }
}

/// Resolves every relation into `parents`, in declaration order.
pub fn aggregate_relations(parents: &mut [Record], relations: &[RelationDeclaration], datasets: &mut Datasets) {
    let mut processor = RelationProcessor::new(datasets);
    for relation in relations {
        processor.process(parents, relation);
    }
}

/// Runs a whole join request: validates it, annotates the parent dataset and
/// returns the parents without their dataset tag.
pub fn run_join(config: &RelationConfig, datasets: &mut Datasets) -> EngineResult<Vec<Record>> {
    let parent_dataset = config.validate()?;
    let mut parents = datasets.records(parent_dataset).to_vec();
    log::debug!("join: {} parent records in {}", parents.len(), parent_dataset);
    if parents.is_empty() {
        return Ok(parents);
    }

    aggregate_relations(&mut parents, &config.relations, datasets);

    Ok(parents
        .iter()
        .filter_map(|parent| match strip_internal(parent) {
            Value::Object(clean) => Some(clean),
            _ => None,
        })
        .collect())
}
