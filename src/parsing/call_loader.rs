
use anyhow::{bail, Context};
use log::warn;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::data_types::gene_call::GeneCall;
use crate::parsing::record_validator::validate_gene_call;
use crate::util::json_io::load_json;

/// A structurally invalid input record. It is excluded from processing and
/// reported individually; exclusion never aborts the batch.
#[derive(Debug, Serialize)]
pub struct ExcludedRecord {
    /// Position of the record in the input sequence, 0-based
    record_index: usize,
    /// Human-readable description of the structural failure
    error: String,
    /// The offending record, verbatim
    raw_record: Value
}

impl ExcludedRecord {
    // getters
    pub fn record_index(&self) -> usize {
        self.record_index
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn raw_record(&self) -> &Value {
        &self.raw_record
    }
}

/// The outcome of loading an input batch: the validated calls plus every
/// excluded record with its reason.
#[derive(Debug, Default)]
pub struct LoadedCalls {
    /// Calls that passed structural validation
    calls: Vec<GeneCall>,
    /// Records that failed structural validation
    excluded: Vec<ExcludedRecord>
}

impl LoadedCalls {
    // getters
    pub fn calls(&self) -> &[GeneCall] {
        &self.calls
    }

    pub fn excluded(&self) -> &[ExcludedRecord] {
        &self.excluded
    }

    /// Decomposes into (valid calls, excluded records)
    pub fn into_parts(self) -> (Vec<GeneCall>, Vec<ExcludedRecord>) {
        (self.calls, self.excluded)
    }
}

/// Validates a batch of raw records, partitioning them into valid calls and
/// excluded records. Per-record failures are logged and reported, never fatal.
/// # Arguments
/// * `records` - the raw record sequence
pub fn partition_gene_calls(records: &[Value]) -> LoadedCalls {
    let mut result = LoadedCalls::default();
    for (record_index, record) in records.iter().enumerate() {
        match validate_gene_call(record) {
            Ok(call) => result.calls.push(call),
            Err(e) => {
                warn!("Excluding record #{record_index} from processing: {e}");
                result.excluded.push(ExcludedRecord {
                    record_index,
                    error: e.to_string(),
                    raw_record: record.clone()
                });
            }
        }
    }
    result
}

/// Loads the input call sequence from a JSON file (optionally gzipped) and
/// validates each record.
/// # Arguments
/// * `filename` - path to the JSON input
/// # Errors
/// * if the file fails to open or parse as JSON at all
/// * if the top-level value is not an array; this is the only batch-fatal shape error
pub fn load_gene_calls(filename: &Path) -> anyhow::Result<LoadedCalls> {
    let document: Value = load_json(filename)
        .with_context(|| format!("Error while loading gene calls from {filename:?}:"))?;
    let records = match document.as_array() {
        Some(records) => records,
        None => bail!("Input {filename:?} is not a JSON array of gene call records")
    };

    Ok(partition_gene_calls(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitioning() {
        let records = vec![
            serde_json::json!({
                "sample_id": "s1", "gene": "CYP2D6", "tool_name": "aldy", "reference_genome": "GRCh38",
                "raw_tool_output": { "diplotype_string": "*1/*4" }
            }),
            // missing tool_name
            serde_json::json!({
                "sample_id": "s1", "gene": "CYP2D6", "reference_genome": "GRCh38",
                "raw_tool_output": { "diplotype_string": "*1/*4" }
            }),
            serde_json::json!({
                "sample_id": "s2", "gene": "CYP2C19", "tool_name": "pharmcat", "reference_genome": "GRCh38",
                "raw_tool_output": { "diplotype_string": "*1/*2" }
            })
        ];

        let loaded = partition_gene_calls(&records);
        assert_eq!(loaded.calls().len(), 2);
        assert_eq!(loaded.excluded().len(), 1);

        // the exclusion names the record and the missing field
        let excluded = &loaded.excluded()[0];
        assert_eq!(excluded.record_index(), 1);
        assert!(excluded.error().contains("tool_name"));
        assert_eq!(excluded.raw_record()["sample_id"], "s1");
    }

    #[test]
    fn test_all_excluded_is_not_fatal() {
        let records = vec![
            serde_json::json!({ "bogus": true }),
            serde_json::json!(42)
        ];
        let loaded = partition_gene_calls(&records);
        assert!(loaded.calls().is_empty());
        assert_eq!(loaded.excluded().len(), 2);
    }
}
