
use anyhow::{bail, Context};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::data_types::consensus_call::ConsensusCall;
use crate::util::json_io::save_json;

/// Aggregates ConsensusCalls across sample-gene groups and guarantees the
/// output contract: exactly one call per (sample, gene) pair observed in the
/// input. Duplicate insertions and missing groups are both hard errors, since
/// either one means a group was silently dropped or double-solved upstream.
pub struct ConsensusWriter {
    /// Every (sample, gene) key the input produced; finalization must see all of them
    expected_keys: BTreeSet<(String, String)>,
    /// The collected results, keyed for duplicate detection and stable output order
    collected: BTreeMap<(String, String), ConsensusCall>
}

impl ConsensusWriter {
    /// Constructor.
    /// # Arguments
    /// * `expected_keys` - the (sample, gene) pairs present in the input
    pub fn new(expected_keys: BTreeSet<(String, String)>) -> Self {
        Self {
            expected_keys,
            collected: Default::default()
        }
    }

    /// Adds one consensus result to the collection.
    /// # Arguments
    /// * `consensus` - a solved group result
    /// # Errors
    /// * if the (sample, gene) key was not observed in the input
    /// * if a result for the key was already inserted
    pub fn add_consensus(&mut self, consensus: ConsensusCall) -> anyhow::Result<()> {
        let key = (consensus.sample_id().to_string(), consensus.gene().to_string());
        if !self.expected_keys.contains(&key) {
            bail!("Consensus for unexpected group ({}, {})", key.0, key.1);
        }
        if self.collected.insert(key.clone(), consensus).is_some() {
            bail!("Duplicate consensus for group ({}, {})", key.0, key.1);
        }
        Ok(())
    }

    /// Number of results collected so far
    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Verifies completeness and writes the output collection as JSON, ordered
    /// by (sample, gene).
    /// # Arguments
    /// * `filename` - the output path
    /// # Errors
    /// * if any input group is missing from the collection
    /// * if serialization or file I/O fails
    pub fn finalize(self, filename: &Path) -> anyhow::Result<()> {
        let missing: Vec<&(String, String)> = self.expected_keys.iter()
            .filter(|key| !self.collected.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            bail!("Missing consensus output for {} input group(s), first: {:?}", missing.len(), missing[0]);
        }

        let output: Vec<&ConsensusCall> = self.collected.values().collect();
        save_json(&output, filename)
            .context("Error while writing consensus calls:")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::consensus_call::{ConsensusDiplotype, ResolutionMethod};

    fn build_consensus(sample: &str, gene: &str) -> ConsensusCall {
        ConsensusCall::new(
            sample.to_string(), gene.to_string(), Some("GRCh38".to_string()), false,
            ConsensusDiplotype::Resolved { diplotype: "*1/*4".to_string() },
            ResolutionMethod::Unanimous, 1.0, None, vec![]
        )
    }

    fn expected(keys: &[(&str, &str)]) -> BTreeSet<(String, String)> {
        keys.iter()
            .map(|(s, g)| (s.to_string(), g.to_string()))
            .collect()
    }

    #[test]
    fn test_duplicate_insertion_rejected() {
        let mut writer = ConsensusWriter::new(expected(&[("s1", "CYP2D6")]));
        writer.add_consensus(build_consensus("s1", "CYP2D6")).unwrap();
        assert_eq!(writer.len(), 1);

        // a second result for the same group is a collision, not an overwrite
        let result = writer.add_consensus(build_consensus("s1", "CYP2D6"));
        assert!(result.is_err());
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn test_unexpected_group_rejected() {
        let mut writer = ConsensusWriter::new(expected(&[("s1", "CYP2D6")]));
        let result = writer.add_consensus(build_consensus("s1", "TPMT"));
        assert!(result.is_err());
        assert!(writer.is_empty());
    }

    #[test]
    fn test_missing_group_fails_finalize() {
        let writer = ConsensusWriter::new(expected(&[("s1", "CYP2D6"), ("s2", "CYP2D6")]));
        // nothing was inserted; finalize must refuse rather than omit groups
        let out_fn = std::env::temp_dir().join("starling_missing_group_test.json");
        let result = writer.finalize(&out_fn);
        assert!(result.is_err());
    }

    #[test]
    fn test_complete_collection_writes() {
        let mut writer = ConsensusWriter::new(expected(&[("s1", "CYP2D6"), ("s2", "CYP2D6")]));
        writer.add_consensus(build_consensus("s2", "CYP2D6")).unwrap();
        writer.add_consensus(build_consensus("s1", "CYP2D6")).unwrap();

        let out_fn = std::env::temp_dir().join("starling_complete_collection_test.json");
        writer.finalize(&out_fn).unwrap();

        // one entry per group, ordered by (sample, gene)
        let written: serde_json::Value = crate::util::json_io::load_json(&out_fn).unwrap();
        let entries = written.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["sample_id"], "s1");
        assert_eq!(entries[1]["sample_id"], "s2");
        std::fs::remove_file(&out_fn).unwrap();
    }
}
