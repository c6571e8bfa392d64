
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::data_types::consensus_call::ConsensusCall;

/// we want a key that is (gene, resolution method, outcome)
type LookupKey = (String, String, String);

/// Accumulated counts for one summary row
#[derive(Clone, Copy, Default)]
struct GroupCounts {
    /// Number of sample-gene groups in this bucket
    groups: u64,
    /// Number of contributing tool calls across those groups
    calls: u64,
    /// Sum of confidence scores, for the mean in the output row
    confidence_total: f64
}

/// This is a wrapper for writing out summary stats to a file
#[derive(Default)]
pub struct ConsensusSummaryWriter {
    /// Group and call counts for each lookup type
    counts: BTreeMap<LookupKey, GroupCounts>
}

/// Contains all the data written to each row of our stats file
#[derive(Serialize)]
struct ConsensusSummaryRow {
    /// The gene
    gene: String,
    /// The resolution method that fired
    resolution_method: String,
    /// The consensus outcome class (resolved / partial / unresolved)
    outcome: String,
    /// Number of sample-gene groups
    groups: u64,
    /// Number of contributing tool calls
    calls: u64,
    /// Mean confidence across the groups
    mean_confidence: f64
}

impl ConsensusSummaryWriter {
    /// Adds one consensus result to our collection
    /// # Arguments
    /// * `consensus` - a solved group result
    pub fn add_consensus_call(&mut self, consensus: &ConsensusCall) {
        let key = (
            consensus.gene().to_string(),
            consensus.resolution_method().to_string(),
            consensus.consensus().simplify().to_string()
        );
        let entry = self.counts.entry(key).or_default();
        entry.groups += 1;
        entry.calls += consensus.provenance().len() as u64;
        entry.confidence_total += consensus.confidence();
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        // go through each entry in order and output the results
        for ((gene, resolution_method, outcome), counts) in self.counts.iter() {
            let row = ConsensusSummaryRow {
                gene: gene.clone(),
                resolution_method: resolution_method.clone(),
                outcome: outcome.clone(),
                groups: counts.groups,
                calls: counts.calls,
                mean_confidence: counts.confidence_total / counts.groups as f64
            };
            csv_writer.serialize(&row)?;
        }

        // save everything
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::consensus_call::{ConsensusDiplotype, ResolutionMethod};

    fn build_consensus(sample: &str, gene: &str, confidence: f64) -> ConsensusCall {
        ConsensusCall::new(
            sample.to_string(), gene.to_string(), Some("GRCh38".to_string()), false,
            ConsensusDiplotype::Resolved { diplotype: "*1/*4".to_string() },
            ResolutionMethod::Unanimous, confidence, None, vec![]
        )
    }

    #[test]
    fn test_accumulation() {
        let mut writer = ConsensusSummaryWriter::default();
        writer.add_consensus_call(&build_consensus("s1", "CYP2D6", 1.0));
        writer.add_consensus_call(&build_consensus("s2", "CYP2D6", 0.5));
        writer.add_consensus_call(&build_consensus("s1", "TPMT", 1.0));

        assert_eq!(writer.counts.len(), 2);
        let key = ("CYP2D6".to_string(), "unanimous".to_string(), "resolved".to_string());
        let counts = writer.counts.get(&key).unwrap();
        assert_eq!(counts.groups, 2);
        assert!((counts.confidence_total - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_write_summary() {
        let mut writer = ConsensusSummaryWriter::default();
        writer.add_consensus_call(&build_consensus("s1", "CYP2D6", 1.0));

        let out_fn = std::env::temp_dir().join("starling_summary_test.tsv");
        writer.write_summary(&out_fn).unwrap();

        let written = std::fs::read_to_string(&out_fn).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next().unwrap(), "gene\tresolution_method\toutcome\tgroups\tcalls\tmean_confidence");
        assert!(lines.next().unwrap().starts_with("CYP2D6\tunanimous\tresolved\t1\t0\t"));
        std::fs::remove_file(&out_fn).unwrap();
    }
}
