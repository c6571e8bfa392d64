
use anyhow::ensure;
use std::collections::BTreeSet;

use crate::data_types::gene_call::GeneCall;

/// The full set of gene calls sharing one (sample, gene) pair.
/// Groups are independent sub-problems; each one resolves to exactly one ConsensusCall.
#[derive(Debug)]
pub struct SampleGeneGroup {
    /// Unique identifier for the group, stable across a run
    group_id: u64,
    /// Sample shared by every call in the group
    sample_id: String,
    /// Gene shared by every call in the group
    gene: String,
    /// The contributing calls, held in a stable sort order so downstream
    /// resolution is independent of input record order
    calls: Vec<GeneCall>
}

impl SampleGeneGroup {
    /// General constructor with checks.
    /// Calls are re-sorted on a stable key (tool, raw diplotype, input file) so
    /// that two groups built from permuted inputs are indistinguishable.
    /// # Arguments
    /// * `group_id` - unique ID for the group
    /// * `calls` - every call for one (sample, gene) pair; must be non-empty
    /// # Errors
    /// * if `calls` is empty
    /// * if any call disagrees on sample or gene
    pub fn new(group_id: u64, mut calls: Vec<GeneCall>) -> anyhow::Result<Self> {
        ensure!(!calls.is_empty(), "A sample-gene group requires at least one call");

        let sample_id = calls[0].sample_id().to_string();
        let gene = calls[0].gene().to_string();
        for call in calls.iter() {
            ensure!(
                call.sample_id() == sample_id && call.gene() == gene,
                "All calls in a group must share (sample, gene); found ({}, {}) in group for ({}, {})",
                call.sample_id(), call.gene(), sample_id, gene
            );
        }

        calls.sort_by(|a, b| {
            a.tool_name().cmp(b.tool_name())
                .then_with(|| a.diplotype_string().cmp(b.diplotype_string()))
                .then_with(|| a.input_file().cmp(&b.input_file()))
        });

        Ok(Self {
            group_id, sample_id, gene, calls
        })
    }

    // various getters
    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn calls(&self) -> &[GeneCall] {
        &self.calls
    }

    /// The distinct reference genome builds in this group, sorted.
    /// More than one entry here is a build-mismatch conflict.
    pub fn reference_genomes(&self) -> BTreeSet<String> {
        self.calls.iter()
            .map(|c| c.reference_genome().to_string())
            .collect()
    }
}
