
use serde::Serialize;

use crate::data_types::gene_call::GeneCall;
use crate::data_types::normalized_diplotype::{DiplotypeResolution, NormalizedDiplotype};
use crate::data_types::phenotype_table::PhenotypeAssignment;

/// Which rule of the resolution policy produced the consensus
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResolutionMethod {
    /// All resolved diplotypes were canonically identical
    Unanimous,
    /// A configured tool ranking selected the winner over disagreement
    PriorityOverride,
    /// A strict majority of resolved diplotypes agreed
    Majority,
    /// No rule produced a consensus; the call is unresolved
    None
}

/// Why a group could not be resolved
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnresolvedReason {
    /// Contributing records disagree on the reference genome build
    BuildMismatch,
    /// Tools genuinely disagree and no policy rule applies (including exact ties)
    ConflictingCalls,
    /// No tool produced a resolvable diplotype
    NoResolvableCalls
}

/// The consensus outcome for one sample-gene group.
/// Discrepancy is a first-class outcome here, never a dropped record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsensusDiplotype {
    /// Both alleles of the consensus are canonical
    Resolved {
        /// Canonical display form, e.g. "*1/*4"
        diplotype: String
    },
    /// Agreement was reached but part of the call never mapped
    Partial {
        /// Best-effort display form with unmapped halves tagged
        diplotype: String,
        /// The raw strings that failed to map, for audit
        unmapped_tokens: Vec<String>
    },
    /// No consensus; all candidate calls are recorded
    Unresolved {
        reason: UnresolvedReason,
        /// Display forms of every distinct candidate observed in the group
        candidates: Vec<String>
    }
}

impl ConsensusDiplotype {
    /// Helper to convert to a simplified string representation for summaries
    pub fn simplify(&self) -> &str {
        match self {
            ConsensusDiplotype::Resolved { .. } => "resolved",
            ConsensusDiplotype::Partial { .. } => "partial",
            ConsensusDiplotype::Unresolved { .. } => "unresolved"
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ConsensusDiplotype::Resolved { .. })
    }
}

/// One contributing tool call inside a ConsensusCall, with its normalization
/// outcome and a value-copy of the original record so every raw field
/// (including unknown extras) survives to the output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProvenanceEntry {
    /// The contributing tool
    tool_name: String,
    /// The diplotype string exactly as the tool reported it
    raw_diplotype: String,
    /// Canonical display form, when any of the call mapped
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized_diplotype: Option<String>,
    /// Per-tool resolved/partial/unresolved status
    resolution: DiplotypeResolution,
    /// Allele-level mapping detail (canonical form, raw token, mapping status)
    normalization: NormalizedDiplotype,
    /// Set when the resolution policy set this record aside, e.g. a dropped build
    #[serde(skip_serializing_if = "Option::is_none")]
    excluded_reason: Option<String>,
    /// The full original record
    record: GeneCall
}

impl ProvenanceEntry {
    /// Constructor; derives the display fields from the record and its normalization
    pub fn new(record: GeneCall, normalization: NormalizedDiplotype, excluded_reason: Option<String>) -> Self {
        let resolution = normalization.resolution();
        let normalized_diplotype = if resolution == DiplotypeResolution::Unresolved {
            None
        } else {
            Some(normalization.to_string())
        };

        Self {
            tool_name: record.tool_name().to_string(),
            raw_diplotype: record.diplotype_string().to_string(),
            normalized_diplotype,
            resolution,
            normalization,
            excluded_reason,
            record
        }
    }

    // getters
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn raw_diplotype(&self) -> &str {
        &self.raw_diplotype
    }

    pub fn normalized_diplotype(&self) -> Option<&str> {
        self.normalized_diplotype.as_deref()
    }

    pub fn resolution(&self) -> DiplotypeResolution {
        self.resolution
    }

    pub fn normalization(&self) -> &NormalizedDiplotype {
        &self.normalization
    }

    pub fn excluded_reason(&self) -> Option<&str> {
        self.excluded_reason.as_deref()
    }

    pub fn record(&self) -> &GeneCall {
        &self.record
    }
}

/// The single output unit per sample-gene group: consensus diplotype (or an
/// explicit unresolved marker), derived phenotype, how it was resolved, and
/// the complete list of contributing calls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsensusCall {
    /// Sample this consensus belongs to
    sample_id: String,
    /// Gene this consensus belongs to
    gene: String,
    /// The shared reference build; None when the group had a build conflict
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_genome: Option<String>,
    /// True when the group contained records on differing builds
    build_conflict: bool,
    /// The consensus outcome
    consensus: ConsensusDiplotype,
    /// Which policy rule fired
    resolution_method: ResolutionMethod,
    /// Agreement score in [0, 1]: the fraction of contributing calls that
    /// match the consensus
    confidence: f64,
    /// Derived phenotype; absent for unresolved consensus
    #[serde(skip_serializing_if = "Option::is_none")]
    phenotype: Option<PhenotypeAssignment>,
    /// Every contributing call with its normalization outcome
    provenance: Vec<ProvenanceEntry>
}

impl ConsensusCall {
    /// Constructor
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sample_id: String, gene: String, reference_genome: Option<String>, build_conflict: bool,
        consensus: ConsensusDiplotype, resolution_method: ResolutionMethod, confidence: f64,
        phenotype: Option<PhenotypeAssignment>, provenance: Vec<ProvenanceEntry>
    ) -> Self {
        Self {
            sample_id, gene, reference_genome, build_conflict,
            consensus, resolution_method, confidence,
            phenotype, provenance
        }
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn reference_genome(&self) -> Option<&str> {
        self.reference_genome.as_deref()
    }

    pub fn build_conflict(&self) -> bool {
        self.build_conflict
    }

    pub fn consensus(&self) -> &ConsensusDiplotype {
        &self.consensus
    }

    pub fn resolution_method(&self) -> ResolutionMethod {
        self.resolution_method
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn phenotype(&self) -> Option<&PhenotypeAssignment> {
        self.phenotype.as_ref()
    }

    pub fn provenance(&self) -> &[ProvenanceEntry] {
        &self.provenance
    }
}
