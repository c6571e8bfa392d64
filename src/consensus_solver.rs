//! # Consensus Solver
//! Contains the logic for resolving all of the calls in one sample-gene group into a
//! single consensus. The resolution policy is a deterministic total order over
//! outcomes: build-mismatch screening, unanimity, priority override, strict-majority
//! voting, and finally the explicit unresolved states. Disagreement is a first-class
//! outcome; nothing ever falls back to an arbitrary pick.
//!
//! ## Example usage
//! ```rust
//! use rustc_hash::FxHashMap;
//! use starling::consensus_solver::{solve_consensus_group, ConsensusConfig};
//! use starling::data_types::consensus_call::{ConsensusDiplotype, ResolutionMethod};
//! use starling::data_types::gene_call::{GeneCall, RawToolOutput};
//! use starling::data_types::nomenclature::{GeneNomenclature, NomenclatureTable};
//! use starling::data_types::phenotype_table::PhenotypeTable;
//! use starling::data_types::reference_db::ReferenceTables;
//! use starling::data_types::sample_group::SampleGeneGroup;
//! use starling::data_types::tool_priority::ToolPriorityTable;
//!
//! // a minimal reference bundle covering two CYP2D6 alleles
//! let alleles: FxHashMap<String, String> = [
//!     ("*1".to_string(), "*1".to_string()),
//!     ("*4".to_string(), "*4".to_string())
//! ].into_iter().collect();
//! let genes: FxHashMap<String, GeneNomenclature> = [(
//!     "CYP2D6".to_string(),
//!     GeneNomenclature::new(vec!["CYP2D6".to_string()], vec!['/', '|'], alleles)
//! )].into_iter().collect();
//! let tables = ReferenceTables::new(
//!     NomenclatureTable::new("example".to_string(), genes),
//!     ToolPriorityTable::empty(),
//!     PhenotypeTable::new("example".to_string(), Default::default())
//! );
//!
//! // two tools report the same diplotype with swapped allele order
//! let calls = vec![
//!     GeneCall::new(
//!         "sample1".to_string(), "CYP2D6".to_string(), "aldy".to_string(), "GRCh38".to_string(),
//!         None, RawToolOutput::from_diplotype("CYP2D6*1/*4".to_string())
//!     ).unwrap(),
//!     GeneCall::new(
//!         "sample1".to_string(), "CYP2D6".to_string(), "stargazer".to_string(), "GRCh38".to_string(),
//!         None, RawToolOutput::from_diplotype("CYP2D6*4/*1".to_string())
//!     ).unwrap()
//! ];
//! let group = SampleGeneGroup::new(0, calls).unwrap();
//!
//! // allele order carries no meaning, so this group is unanimous
//! let result = solve_consensus_group(&group, &tables, ConsensusConfig::default());
//! assert_eq!(result.consensus(), &ConsensusDiplotype::Resolved { diplotype: "*1/*4".to_string() });
//! assert_eq!(result.resolution_method(), ResolutionMethod::Unanimous);
//! assert_eq!(result.confidence(), 1.0);
//! ```
use derive_builder::Builder;
use itertools::Itertools;
use log::debug;
use std::collections::BTreeMap;

use crate::allele_normalizer::normalize_diplotype;
use crate::data_types::consensus_call::{ConsensusCall, ConsensusDiplotype, ProvenanceEntry, ResolutionMethod, UnresolvedReason};
use crate::data_types::gene_call::GeneCall;
use crate::data_types::normalized_diplotype::{DiplotypeResolution, NormalizedDiplotype};
use crate::data_types::phenotype_table::PhenotypeAssignment;
use crate::data_types::reference_db::ReferenceTables;
use crate::data_types::sample_group::SampleGeneGroup;
use crate::data_types::tool_priority::ToolPriorityTable;
use crate::phenotype_mapper::map_phenotype;

/// Controls the knobs of the resolution policy
#[derive(Builder, Clone, Copy)]
#[builder(default)]
pub struct ConsensusConfig {
    /// Fraction of resolved votes that must be strictly exceeded for the
    /// majority rule to fire; 0.5 is a classic strict majority
    majority_threshold: f64
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            majority_threshold: 0.5
        }
    }
}

impl ConsensusConfig {
    // mostly getters
    pub fn majority_threshold(&self) -> f64 {
        self.majority_threshold
    }
}

/// A call paired with its normalization, the unit the policy votes over
struct NormalizedCall<'a> {
    /// The original record
    call: &'a GeneCall,
    /// Its normalized diplotype
    diplotype: NormalizedDiplotype
}

/// Internal outcome of resolving one subset of calls
struct SubsetResolution {
    /// The consensus outcome
    consensus: ConsensusDiplotype,
    /// The rule that fired
    method: ResolutionMethod,
    /// Agreement fraction over the subset
    confidence: f64,
    /// The winning diplotype, retained for phenotype mapping
    winner: Option<NormalizedDiplotype>
}

/// Formats a canonical pair as a display diplotype
fn key_display(key: &(String, String)) -> String {
    format!("{}/{}", key.0, key.1)
}

/// Collects the distinct display forms in a subset, sorted, for candidate lists
fn distinct_displays(subset: &[&NormalizedCall]) -> Vec<String> {
    subset.iter()
        .map(|nc| nc.diplotype.to_string())
        .sorted()
        .dedup()
        .collect()
}

/// Resolves one set of calls that all share a reference build.
/// This is a commutative reduction over the subset: vote tallies and rank
/// lookups only, no first-seen-wins logic, so record order cannot leak into
/// the outcome.
/// # Arguments
/// * `gene` - the gene under resolution
/// * `subset` - the normalized calls to reconcile
/// * `priorities` - the injected tool ranking
/// * `config` - policy knobs
fn resolve_subset(
    gene: &str, subset: &[&NormalizedCall],
    priorities: &ToolPriorityTable, config: ConsensusConfig
) -> SubsetResolution {
    let total = subset.len();

    // the resolved calls, each with its order-independent canonical key
    let resolved: Vec<(&NormalizedCall, (String, String))> = subset.iter()
        .filter_map(|nc| nc.diplotype.canonical_key().map(|key| (*nc, key)))
        .collect();

    if !resolved.is_empty() {
        // rule: unanimity across every resolved diplotype
        if resolved.iter().map(|(_nc, key)| key).all_equal() {
            let winner = resolved[0].0.diplotype.clone();
            return SubsetResolution {
                consensus: ConsensusDiplotype::Resolved { diplotype: key_display(&resolved[0].1) },
                method: ResolutionMethod::Unanimous,
                confidence: 1.0,
                winner: Some(winner)
            };
        }

        // rule: priority override; walk the ranked tools from most to least
        // trusted, skipping any whose own resolved calls disagree internally
        let mut by_rank: BTreeMap<usize, Vec<usize>> = Default::default();
        for (i, (nc, _key)) in resolved.iter().enumerate() {
            if let Some(rank) = priorities.rank(gene, nc.call.tool_name()) {
                by_rank.entry(rank).or_default().push(i);
            }
        }
        for indices in by_rank.values() {
            if !indices.iter().map(|&i| &resolved[i].1).all_equal() {
                // this tool cannot cast a single vote (e.g. conflicting
                // multi-solution output); defer to the next rank
                continue;
            }

            let (winning_call, winner_key) = &resolved[indices[0]];
            let agreeing = resolved.iter()
                .filter(|(_nc, key)| key == winner_key)
                .count();
            return SubsetResolution {
                consensus: ConsensusDiplotype::Resolved { diplotype: key_display(winner_key) },
                method: ResolutionMethod::PriorityOverride,
                confidence: agreeing as f64 / total as f64,
                winner: Some(winning_call.diplotype.clone())
            };
        }

        // rule: strict majority of the resolved votes
        let mut tally: BTreeMap<(String, String), usize> = Default::default();
        for (_nc, key) in resolved.iter() {
            *tally.entry(key.clone()).or_default() += 1;
        }
        let max_votes = tally.values().copied().max().unwrap_or(0);
        let top_keys: Vec<&(String, String)> = tally.iter()
            .filter(|(_key, &votes)| votes == max_votes)
            .map(|(key, _votes)| key)
            .collect();
        let required = config.majority_threshold() * resolved.len() as f64;
        if top_keys.len() == 1 && (max_votes as f64) > required {
            let winner_key = top_keys[0].clone();
            let winner = resolved.iter()
                .find(|(_nc, key)| *key == winner_key)
                .map(|(nc, _key)| nc.diplotype.clone());
            return SubsetResolution {
                consensus: ConsensusDiplotype::Resolved { diplotype: key_display(&winner_key) },
                method: ResolutionMethod::Majority,
                confidence: max_votes as f64 / total as f64,
                winner
            };
        }

        // a tie is never broken arbitrarily
        let candidates: Vec<String> = tally.keys().map(key_display).collect();
        return SubsetResolution {
            consensus: ConsensusDiplotype::Unresolved {
                reason: UnresolvedReason::ConflictingCalls,
                candidates
            },
            method: ResolutionMethod::None,
            confidence: 0.0,
            winner: None
        };
    }

    // rule: zero resolved diplotypes; agreeing partial calls still produce a
    // partial consensus (a sole partial record is the common case here)
    let partials: Vec<&NormalizedCall> = subset.iter()
        .filter(|nc| nc.diplotype.resolution() == DiplotypeResolution::Partial)
        .copied()
        .collect();
    if !partials.is_empty() && partials.iter().map(|nc| nc.diplotype.comparison_key()).all_equal() {
        let winner = partials[0].diplotype.clone();
        let unmapped_tokens: Vec<String> = partials.iter()
            .flat_map(|nc| nc.diplotype.unmapped_tokens())
            .sorted()
            .dedup()
            .collect();
        return SubsetResolution {
            consensus: ConsensusDiplotype::Partial {
                diplotype: winner.to_string(),
                unmapped_tokens
            },
            method: ResolutionMethod::Unanimous,
            confidence: partials.len() as f64 / total as f64,
            winner: Some(winner)
        };
    }

    // nothing usable at all
    SubsetResolution {
        consensus: ConsensusDiplotype::Unresolved {
            reason: UnresolvedReason::NoResolvableCalls,
            candidates: distinct_displays(subset)
        },
        method: ResolutionMethod::None,
        confidence: 0.0,
        winner: None
    }
}

/// Entry point for resolving one sample-gene group into its ConsensusCall.
/// # Arguments
/// * `group` - the sub-problem to resolve
/// * `tables` - shared pre-loaded reference tables, intended to be provided by
///   reference from the parallel iterator
/// * `config` - policy knobs
pub fn solve_consensus_group(group: &SampleGeneGroup, tables: &ReferenceTables, config: ConsensusConfig) -> ConsensusCall {
    let group_id = group.group_id();
    debug!("G#{group_id} Resolving ({}, {}) with {} calls", group.sample_id(), group.gene(), group.calls().len());

    let normalized: Vec<NormalizedCall> = group.calls().iter()
        .map(|call| NormalizedCall {
            call,
            diplotype: normalize_diplotype(call, tables.nomenclature())
        })
        .collect();

    let builds = group.reference_genomes();
    let (resolution, reference_genome, build_conflict, dropped_builds) = if builds.len() > 1 {
        // builds are not comparable at the allele-coordinate level; resolve
        // each build's subset alone and only accept an unambiguous winner
        let mut build_resolutions: Vec<(String, SubsetResolution)> = vec![];
        for build in builds.iter() {
            let subset: Vec<&NormalizedCall> = normalized.iter()
                .filter(|nc| nc.call.reference_genome() == build)
                .collect();
            let subset_resolution = resolve_subset(group.gene(), &subset, tables.priorities(), config);
            if subset_resolution.consensus.is_resolved() {
                build_resolutions.push((build.clone(), subset_resolution));
            }
        }

        if build_resolutions.len() == 1 {
            let (winning_build, subset_resolution) = build_resolutions.remove(0);
            let dropped: Vec<String> = builds.iter()
                .filter(|b| **b != winning_build)
                .cloned()
                .collect();
            (subset_resolution, Some(winning_build), true, dropped)
        } else {
            // zero resolvable builds, or several: choosing one would be an
            // arbitrary tie-break across incomparable coordinate systems
            let all_calls: Vec<&NormalizedCall> = normalized.iter().collect();
            let unresolved = SubsetResolution {
                consensus: ConsensusDiplotype::Unresolved {
                    reason: UnresolvedReason::BuildMismatch,
                    candidates: distinct_displays(&all_calls)
                },
                method: ResolutionMethod::None,
                confidence: 0.0,
                winner: None
            };
            (unresolved, None, true, vec![])
        }
    } else {
        let subset: Vec<&NormalizedCall> = normalized.iter().collect();
        let subset_resolution = resolve_subset(group.gene(), &subset, tables.priorities(), config);
        (subset_resolution, builds.into_iter().next(), false, vec![])
    };

    // the phenotype mapper only runs on a resolved consensus; an agreed
    // partial is explicitly indeterminate, and unresolved carries nothing
    let phenotype = match &resolution.consensus {
        ConsensusDiplotype::Resolved { .. } => resolution.winner.as_ref()
            .map(|winner| map_phenotype(winner, group.gene(), tables.phenotypes())),
        ConsensusDiplotype::Partial { .. } => Some(PhenotypeAssignment::indeterminate()),
        ConsensusDiplotype::Unresolved { .. } => None
    };

    let provenance: Vec<ProvenanceEntry> = normalized.into_iter()
        .map(|nc| {
            let excluded_reason = if dropped_builds.iter().any(|b| b == nc.call.reference_genome()) {
                Some(format!("reference build {} dropped during build-mismatch resolution", nc.call.reference_genome()))
            } else {
                None
            };
            ProvenanceEntry::new(nc.call.clone(), nc.diplotype, excluded_reason)
        })
        .collect();

    ConsensusCall::new(
        group.sample_id().to_string(), group.gene().to_string(),
        reference_genome, build_conflict,
        resolution.consensus, resolution.method, resolution.confidence,
        phenotype, provenance
    )
}
