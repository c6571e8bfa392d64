//! # Allele Normalizer
//! Contains the logic for mapping one tool's raw diplotype string onto the canonical
//! nomenclature. Normalization is always best-effort: misses become field states on the
//! returned diplotype, never errors, because a half-mapped call still carries
//! clinically useful information.
//!
//! ## Example usage
//! ```rust
//! use rustc_hash::FxHashMap;
//! use starling::allele_normalizer::normalize_diplotype;
//! use starling::data_types::gene_call::{GeneCall, RawToolOutput};
//! use starling::data_types::nomenclature::{GeneNomenclature, NomenclatureTable};
//! use starling::data_types::normalized_diplotype::DiplotypeResolution;
//!
//! // a tiny synthetic nomenclature covering two CYP2D6 alleles
//! let alleles: FxHashMap<String, String> = [
//!     ("*1".to_string(), "*1".to_string()),
//!     ("*4".to_string(), "*4".to_string())
//! ].into_iter().collect();
//! let genes: FxHashMap<String, GeneNomenclature> = [(
//!     "CYP2D6".to_string(),
//!     GeneNomenclature::new(vec!["CYP2D6".to_string()], vec!['/', '|'], alleles)
//! )].into_iter().collect();
//! let nomenclature = NomenclatureTable::new("example".to_string(), genes);
//!
//! // a call with a gene-prefixed spelling normalizes to the canonical pair
//! let call = GeneCall::new(
//!     "sample1".to_string(), "CYP2D6".to_string(), "aldy".to_string(), "GRCh38".to_string(),
//!     None, RawToolOutput::from_diplotype("CYP2D6*4/*1".to_string())
//! ).unwrap();
//! let diplotype = normalize_diplotype(&call, &nomenclature);
//! assert_eq!(diplotype.resolution(), DiplotypeResolution::Resolved);
//! assert_eq!(diplotype.to_string(), "*1/*4");
//! ```
use log::debug;

use crate::data_types::gene_call::GeneCall;
use crate::data_types::nomenclature::{GeneNomenclature, NomenclatureTable};
use crate::data_types::normalized_diplotype::{CanonicalAllele, NormalizedAllele, NormalizedDiplotype};

/// Strips any configured tool prefix (and the gene symbol itself) off a raw
/// token, case-insensitively, and restores the leading '*' that some tools
/// omit. "CYP2D6*4" and "2D6*4" both come out as "*4".
fn clean_token(gene_symbol: &str, nomenclature: &GeneNomenclature, token: &str) -> String {
    let trimmed = token.trim();

    let mut stripped = trimmed;
    // longest prefix first so "CYP2D6" wins over a configured "2D6"
    let mut prefixes: Vec<&str> = nomenclature.strip_prefixes().iter()
        .map(|p| p.as_str())
        .chain(std::iter::once(gene_symbol))
        .collect();
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
    for prefix in prefixes {
        if stripped.len() >= prefix.len()
            && stripped.is_char_boundary(prefix.len())
            && stripped[..prefix.len()].eq_ignore_ascii_case(prefix) {
            stripped = &stripped[prefix.len()..];
            break;
        }
    }

    let stripped = stripped.trim();
    if stripped.is_empty() || stripped.starts_with('*') {
        stripped.to_string()
    } else {
        format!("*{stripped}")
    }
}

/// Splits a trailing tandem-duplication suffix off a token: "*1x2" -> ("*1", 2).
/// Returns None when no well-formed suffix is present.
fn split_copy_suffix(token: &str) -> Option<(&str, u32)> {
    let split_at = token.rfind(['x', 'X'])?;
    let (base, suffix) = token.split_at(split_at);
    let copies: u32 = suffix[1..].parse().ok()?;
    if base.is_empty() || copies == 0 {
        return None;
    }
    Some((base, copies))
}

/// Maps one raw haplotype token onto the canonical nomenclature.
/// The lookup ladder, in order:
/// 1. the raw spelling verbatim (exact);
/// 2. the cleaned spelling, case-folded if needed (fuzzy);
/// 3. the cleaned spelling with its copy suffix folded out (fuzzy, carrying the copy number).
/// Anything that falls through is a failed mapping retaining the raw token.
/// # Arguments
/// * `gene_symbol` - the gene the token belongs to
/// * `nomenclature` - the gene's nomenclature rules
/// * `token` - the raw haplotype token
pub fn normalize_haplotype_token(gene_symbol: &str, nomenclature: &GeneNomenclature, token: &str) -> NormalizedAllele {
    // raw spelling, verbatim
    if let Some(canonical) = nomenclature.lookup_exact(token.trim()) {
        return NormalizedAllele::exact(
            CanonicalAllele::new(canonical.to_string(), 1),
            token.to_string()
        );
    }

    // cleaned spelling
    let cleaned = clean_token(gene_symbol, nomenclature, token);
    if let Some(canonical) = nomenclature.lookup_exact(&cleaned).or_else(|| nomenclature.lookup_folded(&cleaned)) {
        return NormalizedAllele::fuzzy(
            CanonicalAllele::new(canonical.to_string(), 1),
            token.to_string()
        );
    }

    // cleaned spelling minus a duplication suffix
    if let Some((base, copies)) = split_copy_suffix(&cleaned) {
        if let Some(canonical) = nomenclature.lookup_exact(base).or_else(|| nomenclature.lookup_folded(base)) {
            return NormalizedAllele::fuzzy(
                CanonicalAllele::new(canonical.to_string(), copies),
                token.to_string()
            );
        }
    }

    NormalizedAllele::failed(token.to_string())
}

/// Returns true if the call carries structural evidence (a reported copy
/// number or structural-variant entries) that makes a copy-number-only
/// interpretation possible when the diplotype string itself is unparseable.
fn has_structural_evidence(call: &GeneCall) -> bool {
    let payload = call.raw_tool_output();
    payload.copy_number_raw.is_some() || !payload.structural_variants_raw.is_empty()
}

/// Entry point for normalizing one call's diplotype.
/// # Arguments
/// * `call` - the validated gene call
/// * `nomenclature` - the full nomenclature table; genes absent from it can
///   never map, though structural evidence is still honored
pub fn normalize_diplotype(call: &GeneCall, nomenclature: &NomenclatureTable) -> NormalizedDiplotype {
    let raw = call.diplotype_string().trim();

    let gene_nomenclature = match nomenclature.gene(call.gene()) {
        Some(g) => g,
        None => {
            debug!("No nomenclature for gene {:?}, call from {:?} cannot map", call.gene(), call.tool_name());
            return if has_structural_evidence(call) {
                NormalizedDiplotype::indeterminate_structural(raw)
            } else {
                NormalizedDiplotype::unparsed(raw)
            };
        }
    };

    // tokenize on the first configured delimiter present in the string
    let split = gene_nomenclature.delimiters().iter()
        .find_map(|&d| raw.split_once(d));
    let (token1, token2) = match split {
        Some(pair) => pair,
        None => {
            // no recognized delimiter; a copy-number-only report is still
            // partial information, anything else is a full miss
            return if has_structural_evidence(call) {
                NormalizedDiplotype::indeterminate_structural(raw)
            } else {
                NormalizedDiplotype::unparsed(raw)
            };
        }
    };

    NormalizedDiplotype::new(
        normalize_haplotype_token(call.gene(), gene_nomenclature, token1),
        normalize_haplotype_token(call.gene(), gene_nomenclature, token2)
    )
}
