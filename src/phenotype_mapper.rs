//! # Phenotype Mapper
//! Derives a predicted metabolizer phenotype from a resolved consensus diplotype via
//! the gene's function/phenotype table. Partial information is never upgraded: any
//! unknown allele function forces the phenotype to indeterminate, and table gaps are
//! logged rather than guessed around.
use log::warn;

use crate::data_types::normalized_diplotype::NormalizedDiplotype;
use crate::data_types::phenotype_table::{AlleleFunction, AlleleFunctionCall, PhenotypeAssignment, PhenotypeTable};

/// Derives the phenotype for a resolved diplotype.
/// This is only meaningful for fully resolved diplotypes; anything with an
/// unmapped allele comes back indeterminate.
/// # Arguments
/// * `diplotype` - the consensus diplotype
/// * `gene` - the gene the diplotype belongs to
/// * `table` - the function/phenotype table
pub fn map_phenotype(diplotype: &NormalizedDiplotype, gene: &str, table: &PhenotypeTable) -> PhenotypeAssignment {
    let gene_rules = match table.gene(gene) {
        Some(rules) => rules,
        None => {
            warn!("No phenotype rules for gene {gene:?}, phenotype is indeterminate");
            return PhenotypeAssignment::indeterminate();
        }
    };

    let alleles = match (diplotype.allele1().canonical(), diplotype.allele2().canonical()) {
        (Some(a1), Some(a2)) => [a1, a2],
        // not resolved; nothing to look up
        _ => return PhenotypeAssignment::indeterminate()
    };

    let functions: Vec<AlleleFunctionCall> = alleles.iter()
        .map(|allele| {
            let function = match gene_rules.function_for(allele) {
                Some(f) => f,
                None => {
                    // allele known to the nomenclature but absent from the function
                    // table; a reference-table inconsistency, not a fatal error
                    warn!("Allele {allele} of {gene} is missing from the function table, treating as unknown");
                    AlleleFunction::Unknown
                }
            };
            AlleleFunctionCall::new(allele.to_string(), function)
        })
        .collect();

    let f1 = functions[0].function();
    let f2 = functions[1].function();
    if f1 == AlleleFunction::Unknown || f2 == AlleleFunction::Unknown {
        return PhenotypeAssignment::indeterminate_with(functions);
    }

    match gene_rules.phenotype_for(f1, f2) {
        Some(phenotype) => PhenotypeAssignment::new(phenotype, functions),
        None => {
            warn!("No phenotype rule for {gene} function pair ({f1}, {f2}), phenotype is indeterminate");
            PhenotypeAssignment::indeterminate_with(functions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashMap;
    use crate::data_types::normalized_diplotype::{CanonicalAllele, NormalizedAllele};
    use crate::data_types::phenotype_table::{GenePhenotypes, PgxPhenotype, PhenotypeRule};

    /// Helper function that builds a small CYP2D6 phenotype table we can repeatedly use
    fn generate_simple_table() -> PhenotypeTable {
        let allele_function: FxHashMap<String, AlleleFunction> = [
            ("*1".to_string(), AlleleFunction::Normal),
            ("*4".to_string(), AlleleFunction::NoFunction),
            ("*41".to_string(), AlleleFunction::Unknown)
        ].into_iter().collect();
        let rules = vec![
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::Normal], PgxPhenotype::NormalMetabolizer),
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::NoFunction], PgxPhenotype::IntermediateMetabolizer),
            PhenotypeRule::new([AlleleFunction::NoFunction, AlleleFunction::NoFunction], PgxPhenotype::PoorMetabolizer),
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::Increased], PgxPhenotype::UltrarapidMetabolizer)
        ];
        let genes: FxHashMap<String, GenePhenotypes> = [(
            "CYP2D6".to_string(),
            GenePhenotypes::new(allele_function, Some(AlleleFunction::Increased), rules)
        )].into_iter().collect();
        PhenotypeTable::new("unit-test".to_string(), genes)
    }

    fn resolved_diplotype(allele1: &str, copies1: u32, allele2: &str) -> NormalizedDiplotype {
        NormalizedDiplotype::new(
            NormalizedAllele::exact(CanonicalAllele::new(allele1.to_string(), copies1), allele1.to_string()),
            NormalizedAllele::exact(CanonicalAllele::new(allele2.to_string(), 1), allele2.to_string())
        )
    }

    #[test]
    fn test_basic_phenotypes() {
        let table = generate_simple_table();

        let intermediate = map_phenotype(&resolved_diplotype("*1", 1, "*4"), "CYP2D6", &table);
        assert_eq!(intermediate.phenotype(), PgxPhenotype::IntermediateMetabolizer);
        assert_eq!(intermediate.allele_functions().len(), 2);
        assert_eq!(intermediate.allele_functions()[0].function(), AlleleFunction::Normal);
        assert_eq!(intermediate.allele_functions()[1].function(), AlleleFunction::NoFunction);

        let poor = map_phenotype(&resolved_diplotype("*4", 1, "*4"), "CYP2D6", &table);
        assert_eq!(poor.phenotype(), PgxPhenotype::PoorMetabolizer);

        // duplication override kicks in for *1x2
        let ultrarapid = map_phenotype(&resolved_diplotype("*1", 2, "*1"), "CYP2D6", &table);
        assert_eq!(ultrarapid.phenotype(), PgxPhenotype::UltrarapidMetabolizer);
        assert_eq!(ultrarapid.allele_functions()[0].allele(), "*1x2");
    }

    #[test]
    fn test_unknown_function_is_indeterminate() {
        let table = generate_simple_table();

        // curated-unknown function
        let curated = map_phenotype(&resolved_diplotype("*1", 1, "*41"), "CYP2D6", &table);
        assert_eq!(curated.phenotype(), PgxPhenotype::Indeterminate);
        // the known half is still reported, not upgraded
        assert_eq!(curated.allele_functions()[0].function(), AlleleFunction::Normal);
        assert_eq!(curated.allele_functions()[1].function(), AlleleFunction::Unknown);

        // entirely absent allele
        let missing = map_phenotype(&resolved_diplotype("*1", 1, "*99"), "CYP2D6", &table);
        assert_eq!(missing.phenotype(), PgxPhenotype::Indeterminate);
        assert_eq!(missing.allele_functions()[1].function(), AlleleFunction::Unknown);
    }

    #[test]
    fn test_table_gaps_are_indeterminate() {
        let table = generate_simple_table();

        // unsupported gene
        let no_gene = map_phenotype(&resolved_diplotype("*1", 1, "*1"), "CYP2C19", &table);
        assert_eq!(no_gene.phenotype(), PgxPhenotype::Indeterminate);
        assert!(no_gene.allele_functions().is_empty());

        // function pair with no rule: *4/*1x2 -> (no_function, increased)
        let no_rule = map_phenotype(&resolved_diplotype("*1", 2, "*4"), "CYP2D6", &table);
        assert_eq!(no_rule.phenotype(), PgxPhenotype::Indeterminate);
        assert_eq!(no_rule.allele_functions().len(), 2);
    }
}
