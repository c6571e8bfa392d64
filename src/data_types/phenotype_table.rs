
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::data_types::normalized_diplotype::CanonicalAllele;

/// Functional status of a single allele
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AlleleFunction {
    NoFunction,
    Decreased,
    Normal,
    Increased,
    /// Curated as uncertain, or simply absent from the table;
    /// any unknown function forces the phenotype to indeterminate
    Unknown
}

/// Predicted metabolizer phenotype categories
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PgxPhenotype {
    PoorMetabolizer,
    IntermediateMetabolizer,
    NormalMetabolizer,
    RapidMetabolizer,
    UltrarapidMetabolizer,
    /// Partial information is never upgraded into a confident phenotype
    Indeterminate
}

/// One function-pair to phenotype rule; the pair is unordered
#[derive(Clone, Debug, Deserialize)]
pub struct PhenotypeRule {
    /// The two allele functions this rule matches, in either order
    functions: [AlleleFunction; 2],
    /// The phenotype the pair maps to
    phenotype: PgxPhenotype
}

impl PhenotypeRule {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(functions: [AlleleFunction; 2], phenotype: PgxPhenotype) -> Self {
        Self {
            functions, phenotype
        }
    }

    /// Order-independent match against a function pair
    fn matches(&self, f1: AlleleFunction, f2: AlleleFunction) -> bool {
        (self.functions[0] == f1 && self.functions[1] == f2) ||
            (self.functions[0] == f2 && self.functions[1] == f1)
    }
}

/// Function and phenotype rules for one gene
#[derive(Clone, Debug, Deserialize)]
pub struct GenePhenotypes {
    /// Canonical designation to functional status; entries may include folded
    /// copy-number forms like "*1x2" for explicit duplication curation
    allele_function: FxHashMap<String, AlleleFunction>,
    /// Function assumed for duplicated alleles with no explicit "*NxM" entry
    #[serde(default)]
    duplication_function: Option<AlleleFunction>,
    /// The unordered function-pair rules for this gene
    diplotype_phenotype: Vec<PhenotypeRule>
}

impl GenePhenotypes {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(
        allele_function: FxHashMap<String, AlleleFunction>,
        duplication_function: Option<AlleleFunction>,
        diplotype_phenotype: Vec<PhenotypeRule>
    ) -> Self {
        Self {
            allele_function, duplication_function, diplotype_phenotype
        }
    }

    /// Looks up the functional status of a canonical allele.
    /// Lookup order: the full folded form (e.g. "*1x2"), then the duplication
    /// override for multi-copy alleles, then the base designation.
    /// Returns None when the allele is absent from the table entirely.
    pub fn function_for(&self, allele: &CanonicalAllele) -> Option<AlleleFunction> {
        if let Some(&function) = self.allele_function.get(&allele.to_string()) {
            return Some(function);
        }

        if allele.copy_number() > 1 {
            if let Some(function) = self.duplication_function {
                return Some(function);
            }
        }

        self.allele_function.get(allele.designation()).copied()
    }

    /// Maps an unordered function pair to a phenotype, if a rule covers it
    pub fn phenotype_for(&self, f1: AlleleFunction, f2: AlleleFunction) -> Option<PgxPhenotype> {
        self.diplotype_phenotype.iter()
            .find(|rule| rule.matches(f1, f2))
            .map(|rule| rule.phenotype)
    }
}

/// The versioned function/phenotype table covering every supported gene
#[derive(Clone, Debug, Deserialize)]
pub struct PhenotypeTable {
    /// Guideline release this table was curated from, e.g. "cpic-2024.11"
    version: String,
    /// Per-gene rules, keyed by gene symbol
    genes: FxHashMap<String, GenePhenotypes>
}

impl PhenotypeTable {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(version: String, genes: FxHashMap<String, GenePhenotypes>) -> Self {
        Self {
            version, genes
        }
    }

    // getters
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn gene(&self, gene: &str) -> Option<&GenePhenotypes> {
        self.genes.get(gene)
    }
}

/// The functional status assigned to one allele of a consensus diplotype
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlleleFunctionCall {
    /// Canonical display form of the allele
    allele: String,
    /// Its functional status
    function: AlleleFunction
}

impl AlleleFunctionCall {
    /// Constructor
    pub fn new(allele: String, function: AlleleFunction) -> Self {
        Self {
            allele, function
        }
    }

    // getters
    pub fn allele(&self) -> &str {
        &self.allele
    }

    pub fn function(&self) -> AlleleFunction {
        self.function
    }
}

/// The phenotype derived for a consensus diplotype, with per-allele functions
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhenotypeAssignment {
    /// The phenotype category
    phenotype: PgxPhenotype,
    /// Functional status of each constituent allele
    allele_functions: Vec<AlleleFunctionCall>
}

impl PhenotypeAssignment {
    /// Constructor
    pub fn new(phenotype: PgxPhenotype, allele_functions: Vec<AlleleFunctionCall>) -> Self {
        Self {
            phenotype, allele_functions
        }
    }

    /// An indeterminate assignment with no per-allele detail
    pub fn indeterminate() -> Self {
        Self {
            phenotype: PgxPhenotype::Indeterminate,
            allele_functions: vec![]
        }
    }

    /// An indeterminate assignment that still reports what is known per allele
    pub fn indeterminate_with(allele_functions: Vec<AlleleFunctionCall>) -> Self {
        Self {
            phenotype: PgxPhenotype::Indeterminate,
            allele_functions
        }
    }

    // getters
    pub fn phenotype(&self) -> PgxPhenotype {
        self.phenotype
    }

    pub fn allele_functions(&self) -> &[AlleleFunctionCall] {
        &self.allele_functions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_gene() -> GenePhenotypes {
        let allele_function: FxHashMap<String, AlleleFunction> = [
            ("*1".to_string(), AlleleFunction::Normal),
            ("*4".to_string(), AlleleFunction::NoFunction),
            ("*10".to_string(), AlleleFunction::Decreased),
            ("*4x2".to_string(), AlleleFunction::NoFunction)
        ].into_iter().collect();
        GenePhenotypes::new(allele_function, Some(AlleleFunction::Increased), vec![
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::Normal], PgxPhenotype::NormalMetabolizer),
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::NoFunction], PgxPhenotype::IntermediateMetabolizer),
            PhenotypeRule::new([AlleleFunction::NoFunction, AlleleFunction::NoFunction], PgxPhenotype::PoorMetabolizer),
            PhenotypeRule::new([AlleleFunction::Normal, AlleleFunction::Increased], PgxPhenotype::UltrarapidMetabolizer)
        ])
    }

    #[test]
    fn test_function_lookup_order() {
        let gene = example_gene();
        let plain = CanonicalAllele::new("*1".to_string(), 1);
        assert_eq!(gene.function_for(&plain), Some(AlleleFunction::Normal));

        // explicit folded entry wins over the duplication override
        let dup4 = CanonicalAllele::new("*4".to_string(), 2);
        assert_eq!(gene.function_for(&dup4), Some(AlleleFunction::NoFunction));

        // no explicit entry, so the duplication override applies
        let dup1 = CanonicalAllele::new("*1".to_string(), 2);
        assert_eq!(gene.function_for(&dup1), Some(AlleleFunction::Increased));

        // absent allele
        let missing = CanonicalAllele::new("*99".to_string(), 1);
        assert_eq!(gene.function_for(&missing), None);
    }

    #[test]
    fn test_pair_rules_are_unordered() {
        let gene = example_gene();
        assert_eq!(
            gene.phenotype_for(AlleleFunction::NoFunction, AlleleFunction::Normal),
            Some(PgxPhenotype::IntermediateMetabolizer)
        );
        assert_eq!(
            gene.phenotype_for(AlleleFunction::Normal, AlleleFunction::NoFunction),
            Some(PgxPhenotype::IntermediateMetabolizer)
        );
        assert_eq!(gene.phenotype_for(AlleleFunction::Decreased, AlleleFunction::Increased), None);
    }

    #[test]
    fn test_string_round_trips() {
        use std::str::FromStr;
        assert_eq!(PgxPhenotype::PoorMetabolizer.to_string(), "poor_metabolizer");
        assert_eq!(PgxPhenotype::from_str("Ultrarapid_Metabolizer").unwrap(), PgxPhenotype::UltrarapidMetabolizer);
        assert_eq!(AlleleFunction::NoFunction.to_string(), "no_function");
        assert_eq!(AlleleFunction::from_str("no_function").unwrap(), AlleleFunction::NoFunction);
    }

    #[test]
    fn test_table_deserialize() {
        let table: PhenotypeTable = serde_json::from_value(serde_json::json!({
            "version": "cpic-2024.11",
            "genes": {
                "CYP2D6": {
                    "allele_function": { "*1": "normal", "*4": "no_function" },
                    "duplication_function": "increased",
                    "diplotype_phenotype": [
                        { "functions": ["normal", "normal"], "phenotype": "normal_metabolizer" }
                    ]
                }
            }
        })).unwrap();
        assert_eq!(table.version(), "cpic-2024.11");
        let gene = table.gene("CYP2D6").unwrap();
        assert_eq!(
            gene.phenotype_for(AlleleFunction::Normal, AlleleFunction::Normal),
            Some(PgxPhenotype::NormalMetabolizer)
        );
    }
}
