
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Delimiters assumed for genes that do not configure their own
fn default_delimiters() -> Vec<char> {
    vec!['/', '|']
}

/// Nomenclature rules for a single gene: how to tokenize its diplotype strings
/// and how to map tool-specific or legacy spellings onto canonical designations.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneNomenclature {
    /// Prefixes that tools prepend to allele tokens, stripped case-insensitively;
    /// the gene symbol itself is always stripped even if this list is empty
    #[serde(default)]
    strip_prefixes: Vec<String>,
    /// Characters that separate the two haplotype tokens in a diplotype string
    #[serde(default = "default_delimiters")]
    delimiters: Vec<char>,
    /// Raw spelling to canonical designation, including synonyms and sub-allele
    /// collapses (e.g. "*4.021" -> "*4")
    alleles: FxHashMap<String, String>
}

impl GeneNomenclature {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(strip_prefixes: Vec<String>, delimiters: Vec<char>, alleles: FxHashMap<String, String>) -> Self {
        Self {
            strip_prefixes, delimiters, alleles
        }
    }

    // getters
    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    pub fn strip_prefixes(&self) -> &[String] {
        &self.strip_prefixes
    }

    /// Case-preserving direct lookup of a raw spelling
    pub fn lookup_exact(&self, token: &str) -> Option<&str> {
        self.alleles.get(token).map(|s| s.as_str())
    }

    /// Case-insensitive lookup for tokens that missed the exact path.
    /// Tables are small per gene, so a scan is cheaper than a second folded map.
    pub fn lookup_folded(&self, token: &str) -> Option<&str> {
        self.alleles.iter()
            .find(|(raw, _canonical)| raw.eq_ignore_ascii_case(token))
            .map(|(_raw, canonical)| canonical.as_str())
    }
}

/// The versioned nomenclature table covering every supported gene.
/// Loaded once from JSON configuration and treated as immutable for the run.
#[derive(Clone, Debug, Deserialize)]
pub struct NomenclatureTable {
    /// Upstream nomenclature release this table was built from, e.g. "pharmvar-6.2.3"
    version: String,
    /// Per-gene rules, keyed by gene symbol
    genes: FxHashMap<String, GeneNomenclature>
}

impl NomenclatureTable {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(version: String, genes: FxHashMap<String, GeneNomenclature>) -> Self {
        Self {
            version, genes
        }
    }

    // getters
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn gene(&self, gene: &str) -> Option<&GeneNomenclature> {
        self.genes.get(gene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_gene() -> GeneNomenclature {
        let alleles: FxHashMap<String, String> = [
            ("*1".to_string(), "*1".to_string()),
            ("*4".to_string(), "*4".to_string()),
            ("*4.021".to_string(), "*4".to_string()),
            ("*4A".to_string(), "*4".to_string())
        ].into_iter().collect();
        GeneNomenclature::new(vec!["CYP2D6".to_string()], default_delimiters(), alleles)
    }

    #[test]
    fn test_lookups() {
        let gene = example_gene();
        assert_eq!(gene.lookup_exact("*4"), Some("*4"));
        assert_eq!(gene.lookup_exact("*4.021"), Some("*4"));
        assert_eq!(gene.lookup_exact("*9"), None);

        // folded path catches case drift
        assert_eq!(gene.lookup_exact("*4a"), None);
        assert_eq!(gene.lookup_folded("*4a"), Some("*4"));
        assert_eq!(gene.lookup_folded("*1"), Some("*1"));
    }

    #[test]
    fn test_table_deserialize() {
        let table: NomenclatureTable = serde_json::from_value(serde_json::json!({
            "version": "pharmvar-6.2.3",
            "genes": {
                "CYP2D6": {
                    "strip_prefixes": ["CYP2D6", "2D6"],
                    "alleles": { "*1": "*1", "*4": "*4" }
                }
            }
        })).unwrap();
        assert_eq!(table.version(), "pharmvar-6.2.3");
        let gene = table.gene("CYP2D6").unwrap();
        // unspecified delimiters fall back to the defaults
        assert_eq!(gene.delimiters(), &['/', '|']);
        assert_eq!(gene.strip_prefixes().len(), 2);
        assert!(table.gene("CYP2C19").is_none());
    }
}
