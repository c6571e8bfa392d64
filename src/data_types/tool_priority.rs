
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// The versioned tool-reliability ranking used by the priority-override rule.
/// Rankings are configured per gene (tool accuracy is gene-specific), with an
/// optional table-wide default for genes without their own entry.
/// Lower index means higher priority.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolPriorityTable {
    /// Identifier for this ranking configuration, e.g. "site-benchmarks-2025Q2"
    #[serde(default)]
    version: String,
    /// Per-gene rankings, best tool first
    #[serde(default)]
    genes: FxHashMap<String, Vec<String>>,
    /// Fallback ranking applied to genes with no entry of their own
    #[serde(default)]
    default: Vec<String>
}

impl ToolPriorityTable {
    /// Constructor, mostly for synthetic tables in tests
    pub fn new(version: String, genes: FxHashMap<String, Vec<String>>, default: Vec<String>) -> Self {
        Self {
            version, genes, default
        }
    }

    /// An empty table, used when no ranking configuration was provided;
    /// every lookup misses and the resolver falls through to majority voting
    pub fn empty() -> Self {
        Self::default()
    }

    // getters
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the rank of a tool for a gene, 0 being the most trusted.
    /// Tools absent from the applicable ranking are unranked (None).
    pub fn rank(&self, gene: &str, tool_name: &str) -> Option<usize> {
        let ranking = self.genes.get(gene)
            .unwrap_or(&self.default);
        ranking.iter().position(|t| t == tool_name)
    }

    /// Returns true if no ranking applies to the given gene at all
    pub fn is_unranked(&self, gene: &str) -> bool {
        self.genes.get(gene)
            .unwrap_or(&self.default)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> ToolPriorityTable {
        let genes: FxHashMap<String, Vec<String>> = [
            ("CYP2D6".to_string(), vec!["stargazer".to_string(), "aldy".to_string()])
        ].into_iter().collect();
        ToolPriorityTable::new("unit-test".to_string(), genes, vec!["aldy".to_string()])
    }

    #[test]
    fn test_gene_specific_ranking() {
        let table = example_table();
        assert_eq!(table.rank("CYP2D6", "stargazer"), Some(0));
        assert_eq!(table.rank("CYP2D6", "aldy"), Some(1));
        assert_eq!(table.rank("CYP2D6", "pharmcat"), None);
        assert!(!table.is_unranked("CYP2D6"));
    }

    #[test]
    fn test_default_fallback() {
        let table = example_table();
        // CYP2C19 has no entry, so the default ranking applies
        assert_eq!(table.rank("CYP2C19", "aldy"), Some(0));
        assert_eq!(table.rank("CYP2C19", "stargazer"), None);

        // an empty table ranks nothing
        let empty = ToolPriorityTable::empty();
        assert_eq!(empty.rank("CYP2D6", "aldy"), None);
        assert!(empty.is_unranked("CYP2D6"));
    }
}
