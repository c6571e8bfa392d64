
use serde::Serialize;
use std::cmp::Ordering;

/// How a raw haplotype token was mapped onto the canonical nomenclature
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MappingStatus {
    /// The raw spelling was a direct table hit
    Exact,
    /// The token resolved after prefix/case normalization or through a synonym entry
    Fuzzy,
    /// No allele identity, but copy-number/structural evidence was present;
    /// carries more information than a plain miss (e.g. it is known not to be a deletion)
    IndeterminateStructural,
    /// No mapping found; the raw token is retained for audit
    Failed
}

impl MappingStatus {
    /// Returns true if the token reached a canonical designation
    pub fn is_mapped(&self) -> bool {
        match self {
            MappingStatus::Exact |
            MappingStatus::Fuzzy => true,
            MappingStatus::IndeterminateStructural |
            MappingStatus::Failed => false
        }
    }
}

/// A canonical star-allele designation with any folded copy number.
/// "*1x2" is designation "*1" with copy_number 2.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct CanonicalAllele {
    /// The canonical designation from the nomenclature table, e.g. "*4"
    designation: String,
    /// Folded copy count; 1 for a plain allele, >1 for tandem duplications
    copy_number: u32
}

impl CanonicalAllele {
    /// Constructor; a zero copy number is coerced to 1
    pub fn new(designation: String, copy_number: u32) -> Self {
        Self {
            designation,
            copy_number: copy_number.max(1)
        }
    }

    // getters
    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn copy_number(&self) -> u32 {
        self.copy_number
    }

    /// Splits a star designation into its numeric core and any remaining suffix,
    /// enabling numeric-aware ordering ("*4" before "*10")
    fn star_rank(&self) -> (Option<u64>, &str) {
        let body = self.designation.strip_prefix('*').unwrap_or(&self.designation);
        let digit_end = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
        let numeric = body[..digit_end].parse::<u64>().ok();
        (numeric, body)
    }
}

impl std::fmt::Display for CanonicalAllele {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.copy_number > 1 {
            write!(f, "{}x{}", self.designation, self.copy_number)
        } else {
            write!(f, "{}", self.designation)
        }
    }
}

impl Ord for CanonicalAllele {
    fn cmp(&self, other: &Self) -> Ordering {
        let (s_num, s_body) = self.star_rank();
        let (o_num, o_body) = other.star_rank();
        match (s_num, o_num) {
            // numbered star alleles sort numerically, then on the full body for sub-alleles
            (Some(s), Some(o)) => s.cmp(&o)
                .then_with(|| s_body.cmp(o_body))
                .then_with(|| self.copy_number.cmp(&other.copy_number)),
            // numbered alleles come before anything non-standard
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => s_body.cmp(o_body)
                .then_with(|| self.copy_number.cmp(&other.copy_number))
        }
    }
}

impl PartialOrd for CanonicalAllele {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One haplotype after normalization: the canonical form when mapping succeeded,
/// plus the raw token it came from and how the mapping went.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NormalizedAllele {
    /// Canonical representation; None when the mapping failed or was only structural
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<CanonicalAllele>,
    /// The raw string this allele was derived from
    raw_token: String,
    /// Outcome of the nomenclature lookup
    status: MappingStatus
}

impl NormalizedAllele {
    /// A direct table hit
    pub fn exact(canonical: CanonicalAllele, raw_token: String) -> Self {
        Self {
            canonical: Some(canonical),
            raw_token,
            status: MappingStatus::Exact
        }
    }

    /// A hit through synonym resolution or format normalization
    pub fn fuzzy(canonical: CanonicalAllele, raw_token: String) -> Self {
        Self {
            canonical: Some(canonical),
            raw_token,
            status: MappingStatus::Fuzzy
        }
    }

    /// Copy-number/structural evidence without an allele identity
    pub fn indeterminate_structural(raw_token: String) -> Self {
        Self {
            canonical: None,
            raw_token,
            status: MappingStatus::IndeterminateStructural
        }
    }

    /// A mapping miss; the raw token is all we have
    pub fn failed(raw_token: String) -> Self {
        Self {
            canonical: None,
            raw_token,
            status: MappingStatus::Failed
        }
    }

    // getters
    pub fn canonical(&self) -> Option<&CanonicalAllele> {
        self.canonical.as_ref()
    }

    pub fn raw_token(&self) -> &str {
        &self.raw_token
    }

    pub fn status(&self) -> MappingStatus {
        self.status
    }

    /// Returns true if this allele carries a canonical designation
    pub fn is_resolved(&self) -> bool {
        self.canonical.is_some()
    }

    /// A stable string for agreement comparisons: the canonical display form when
    /// resolved, otherwise the raw token wrapped so it can never collide with a
    /// canonical designation
    fn comparison_token(&self) -> String {
        match (self.canonical.as_ref(), self.status) {
            (Some(canonical), _) => canonical.to_string(),
            (None, MappingStatus::IndeterminateStructural) => format!("?cn({})", self.raw_token),
            (None, _) => format!("?({})", self.raw_token)
        }
    }
}

/// Overall state of a normalized diplotype
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiplotypeResolution {
    /// Both alleles mapped to canonical designations
    Resolved,
    /// Exactly one allele mapped, or only structural information is available
    Partial,
    /// Nothing usable was recovered from the call
    Unresolved
}

/// An unordered pair of normalized alleles attributed to one gene call.
/// "*1/*4" and "*4/*1" are the same diplotype; all comparison and display
/// functions order the alleles canonically.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NormalizedDiplotype {
    /// First allele as parsed; pair order carries no meaning
    allele1: NormalizedAllele,
    /// Second allele as parsed
    allele2: NormalizedAllele
}

impl NormalizedDiplotype {
    /// Constructor
    pub fn new(allele1: NormalizedAllele, allele2: NormalizedAllele) -> Self {
        Self {
            allele1, allele2
        }
    }

    /// Builds a fully-unresolved diplotype from a raw string that did not parse
    pub fn unparsed(raw_diplotype: &str) -> Self {
        Self {
            allele1: NormalizedAllele::failed(raw_diplotype.to_string()),
            allele2: NormalizedAllele::failed(raw_diplotype.to_string())
        }
    }

    /// Builds an indeterminate-structural diplotype for copy-number-only calls
    pub fn indeterminate_structural(raw_diplotype: &str) -> Self {
        Self {
            allele1: NormalizedAllele::indeterminate_structural(raw_diplotype.to_string()),
            allele2: NormalizedAllele::indeterminate_structural(raw_diplotype.to_string())
        }
    }

    // getters
    pub fn allele1(&self) -> &NormalizedAllele {
        &self.allele1
    }

    pub fn allele2(&self) -> &NormalizedAllele {
        &self.allele2
    }

    /// Resolution state; `Resolved` requires both alleles to have mapped
    pub fn resolution(&self) -> DiplotypeResolution {
        let mapped = [&self.allele1, &self.allele2].iter()
            .filter(|a| a.is_resolved())
            .count();
        match mapped {
            2 => DiplotypeResolution::Resolved,
            1 => DiplotypeResolution::Partial,
            _ => {
                // copy-number-only evidence is partial information, not a total miss
                if self.allele1.status() == MappingStatus::IndeterminateStructural ||
                    self.allele2.status() == MappingStatus::IndeterminateStructural {
                    DiplotypeResolution::Partial
                } else {
                    DiplotypeResolution::Unresolved
                }
            }
        }
    }

    /// The order-independent canonical pair, available only when fully resolved.
    /// This is the equality key for consensus voting.
    pub fn canonical_key(&self) -> Option<(String, String)> {
        match (self.allele1.canonical(), self.allele2.canonical()) {
            (Some(c1), Some(c2)) => {
                if c1 <= c2 {
                    Some((c1.to_string(), c2.to_string()))
                } else {
                    Some((c2.to_string(), c1.to_string()))
                }
            },
            _ => None
        }
    }

    /// An order-independent key usable for any resolution state; partial and
    /// structural alleles contribute tagged raw tokens so distinct misses never
    /// compare equal to canonical designations
    pub fn comparison_key(&self) -> (String, String) {
        let t1 = self.allele1.comparison_token();
        let t2 = self.allele2.comparison_token();
        if t1 <= t2 {
            (t1, t2)
        } else {
            (t2, t1)
        }
    }

    /// Raw tokens that failed to map, for audit trails
    pub fn unmapped_tokens(&self) -> Vec<String> {
        [&self.allele1, &self.allele2].iter()
            .filter(|a| !a.is_resolved())
            .map(|a| a.raw_token().to_string())
            .collect()
    }
}

impl std::fmt::Display for NormalizedDiplotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (t1, t2) = self.comparison_key();
        write!(f, "{t1}/{t2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(designation: &str) -> CanonicalAllele {
        CanonicalAllele::new(designation.to_string(), 1)
    }

    #[test]
    fn test_star_allele_ordering() {
        // numeric-aware: *4 before *10, sub-alleles after their core
        assert!(plain("*1") < plain("*4"));
        assert!(plain("*4") < plain("*10"));
        assert!(plain("*4") < plain("*4.021"));
        // non-standard designations sort after numbered ones
        assert!(plain("*10") < plain("*S1"));
        // copy number is the final tiebreak
        assert!(plain("*1") < CanonicalAllele::new("*1".to_string(), 2));
    }

    #[test]
    fn test_copy_number_display() {
        assert_eq!(plain("*4").to_string(), "*4");
        assert_eq!(CanonicalAllele::new("*1".to_string(), 2).to_string(), "*1x2");
    }

    #[test]
    fn test_order_independent_key() {
        let d1 = NormalizedDiplotype::new(
            NormalizedAllele::exact(plain("*4"), "*4".to_string()),
            NormalizedAllele::exact(plain("*1"), "CYP2D6*1".to_string())
        );
        let d2 = NormalizedDiplotype::new(
            NormalizedAllele::exact(plain("*1"), "*1".to_string()),
            NormalizedAllele::exact(plain("*4"), "*4".to_string())
        );
        assert_eq!(d1.canonical_key(), d2.canonical_key());
        assert_eq!(d1.canonical_key().unwrap(), ("*1".to_string(), "*4".to_string()));
        assert_eq!(d1.to_string(), "*1/*4");
        assert_eq!(d1.resolution(), DiplotypeResolution::Resolved);
    }

    #[test]
    fn test_partial_resolution() {
        let partial = NormalizedDiplotype::new(
            NormalizedAllele::exact(plain("*1"), "*1".to_string()),
            NormalizedAllele::failed("*999".to_string())
        );
        assert_eq!(partial.resolution(), DiplotypeResolution::Partial);
        assert_eq!(partial.canonical_key(), None);
        assert_eq!(partial.unmapped_tokens(), vec!["*999".to_string()]);

        // the resolved half still shows up in the comparison key
        let key = partial.comparison_key();
        assert_eq!(key, ("*1".to_string(), "?(*999)".to_string()));
    }

    #[test]
    fn test_unresolved_and_structural() {
        let unresolved = NormalizedDiplotype::unparsed("garbage");
        assert_eq!(unresolved.resolution(), DiplotypeResolution::Unresolved);
        assert_eq!(unresolved.unmapped_tokens().len(), 2);

        // copy-number-only evidence is distinct from a plain failure
        let structural = NormalizedDiplotype::indeterminate_structural("2 copies, unknown type");
        assert_eq!(structural.resolution(), DiplotypeResolution::Partial);
        assert_ne!(structural.comparison_key(), unresolved.comparison_key());
    }
}
