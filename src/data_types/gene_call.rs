
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Errors from structural validation of an incoming gene call record
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("required field \"{field}\" is missing")]
    MissingField { field: &'static str },
    #[error("required field \"{field}\" must be a non-empty string")]
    MalformedField { field: &'static str },
    #[error("\"raw_tool_output\" must be a JSON object")]
    RawOutputNotAnObject,
    #[error("\"input_file\" must be a string when present")]
    MalformedInputFile
}

/// An individual variant (SNP/indel) reported by a genotyping tool in support of a call.
/// All fields are optional; parsers populate whatever the raw tool output provides.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct VariantReported {
    /// dbSNP identifier, e.g. "rs1135840"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsid: Option<String>,
    /// Genomic coordinate, e.g. "chr22:42522612"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Reference allele
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_allele: Option<String>,
    /// Alternate allele
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_allele: Option<String>,
    /// Genotype at this locus, e.g. "A/G"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genotype: Option<String>,
    /// Zygosity of the variant, e.g. "heterozygous"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zygosity: Option<String>,
    /// Numeric quality or coverage score; malformed values get demoted to `extra`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Which raw allele/haplotype this variant defines, e.g. "haplotype1" or "*4"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_assignment: Option<String>,
    /// Tool-specific flags or raw functional annotations, e.g. "NORMAL|FUNC:S486T"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_specific_flags: Option<String>,
    /// Any keys we do not model, preserved verbatim in input order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>
}

/// A structural variant (gene deletion, duplication, hybrid) as reported by a tool
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct StructuralVariantRaw {
    /// The kind of event, e.g. "deletion" or "duplication"; spelled "type" on the wire
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub sv_type: Option<String>,
    /// Descriptive string from the tool, e.g. "CYP2D6 gene deletion"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Genomic coordinates if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Internal ID or nomenclature the tool uses for this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_specific_id: Option<String>,
    /// Any keys we do not model, preserved verbatim in input order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>
}

/// The raw, tool-specific payload of one gene call.
/// Typed fields cover the shared vocabulary; everything else a tool reports lands in
/// `extra` and is carried through to the output provenance untouched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawToolOutput {
    /// The primary diplotype call string as reported by the tool, e.g. "CYP2D6*1/*4"
    pub diplotype_string: String,
    /// Raw string for the first inferred haplotype
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haplotype1_raw: Option<String>,
    /// Raw string for the second inferred haplotype
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haplotype2_raw: Option<String>,
    /// Gene/segmental copy number reported by the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_number_raw: Option<f64>,
    /// Tool's direct functional prediction, e.g. "Normal Function"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functional_status_raw: Option<String>,
    /// Tool's direct phenotype prediction, e.g. "Normal Metabolizer"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phenotype_prediction_raw: Option<String>,
    /// Overall confidence score for the call from the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score_raw: Option<f64>,
    /// General comments or supplementary text, e.g. an ALDY "#Solution" description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_raw: Option<String>,
    /// Structural variants reported by the tool, in report order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_variants_raw: Vec<StructuralVariantRaw>,
    /// Individual variant calls contributing to the diplotype, in report order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants_reported: Vec<VariantReported>,
    /// Every key we do not model, preserved verbatim in input order.
    /// Malformed optional fields are demoted into here rather than rejected.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>
}

impl RawToolOutput {
    /// Minimal constructor for a payload that only carries a diplotype string
    pub fn from_diplotype(diplotype_string: String) -> Self {
        Self {
            diplotype_string,
            haplotype1_raw: None,
            haplotype2_raw: None,
            copy_number_raw: None,
            functional_status_raw: None,
            phenotype_prediction_raw: None,
            confidence_score_raw: None,
            comments_raw: None,
            structural_variants_raw: vec![],
            variants_reported: vec![],
            extra: Default::default()
        }
    }
}

/// One standardized gene call: a single tool's diplotype call for a single sample-gene pair.
/// These are the immutable inputs to the consensus engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneCall {
    /// Unique identifier for the sample, e.g. "NA10860"
    sample_id: String,
    /// The pharmacogene symbol, e.g. "CYP2D6"
    gene: String,
    /// Name of the genotyping tool that generated this call, e.g. "aldy"
    tool_name: String,
    /// The reference assembly the tool called against, e.g. "GRCh38"
    reference_genome: String,
    /// Base name or path of the original input file, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    input_file: Option<String>,
    /// The raw tool-specific payload
    raw_tool_output: RawToolOutput
}

impl GeneCall {
    /// General constructor with the required-field checks.
    /// # Arguments
    /// * `sample_id` - unique sample identifier
    /// * `gene` - pharmacogene symbol
    /// * `tool_name` - genotyping tool that produced the call
    /// * `reference_genome` - reference assembly for the call
    /// * `input_file` - optional source file for traceability
    /// * `raw_tool_output` - raw payload, which must carry a diplotype string
    /// # Errors
    /// * if any required identifier is an empty string
    /// * if the payload diplotype string is empty
    pub fn new(
        sample_id: String, gene: String, tool_name: String, reference_genome: String,
        input_file: Option<String>, raw_tool_output: RawToolOutput
    ) -> Result<Self, ValidationError> {
        if sample_id.is_empty() {
            return Err(ValidationError::MalformedField { field: "sample_id" });
        }
        if gene.is_empty() {
            return Err(ValidationError::MalformedField { field: "gene" });
        }
        if tool_name.is_empty() {
            return Err(ValidationError::MalformedField { field: "tool_name" });
        }
        if reference_genome.is_empty() {
            return Err(ValidationError::MalformedField { field: "reference_genome" });
        }
        if raw_tool_output.diplotype_string.is_empty() {
            return Err(ValidationError::MalformedField { field: "diplotype_string" });
        }

        Ok(Self {
            sample_id, gene, tool_name, reference_genome,
            input_file, raw_tool_output
        })
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn reference_genome(&self) -> &str {
        &self.reference_genome
    }

    pub fn input_file(&self) -> Option<&str> {
        self.input_file.as_deref()
    }

    pub fn raw_tool_output(&self) -> &RawToolOutput {
        &self.raw_tool_output
    }

    /// Shorthand for the diplotype string, which drives most of the pipeline
    pub fn diplotype_string(&self) -> &str {
        &self.raw_tool_output.diplotype_string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let payload = RawToolOutput::from_diplotype("*1/*4".to_string());
        let call = GeneCall::new(
            "NA10860".to_string(), "CYP2D6".to_string(), "aldy".to_string(),
            "GRCh38".to_string(), None, payload.clone()
        ).unwrap();
        assert_eq!(call.sample_id(), "NA10860");
        assert_eq!(call.diplotype_string(), "*1/*4");

        // empty identifiers are rejected
        let result = GeneCall::new(
            String::new(), "CYP2D6".to_string(), "aldy".to_string(),
            "GRCh38".to_string(), None, payload.clone()
        );
        assert!(matches!(result, Err(ValidationError::MalformedField { field: "sample_id" })));

        // and so is an empty diplotype string
        let result = GeneCall::new(
            "NA10860".to_string(), "CYP2D6".to_string(), "aldy".to_string(),
            "GRCh38".to_string(), None, RawToolOutput::from_diplotype(String::new())
        );
        assert!(matches!(result, Err(ValidationError::MalformedField { field: "diplotype_string" })));
    }

    #[test]
    fn test_extra_field_round_trip() {
        // unknown keys must survive serialization verbatim and in order
        let mut payload = RawToolOutput::from_diplotype("*1/*4".to_string());
        payload.extra.insert("aldy_solution_id".to_string(), serde_json::json!("1"));
        payload.extra.insert("aldy_alleles_parsed".to_string(), serde_json::json!([
            { "raw_allele_name": "*1", "allele_copy_id": 0 }
        ]));

        let serialized = serde_json::to_value(&payload).unwrap();
        assert_eq!(serialized["diplotype_string"], "*1/*4");
        assert_eq!(serialized["aldy_solution_id"], "1");
        assert_eq!(serialized["aldy_alleles_parsed"][0]["raw_allele_name"], "*1");

        // fields that were absent must stay absent
        assert!(serialized.get("copy_number_raw").is_none());
        assert!(serialized.get("variants_reported").is_none());
    }

    #[test]
    fn test_variant_reported_lenient_shape() {
        // entries deserialize with any subset of known fields; unknown keys land in extra
        let value = serde_json::json!({
            "rsid": "rs3892097",
            "genotype": "A/G",
            "stargazer_phase": "hap1"
        });
        let variant: VariantReported = serde_json::from_value(value).unwrap();
        assert_eq!(variant.rsid.as_deref(), Some("rs3892097"));
        assert_eq!(variant.genotype.as_deref(), Some("A/G"));
        assert_eq!(variant.extra.get("stargazer_phase").unwrap(), "hap1");
    }
}
