
use serde_json::{Map, Value};

use crate::data_types::gene_call::{GeneCall, RawToolOutput, StructuralVariantRaw, ValidationError, VariantReported};

/// Pulls a required non-empty string field out of a record object.
/// # Arguments
/// * `record` - the record object
/// * `field` - the field name, used in the error when absent/malformed
fn required_string(record: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match record.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(ValidationError::MalformedField { field }),
        None => Err(ValidationError::MissingField { field })
    }
}

/// Removes an optional string field from the payload object.
/// A present-but-malformed value is left in place so it lands in the opaque
/// side-map instead of invalidating the record.
fn take_optional_string(payload: &mut Map<String, Value>, field: &str) -> Option<String> {
    if !matches!(payload.get(field), Some(Value::String(_)) | Some(Value::Null)) {
        return None;
    }
    match payload.shift_remove(field) {
        Some(Value::String(s)) => Some(s),
        _ => None
    }
}

/// Removes an optional numeric field from the payload object.
/// A present-but-non-numeric value is left in place so it lands in the opaque
/// side-map as an opaque/unknown value.
fn take_optional_number(payload: &mut Map<String, Value>, field: &str) -> Option<f64> {
    if !matches!(payload.get(field), Some(v) if v.is_number() || v.is_null()) {
        return None;
    }
    payload.shift_remove(field).as_ref().and_then(Value::as_f64)
}

/// Parses one variant entry, demoting a non-numeric quality score into the
/// entry's own side-map instead of rejecting the entry.
/// Returns None when the entry cannot be represented at all (not an object).
fn parse_variant_entry(entry: &Value) -> Option<VariantReported> {
    let mut object = entry.as_object()?.clone();
    let demoted_quality = match object.get("quality_score") {
        Some(v) if !v.is_number() && !v.is_null() => object.shift_remove("quality_score"),
        _ => None
    };

    let mut variant: VariantReported = serde_json::from_value(Value::Object(object)).ok()?;
    if let Some(raw_quality) = demoted_quality {
        variant.extra.insert("quality_score".to_string(), raw_quality);
    }
    Some(variant)
}

/// Removes an array field and parses its entries with the provided function.
/// If the field is not an array, or any entry fails to parse, the original
/// value is left in place verbatim and an empty list is returned.
fn take_entry_array<T>(
    payload: &mut Map<String, Value>, field: &str,
    parse_entry: impl Fn(&Value) -> Option<T>
) -> Vec<T> {
    let entries = match payload.get(field) {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) => {
            payload.shift_remove(field);
            return vec![];
        },
        _ => return vec![]
    };

    let parsed: Option<Vec<T>> = entries.iter()
        .map(&parse_entry)
        .collect();
    match parsed {
        Some(typed) => {
            payload.shift_remove(field);
            typed
        },
        // an unrepresentable entry demotes the whole array rather than dropping data
        None => vec![]
    }
}

/// Validates one raw input record against the gene call contract.
/// Required fields (sample_id, gene, tool_name, reference_genome, and the
/// payload diplotype_string) produce a ValidationError when missing or
/// malformed; everything else is best-effort, with malformed optional fields
/// demoted into the payload's opaque side-map and unknown keys preserved
/// verbatim in input order.
/// # Arguments
/// * `record` - one element of the input call sequence
/// # Errors
/// * if the record or its raw_tool_output is not a JSON object
/// * if any required field is missing or malformed
pub fn validate_gene_call(record: &Value) -> Result<GeneCall, ValidationError> {
    let record = record.as_object().ok_or(ValidationError::NotAnObject)?;

    let sample_id = required_string(record, "sample_id")?;
    let gene = required_string(record, "gene")?;
    let tool_name = required_string(record, "tool_name")?;
    let reference_genome = required_string(record, "reference_genome")?;

    let input_file = match record.get("input_file") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => return Err(ValidationError::MalformedInputFile)
    };

    let mut payload = match record.get("raw_tool_output") {
        Some(Value::Object(payload)) => payload.clone(),
        Some(_) => return Err(ValidationError::RawOutputNotAnObject),
        None => return Err(ValidationError::MissingField { field: "raw_tool_output" })
    };

    let diplotype_string = match payload.shift_remove("diplotype_string") {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(_) => return Err(ValidationError::MalformedField { field: "diplotype_string" }),
        None => return Err(ValidationError::MissingField { field: "diplotype_string" })
    };

    let haplotype1_raw = take_optional_string(&mut payload, "haplotype1_raw");
    let haplotype2_raw = take_optional_string(&mut payload, "haplotype2_raw");
    let functional_status_raw = take_optional_string(&mut payload, "functional_status_raw");
    let phenotype_prediction_raw = take_optional_string(&mut payload, "phenotype_prediction_raw");
    let comments_raw = take_optional_string(&mut payload, "comments_raw");
    let copy_number_raw = take_optional_number(&mut payload, "copy_number_raw");
    let confidence_score_raw = take_optional_number(&mut payload, "confidence_score_raw");

    let structural_variants_raw = take_entry_array(&mut payload, "structural_variants_raw", |entry| {
        serde_json::from_value::<StructuralVariantRaw>(entry.clone()).ok()
    });
    let variants_reported = take_entry_array(&mut payload, "variants_reported", parse_variant_entry);

    // everything left over is tool-specific and opaque; keep it in input order
    let extra = payload.into_iter().collect();

    let raw_tool_output = RawToolOutput {
        diplotype_string,
        haplotype1_raw,
        haplotype2_raw,
        copy_number_raw,
        functional_status_raw,
        phenotype_prediction_raw,
        confidence_score_raw,
        comments_raw,
        structural_variants_raw,
        variants_reported,
        extra
    };

    GeneCall::new(sample_id, gene, tool_name, reference_genome, input_file, raw_tool_output)
}
