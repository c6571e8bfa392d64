
use std::collections::BTreeMap;

use crate::data_types::gene_call::GeneCall;
use crate::data_types::sample_group::SampleGeneGroup;

/// Partitions validated calls into sample-gene groups, the independent
/// sub-problems of a run. Group order and group ids depend only on the set of
/// (sample, gene) keys present, never on input record order, so permuting the
/// input yields an identical set of groups.
/// # Arguments
/// * `calls` - every validated call in the batch
/// # Errors
/// * if group construction fails internal consistency checks
pub fn generate_sample_gene_groups(calls: Vec<GeneCall>) -> anyhow::Result<Vec<SampleGeneGroup>> {
    let mut keyed: BTreeMap<(String, String), Vec<GeneCall>> = Default::default();
    for call in calls {
        let key = (call.sample_id().to_string(), call.gene().to_string());
        keyed.entry(key).or_default().push(call);
    }

    keyed.into_values()
        .enumerate()
        .map(|(group_id, group_calls)| SampleGeneGroup::new(group_id as u64, group_calls))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::gene_call::RawToolOutput;

    fn build_call(sample: &str, gene: &str, tool: &str) -> GeneCall {
        GeneCall::new(
            sample.to_string(), gene.to_string(), tool.to_string(),
            "GRCh38".to_string(), None, RawToolOutput::from_diplotype("*1/*4".to_string())
        ).unwrap()
    }

    #[test]
    fn test_grouping() {
        let calls = vec![
            build_call("s2", "CYP2C19", "aldy"),
            build_call("s1", "CYP2D6", "aldy"),
            build_call("s1", "CYP2D6", "stargazer"),
            build_call("s1", "TPMT", "pharmcat")
        ];
        let groups = generate_sample_gene_groups(calls).unwrap();

        // groups come out keyed and ordered by (sample, gene)
        assert_eq!(groups.len(), 3);
        assert_eq!((groups[0].sample_id(), groups[0].gene()), ("s1", "CYP2D6"));
        assert_eq!((groups[1].sample_id(), groups[1].gene()), ("s1", "TPMT"));
        assert_eq!((groups[2].sample_id(), groups[2].gene()), ("s2", "CYP2C19"));
        assert_eq!(groups[0].calls().len(), 2);
        assert_eq!(groups[0].group_id(), 0);
        assert_eq!(groups[2].group_id(), 2);
    }

    #[test]
    fn test_order_independence() {
        let forward = generate_sample_gene_groups(vec![
            build_call("s1", "CYP2D6", "aldy"),
            build_call("s1", "CYP2D6", "stargazer"),
            build_call("s2", "CYP2D6", "aldy")
        ]).unwrap();
        let shuffled = generate_sample_gene_groups(vec![
            build_call("s2", "CYP2D6", "aldy"),
            build_call("s1", "CYP2D6", "stargazer"),
            build_call("s1", "CYP2D6", "aldy")
        ]).unwrap();

        assert_eq!(forward.len(), shuffled.len());
        for (f, s) in forward.iter().zip(shuffled.iter()) {
            assert_eq!(f.group_id(), s.group_id());
            assert_eq!(f.sample_id(), s.sample_id());
            assert_eq!(f.gene(), s.gene());
            assert_eq!(f.calls(), s.calls());
        }
    }
}
