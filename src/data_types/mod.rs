
/// Contains the final consensus output unit and its provenance entries
pub mod consensus_call;
/// Contains the standardized gene call records that serve as immutable inputs
pub mod gene_call;
/// Contains the versioned nomenclature table for allele spelling lookups
pub mod nomenclature;
/// Contains normalized allele/diplotype representations and mapping states
pub mod normalized_diplotype;
/// Contains the versioned allele-function and phenotype rule table
pub mod phenotype_table;
/// Wrapper bundling all reference tables for injection into the solvers
pub mod reference_db;
/// Contains sample-gene groups which serve as the sub-unit for solving
pub mod sample_group;
/// Contains the versioned per-gene tool reliability ranking
pub mod tool_priority;
