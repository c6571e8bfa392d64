
/// Contains the logic for mapping raw diplotype strings onto the canonical nomenclature
pub mod allele_normalizer;
/// Command line interface functionality
pub mod cli;
/// Contains the core logic for resolving a sample-gene group into one consensus
pub mod consensus_solver;
/// Contains various shared data types
pub mod data_types;
/// Tooling for parsing and validating input records into meaningful structs / data
pub mod parsing;
/// Contains the logic for deriving phenotypes from resolved diplotypes
pub mod phenotype_mapper;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
