//! # Parsing module
//! Contains the logic for turning raw input records into validated calls and
//! sample-gene groups that serve as sub-problems.
/// Loads the input call sequence and partitions valid from excluded records
pub mod call_loader;
/// Handles creation of sample-gene groups that serve as sub-problems
pub mod group_generation;
/// Structural validation of individual raw records
pub mod record_validator;
