//! # CLI module
//! Command line interface functionality that is specific to Starling.
/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The consensus CLI subcommand
pub mod consensus;
