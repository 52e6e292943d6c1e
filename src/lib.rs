#![forbid(clippy::mod_module_files)]

pub mod error;
pub mod pairwise_aligner;
pub mod path_generator;
pub mod scoring;
mod trace_matrix;
