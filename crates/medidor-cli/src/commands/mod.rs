//! CLI command implementations.

pub mod effects;
pub mod generate;
pub mod measure;
