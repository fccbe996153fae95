//! Static analysis of parsed modules.
pub mod imports;

pub use imports::ImportAnalysis;
