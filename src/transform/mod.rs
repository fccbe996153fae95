//! Code transformations applied after parsing.
pub mod commonjs;

pub use commonjs::lower;
