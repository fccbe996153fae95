//! Bundle an entry point and its static imports into one file.
//!
//! ```no_run
//! use pumice::{bundle, BundleOptions, Rule, JsonLoader};
//! # fn main() -> anyhow::Result<()> {
//! let options = BundleOptions::new("./src/main.js")
//!     .rule(Rule::new(r"\.json$")?.with(JsonLoader));
//! let written = bundle(options)?;
//! println!("{}", written.display());
//! # Ok(())
//! # }
//! ```
use std::path::PathBuf;

use anyhow::Result;

pub mod analysis;
pub mod asset;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod loader;
pub mod plugins;
pub mod resolver;
mod swc_utils;
pub mod transform;

pub use asset::{Asset, AssetBuilder};
pub use bundler::{render, BundleOptions, Bundler, ModuleRecord};
pub use config::ConfigFile;
pub use error::BundleError;
pub use graph::ModuleGraph;
pub use hooks::{EmitContext, Hooks, Plugin, SyncHook};
pub use loader::{JsonLoader, Loader, LoaderContext, Pipeline, RawLoader, Rule};
pub use plugins::ChangeOutputPath;
pub use resolver::RelativeResolver;

/// Build and write a bundle, returning the path written to.
pub fn bundle(options: BundleOptions) -> Result<PathBuf> {
    Bundler::new(options).build()
}
