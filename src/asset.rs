//! Build an asset from a single source file.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;

use swc_common::{Globals, Mark, SourceMap, GLOBALS};
use swc_ecma_transforms_base::resolver::resolver_with_mark;
use swc_ecma_visit::FoldWith;

use crate::{
    analysis::ImportAnalysis,
    error::BundleError,
    loader::Pipeline,
    swc_utils::{parse_module, print_script},
    transform::lower,
};

/// A processed source file and its dependency metadata.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Module identifier, the entry is always zero.
    pub id: usize,
    /// Canonical path of the source file.
    pub path: PathBuf,
    /// Factory body ready to embed in the bundle.
    pub code: String,
    /// Import specifiers in declaration order.
    pub dependency_specifiers: Vec<String>,
    /// Map from each import specifier to the resolved module identifier.
    pub specifier_to_id: IndexMap<String, usize>,
}

/// Reads, transforms and analyzes single files.
///
/// The builder has no knowledge of the module graph; identifiers
/// are handed to it by the caller.
#[derive(Debug, Default, Clone)]
pub struct AssetBuilder {
    pipeline: Pipeline,
}

impl AssetBuilder {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Build the asset for a canonical file path.
    pub fn build(&self, path: &Path, id: usize) -> Result<Asset> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            BundleError::FileRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let source = self.pipeline.apply(path, source)?;

        let sm: Arc<SourceMap> = Arc::new(Default::default());
        let (dependency_specifiers, script) =
            GLOBALS.set(&Globals::new(), || -> Result<_> {
                let module = parse_module(&sm, path, source)?;
                let dependency_specifiers = ImportAnalysis::analyze(&module);

                let top_level_mark = Mark::fresh(Mark::root());
                let module =
                    module.fold_with(&mut resolver_with_mark(top_level_mark));
                let script =
                    lower(&sm, module).map_err(|e| BundleError::Transform {
                        loader: "commonjs".to_string(),
                        path: path.to_path_buf(),
                        source: e.into(),
                    })?;
                Ok((dependency_specifiers, script))
            })?;
        let code = print_script(&sm, &script)?;

        log::debug!(
            "Built module {} {} ({} dependencies)",
            id,
            path.display(),
            dependency_specifiers.len()
        );

        Ok(Asset {
            id,
            path: path.to_path_buf(),
            code,
            dependency_specifiers,
            specifier_to_id: Default::default(),
        })
    }
}
