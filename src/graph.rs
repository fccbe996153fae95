//! Resolve the module graph for an entry point.
//!
//! The queue is a growable list walked with an index cursor; assets
//! discovered while visiting one frontier are appended and visited by
//! the next. Paths are deduplicated and identifiers assigned on the
//! calling thread so a parallel build numbers modules exactly as a
//! sequential build would.
use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use rayon::prelude::*;

use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;

use crate::{
    asset::{Asset, AssetBuilder},
    error::BundleError,
    resolver::RelativeResolver,
};

/// Builds the ordered list of assets reachable from an entry point.
pub struct ModuleGraph<'a> {
    builder: &'a AssetBuilder,
    resolver: Box<dyn Resolve>,
    parallel: bool,
    /// Canonical path to module identifier in discovery order.
    ids: IndexMap<PathBuf, usize>,
}

impl<'a> ModuleGraph<'a> {
    /// Create a graph using the relative path resolver.
    pub fn new(builder: &'a AssetBuilder) -> Self {
        Self {
            builder,
            resolver: Box::new(RelativeResolver),
            parallel: false,
            ids: Default::default(),
        }
    }

    /// Use a different specifier resolver.
    pub fn with_resolver(mut self, resolver: Box<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build newly discovered modules on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Resolve every module reachable from `entry`.
    ///
    /// The returned list is ordered by identifier.
    pub fn resolve<P: AsRef<Path>>(mut self, entry: P) -> Result<Vec<Asset>> {
        let entry = entry.as_ref();
        let entry = entry.canonicalize().map_err(|source| BundleError::FileRead {
            path: entry.to_path_buf(),
            source,
        })?;

        let id = self.claim(entry.clone());
        let mut queue = vec![self.builder.build(&entry, id)?];
        let mut cursor = 0;

        while cursor < queue.len() {
            let frontier = queue.len();
            let mut pending = Vec::new();

            for asset in queue[cursor..frontier].iter_mut() {
                for specifier in asset.dependency_specifiers.iter() {
                    let path = self.locate(&asset.path, specifier)?;
                    let known = self.ids.get(&path).copied();
                    let id = match known {
                        Some(id) => id,
                        None => {
                            let id = self.claim(path.clone());
                            pending.push((id, path));
                            id
                        }
                    };
                    asset.specifier_to_id.insert(specifier.clone(), id);
                }
            }

            cursor = frontier;
            let mut built = self.build_all(pending)?;
            queue.append(&mut built);
        }

        log::info!("Resolved {} module(s) from {}", queue.len(), entry.display());

        Ok(queue)
    }

    /// Assign the next identifier to a path.
    fn claim(&mut self, path: PathBuf) -> usize {
        let id = self.ids.len();
        self.ids.insert(path, id);
        id
    }

    /// Resolve a specifier relative to the importing file.
    fn locate(&self, importer: &Path, specifier: &str) -> Result<PathBuf> {
        let base = FileName::Real(importer.to_path_buf());
        let not_found = || BundleError::ModuleNotFound {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
        };
        match self.resolver.resolve(&base, specifier) {
            Ok(FileName::Real(path)) => {
                path.canonicalize().map_err(|_| not_found().into())
            }
            Ok(file_name) => {
                log::debug!("Unsupported module {} for {}", file_name, specifier);
                Err(not_found().into())
            }
            Err(e) => {
                log::debug!("Failed to resolve {}: {}", specifier, e);
                Err(not_found().into())
            }
        }
    }

    /// Build the assets for newly claimed paths in identifier order.
    fn build_all(&self, pending: Vec<(usize, PathBuf)>) -> Result<Vec<Asset>> {
        let builder = self.builder;
        if self.parallel && pending.len() > 1 {
            pending
                .par_iter()
                .map(|(id, path)| builder.build(path, *id))
                .collect()
        } else {
            pending
                .iter()
                .map(|(id, path)| builder.build(path, *id))
                .collect()
        }
    }
}
