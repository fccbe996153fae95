//! Resolve import specifiers to files on disc.
use anyhow::{bail, Result};

use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;

/// Resolves specifiers as literal paths relative to the importing file.
///
/// No extensions are inferred and package directories are not
/// searched; the specifier must name an existing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelativeResolver;

impl Resolve for RelativeResolver {
    fn resolve(&self, base: &FileName, module_specifier: &str) -> Result<FileName> {
        let base = match base {
            FileName::Real(path) => path,
            _ => bail!("cannot resolve '{}' from {}", module_specifier, base),
        };
        let dir = match base.parent() {
            Some(dir) => dir,
            None => bail!("{} has no parent directory", base.display()),
        };
        let candidate = dir.join(module_specifier);
        if !candidate.is_file() {
            bail!("no file at {}", candidate.display());
        }
        Ok(FileName::Real(candidate.canonicalize()?))
    }
}
