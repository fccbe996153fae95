//! Built in plugins.
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::hooks::{EmitContext, Hooks, Plugin};

/// Rename the bundle to a hash of its file stem.
///
/// `dist/bundle.js` becomes `dist/769601666.js`. The stem of the
/// configured output is hashed rather than a fixed name, so
/// `out/app.js` becomes `out/<hash of "app">.js`.
#[derive(Debug, Default)]
pub struct ChangeOutputPath;

impl Plugin for ChangeOutputPath {
    fn name(&self) -> &str {
        "change-output-path"
    }

    fn apply(&self, hooks: &mut Hooks) {
        hooks.emit_file.tap(self.name(), |ctx: &mut EmitContext| {
            let path = hashed_output_path(ctx.output_path());
            log::debug!("Changing output path to {}", path.display());
            ctx.change_output_path(path);
            Ok(())
        });
    }
}

/// Keeps the directory and replaces the file name with the stem hash.
fn hashed_output_path(path: &Path) -> std::path::PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.js", hash_code(&stem)))
}

/// String hash using a multiplier of 31, kept within 31 bits.
pub fn hash_code(value: &str) -> u64 {
    const MODULUS: u64 = 2_147_483_648;
    let mut hash: u64 = 0;
    for unit in value.encode_utf16() {
        hash = 31 * hash + unit as u64;
        if hash >= MODULUS {
            hash %= MODULUS;
        }
    }
    hash
}

/// Look up a built in plugin by name.
pub fn builtin_plugin(name: &str) -> Result<Arc<dyn Plugin>> {
    match name {
        "change-output-path" => Ok(Arc::new(ChangeOutputPath)),
        _ => Err(anyhow!("unknown plugin '{}'", name)),
    }
}
