//! Fixture helpers shared by the integration tests.
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Result};

/// Directory holding the fixture projects.
pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("fixtures")
}

/// Path to a file inside a fixture project.
pub fn fixture<P: AsRef<Path>>(project: &str, file: P) -> PathBuf {
    fixtures().join(project).join(file)
}

/// Canonical path to a file inside a fixture project.
pub fn canonical_fixture<P: AsRef<Path>>(
    project: &str,
    file: P,
) -> Result<PathBuf> {
    Ok(fixture(project, file).canonicalize()?)
}

/// Read a file normalizing line endings.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut content = std::fs::read_to_string(path)?;
    if cfg!(target_os = "windows") {
        content = content.replace("\r\n", "\n");
    }
    Ok(content)
}

/// Determine if a `node` executable is available.
pub fn has_node() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Execute a script with `node` and capture standard output.
pub fn run_node<P: AsRef<Path>>(script: P) -> Result<String> {
    let out = Command::new("node").arg(script.as_ref()).output()?;
    if !out.status.success() {
        bail!(
            "node exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr)
        );
    }
    Ok(String::from_utf8(out.stdout)?)
}
