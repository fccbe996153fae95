use anyhow::Result;
use std::path::Path;

use pumice::{bundle, Asset, AssetBuilder, BundleOptions};
use testing::{fixture, has_node, run_node};

fn build_source(source: &str) -> Result<Asset> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("input.js");
    std::fs::write(&path, source)?;
    AssetBuilder::default().build(&path, 0)
}

fn position(code: &str, needle: &str) -> usize {
    match code.find(needle) {
        Some(index) => index,
        None => panic!("expected {:?} in:\n{}", needle, code),
    }
}

#[test]
fn plain_script_is_unchanged() -> Result<()> {
    let asset = build_source("var a = 1;\nconsole.log(a);\n")?;
    assert!(!asset.code.contains("__esModule"));
    assert!(!asset.code.contains("use strict"));
    assert!(asset.dependency_specifiers.is_empty());
    Ok(())
}

#[test]
fn require_calls_are_not_dependencies() -> Result<()> {
    let asset = build_source(
        "import a from \"./a.js\";\nrequire(\"./b.js\");\nconsole.log(a);\n",
    )?;
    assert_eq!(vec!["./a.js"], asset.dependency_specifiers);
    Ok(())
}

#[test]
fn exports_defined_before_requires() -> Result<()> {
    let asset = build_source(
        "import { dep } from \"./dep.js\";\nexport const value = dep;\n",
    )?;
    let code = &asset.code;
    let strict = position(code, "\"use strict\"");
    let es_module = position(code, "\"__esModule\"");
    let getter = position(code, "\"value\"");
    let require = position(code, "require(\"./dep.js\")");
    assert!(strict < es_module);
    assert!(es_module < getter);
    assert!(getter < require);
    assert!(!code.contains("import "));
    assert!(!code.contains("export "));
    Ok(())
}

#[test]
fn imported_bindings_read_through_module() -> Result<()> {
    let asset = build_source(
        "import { dep } from \"./dep.js\";\nconsole.log(dep);\ndep();\n",
    )?;
    let code = &asset.code;
    position(code, "__pumice_import_0[\"dep\"]");
    assert!(!code.contains("__pumice_interop_default"));
    assert!(!code.contains("__pumice_export_star"));
    Ok(())
}

#[test]
fn helpers_only_when_needed() -> Result<()> {
    let asset = build_source(
        "import def from \"./a.js\";\nexport * from \"./b.js\";\nconsole.log(def);\n",
    )?;
    let code = &asset.code;
    position(code, "function __pumice_interop_default(");
    position(code, "function __pumice_export_star(");
    assert_eq!(vec!["./a.js", "./b.js"], asset.dependency_specifiers);
    Ok(())
}

#[test]
fn namespace_and_mixed_imports_use_wildcard() -> Result<()> {
    let asset = build_source(
        "import * as ns from \"./a.js\";\nimport lib, { x } from \"./b.js\";\nimport only from \"./c.js\";\nconsole.log(ns, lib, x, only);\n",
    )?;
    let code = &asset.code;
    position(code, "function __pumice_interop_wildcard(");
    position(code, "__pumice_interop_wildcard(require(\"./a.js\"))");
    position(code, "__pumice_interop_wildcard(require(\"./b.js\"))");
    position(code, "__pumice_interop_default(require(\"./c.js\"))");
    Ok(())
}

#[test]
fn named_imports_skip_interop() -> Result<()> {
    let asset = build_source("import { x } from \"./a.js\";\nconsole.log(x);\n")?;
    assert!(!asset.code.contains("__pumice_interop"));
    Ok(())
}

#[test]
fn default_exports() -> Result<()> {
    let asset = build_source("export default 40 + 2;\n")?;
    position(&asset.code, "var __pumice_default = 40 + 2");

    let asset = build_source("export default function named() {}\n")?;
    position(&asset.code, "function named()");
    position(&asset.code, "\"default\"");
    Ok(())
}

#[test]
fn parse_errors_carry_position() -> Result<()> {
    let err = build_source("import a from \"./a.js\";\n\nlet = ;\n").unwrap_err();
    match err.downcast_ref::<pumice::BundleError>() {
        Some(pumice::BundleError::Parse {
            path, line, column, ..
        }) => {
            assert_eq!(Some("input.js"), path.file_name().and_then(|n| n.to_str()));
            assert_eq!(3, *line);
            assert!(*column >= 1);
        }
        _ => panic!("expected parse error, got {:?}", err),
    }
    Ok(())
}

#[test]
fn run_live_bindings() -> Result<()> {
    if !has_node() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let options = BundleOptions::new(fixture("live", "main.js"))
        .output(dir.path().join("bundle.js"));
    let written = bundle(options)?;
    assert_eq!(
        "0\n1\ncommonjs ran\n42 1\nshape 2 9\n",
        run_node(Path::new(&written))?
    );
    Ok(())
}
