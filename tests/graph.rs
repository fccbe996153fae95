use anyhow::Result;
use std::path::{Path, PathBuf};

use pumice::{AssetBuilder, BundleError, ModuleGraph};
use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;
use testing::{canonical_fixture, fixture};

fn resolve(project: &str, parallel: bool) -> Result<Vec<pumice::Asset>> {
    let builder = AssetBuilder::default();
    ModuleGraph::new(&builder)
        .parallel(parallel)
        .resolve(fixture(project, "main.js"))
}

fn ids(assets: &[pumice::Asset]) -> Vec<(usize, PathBuf)> {
    assets.iter().map(|a| (a.id, a.path.clone())).collect()
}

#[test]
fn graph_basic() -> Result<()> {
    let assets = resolve("basic", false)?;
    assert_eq!(2, assets.len());

    assert_eq!(0, assets[0].id);
    assert_eq!(canonical_fixture("basic", "main.js")?, assets[0].path);
    assert_eq!(vec!["./foo.js"], assets[0].dependency_specifiers);
    assert_eq!(Some(&1), assets[0].specifier_to_id.get("./foo.js"));

    assert_eq!(1, assets[1].id);
    assert_eq!(canonical_fixture("basic", "foo.js")?, assets[1].path);
    assert!(assets[1].specifier_to_id.is_empty());
    Ok(())
}

#[test]
fn graph_breadth_first_ids() -> Result<()> {
    let assets = resolve("diamond", false)?;
    let expected = vec![
        (0, canonical_fixture("diamond", "main.js")?),
        (1, canonical_fixture("diamond", "lib/left.js")?),
        (2, canonical_fixture("diamond", "right.js")?),
        (3, canonical_fixture("diamond", "shared.js")?),
    ];
    assert_eq!(expected, ids(&assets));

    // Both importers reach the shared module through different specifiers
    assert_eq!(Some(&3), assets[1].specifier_to_id.get("../shared.js"));
    assert_eq!(Some(&3), assets[2].specifier_to_id.get("./shared.js"));
    Ok(())
}

#[test]
fn graph_duplicate_paths() -> Result<()> {
    let assets = resolve("dupe", false)?;
    assert_eq!(3, assets.len());

    let main = &assets[0];
    assert_eq!(
        vec!["./counter.js", "./../dupe/counter.js", "./other.js"],
        main.dependency_specifiers
    );
    assert_eq!(Some(&1), main.specifier_to_id.get("./counter.js"));
    assert_eq!(Some(&1), main.specifier_to_id.get("./../dupe/counter.js"));
    assert_eq!(Some(&2), main.specifier_to_id.get("./other.js"));
    assert_eq!(Some(&1), assets[2].specifier_to_id.get("./counter.js"));
    Ok(())
}

#[test]
fn graph_cycle() -> Result<()> {
    let assets = resolve("cycle", false)?;
    assert_eq!(2, assets.len());
    assert_eq!(Some(&1), assets[0].specifier_to_id.get("./a.js"));
    assert_eq!(Some(&0), assets[1].specifier_to_id.get("./main.js"));
    Ok(())
}

#[test]
fn graph_reexports_are_dependencies() -> Result<()> {
    let assets = resolve("reexport", false)?;
    assert_eq!(4, assets.len());
    let index = &assets[1];
    assert_eq!(canonical_fixture("reexport", "math/index.js")?, index.path);
    assert_eq!(
        vec!["./constants.js", "./add.js", "./add.js"],
        index.dependency_specifiers
    );
    assert_eq!(2, index.specifier_to_id.len());
    Ok(())
}

#[test]
fn graph_ids_are_a_bijection() -> Result<()> {
    for project in &["basic", "cycle", "dupe", "diamond", "reexport", "noimports"] {
        let assets = resolve(project, false)?;
        for (index, asset) in assets.iter().enumerate() {
            assert_eq!(index, asset.id);
            for id in asset.specifier_to_id.values() {
                assert!(*id < assets.len());
            }
            assert_eq!(
                !asset.dependency_specifiers.is_empty(),
                !asset.specifier_to_id.is_empty()
            );
        }
    }
    Ok(())
}

#[test]
fn graph_parallel_matches_sequential() -> Result<()> {
    for project in &["diamond", "dupe", "reexport"] {
        let sequential = resolve(project, false)?;
        let parallel = resolve(project, true)?;
        assert_eq!(ids(&sequential), ids(&parallel));
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.specifier_to_id, b.specifier_to_id);
            assert_eq!(a.code, b.code);
        }
    }
    Ok(())
}

#[test]
fn graph_missing_module() -> Result<()> {
    let err = resolve("missing", false).unwrap_err();
    match err.downcast_ref::<BundleError>() {
        Some(BundleError::ModuleNotFound {
            specifier,
            importer,
        }) => {
            assert_eq!("./missing", specifier);
            assert_eq!(&canonical_fixture("missing", "main.js")?, importer);
        }
        _ => panic!("expected module not found, got {:?}", err),
    }
    Ok(())
}

#[test]
fn graph_missing_entry() {
    let builder = AssetBuilder::default();
    let err = ModuleGraph::new(&builder)
        .resolve(fixture("basic", "nope.js"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::FileRead { .. })
    ));
}

#[test]
fn graph_parse_error() {
    let builder = AssetBuilder::default();
    let err = ModuleGraph::new(&builder)
        .resolve(fixture("broken", "main.js"))
        .unwrap_err();
    match err.downcast_ref::<BundleError>() {
        Some(BundleError::Parse { line, .. }) => assert_eq!(2, *line),
        _ => panic!("expected parse error, got {:?}", err),
    }
}

/// Maps `~/` specifiers to the fixture root.
#[derive(Debug)]
struct AliasResolver;

impl Resolve for AliasResolver {
    fn resolve(&self, base: &FileName, module_specifier: &str) -> Result<FileName> {
        if let Some(rest) = module_specifier.strip_prefix("~/") {
            return Ok(FileName::Real(testing::fixtures().join(rest)));
        }
        pumice::RelativeResolver.resolve(base, module_specifier)
    }
}

#[test]
fn graph_custom_resolver() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let entry = dir.path().join("main.js");
    std::fs::write(&entry, "import { greet } from \"~/basic/foo.js\";\ngreet();\n")?;

    let builder = AssetBuilder::default();
    let assets = ModuleGraph::new(&builder)
        .with_resolver(Box::new(AliasResolver))
        .resolve(&entry)?;
    assert_eq!(2, assets.len());
    assert_eq!(canonical_fixture("basic", "foo.js")?, assets[1].path);
    assert_eq!(Some(&1), assets[0].specifier_to_id.get("~/basic/foo.js"));
    assert!(Path::new(&assets[0].path).is_absolute());
    Ok(())
}
