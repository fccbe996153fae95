use anyhow::{bail, Result};
use std::path::PathBuf;

use pumice::{
    bundle, BundleError, BundleOptions, Bundler, ChangeOutputPath, EmitContext, Hooks,
    Plugin,
};
use testing::fixture;

/// Moves the bundle to a fixed path.
struct MoveTo(PathBuf);

impl Plugin for MoveTo {
    fn name(&self) -> &str {
        "move-to"
    }

    fn apply(&self, hooks: &mut Hooks) {
        let target = self.0.clone();
        hooks.emit_file.tap(self.name(), move |ctx: &mut EmitContext| {
            ctx.change_output_path(target.clone());
            Ok(())
        });
    }
}

struct Failing;

impl Plugin for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(&self, hooks: &mut Hooks) {
        hooks
            .emit_file
            .tap(self.name(), |_: &mut EmitContext| bail!("refusing to emit"));
    }
}

#[test]
fn change_output_path_plugin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let default = dir.path().join("dist").join("bundle.js");
    let options = BundleOptions::new(fixture("basic", "main.js"))
        .output(&default)
        .plugin(ChangeOutputPath);

    let written = bundle(options)?;
    let expected = dir.path().join("dist").join("769601666.js");
    assert_eq!(expected, written);
    assert!(expected.is_file());
    assert!(!default.exists());
    Ok(())
}

#[test]
fn last_plugin_wins() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let first = dir.path().join("first.js");
    let second = dir.path().join("second.js");
    let options = BundleOptions::new(fixture("basic", "main.js"))
        .output(dir.path().join("bundle.js"))
        .plugin(MoveTo(first.clone()))
        .plugin(MoveTo(second.clone()));

    assert_eq!(second, bundle(options)?);
    assert!(second.is_file());
    assert!(!first.exists());
    assert!(!dir.path().join("bundle.js").exists());
    Ok(())
}

#[test]
fn plugins_see_previous_changes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let options = BundleOptions::new(fixture("basic", "main.js"))
        .plugin(MoveTo(dir.path().join("app.js")))
        .plugin(ChangeOutputPath);

    let written = bundle(options)?;
    assert_eq!(
        dir.path().join(format!("{}.js", pumice::plugins::hash_code("app"))),
        written
    );
    Ok(())
}

#[test]
fn tap_without_plugin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("tapped.js");
    let mut bundler = Bundler::new(BundleOptions::new(fixture("basic", "main.js")));
    let moved = target.clone();
    bundler
        .hooks_mut()
        .emit_file
        .tap("inline", move |ctx: &mut EmitContext| {
            ctx.change_output_path(moved.clone());
            Ok(())
        });
    assert_eq!(target, bundler.build()?);
    Ok(())
}

#[test]
fn failing_plugin_aborts_write() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("bundle.js");
    let options = BundleOptions::new(fixture("basic", "main.js"))
        .output(&output)
        .plugin(Failing);

    let err = bundle(options).unwrap_err();
    assert!(err.to_string().contains("failing"));
    assert!(err.downcast_ref::<BundleError>().is_none());
    assert!(!output.exists());
    Ok(())
}
