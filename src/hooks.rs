//! Synchronous hooks that plugins tap into.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

type Callback<C> = Box<dyn Fn(&mut C) -> Result<()> + Send + Sync>;

struct Tap<C> {
    name: String,
    callback: Callback<C>,
}

/// An ordered list of callbacks invoked with a shared mutable context.
pub struct SyncHook<C> {
    taps: Vec<Tap<C>>,
}

impl<C> Default for SyncHook<C> {
    fn default() -> Self {
        Self { taps: Vec::new() }
    }
}

impl<C> SyncHook<C> {
    /// Register a callback; callbacks run in registration order.
    pub fn tap<S, F>(&mut self, name: S, callback: F)
    where
        S: Into<String>,
        F: Fn(&mut C) -> Result<()> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    /// Invoke every callback with the same context.
    ///
    /// Dispatch stops at the first callback that fails.
    pub fn call(&self, context: &mut C) -> Result<()> {
        for tap in self.taps.iter() {
            log::debug!("Calling hook {}", tap.name);
            (tap.callback)(context)
                .with_context(|| format!("hook '{}' failed", tap.name))?;
        }
        Ok(())
    }

    /// Names of the registered callbacks.
    pub fn names(&self) -> Vec<&str> {
        self.taps.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

/// Context for the `emit_file` hook.
#[derive(Debug)]
pub struct EmitContext {
    output_path: PathBuf,
}

impl EmitContext {
    pub fn new<P: Into<PathBuf>>(output_path: P) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Current destination for the bundle.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write the bundle to a different file.
    pub fn change_output_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.output_path = path.into();
    }
}

/// Hook points available to plugins.
#[derive(Default)]
pub struct Hooks {
    /// Called once per build just before the bundle is written.
    pub emit_file: SyncHook<EmitContext>,
}

/// Extension registered with a bundler.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Tap the hooks this plugin is interested in.
    fn apply(&self, hooks: &mut Hooks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    #[test]
    fn callbacks_run_in_registration_order() -> Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hook: SyncHook<EmitContext> = Default::default();
        for name in &["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            let name = name.to_string();
            hook.tap(name.clone(), move |ctx: &mut EmitContext| {
                seen.lock().unwrap().push(name.clone());
                ctx.change_output_path(format!("dist/{}.js", name));
                Ok(())
            });
        }
        let mut ctx = EmitContext::new("dist/bundle.js");
        hook.call(&mut ctx)?;
        assert_eq!(vec!["first", "second", "third"], *seen.lock().unwrap());
        assert_eq!(Path::new("dist/third.js"), ctx.output_path());
        Ok(())
    }

    #[test]
    fn failing_callback_stops_dispatch() {
        let mut hook: SyncHook<EmitContext> = Default::default();
        hook.tap("fail", |_: &mut EmitContext| bail!("nope"));
        hook.tap("later", |ctx: &mut EmitContext| {
            ctx.change_output_path("never.js");
            Ok(())
        });
        let mut ctx = EmitContext::new("dist/bundle.js");
        let err = hook.call(&mut ctx).unwrap_err();
        assert_eq!("hook 'fail' failed", err.to_string());
        assert_eq!(Path::new("dist/bundle.js"), ctx.output_path());
    }

    #[test]
    fn empty_hook_leaves_context() -> Result<()> {
        let hook: SyncHook<EmitContext> = Default::default();
        assert!(hook.is_empty());
        let mut ctx = EmitContext::new("dist/bundle.js");
        hook.call(&mut ctx)?;
        assert_eq!(Path::new("dist/bundle.js"), ctx.output_path());
        Ok(())
    }
}
