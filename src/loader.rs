//! Loaders transform raw file contents before a module is parsed.
//!
//! A [Rule] pairs a path test with a chain of loaders; chains run from
//! the last declared loader back to the first so that the output of
//! the last stage feeds the one declared before it.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::error::BundleError;

/// Context passed to every loader invocation.
#[derive(Debug)]
pub struct LoaderContext<'a> {
    resource: &'a Path,
    dependencies: Vec<String>,
}

impl<'a> LoaderContext<'a> {
    fn new(resource: &'a Path) -> Self {
        Self {
            resource,
            dependencies: Vec::new(),
        }
    }

    /// File being transformed.
    pub fn resource(&self) -> &Path {
        self.resource
    }

    /// Record a dependency the loader discovered outside of import syntax.
    ///
    /// Declared dependencies are informational, they are not added to
    /// the module graph.
    pub fn add_dependency<S: Into<String>>(&mut self, dep: S) {
        let dep = dep.into();
        log::info!("{} declares dependency {}", self.resource.display(), dep);
        self.dependencies.push(dep);
    }

    /// Dependencies declared so far.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Transform the text of a file.
pub trait Loader: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Transform `source` into new module text.
    fn load(&self, ctx: &mut LoaderContext<'_>, source: String) -> Result<String>;
}

impl<F> Loader for F
where
    F: Fn(&mut LoaderContext<'_>, String) -> Result<String> + Send + Sync,
{
    fn load(&self, ctx: &mut LoaderContext<'_>, source: String) -> Result<String> {
        self(ctx, source)
    }
}

/// Convert a JSON document to a module with a default export.
#[derive(Debug, Default)]
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self, _ctx: &mut LoaderContext<'_>, source: String) -> Result<String> {
        let value: serde_json::Value = serde_json::from_str(&source)?;
        Ok(format!("export default {};", value))
    }
}

/// Export the file contents as a default string export.
#[derive(Debug, Default)]
pub struct RawLoader;

impl Loader for RawLoader {
    fn name(&self) -> &str {
        "raw"
    }

    fn load(&self, _ctx: &mut LoaderContext<'_>, source: String) -> Result<String> {
        Ok(format!("export default {};", serde_json::to_string(&source)?))
    }
}

/// Look up a built in loader by name.
pub fn builtin_loader(name: &str) -> Result<Arc<dyn Loader>> {
    match name {
        "json" => Ok(Arc::new(JsonLoader)),
        "raw" => Ok(Arc::new(RawLoader)),
        _ => Err(anyhow!("unknown loader '{}'", name)),
    }
}

/// Apply a chain of loaders to files whose path matches a test.
#[derive(Clone)]
pub struct Rule {
    test: Regex,
    loaders: Vec<Arc<dyn Loader>>,
}

impl Rule {
    /// Create a rule from a pattern matched against file paths.
    pub fn new(test: &str) -> Result<Self> {
        Ok(Self {
            test: Regex::new(test)?,
            loaders: Vec::new(),
        })
    }

    /// Append a loader to the chain.
    pub fn with<L: Loader + 'static>(mut self, loader: L) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    /// Append a shared loader to the chain.
    pub fn with_shared(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Determine if this rule applies to a file.
    pub fn matches(&self, path: &Path) -> bool {
        self.test.is_match(&path.to_string_lossy())
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("test", &self.test.as_str())
            .field(
                "loaders",
                &self.loaders.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Ordered rule list applied to every file before parsing.
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    rules: Vec<Rule>,
}

impl Pipeline {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Run every matching rule over `source`.
    ///
    /// Rules apply in declaration order when more than one matches.
    pub fn apply(&self, path: &Path, mut source: String) -> Result<String> {
        let mut ctx = LoaderContext::new(path);
        for rule in self.rules.iter().filter(|r| r.matches(path)) {
            for loader in rule.loaders.iter().rev() {
                source = loader.load(&mut ctx, source).map_err(|e| {
                    BundleError::Transform {
                        loader: loader.name().to_string(),
                        path: PathBuf::from(path),
                        source: e.into(),
                    }
                })?;
            }
        }
        Ok(source)
    }
}
