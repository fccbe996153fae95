//! Generate bundles.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;

use swc_common::{Globals, SourceMap, DUMMY_SP, GLOBALS};
use swc_ecma_ast::*;

use crate::{
    asset::{Asset, AssetBuilder},
    error::BundleError,
    graph::ModuleGraph,
    hooks::{EmitContext, Hooks, Plugin},
    loader::{Pipeline, Rule},
    swc_utils::{parse_script, print_script},
};

pub mod runtime;
pub mod serializer;

/// Destination used when no output is configured.
pub const DEFAULT_OUTPUT: &str = "./dist/bundle.js";

/// Options for bundling.
#[derive(Clone)]
pub struct BundleOptions {
    pub(crate) entry: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) rules: Vec<Rule>,
    pub(crate) plugins: Vec<Arc<dyn Plugin>>,
    pub(crate) parallel: bool,
}

impl BundleOptions {
    pub fn new<P: Into<PathBuf>>(entry: P) -> Self {
        Self {
            entry: entry.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            rules: Vec::new(),
            plugins: Vec::new(),
            parallel: false,
        }
    }

    /// Write the bundle to `output` instead of the default destination.
    pub fn output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    /// Append a loader rule; rules apply in the order added.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn plugin<P: Plugin + 'static>(self, plugin: P) -> Self {
        self.shared_plugin(Arc::new(plugin))
    }

    pub fn shared_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Build modules of each frontier in parallel.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.rules.clone())
    }
}

impl std::fmt::Debug for BundleOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleOptions")
            .field("entry", &self.entry)
            .field("output", &self.output)
            .field("rules", &self.rules)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("parallel", &self.parallel)
            .finish()
    }
}

/// The part of an asset the emitter needs.
#[derive(Debug)]
pub struct ModuleRecord<'a> {
    pub id: usize,
    pub code: &'a str,
    pub specifier_to_id: &'a IndexMap<String, usize>,
}

impl<'a> From<&'a Asset> for ModuleRecord<'a> {
    fn from(asset: &'a Asset) -> Self {
        Self {
            id: asset.id,
            code: &asset.code,
            specifier_to_id: &asset.specifier_to_id,
        }
    }
}

/// Render resolved assets into a single self executing program.
///
/// The entry module must have the identifier zero.
pub fn render(assets: &[Asset]) -> Result<String> {
    let records: Vec<ModuleRecord<'_>> = assets.iter().map(ModuleRecord::from).collect();
    let sm: Arc<SourceMap> = Arc::new(Default::default());
    let program = GLOBALS.set(&Globals::new(), || -> Result<_> {
        let mut props = Vec::with_capacity(records.len());
        for record in records.iter() {
            props.push(PropOrSpread::Prop(Box::new(Prop::KeyValue(
                KeyValueProp {
                    key: PropName::Num(Number {
                        span: DUMMY_SP,
                        value: record.id as f64,
                    }),
                    value: module_entry(&sm, record)?,
                },
            ))));
        }
        let modules = Box::new(Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props,
        }));
        let entry = serializer::to_expr(&0usize)?;
        runtime::instantiate(&sm, modules, entry)
    })?;

    let code = print_script(&sm, &program)?;
    Ok(format!("{}{}", runtime::banner(), code))
}

/// Create the `[factory, mapping]` pair for a module.
fn module_entry(sm: &Arc<SourceMap>, record: &ModuleRecord<'_>) -> Result<Box<Expr>> {
    let name = format!("pumice-module-{}.js", record.id);
    let script = parse_script(sm, &name, record.code.to_string())?;

    let param = |name: &str| Param {
        span: DUMMY_SP,
        decorators: vec![],
        pat: Pat::Ident(BindingIdent {
            id: Ident::new(name.into(), DUMMY_SP),
            type_ann: None,
        }),
    };

    let factory = Box::new(Expr::Fn(FnExpr {
        ident: None,
        function: Function {
            params: vec![param("require"), param("module"), param("exports")],
            decorators: vec![],
            span: DUMMY_SP,
            body: Some(BlockStmt {
                span: DUMMY_SP,
                stmts: script.body,
            }),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        },
    }));
    let mapping = serializer::to_expr(record.specifier_to_id)?;

    Ok(Box::new(Expr::Array(ArrayLit {
        span: DUMMY_SP,
        elems: vec![
            Some(ExprOrSpread {
                spread: None,
                expr: factory,
            }),
            Some(ExprOrSpread {
                spread: None,
                expr: mapping,
            }),
        ],
    })))
}

/// Runs a build from options to written file.
pub struct Bundler {
    options: BundleOptions,
    hooks: Hooks,
}

impl Bundler {
    /// Create a bundler and let each plugin tap the hooks.
    pub fn new(options: BundleOptions) -> Self {
        let mut hooks = Hooks::default();
        for plugin in options.plugins.iter() {
            log::debug!("Applying plugin {}", plugin.name());
            plugin.apply(&mut hooks);
        }
        Self { options, hooks }
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Hooks for callers that tap without writing a plugin.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Resolve the module graph for the configured entry.
    pub fn graph(&self) -> Result<Vec<Asset>> {
        let builder = AssetBuilder::new(self.options.pipeline());
        ModuleGraph::new(&builder)
            .parallel(self.options.parallel)
            .resolve(&self.options.entry)
    }

    /// Resolve, render and write the bundle.
    ///
    /// Returns the path the bundle was written to.
    pub fn build(&self) -> Result<PathBuf> {
        let assets = self.graph()?;
        let code = render(&assets)?;
        self.emit(&code)
    }

    /// Dispatch `emit_file` and write the code to the chosen path.
    pub fn emit(&self, code: &str) -> Result<PathBuf> {
        let mut ctx = EmitContext::new(self.options.output.clone());
        self.hooks.emit_file.call(&mut ctx)?;
        let path = ctx.output_path().to_path_buf();

        let write_error = |source| BundleError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        std::fs::write(&path, code).map_err(write_error)?;

        log::info!("Wrote bundle to {}", path.display());
        Ok(path)
    }
}
