//! The module loader embedded at the top of every bundle.
//!
//! The template is parsed like any other script and its two slots are
//! replaced with AST nodes, so the module table never passes through
//! string concatenation.
use std::sync::Arc;

use anyhow::{bail, Result};

use swc_common::SourceMap;
use swc_ecma_ast::*;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::swc_utils::parse_script;

/// Bumped whenever the loader template changes shape.
pub const RUNTIME_VERSION: u32 = 1;

const MODULES_SLOT: &str = "__pumice_modules__";
const ENTRY_SLOT: &str = "__pumice_entry__";

const TEMPLATE: &str = r#"(function (modules) {
    var cache = {};
    function require(id) {
        var cached = cache[id];
        if (cached !== undefined) {
            return cached.exports;
        }
        var record = modules[id];
        var factory = record[0];
        var mapping = record[1];
        var module = cache[id] = { exports: {}, loaded: false };
        function localRequire(specifier) {
            if (!Object.prototype.hasOwnProperty.call(mapping, specifier)) {
                throw new Error("Cannot find module '" + specifier + "'");
            }
            return require(mapping[specifier]);
        }
        try {
            factory(localRequire, module, module.exports);
        } catch (err) {
            delete cache[id];
            throw err;
        }
        module.loaded = true;
        return module.exports;
    }
    return require(__pumice_entry__);
})(__pumice_modules__);
"#;

/// Comment written before the generated program.
pub fn banner() -> String {
    format!("/* pumice runtime v{} */\n", RUNTIME_VERSION)
}

/// Parse the loader template and fill its slots.
pub(crate) fn instantiate(
    sm: &Arc<SourceMap>,
    modules: Box<Expr>,
    entry: Box<Expr>,
) -> Result<Script> {
    let mut script = parse_script(sm, "pumice-runtime.js", TEMPLATE.to_string())?;
    let mut slots = FillSlots {
        modules: Some(modules),
        entry: Some(entry),
    };
    script.visit_mut_with(&mut slots);
    if slots.modules.is_some() || slots.entry.is_some() {
        bail!("runtime template is missing a slot");
    }
    Ok(script)
}

struct FillSlots {
    modules: Option<Box<Expr>>,
    entry: Option<Box<Expr>>,
}

impl VisitMut for FillSlots {
    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Expr::Ident(ident) = n {
            let slot = match &*ident.sym {
                MODULES_SLOT => self.modules.take(),
                ENTRY_SLOT => self.entry.take(),
                _ => None,
            };
            if let Some(expr) = slot {
                *n = *expr;
            }
            return;
        }
        n.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swc_utils::print_script;
    use swc_common::DUMMY_SP;

    fn num(value: f64) -> Box<Expr> {
        Box::new(Expr::Lit(Lit::Num(Number {
            span: DUMMY_SP,
            value,
        })))
    }

    #[test]
    fn fills_both_slots() -> Result<()> {
        let sm: Arc<SourceMap> = Arc::new(Default::default());
        let modules = Box::new(Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props: vec![],
        }));
        let script = instantiate(&sm, modules, num(0.0))?;
        let code = print_script(&sm, &script)?;
        assert!(!code.contains(MODULES_SLOT));
        assert!(!code.contains(ENTRY_SLOT));
        assert!(code.contains("return require(0);"));
        Ok(())
    }

    #[test]
    fn banner_names_version() {
        assert_eq!("/* pumice runtime v1 */\n", banner());
    }
}
