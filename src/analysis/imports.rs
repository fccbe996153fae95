//! Helper to collect the static import specifiers of a module.
use swc_ecma_ast::*;
use swc_ecma_visit::{Node, Visit, VisitWith};

/// Collects the source of every static import declaration.
///
/// Re-exports with a `from` clause load a module too, so they are
/// recorded alongside `import` declarations. Dynamic `import()` and
/// `require()` calls are expressions and never reach this visitor.
#[derive(Default, Debug)]
pub struct ImportAnalysis {
    /// Specifiers in declaration order, duplicates preserved.
    pub specifiers: Vec<String>,
}

impl ImportAnalysis {
    pub fn new() -> Self {
        Self {
            specifiers: Default::default(),
        }
    }

    /// Analyze the top-level imports of a module.
    pub fn analyze(module: &Module) -> Vec<String> {
        let mut analysis = ImportAnalysis::new();
        module.visit_children_with(&mut analysis);
        analysis.specifiers
    }
}

impl Visit for ImportAnalysis {
    // Statements cannot contain module declarations
    fn visit_stmt(&mut self, _: &Stmt, _: &dyn Node) {}

    fn visit_import_decl(&mut self, n: &ImportDecl, _: &dyn Node) {
        self.specifiers.push(n.src.value.as_ref().to_string());
    }

    fn visit_named_export(&mut self, n: &NamedExport, _: &dyn Node) {
        if let Some(src) = &n.src {
            self.specifiers.push(src.value.as_ref().to_string());
        }
    }

    fn visit_export_all(&mut self, n: &ExportAll, _: &dyn Node) {
        self.specifiers.push(n.src.value.as_ref().to_string());
    }
}
