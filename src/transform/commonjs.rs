//! Lower ES module syntax to the body of a bundle factory.
//!
//! The generated code expects `require`, `module` and `exports` to be
//! in scope. Exports are defined as getters before any dependency is
//! required so that a module caught in a cycle exposes live bindings
//! through its partially evaluated exports object.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};

use swc_atoms::JsWord;
use swc_common::{SourceMap, SyntaxContext, DUMMY_SP};
use swc_ecma_ast::*;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::{bundler::serializer::str_lit, swc_utils::parse_script};

const IMPORT_PREFIX: &str = "__pumice_import_";
const DEFAULT_EXPORT: &str = "__pumice_default";
const INTEROP_DEFAULT: &str = "__pumice_interop_default";
const INTEROP_WILDCARD: &str = "__pumice_interop_wildcard";
const EXPORT_STAR: &str = "__pumice_export_star";

const HELPERS: &str = r#"
function __pumice_interop_default(m) {
    return m && m.__esModule ? m : { default: m };
}
function __pumice_interop_wildcard(m) {
    if (m && m.__esModule) return m;
    var ns = {};
    if (m != null) {
        Object.keys(m).forEach(function (k) {
            if (k === "default") return;
            Object.defineProperty(ns, k, {
                enumerable: true,
                get: function () {
                    return m[k];
                }
            });
        });
    }
    ns.default = m;
    return ns;
}
function __pumice_export_star(from, to) {
    Object.keys(from).forEach(function (k) {
        if (k === "default" || k === "__esModule" || Object.prototype.hasOwnProperty.call(to, k)) return;
        Object.defineProperty(to, k, {
            enumerable: true,
            get: function () {
                return from[k];
            }
        });
    });
}
"#;

/// Lower a module to a factory body script.
///
/// Modules without import or export declarations are returned
/// unchanged apart from the container type.
pub fn lower(sm: &Arc<SourceMap>, module: Module) -> Result<Script> {
    let is_module = module
        .body
        .iter()
        .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));

    if !is_module {
        return Ok(Script {
            span: module.span,
            body: module
                .body
                .into_iter()
                .filter_map(|item| match item {
                    ModuleItem::Stmt(stmt) => Some(stmt),
                    ModuleItem::ModuleDecl(_) => None,
                })
                .collect(),
            shebang: module.shebang,
        });
    }

    let mut lowering = CommonJs::default();
    for item in module.body {
        match item {
            ModuleItem::Stmt(stmt) => lowering.body.push(stmt),
            ModuleItem::ModuleDecl(decl) => lowering.module_decl(decl)?,
        }
    }
    lowering.finish(sm, module.span, module.shebang)
}

/// Binding introduced by an import declaration.
struct Binding {
    ctxt: SyntaxContext,
    expr: Box<Expr>,
}

#[derive(Default)]
struct CommonJs {
    bindings: HashMap<JsWord, Binding>,
    exports: Vec<(JsWord, Box<Expr>)>,
    requires: Vec<Stmt>,
    body: Vec<Stmt>,
    import_count: usize,
    interop: bool,
    wildcard: bool,
    export_star: bool,
}

impl CommonJs {
    fn module_decl(&mut self, decl: ModuleDecl) -> Result<()> {
        match decl {
            ModuleDecl::Import(import) => self.import(import),
            ModuleDecl::ExportDecl(ExportDecl { decl, .. }) => {
                match &decl {
                    Decl::Fn(FnDecl { ident, .. }) => self.export_local(ident),
                    Decl::Class(ClassDecl { ident, .. }) => {
                        self.export_local(ident)
                    }
                    Decl::Var(var) => {
                        let mut names = Vec::new();
                        for decl in var.decls.iter() {
                            binding_idents(&decl.name, &mut names);
                        }
                        for ident in names {
                            self.export_local(ident);
                        }
                    }
                    _ => bail!("unsupported export declaration"),
                }
                self.body.push(Stmt::Decl(decl));
            }
            ModuleDecl::ExportNamed(named) => self.export_named(named)?,
            ModuleDecl::ExportDefaultDecl(ExportDefaultDecl { decl, .. }) => {
                match decl {
                    DefaultDecl::Fn(FnExpr { ident, function }) => {
                        let ident = ident.unwrap_or_else(|| ident_of(DEFAULT_EXPORT));
                        self.export("default", Box::new(Expr::Ident(ident.clone())));
                        self.body.push(Stmt::Decl(Decl::Fn(FnDecl {
                            ident,
                            declare: false,
                            function,
                        })));
                    }
                    DefaultDecl::Class(ClassExpr { ident, class }) => {
                        let ident = ident.unwrap_or_else(|| ident_of(DEFAULT_EXPORT));
                        self.export("default", Box::new(Expr::Ident(ident.clone())));
                        self.body.push(Stmt::Decl(Decl::Class(ClassDecl {
                            ident,
                            declare: false,
                            class,
                        })));
                    }
                    _ => bail!("unsupported default export declaration"),
                }
            }
            ModuleDecl::ExportDefaultExpr(ExportDefaultExpr { expr, .. }) => {
                self.export("default", ident_expr(DEFAULT_EXPORT));
                self.body.push(var_stmt(DEFAULT_EXPORT, expr));
            }
            ModuleDecl::ExportAll(ExportAll { src, .. }) => {
                self.export_star = true;
                self.requires.push(expr_stmt(call(
                    ident_expr(EXPORT_STAR),
                    vec![require(&src.value), ident_expr("exports")],
                )));
            }
            _ => bail!("unsupported module declaration"),
        }
        Ok(())
    }

    fn import(&mut self, import: ImportDecl) {
        // Side effect import, eg: `import "./polyfill.js";`
        if import.specifiers.is_empty() {
            self.requires.push(expr_stmt(require(&import.src.value)));
            return;
        }

        let local = self.next_import();
        let has_default = import
            .specifiers
            .iter()
            .any(|s| matches!(s, ImportSpecifier::Default(_)));
        let has_namespace = import
            .specifiers
            .iter()
            .any(|s| matches!(s, ImportSpecifier::Namespace(_)));
        let init = if has_namespace || (has_default && import.specifiers.len() > 1) {
            // Named bindings and `default` must both resolve on CommonJS targets
            self.wildcard = true;
            call(ident_expr(INTEROP_WILDCARD), vec![require(&import.src.value)])
        } else if has_default {
            self.interop = true;
            call(ident_expr(INTEROP_DEFAULT), vec![require(&import.src.value)])
        } else {
            require(&import.src.value)
        };
        self.requires.push(var_stmt(&local, init));

        for spec in import.specifiers {
            match spec {
                ImportSpecifier::Default(item) => {
                    self.bind(&item.local, member(&local, "default"));
                }
                ImportSpecifier::Named(item) => {
                    let name = item
                        .imported
                        .as_ref()
                        .map(|n| n.sym.clone())
                        .unwrap_or_else(|| item.local.sym.clone());
                    self.bind(&item.local, member(&local, &name));
                }
                ImportSpecifier::Namespace(item) => {
                    self.bind(&item.local, ident_expr(&local));
                }
            }
        }
    }

    fn export_named(&mut self, named: NamedExport) -> Result<()> {
        if let Some(src) = &named.src {
            let local = self.next_import();
            self.requires.push(var_stmt(&local, require(&src.value)));
            for spec in named.specifiers {
                match spec {
                    ExportSpecifier::Named(item) => {
                        let exported = item.exported.as_ref().unwrap_or(&item.orig);
                        self.export(&exported.sym, member(&local, &item.orig.sym));
                    }
                    ExportSpecifier::Namespace(item) => {
                        self.export(&item.name.sym, ident_expr(&local));
                    }
                    ExportSpecifier::Default(item) => {
                        self.export(&item.exported.sym, member(&local, "default"));
                    }
                }
            }
        } else {
            for spec in named.specifiers {
                match spec {
                    ExportSpecifier::Named(item) => {
                        let exported = item.exported.as_ref().unwrap_or(&item.orig);
                        self.export(&exported.sym, Box::new(Expr::Ident(item.orig.clone())));
                    }
                    _ => bail!("unsupported local export specifier"),
                }
            }
        }
        Ok(())
    }

    fn export_local(&mut self, ident: &Ident) {
        self.export(&ident.sym, Box::new(Expr::Ident(ident.clone())));
    }

    fn export(&mut self, name: &str, expr: Box<Expr>) {
        self.exports.push((name.into(), expr));
    }

    fn bind(&mut self, local: &Ident, expr: Box<Expr>) {
        self.bindings.insert(
            local.sym.clone(),
            Binding {
                ctxt: local.span.ctxt(),
                expr,
            },
        );
    }

    fn next_import(&mut self) -> String {
        let name = format!("{}{}", IMPORT_PREFIX, self.import_count);
        self.import_count += 1;
        name
    }

    /// Assemble the factory body.
    fn finish(
        mut self,
        sm: &Arc<SourceMap>,
        span: swc_common::Span,
        shebang: Option<JsWord>,
    ) -> Result<Script> {
        let mut rewriter = ImportRewriter {
            bindings: &self.bindings,
        };
        self.body.visit_mut_with(&mut rewriter);
        for (_, expr) in self.exports.iter_mut() {
            expr.visit_mut_with(&mut rewriter);
        }

        let mut body = Vec::with_capacity(
            self.exports.len() + self.requires.len() + self.body.len() + 4,
        );
        body.push(expr_stmt(Box::new(Expr::Lit(Lit::Str(str_lit("use strict"))))));
        body.push(define_property("__esModule", {
            object_lit(vec![("value", Box::new(Expr::Lit(Lit::Bool(Bool {
                span: DUMMY_SP,
                value: true,
            }))))])
        }));

        if self.interop || self.wildcard || self.export_star {
            let helpers = parse_script(sm, "pumice:helpers", HELPERS.to_string())?;
            for stmt in helpers.body {
                let keep = match &stmt {
                    Stmt::Decl(Decl::Fn(FnDecl { ident, .. })) => {
                        (self.interop && &*ident.sym == INTEROP_DEFAULT)
                            || (self.wildcard && &*ident.sym == INTEROP_WILDCARD)
                            || (self.export_star && &*ident.sym == EXPORT_STAR)
                    }
                    _ => false,
                };
                if keep {
                    body.push(stmt);
                }
            }
        }

        for (name, expr) in self.exports {
            body.push(define_property(&name, getter(expr)));
        }
        body.append(&mut self.requires);
        body.append(&mut self.body);

        Ok(Script {
            span,
            body,
            shebang,
        })
    }
}

/// Replace references to imported bindings with member lookups on the
/// required module so reads always observe the current export value.
struct ImportRewriter<'a> {
    bindings: &'a HashMap<JsWord, Binding>,
}

impl<'a> ImportRewriter<'a> {
    fn lookup(&self, ident: &Ident) -> Option<Box<Expr>> {
        let ctxt = ident.span.ctxt();
        self.bindings
            .get(&ident.sym)
            .filter(|b| b.ctxt == ctxt || ctxt == SyntaxContext::empty())
            .map(|b| b.expr.clone())
    }
}

impl<'a> VisitMut for ImportRewriter<'a> {
    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Expr::Ident(ident) = &*n {
            if let Some(expr) = self.lookup(ident) {
                *n = *expr;
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        if let ExprOrSuper::Expr(callee) = &mut n.callee {
            let found = match &**callee {
                Expr::Ident(ident) => self.lookup(ident),
                _ => None,
            };
            if let Some(expr) = found {
                // Call without binding `this` to the module namespace
                *callee = Box::new(Expr::Paren(ParenExpr {
                    span: DUMMY_SP,
                    expr: Box::new(Expr::Seq(SeqExpr {
                        span: DUMMY_SP,
                        exprs: vec![
                            Box::new(Expr::Lit(Lit::Num(Number {
                                span: DUMMY_SP,
                                value: 0.0,
                            }))),
                            expr,
                        ],
                    })),
                }));
                n.args.visit_mut_with(self);
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_member_expr(&mut self, n: &mut MemberExpr) {
        n.obj.visit_mut_with(self);
        if n.computed {
            n.prop.visit_mut_with(self);
        }
    }

    fn visit_mut_prop(&mut self, n: &mut Prop) {
        if let Prop::Shorthand(ident) = &*n {
            if let Some(expr) = self.lookup(ident) {
                *n = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(ident.clone()),
                    value: expr,
                });
                return;
            }
        }
        n.visit_mut_children_with(self);
    }
}

/// Collect the identifiers bound by a declaration pattern.
fn binding_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                binding_idents(elem, out);
            }
        }
        Pat::Object(obj) => {
            for prop in obj.props.iter() {
                match prop {
                    ObjectPatProp::KeyValue(entry) => {
                        binding_idents(&entry.value, out)
                    }
                    ObjectPatProp::Assign(entry) => out.push(&entry.key),
                    ObjectPatProp::Rest(entry) => binding_idents(&entry.arg, out),
                }
            }
        }
        Pat::Rest(rest) => binding_idents(&rest.arg, out),
        Pat::Assign(assign) => binding_idents(&assign.left, out),
        _ => {}
    }
}

fn ident_of(sym: &str) -> Ident {
    Ident::new(sym.into(), DUMMY_SP)
}

fn ident_expr(sym: &str) -> Box<Expr> {
    Box::new(Expr::Ident(ident_of(sym)))
}

fn member(obj: &str, prop: &str) -> Box<Expr> {
    Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: ExprOrSuper::Expr(ident_expr(obj)),
        prop: Box::new(Expr::Lit(Lit::Str(str_lit(prop)))),
        computed: true,
    }))
}

fn call(callee: Box<Expr>, args: Vec<Box<Expr>>) -> Box<Expr> {
    Box::new(Expr::Call(CallExpr {
        span: DUMMY_SP,
        callee: ExprOrSuper::Expr(callee),
        args: args
            .into_iter()
            .map(|expr| ExprOrSpread { spread: None, expr })
            .collect(),
        type_args: None,
    }))
}

fn require(src: &str) -> Box<Expr> {
    call(
        ident_expr("require"),
        vec![Box::new(Expr::Lit(Lit::Str(str_lit(src))))],
    )
}

fn expr_stmt(expr: Box<Expr>) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr,
    })
}

fn var_stmt(name: &str, init: Box<Expr>) -> Stmt {
    Stmt::Decl(Decl::Var(VarDecl {
        span: DUMMY_SP,
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent {
                id: ident_of(name),
                type_ann: None,
            }),
            init: Some(init),
            definite: false,
        }],
    }))
}

fn object_lit(props: Vec<(&str, Box<Expr>)>) -> Box<Expr> {
    Box::new(Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props: props
            .into_iter()
            .map(|(key, value)| {
                PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(ident_of(key)),
                    value,
                })))
            })
            .collect(),
    }))
}

/// `{ enumerable: true, get: function () { return <expr>; } }`
fn getter(expr: Box<Expr>) -> Box<Expr> {
    let get = Box::new(Expr::Fn(FnExpr {
        ident: None,
        function: Function {
            params: vec![],
            decorators: vec![],
            span: DUMMY_SP,
            body: Some(BlockStmt {
                span: DUMMY_SP,
                stmts: vec![Stmt::Return(ReturnStmt {
                    span: DUMMY_SP,
                    arg: Some(expr),
                })],
            }),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        },
    }));
    object_lit(vec![
        (
            "enumerable",
            Box::new(Expr::Lit(Lit::Bool(Bool {
                span: DUMMY_SP,
                value: true,
            }))),
        ),
        ("get", get),
    ])
}

/// `Object.defineProperty(exports, "<name>", <descriptor>);`
fn define_property(name: &str, descriptor: Box<Expr>) -> Stmt {
    let callee = Box::new(Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: ExprOrSuper::Expr(ident_expr("Object")),
        prop: ident_expr("defineProperty"),
        computed: false,
    }));
    expr_stmt(call(
        callee,
        vec![
            ident_expr("exports"),
            Box::new(Expr::Lit(Lit::Str(str_lit(name)))),
            descriptor,
        ],
    ))
}
