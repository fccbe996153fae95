//! Helpers to get a handler, parser and code generator.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use swc_common::{
    errors::{emitter::ColorConfig, Handler},
    FileName, SourceFile, SourceMap, Spanned,
};
use swc_ecma_ast::{EsVersion, Module, Script};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_parser::{error::Error as ParserError, lexer::Lexer, Parser, StringInput, Syntax};

use crate::error::BundleError;

pub(crate) fn get_handler(sm: Arc<SourceMap>) -> Handler {
    Handler::with_tty_emitter(ColorConfig::Auto, true, false, Some(sm))
}

pub(crate) fn get_parser<'a>(
    fm: &'a SourceFile,
) -> Parser<Lexer<'a, StringInput<'a>>> {
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::Es2020,
        StringInput::from(fm),
        None,
    );
    Parser::new_from(lexer)
}

/// Convert a parser error into a positioned error and emit the diagnostic.
fn parse_error(
    sm: &Arc<SourceMap>,
    handler: &Handler,
    path: &Path,
    err: ParserError,
) -> BundleError {
    let loc = sm.lookup_char_pos(err.span().lo());
    let message = err.kind().msg().to_string();
    err.into_diagnostic(handler).emit();
    BundleError::Parse {
        path: path.to_path_buf(),
        line: loc.line,
        column: loc.col.0 + 1,
        message,
    }
}

/// Parse module source text that belongs to `path`.
pub(crate) fn parse_module(
    sm: &Arc<SourceMap>,
    path: &Path,
    source: String,
) -> Result<Module> {
    let handler = get_handler(Arc::clone(sm));
    let fm = sm.new_source_file(FileName::Real(path.to_path_buf()), source);
    let mut parser = get_parser(&*fm);

    let module = parser
        .parse_module()
        .map_err(|e| parse_error(sm, &handler, path, e))?;

    // Recoverable errors still abort the build
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(parse_error(sm, &handler, path, e).into());
    }

    Ok(module)
}

/// Parse script source generated by this crate.
pub(crate) fn parse_script(
    sm: &Arc<SourceMap>,
    name: &str,
    source: String,
) -> Result<Script> {
    let handler = get_handler(Arc::clone(sm));
    let fm = sm.new_source_file(FileName::Custom(name.into()), source);
    let mut parser = get_parser(&*fm);
    let script = parser.parse_script().map_err(|e| {
        let err = parse_error(sm, &handler, Path::new(name), e);
        anyhow::Error::new(err)
    })?;
    Ok(script)
}

/// Print a script to source text.
pub(crate) fn print_script(sm: &Arc<SourceMap>, script: &Script) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config {
                minify: false,
                ..Default::default()
            },
            cm: Arc::clone(sm),
            comments: None,
            wr: Box::new(JsWriter::new(Arc::clone(sm), "\n", &mut buf, None)),
        };
        emitter
            .emit_script(script)
            .context("failed to generate code")?;
    }
    Ok(String::from_utf8(buf)?)
}
