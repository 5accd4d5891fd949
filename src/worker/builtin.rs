//! Built-in transpiler.
//!
//! Parses the unit as a JSX-enabled ES module with oxc and reports the first
//! syntax error with its line. On success, top-level `import` declarations
//! become `require` calls and JSX becomes `React.createElement` calls, both
//! in place. Every replacement is padded to the line breaks of the text it
//! replaces, so runtime line numbers still match the unit.

use std::fmt::Write as _;

use oxc::allocator::Allocator;
use oxc::ast::ast::{ImportDeclaration, ImportDeclarationSpecifier, Statement};
use oxc::ast_visit::Visit;
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};

use super::jsx::JsxLowering;
use super::{CompileError, Transpiler, line_at};

/// Replace `[start, end)` of the source with the given text.
pub(super) type Edit = (usize, usize, String);

#[derive(Debug, Default, Clone, Copy)]
pub struct OxcTranspiler;

impl Transpiler for OxcTranspiler {
    fn transpile(&self, source: &str) -> Result<String, CompileError> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::jsx()).parse();

        if let Some(error) = ret.errors.first() {
            let line = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| line_at(source, label.offset()));
            return Err(CompileError::new(format!("SyntaxError: {error}"), line));
        }

        let mut edits: Vec<Edit> = Vec::new();
        for stmt in &ret.program.body {
            match stmt {
                Statement::ImportDeclaration(decl) => {
                    let span = decl.span;
                    edits.push((span.start as usize, span.end as usize, import_to_require(decl)));
                }
                Statement::ExportNamedDeclaration(_)
                | Statement::ExportDefaultDeclaration(_)
                | Statement::ExportAllDeclaration(_) => {
                    let line = line_at(source, stmt.span().start as usize);
                    return Err(CompileError::new(
                        "SyntaxError: export declarations are not supported in the playground, assign to module.exports instead",
                        Some(line),
                    ));
                }
                _ => {}
            }
        }

        let mut jsx = JsxLowering::new(source);
        jsx.visit_program(&ret.program);
        edits.extend(jsx.edits);
        edits.sort_by_key(|(start, _, _)| *start);

        Ok(splice(source, 0, source.len(), &edits))
    }
}

/// `import A, { b as c } from 'm'` -> `var A = require("m"); var c = require("m").b;`
fn import_to_require(decl: &ImportDeclaration<'_>) -> String {
    let module = serde_json::to_string(decl.source.value.as_str()).unwrap_or_default();
    let mut out = String::new();

    let Some(specifiers) = &decl.specifiers else {
        let _ = write!(out, "require({module});");
        return out;
    };
    if specifiers.is_empty() {
        let _ = write!(out, "require({module});");
        return out;
    }

    for specifier in specifiers {
        match specifier {
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                let _ = write!(out, "var {} = require({module}); ", s.local.name);
            }
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                let _ = write!(out, "var {} = require({module}); ", s.local.name);
            }
            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                let imported = serde_json::to_string(s.imported.name().as_str()).unwrap_or_default();
                let _ = write!(
                    out,
                    "var {} = require({module})[{imported}]; ",
                    s.local.name
                );
            }
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Source range `[from, to)` with sorted, non-overlapping edits applied.
///
/// A replacement holding fewer line breaks than the text it replaces is
/// padded with the missing ones.
pub(super) fn splice(source: &str, from: usize, to: usize, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(to - from);
    let mut cursor = from;
    for (start, end, replacement) in edits {
        out.push_str(&source[cursor..*start]);
        out.push_str(replacement);
        let missing = source[*start..*end]
            .matches('\n')
            .count()
            .saturating_sub(replacement.matches('\n').count());
        out.extend(std::iter::repeat_n('\n', missing));
        cursor = *end;
    }
    out.push_str(&source[cursor..to]);
    out
}
