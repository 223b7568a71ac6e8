//! Handler discovery: static analysis of function source files.
//!
//! A handler file declares which HTTP methods it serves through its
//! top-level exports (`onRequestGet`, `onRequest`, ...). Discovery parses
//! each candidate file with OXC and records the exported names in document
//! order, without executing the file, resolving imports, or following
//! re-exports to other files.

use std::fs;
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPatternKind, Declaration, ModuleExportName, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use walkdir::WalkDir;

use crate::error::{CoreError, Result};

/// Enumerate candidate handler files (`.js` / `.ts`) under the functions
/// root, recursively, in deterministic sorted order.
pub fn handler_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("js" | "ts")
            )
        })
        .collect()
}

/// Collect the top-level exported names of a source file.
///
/// Recorded constructs:
///
/// - named export specifiers, including re-export specifiers
/// - exported function declarations
/// - exported TS type aliases and interfaces
/// - exported variable statements, each declarator individually
///
/// Results follow document order. Duplicates are preserved; callers apply
/// set semantics where they need them.
///
/// # Errors
///
/// Returns [`CoreError::Io`] when the file cannot be read and
/// [`CoreError::Parse`] when it cannot be parsed.
pub fn collect_exports(path: &Path) -> Result<Vec<String>> {
    let source = fs::read_to_string(path).map_err(|error| CoreError::Io {
        path: path.to_path_buf(),
        error,
    })?;

    let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, &source, source_type).parse();

    if !parsed.errors.is_empty() {
        return Err(CoreError::Parse {
            path: path.to_path_buf(),
            messages: parsed
                .errors
                .iter()
                .map(|diagnostic| diagnostic.message.to_string())
                .collect(),
        });
    }

    let mut names = Vec::new();
    for statement in &parsed.program.body {
        let Statement::ExportNamedDeclaration(export) = statement else {
            continue;
        };

        for specifier in &export.specifiers {
            names.push(export_name(&specifier.exported));
        }

        match &export.declaration {
            Some(Declaration::FunctionDeclaration(function)) => {
                if let Some(id) = &function.id {
                    names.push(id.name.to_string());
                }
            }
            Some(Declaration::TSTypeAliasDeclaration(alias)) => {
                names.push(alias.id.name.to_string());
            }
            Some(Declaration::TSInterfaceDeclaration(interface)) => {
                names.push(interface.id.name.to_string());
            }
            Some(Declaration::VariableDeclaration(variable)) => {
                for declarator in &variable.declarations {
                    if let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind {
                        names.push(ident.name.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(names)
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}
