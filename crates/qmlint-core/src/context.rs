// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! The parsing context: files, diagnostics, import resolution.
//!
//! A [`Context`] owns the set of [`File`]s of one analysis run, keyed
//! by path, plus the ordered diagnostic list shared by the parser, the
//! symbol passes and the rule engine. Files live as long as the
//! context.
//!
//! Parsing is per file and stateless; there is no scope stack. When
//! `include_imports` is enabled, each successful parse resolves its
//! string imports against the file's directory and queues existing,
//! not-yet-parsed files into the same file set.
//!
//! Input is decoded as Latin-1: every byte maps to the char with the
//! same code point, so lexing never sees a decode error.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use ecow::{eco_format, EcoString};

use crate::analyse;
use crate::ast::{Ast, NodeId, NodeKind, Value};
use crate::source_analysis::{parse, ParsedSource, Position};

/// What produced a diagnostic, and whether parsing continued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// From the parser; terminal for the affected file.
    Syntax,
    /// From the rule engine.
    RuleViolation,
    /// From the built-in unused-symbol rules.
    UnusedSymbol,
    /// File missing or unreadable.
    Io,
}

/// A diagnostic: file, position, message.
///
/// Displays as `<path> (<line>, <col>) : <text>` with 1-based line and
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: Utf8PathBuf,
    pub position: Position,
    pub text: EcoString,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(
        kind: DiagnosticKind,
        file: Utf8PathBuf,
        position: Position,
        text: impl Into<EcoString>,
    ) -> Self {
        Self {
            kind,
            file,
            position,
            text: text.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} : {}", self.file, self.position, self.text)
    }
}

/// One source file of the analysis run.
#[derive(Debug, Clone)]
pub struct File {
    path: Utf8PathBuf,
    parsed: bool,
    source: Option<ParsedSource>,
}

impl File {
    fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            parsed: false,
            source: None,
        }
    }

    /// The file's path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// True once a parse has been attempted, successful or not.
    #[must_use]
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// True when the file parsed cleanly and carries an AST.
    #[must_use]
    pub fn success(&self) -> bool {
        self.source.is_some()
    }

    /// The parse result, present only on success.
    #[must_use]
    pub fn source(&self) -> Option<&ParsedSource> {
        self.source.as_ref()
    }

    /// The parse result, mutably (for symbol removal before rewrite).
    pub fn source_mut(&mut self) -> Option<&mut ParsedSource> {
        self.source.as_mut()
    }

    /// The file's root entity.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.source.as_ref().map(|s| s.root)
    }

    /// The file's AST arena.
    #[must_use]
    pub fn ast(&self) -> Option<&Ast> {
        self.source.as_ref().map(|s| &s.ast)
    }
}

/// Owner of the file set and the shared diagnostic list.
#[derive(Debug, Default)]
pub struct Context {
    files: Vec<File>,
    /// Ordered diagnostics; order is emission order.
    pub diagnostics: Vec<Diagnostic>,
    include_imports: bool,
    error: Option<Diagnostic>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables parsing of imported files.
    pub fn set_include_imports(&mut self, value: bool) {
        self.include_imports = value;
    }

    /// Adds a file to the set, deduplicating by path. Returns its
    /// index.
    pub fn add_file(&mut self, path: Utf8PathBuf) -> usize {
        if let Some(index) = self.files.iter().position(|f| f.path == path) {
            return index;
        }
        self.files.push(File::new(path));
        self.files.len() - 1
    }

    /// All files, in the order they were added.
    #[must_use]
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// The file for `path`, if present.
    #[must_use]
    pub fn file_by_path(&self, path: &Utf8Path) -> Option<&File> {
        self.files.iter().find(|f| f.path == path)
    }

    /// The file for `path`, mutably.
    pub fn file_by_path_mut(&mut self, path: &Utf8Path) -> Option<&mut File> {
        self.files.iter_mut().find(|f| f.path == path)
    }

    /// True when no syntax error has been recorded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// The last syntax error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Diagnostic> {
        self.error.as_ref()
    }

    /// Runs the rule grammar over a successfully parsed file, appending
    /// engine diagnostics to the shared list. A file that failed to
    /// parse is skipped - there is no partial AST to analyze.
    pub fn run_grammar(&mut self, grammar: &crate::rules::Grammar, path: &Utf8Path) {
        let Some(file) = self.files.iter().find(|f| f.path == path) else {
            return;
        };
        let Some(source) = &file.source else {
            return;
        };
        crate::rules::run(grammar, path, &source.ast, source.root, &mut self.diagnostics);
    }

    /// Parses every file that has not been parsed yet, including files
    /// queued by import resolution along the way. Returns true when no
    /// new syntax or IO diagnostics were emitted.
    pub fn parse(&mut self) -> bool {
        let mut clean = true;
        let mut index = 0;
        while index < self.files.len() {
            if !self.files[index].parsed {
                clean &= self.parse_file_at(index);
            }
            index += 1;
        }
        clean
    }

    fn parse_file_at(&mut self, index: usize) -> bool {
        let path = self.files[index].path.clone();
        tracing::debug!(%path, "parsing");

        let text = match read_latin1(&path) {
            Ok(text) => text,
            Err(error) => {
                self.files[index].parsed = true;
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Io,
                    path,
                    Position::default(),
                    eco_format!("Cannot read file: {error}"),
                ));
                return false;
            }
        };

        match parse(&text) {
            Ok(mut source) => {
                analyse::resolve(&mut source.ast, source.root);
                let import_paths = if self.include_imports {
                    resolve_import_paths(&source, &path)
                } else {
                    Vec::new()
                };

                let file = &mut self.files[index];
                file.source = Some(source);
                file.parsed = true;

                for import in import_paths {
                    tracing::debug!(%import, "queuing imported file");
                    self.add_file(import);
                }
                true
            }
            Err(error) => {
                self.files[index].parsed = true;
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::Syntax,
                    path,
                    error.position,
                    eco_format!("Syntax error: {}", error.message),
                );
                self.diagnostics.push(diagnostic.clone());
                self.error = Some(diagnostic);
                false
            }
        }
    }
}

/// Resolves a file's string imports against its directory, keeping
/// only paths that exist as files. Module imports (`import QtQuick`)
/// have no file to parse and are skipped.
fn resolve_import_paths(source: &ParsedSource, path: &Utf8Path) -> Vec<Utf8PathBuf> {
    let directory = path.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
    let mut resolved = Vec::new();
    for &import in &source.imports {
        let NodeKind::Import(import) = &source.ast.node(import).kind else {
            continue;
        };
        let NodeKind::Entity(Value::String(relative)) = &source.ast.node(import.name).kind else {
            continue;
        };
        let candidate = directory.join(relative.as_str());
        if candidate.as_std_path().is_file() {
            resolved.push(candidate);
        }
    }
    resolved
}

/// Reads a file as Latin-1: every byte becomes the char with the same
/// code point.
fn read_latin1(path: &Utf8Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Encodes text back to Latin-1 for rewriting; characters outside the
/// range become `?`.
#[must_use]
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}
