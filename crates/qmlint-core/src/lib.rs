// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! qmlint analysis core.
//!
//! This crate contains the core analyzer functionality for QML-like
//! declarative-UI source:
//! - Lexical analysis (tokenization with line/column tracking)
//! - Parsing (AST construction)
//! - Symbol resolution (unused property/variable/parameter detection)
//! - Rule evaluation (XML grammar of Check/Accept/Reject/Condition)
//! - Source emission (AST back to formatted text)
//!
//! Analysis of a single file is a fresh, stateless operation; the
//! [`context::Context`] owns the parsed files and the shared diagnostic
//! list for a whole run.

pub mod analyse;
pub mod analyzer;
pub mod ast;
pub mod ast_walker;
pub mod context;
pub mod emit;
pub mod rules;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::analyzer::Analyzer;
    pub use crate::ast::{Ast, Node, NodeId, NodeKind, Value};
    pub use crate::context::{Context, Diagnostic, DiagnosticKind, File};
    pub use crate::rules::{Grammar, GrammarError};
    pub use crate::source_analysis::{Lexer, Position, Token, TokenKind};
}
