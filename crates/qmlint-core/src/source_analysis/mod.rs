// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Source analysis: positions, tokens, lexer and parser.
//!
//! The [`Lexer`] turns Latin-1-decoded source text into a stream of
//! [`Token`]s carrying [`Position`]s; the [`parser`] builds the AST from
//! that stream with a single token of lookahead.

mod lexer;
pub mod parser;
mod position;
mod token;

#[cfg(test)]
mod lexer_property_tests;

pub use lexer::{lex_with_eof, Lexer};
pub use parser::{parse, ParsedSource, SyntaxError};
pub use position::Position;
pub use token::{Keyword, Operator, Token, TokenKind};
