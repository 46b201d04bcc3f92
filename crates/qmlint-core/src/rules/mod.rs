// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! The rule engine.
//!
//! A grammar is an XML document of `Macro` and `Check` elements; each
//! `Check` names an AST class and holds `Accept` / `Reject` rules, each
//! guarded by zero or more `Condition`s. [`grammar`] loads and
//! validates the document; [`engine`] interprets it against a parsed
//! file, emitting diagnostics.

pub mod engine;
pub mod grammar;

pub use engine::run;
pub use grammar::{Grammar, GrammarError};
