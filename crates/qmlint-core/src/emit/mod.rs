// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Source emission: AST back to formatted text.
//!
//! The emitter produces canonical source for each node variant,
//! honoring `is_parenthesized` and a four-space indentation level.
//! Formatting beyond that canonical layout is the job of an external
//! [`Beautifier`] collaborator, a pure string-in/string-out step the
//! rewrite pipeline applies after emission.

use std::fmt::Write as _;

use crate::ast::{Ast, ComplexKind, NodeId, NodeKind, Value};

/// An external text-transformation step applied to emitted source.
pub trait Beautifier {
    /// Transforms emitted source into its final form.
    fn beautify(&self, source: String) -> String;
}

/// A [`Beautifier`] that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBeautifier;

impl Beautifier for PassthroughBeautifier {
    fn beautify(&self, source: String) -> String {
        source
    }
}

const INDENT: &str = "    ";

/// Emits the whole file rooted at `root`.
#[must_use]
pub fn to_source(ast: &Ast, root: NodeId) -> String {
    let mut out = String::new();
    let top_level = ast.contents(root);
    let mut previous_was_import = false;
    for (index, &child) in top_level.iter().enumerate() {
        let is_import = matches!(
            ast.node(child).kind,
            NodeKind::Import(_) | NodeKind::Pragma(_)
        );
        if index > 0 && previous_was_import && !is_import {
            out.push('\n');
        }
        emit(ast, child, 0, &mut out);
        out.push('\n');
        previous_was_import = is_import;
    }
    out
}

/// Emits one node. Statement-level layout (indentation, line breaks) is
/// handled by the container emitters; `emit` itself writes no leading
/// indent.
fn emit(ast: &Ast, id: NodeId, indent: usize, out: &mut String) {
    let node = ast.node(id);
    if node.is_parenthesized {
        out.push('(');
    }
    match &node.kind {
        NodeKind::Entity(value) => emit_value(value, out),
        NodeKind::Identifier(name) => out.push_str(name),
        NodeKind::ComplexEntity(complex) => match complex.kind {
            ComplexKind::Sequence => emit_sequence(ast, &complex.contents, indent, out),
            ComplexKind::Block => emit_block(ast, &complex.contents, indent, out),
            ComplexKind::Array => {
                out.push('[');
                emit_comma_separated(ast, &complex.contents, indent, out);
                out.push(']');
            }
            ComplexKind::Case => {
                match complex.name {
                    Some(label) => {
                        out.push_str("case ");
                        emit(ast, label, indent, out);
                        out.push(':');
                    }
                    None => out.push_str("default:"),
                }
                for &statement in &complex.contents {
                    out.push('\n');
                    push_indent(indent + 1, out);
                    emit(ast, statement, indent + 1, out);
                }
            }
        },
        NodeKind::Import(import) => {
            out.push_str("import ");
            emit(ast, import.name, indent, out);
            if let Some(version) = import.version {
                out.push(' ');
                emit(ast, version, indent, out);
            }
            if let Some(alias) = import.alias {
                out.push_str(" as ");
                emit(ast, alias, indent, out);
            }
        }
        NodeKind::Pragma(pragma) => {
            out.push_str("pragma ");
            emit(ast, pragma.name, indent, out);
        }
        NodeKind::Item(item) => {
            emit(ast, item.name, indent, out);
            if let Some(target) = item.on_target {
                out.push_str(" on ");
                emit(ast, target, indent, out);
            }
            out.push_str(" {");
            for &child in &item.contents {
                out.push('\n');
                push_indent(indent + 1, out);
                emit(ast, child, indent + 1, out);
            }
            out.push('\n');
            push_indent(indent, out);
            out.push('}');
        }
        NodeKind::PropertyDeclaration(prop) => {
            if prop.is_default {
                out.push_str("default ");
            }
            if prop.is_readonly {
                out.push_str("readonly ");
            }
            out.push_str("property ");
            if let Some(type_name) = prop.type_name {
                emit(ast, type_name, indent, out);
                out.push(' ');
            }
            emit(ast, prop.name, indent, out);
            if let Some(content) = prop.content {
                out.push_str(": ");
                emit(ast, content, indent, out);
            }
        }
        NodeKind::PropertyAssignment(prop) => {
            emit(ast, prop.name, indent, out);
            out.push_str(": ");
            if let Some(content) = prop.content {
                emit(ast, content, indent, out);
            }
        }
        NodeKind::SignalDeclaration(signal) => {
            out.push_str("signal ");
            emit(ast, signal.name, indent, out);
            if let Some(parameters) = signal.parameters {
                out.push('(');
                let params = ast.contents(parameters);
                for (index, &param) in params.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    // Typed parameters emit as `type name`, without the
                    // `property` keyword of their node form.
                    if let NodeKind::PropertyDeclaration(decl) = &ast.node(param).kind {
                        if let Some(type_name) = decl.type_name {
                            emit(ast, type_name, indent, out);
                            out.push(' ');
                        }
                        emit(ast, decl.name, indent, out);
                    } else {
                        emit(ast, param, indent, out);
                    }
                }
                out.push(')');
            }
        }
        NodeKind::VariableDeclaration(_) => {
            out.push_str("var ");
            emit_declarator(ast, id, indent, out);
        }
        NodeKind::Function(function) => {
            out.push_str("function");
            if let Some(name) = function.name {
                out.push(' ');
                emit(ast, name, indent, out);
            }
            out.push('(');
            emit_comma_separated(ast, ast.contents(function.parameters), indent, out);
            out.push_str(") ");
            emit(ast, function.content, indent, out);
        }
        NodeKind::FunctionCall(call) => {
            emit(ast, call.name, indent, out);
            out.push('(');
            emit_comma_separated(ast, ast.contents(call.parameters), indent, out);
            out.push(')');
        }
        NodeKind::ArrayAccess(access) => {
            emit(ast, access.array, indent, out);
            if access.is_dot {
                out.push('.');
                if let NodeKind::Entity(Value::String(member)) = &ast.node(access.index).kind {
                    out.push_str(member);
                }
            } else {
                out.push('[');
                emit(ast, access.index, indent, out);
                out.push(']');
            }
        }
        NodeKind::If(cond) => {
            out.push_str("if (");
            emit(ast, cond.condition, indent, out);
            out.push_str(") ");
            emit(ast, cond.then_branch, indent, out);
            if let Some(else_branch) = cond.else_branch {
                out.push_str(" else ");
                emit(ast, else_branch, indent, out);
            }
        }
        NodeKind::Conditional(cond) => {
            emit(ast, cond.condition, indent, out);
            out.push_str(" ? ");
            emit(ast, cond.then_branch, indent, out);
            out.push_str(" : ");
            if let Some(else_branch) = cond.else_branch {
                emit(ast, else_branch, indent, out);
            }
        }
        NodeKind::For(for_loop) => {
            out.push_str("for (");
            if let Some(init) = for_loop.initialization {
                emit(ast, init, indent, out);
            }
            out.push_str("; ");
            if let Some(condition) = for_loop.condition {
                emit(ast, condition, indent, out);
            }
            out.push_str("; ");
            if let Some(inc) = for_loop.incrementation {
                emit(ast, inc, indent, out);
            }
            out.push(')');
            emit_loop_body(ast, for_loop.content, indent, out);
        }
        NodeKind::ForIn(for_in) => {
            out.push_str("for (");
            emit(ast, for_in.variable, indent, out);
            out.push_str(" in ");
            emit(ast, for_in.expression, indent, out);
            out.push(')');
            emit_loop_body(ast, for_in.content, indent, out);
        }
        NodeKind::While(while_loop) => {
            out.push_str("while (");
            emit(ast, while_loop.condition, indent, out);
            out.push(')');
            emit_loop_body(ast, while_loop.content, indent, out);
        }
        NodeKind::Switch(switch) => {
            out.push_str("switch (");
            emit(ast, switch.expression, indent, out);
            out.push_str(") {");
            for &clause in ast.contents(switch.cases) {
                out.push('\n');
                push_indent(indent + 1, out);
                emit(ast, clause, indent + 1, out);
            }
            out.push('\n');
            push_indent(indent, out);
            out.push('}');
        }
        NodeKind::Return(ret) => {
            out.push_str("return");
            if let Some(expression) = ret.expression {
                out.push(' ');
                emit(ast, expression, indent, out);
            }
        }
        NodeKind::Break => out.push_str("break"),
        NodeKind::Continue => out.push_str("continue"),
        NodeKind::BinaryOperation(op) => {
            emit(ast, op.left, indent, out);
            let _ = write!(out, " {} ", op.operator.as_str());
            emit(ast, op.right, indent, out);
        }
        NodeKind::UnaryOperation(op) => {
            if op.is_postfix {
                emit(ast, op.operand, indent, out);
                out.push_str(op.operator.as_str());
            } else {
                out.push_str(op.operator.as_str());
                if matches!(
                    op.operator,
                    crate::ast::UnaryOperator::Typeof | crate::ast::UnaryOperator::New
                ) {
                    out.push(' ');
                }
                emit(ast, op.operand, indent, out);
            }
        }
    }
    if node.is_parenthesized {
        out.push(')');
    }
}

fn emit_value(value: &Value, out: &mut String) {
    match value {
        Value::String(text) => {
            out.push('"');
            for c in text.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
        other => out.push_str(&other.to_text()),
    }
}

/// A bare sequence. Groups of `var` declarators re-form a single `var`
/// statement; anything else joins with commas.
fn emit_sequence(ast: &Ast, contents: &[NodeId], indent: usize, out: &mut String) {
    let all_vars = !contents.is_empty()
        && contents
            .iter()
            .all(|&c| matches!(ast.node(c).kind, NodeKind::VariableDeclaration(_)));
    if all_vars {
        out.push_str("var ");
        for (index, &declaration) in contents.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            emit_declarator(ast, declaration, indent, out);
        }
    } else {
        emit_comma_separated(ast, contents, indent, out);
    }
}

/// The `name = content` part of a `var` declaration.
fn emit_declarator(ast: &Ast, id: NodeId, indent: usize, out: &mut String) {
    if let NodeKind::VariableDeclaration(var) = &ast.node(id).kind {
        emit(ast, var.name, indent, out);
        if let Some(content) = var.content {
            out.push_str(" = ");
            emit(ast, content, indent, out);
        }
    }
}

fn emit_block(ast: &Ast, statements: &[NodeId], indent: usize, out: &mut String) {
    out.push('{');
    for &statement in statements {
        out.push('\n');
        push_indent(indent + 1, out);
        emit(ast, statement, indent + 1, out);
    }
    out.push('\n');
    push_indent(indent, out);
    out.push('}');
}

fn emit_loop_body(ast: &Ast, content: Option<NodeId>, indent: usize, out: &mut String) {
    match content {
        Some(body) => {
            out.push(' ');
            emit(ast, body, indent, out);
        }
        None => out.push(';'),
    }
}

fn emit_comma_separated(ast: &Ast, contents: &[NodeId], indent: usize, out: &mut String) {
    for (index, &child) in contents.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        emit(ast, child, indent, out);
    }
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse;

    fn emit_source(source: &str) -> String {
        let parsed = parse(source).expect("parse");
        to_source(&parsed.ast, parsed.root)
    }

    #[test]
    fn emits_imports_and_items() {
        let out = emit_source("import QtQuick 2.5 as QQ\nItem { width: 100 }");
        assert_eq!(
            out,
            "import QtQuick 2.5 as QQ\n\nItem {\n    width: 100\n}\n"
        );
    }

    #[test]
    fn emits_string_imports_quoted() {
        let out = emit_source("import \"components\"\nItem { }");
        assert!(out.starts_with("import \"components\"\n"));
    }

    #[test]
    fn emits_property_declarations_with_flags() {
        let out = emit_source("Item { default property alias inner: a\nreadonly property int n: 1 }");
        assert!(out.contains("default property alias inner: a"));
        assert!(out.contains("readonly property int n: 1"));
    }

    #[test]
    fn parenthesized_flag_is_preserved() {
        let out = emit_source("Item { width: (1 + 2) * 3 }");
        assert!(out.contains("(1 + 2) * 3"), "output was: {out}");
    }

    #[test]
    fn emits_functions_with_statements() {
        let out = emit_source("Item { function f(a, b) { var sum = a + b; return sum } }");
        assert!(out.contains("function f(a, b) {"), "output was: {out}");
        assert!(out.contains("var sum = a + b"));
        assert!(out.contains("return sum"));
    }

    #[test]
    fn emits_signal_parameter_types() {
        let out = emit_source("Item { signal moved(int x, int y) }");
        assert!(out.contains("signal moved(int x, int y)"), "output was: {out}");
    }

    #[test]
    fn emits_control_flow() {
        let out = emit_source(
            "Item { function f(x) { if (x > 0) { x-- } else { x++ }\nwhile (x) { break } } }",
        );
        assert!(out.contains("if (x > 0) {"), "output was: {out}");
        assert!(out.contains("} else {"));
        assert!(out.contains("while (x) {"));
        assert!(out.contains("break"));
    }

    #[test]
    fn emits_dot_and_index_access() {
        let out = emit_source("Item { width: list[0] + f().size }");
        assert!(out.contains("list[0] + f().size"), "output was: {out}");
    }

    #[test]
    fn real_literals_keep_their_decimal_point() {
        let out = emit_source("Item { scale: 1.0 }");
        assert!(out.contains("scale: 1.0"), "output was: {out}");
    }

    #[test]
    fn round_trip_is_structurally_idempotent() {
        let source = "import QtQuick 2.5\n\
            Item {\n\
                property int count: 0\n\
                signal done(int code)\n\
                width: (count + 1) * 2\n\
                anchors.fill: parent\n\
                function tally(items) {\n\
                    var total = 0\n\
                    for (var i = 0; i < items.length; i++) { total += items[i] }\n\
                    return total\n\
                }\n\
                Behavior on opacity { }\n\
                Rectangle { color: \"red\" }\n\
            }\n";
        let first = parse(source).expect("first parse");
        let emitted = to_source(&first.ast, first.root);
        let second = parse(&emitted).expect("emitted source must reparse");
        let re_emitted = to_source(&second.ast, second.root);
        assert_eq!(emitted, re_emitted, "emission must be a fixed point");
    }

    #[test]
    fn passthrough_beautifier_is_identity() {
        let source = String::from("Item {\n}\n");
        assert_eq!(PassthroughBeautifier.beautify(source.clone()), source);
    }
}
