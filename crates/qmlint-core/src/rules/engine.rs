// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Rule evaluation against a parsed file.
//!
//! The engine walks the AST depth-first. At each node it first emits
//! the built-in unused-symbol diagnostics, then evaluates every `Check`
//! whose class matches the node - `Reject` rules before `Accept` rules,
//! in document order. A fired rule prunes the subtree: neither members
//! nor contents are visited. A firing `Accept` prunes exactly like a
//! firing `Reject`; counterintuitive, but grammars depend on it.
//!
//! Both rule kinds share one evaluation path, parameterized by an
//! inverse-logic flag that XORs the final comparison: `Reject` emits
//! when the predicate holds, `Accept` emits when it does not.

use camino::{Utf8Path, Utf8PathBuf};

use super::grammar::{Condition, Grammar, Operation, Predicate, Rule, RuleKind};
use crate::ast::{Ast, MemberRef, NodeId, NodeKind};
use crate::context::{Diagnostic, DiagnosticKind};
use crate::source_analysis::Position;

/// Runs `grammar` over the file rooted at `root`, appending diagnostics.
///
/// `path` is used for diagnostic locations, the `filename` pseudo-member
/// and `Path="Exists"` resolution.
pub fn run(
    grammar: &Grammar,
    path: &Utf8Path,
    ast: &Ast,
    root: NodeId,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let directory = path.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
    let engine = Engine {
        grammar,
        path,
        directory,
        ast,
    };
    for &child in ast.contents(root) {
        engine.check_node(child, diagnostics);
    }
}

struct Engine<'a> {
    grammar: &'a Grammar,
    path: &'a Utf8Path,
    directory: Utf8PathBuf,
    ast: &'a Ast,
}

impl Engine<'_> {
    fn check_node(&self, id: NodeId, diagnostics: &mut Vec<Diagnostic>) {
        let node = self.ast.node(id);

        // Built-in unused-symbol rules, at the declaration's position.
        match node.kind {
            NodeKind::Item(_) => {
                for (_, declaration) in self.ast.unused_properties(id) {
                    self.emit(
                        DiagnosticKind::UnusedSymbol,
                        self.ast.node(declaration).position,
                        "Unreferenced property",
                        diagnostics,
                    );
                }
            }
            NodeKind::Function(_) => {
                for (_, declaration) in self.ast.unused_variables(id) {
                    self.emit(
                        DiagnosticKind::UnusedSymbol,
                        self.ast.node(declaration).position,
                        "Unreferenced variable",
                        diagnostics,
                    );
                }
                for (_, declaration) in self.ast.unused_parameters(id) {
                    self.emit(
                        DiagnosticKind::UnusedSymbol,
                        self.ast.node(declaration).position,
                        "Unreferenced parameter",
                        diagnostics,
                    );
                }
            }
            _ => {}
        }

        let mut any_fired = false;
        let class = node.class_name();
        for check in self.grammar.checks.iter().filter(|c| c.class == class) {
            for rule in check.rules.iter().filter(|r| r.kind == RuleKind::Reject) {
                if self.evaluate(rule, id, false, diagnostics) {
                    any_fired = true;
                }
            }
            for rule in check.rules.iter().filter(|r| r.kind == RuleKind::Accept) {
                if self.evaluate(rule, id, true, diagnostics) {
                    any_fired = true;
                }
            }
        }

        if any_fired {
            return; // prune the subtree
        }
        for (_, member) in node.members() {
            if let MemberRef::Node(child) = member {
                self.check_node(child, diagnostics);
            }
        }
        for &child in self.ast.contents(id) {
            self.check_node(child, diagnostics);
        }
    }

    /// Evaluates one rule; returns true (and emits) when it fired.
    fn evaluate(
        &self,
        rule: &Rule,
        id: NodeId,
        inverse: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        if !self.conditions_pass(rule, id) {
            return false;
        }

        let node = self.ast.node(id);

        // NestedCount works on the node itself, not on a member.
        if let Predicate::NestedCount(limit) = rule.predicate {
            let depth = self.count_nested(node.class_name(), id);
            if (depth > limit) ^ inverse {
                self.emit(DiagnosticKind::RuleViolation, node.position, &rule.text, diagnostics);
                return true;
            }
            return false;
        }

        let Some(member) = self.lookup_member(id, &rule.member) else {
            return false;
        };
        let text = strip_quotes(&self.member_text(&member)).to_string();

        let fired = match &rule.predicate {
            Predicate::NestedCount(_) => false, // handled above

            Predicate::List(values) => values.iter().any(|v| v.as_str() == text) ^ inverse,
            Predicate::Class(class) => (self.member_class(&member) == class.as_str()) ^ inverse,
            Predicate::PathExists => {
                let resolved = self.directory.join(&text);
                resolved.as_std_path().exists() ^ inverse
            }
            Predicate::RegExp(regex) => {
                if text.is_empty() {
                    return false;
                }
                regex.is_match(&text) ^ inverse
            }
            Predicate::Count(limit) => match member {
                MemberRef::Node(child)
                    if matches!(
                        self.ast.node(child).kind,
                        NodeKind::ComplexEntity(_) | NodeKind::Item(_)
                    ) =>
                {
                    (self.ast.contents(child).len() as i64 > *limit) ^ inverse
                }
                _ => return false,
            },
            Predicate::Type(type_name) => {
                let value = match &member {
                    MemberRef::Node(child) => self.ast.node(*child).value(),
                    MemberRef::Attribute(value) => Some(value.clone()),
                };
                let Some(value) = value else {
                    return false;
                };
                (value.type_name() == type_name.as_str()) ^ inverse
            }
            Predicate::Value(expected) => (text == expected.as_str()) ^ inverse,
        };

        if fired {
            self.emit(DiagnosticKind::RuleViolation, node.position, &rule.text, diagnostics);
        }
        fired
    }

    /// All conditions must pass for the rule to run.
    fn conditions_pass(&self, rule: &Rule, id: NodeId) -> bool {
        rule.conditions
            .iter()
            .all(|condition| self.condition_passes(condition, id))
    }

    fn condition_passes(&self, condition: &Condition, id: NodeId) -> bool {
        if let Some(member) = self.lookup_member(id, &condition.member) {
            let text = strip_quotes(&self.member_text(&member)).to_string();
            if let Some(value) = &condition.value {
                return (text == value.as_str()) ^ condition.negate;
            }
            if let Some(empty) = &condition.empty {
                return text.is_empty() == (empty.as_str() == "true");
            }
            return true;
        }

        // No such member on this node.
        if condition.member == "filename" {
            let value = condition.value.as_deref().unwrap_or_default();
            let matched = match condition.operation {
                Operation::Contains => self.path.as_str().contains(value),
                Operation::Equals => self.path.as_str() == value,
            };
            return matched ^ condition.negate;
        }
        // A missing member fails the condition unless `Empty` is set
        // and not "true".
        matches!(&condition.empty, Some(empty) if empty.as_str() != "true")
    }

    fn lookup_member(&self, id: NodeId, name: &str) -> Option<MemberRef> {
        self.ast
            .node(id)
            .members()
            .into_iter()
            .find(|(member_name, _)| *member_name == name)
            .map(|(_, member)| member)
    }

    fn member_text(&self, member: &MemberRef) -> String {
        match member {
            MemberRef::Node(child) => self.ast.display_string(*child),
            MemberRef::Attribute(value) => value.to_text(),
        }
    }

    fn member_class(&self, member: &MemberRef) -> &'static str {
        match member {
            MemberRef::Node(child) => self.ast.node(*child).class_name(),
            // A plain attribute is the leaf's own payload.
            MemberRef::Attribute(_) => "Entity",
        }
    }

    /// Deepest chain of `class`-tagged nodes within the subtree at `id`.
    fn count_nested(&self, class: &str, id: NodeId) -> i64 {
        let node = self.ast.node(id);
        let mut deepest = 0;
        for (_, member) in node.members() {
            if let MemberRef::Node(child) = member {
                deepest = deepest.max(self.count_nested(class, child));
            }
        }
        for &child in self.ast.contents(id) {
            deepest = deepest.max(self.count_nested(class, child));
        }
        if node.class_name() == class {
            deepest += 1;
        }
        deepest
    }

    fn emit(
        &self,
        kind: DiagnosticKind,
        position: Position,
        text: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        diagnostics.push(Diagnostic::new(kind, self.path.to_path_buf(), position, text));
    }
}

/// Strips one surrounding pair of double quotes, so string literals
/// compare cleanly against grammar values.
fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
