// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Symbol resolution.
//!
//! Runs once per file after a successful parse, in three sub-passes,
//! each a full walk of the AST:
//!
//! 1. **Declarations** - populate each `Item`'s property map and each
//!    `Function`'s local and parameter maps.
//! 2. **References** - resolve every identifier *use* against the
//!    enclosing scopes (innermost `Function` first, then the enclosing
//!    `Item` chain). Resolution is by name; shadowing is nearest-wins.
//!    Identifiers that do not resolve are silently ignored - there is
//!    no cross-file lookup.
//! 3. **Usage counts** - increment the count on each matched
//!    declaration.
//!
//! Only identifiers in expression position are uses: the name and type
//! slots of declarations and assignments never count, so a property
//! that is only ever assigned still shows up as unreferenced. Dotted
//! identifiers resolve through their first segment (`theme.primary`
//! is a use of `theme`).

use ecow::EcoString;

use crate::ast::{Ast, NodeId, NodeKind, SymbolEntry};

/// An identifier use resolved to a declaration.
///
/// `owner` is the `Item` or `Function` whose symbol table holds `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub owner: NodeId,
    pub name: EcoString,
}

/// Runs all three resolution passes over the tree rooted at `root`.
pub fn resolve(ast: &mut Ast, root: NodeId) {
    solve_declarations(ast, root);
    let references = solve_references(ast, root);
    apply_usages(ast, &references);
}

// ── Pass 1: declarations ────────────────────────────────────────────────────

/// Fills the symbol tables of every `Item` and `Function`.
pub fn solve_declarations(ast: &mut Ast, root: NodeId) {
    // Gather immutably first; the maps live inside the nodes being
    // walked.
    let mut item_decls: Vec<(NodeId, Vec<(EcoString, NodeId)>)> = Vec::new();
    let mut function_decls: Vec<(NodeId, Vec<(EcoString, NodeId)>, Vec<(EcoString, NodeId)>)> =
        Vec::new();

    crate::ast_walker::walk(ast, root, &mut |id| match &ast.node(id).kind {
        NodeKind::Item(item) => {
            let mut properties = Vec::new();
            for &child in &item.contents {
                if let NodeKind::PropertyDeclaration(prop) = &ast.node(child).kind {
                    if let NodeKind::Identifier(name) = &ast.node(prop.name).kind {
                        properties.push((name.clone(), child));
                    }
                }
            }
            item_decls.push((id, properties));
        }
        NodeKind::Function(function) => {
            let mut params = Vec::new();
            for &param in ast.contents(function.parameters) {
                if let NodeKind::Identifier(name) = &ast.node(param).kind {
                    params.push((name.clone(), param));
                }
            }
            let mut locals = Vec::new();
            collect_locals(ast, function.content, &mut locals);
            function_decls.push((id, locals, params));
        }
        _ => {}
    });

    for (id, properties) in item_decls {
        if let NodeKind::Item(item) = &mut ast.node_mut(id).kind {
            for (name, declaration) in properties {
                item.properties.insert(name, SymbolEntry::new(declaration));
            }
        }
    }
    for (id, locals, params) in function_decls {
        if let NodeKind::Function(function) = &mut ast.node_mut(id).kind {
            for (name, declaration) in locals {
                function.locals.insert(name, SymbolEntry::new(declaration));
            }
            for (name, declaration) in params {
                function.params.insert(name, SymbolEntry::new(declaration));
            }
        }
    }
}

/// Collects `var` declarations in a function body, without descending
/// into nested functions - their locals are their own.
fn collect_locals(ast: &Ast, id: NodeId, out: &mut Vec<(EcoString, NodeId)>) {
    let node = ast.node(id);
    if let NodeKind::Function(_) = node.kind {
        return;
    }
    if let NodeKind::VariableDeclaration(var) = &node.kind {
        if let NodeKind::Identifier(name) = &ast.node(var.name).kind {
            out.push((name.clone(), id));
        }
    }
    for (_, member) in node.members() {
        if let crate::ast::MemberRef::Node(child) = member {
            collect_locals(ast, child, out);
        }
    }
    for &child in ast.contents(id) {
        collect_locals(ast, child, out);
    }
}

// ── Pass 2: references ──────────────────────────────────────────────────────

/// Resolves every identifier use to its nearest enclosing declaration.
#[must_use]
pub fn solve_references(ast: &Ast, root: NodeId) -> Vec<Reference> {
    let mut references = Vec::new();
    let mut scopes = Vec::new();
    visit(ast, root, &mut scopes, &mut references);
    references
}

/// Scope-aware walk. Recurses only into expression-bearing slots, so
/// declaration names and types are never counted as uses.
fn visit(ast: &Ast, id: NodeId, scopes: &mut Vec<NodeId>, out: &mut Vec<Reference>) {
    let node = ast.node(id);
    match &node.kind {
        NodeKind::Identifier(name) => {
            let first_segment = name.split('.').next().unwrap_or(name);
            if let Some(owner) = lookup(ast, scopes, first_segment) {
                out.push(Reference {
                    owner,
                    name: first_segment.into(),
                });
            }
        }
        NodeKind::Entity(_)
        | NodeKind::Import(_)
        | NodeKind::SignalDeclaration(_)
        | NodeKind::Pragma(_)
        | NodeKind::Break
        | NodeKind::Continue => {}
        NodeKind::Item(item) => {
            scopes.push(id);
            for &child in &item.contents {
                visit(ast, child, scopes, out);
            }
            scopes.pop();
        }
        NodeKind::Function(function) => {
            scopes.push(id);
            visit(ast, function.content, scopes, out);
            scopes.pop();
        }
        NodeKind::PropertyDeclaration(prop) | NodeKind::PropertyAssignment(prop) => {
            if let Some(content) = prop.content {
                visit(ast, content, scopes, out);
            }
        }
        NodeKind::VariableDeclaration(var) => {
            if let Some(content) = var.content {
                visit(ast, content, scopes, out);
            }
        }
        NodeKind::ForIn(for_in) => {
            // The loop variable is a binding, not a use, when declared
            // with `var`; a bare identifier target is a use.
            if !matches!(
                ast.node(for_in.variable).kind,
                NodeKind::VariableDeclaration(_)
            ) {
                visit(ast, for_in.variable, scopes, out);
            }
            visit(ast, for_in.expression, scopes, out);
            if let Some(content) = for_in.content {
                visit(ast, content, scopes, out);
            }
        }
        NodeKind::ComplexEntity(complex) => {
            if let Some(name) = complex.name {
                visit(ast, name, scopes, out);
            }
            for &child in &complex.contents {
                visit(ast, child, scopes, out);
            }
        }
        _ => {
            for (_, member) in node.members() {
                if let crate::ast::MemberRef::Node(child) = member {
                    visit(ast, child, scopes, out);
                }
            }
        }
    }
}

/// Finds the nearest enclosing scope declaring `name`: function locals,
/// then its parameters, then the item chain outward.
fn lookup(ast: &Ast, scopes: &[NodeId], name: &str) -> Option<NodeId> {
    for &scope in scopes.iter().rev() {
        match &ast.node(scope).kind {
            NodeKind::Function(function) => {
                if function.locals.contains_key(name) || function.params.contains_key(name) {
                    return Some(scope);
                }
            }
            NodeKind::Item(item) => {
                if item.properties.contains_key(name) {
                    return Some(scope);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Pass 3: usage counts ────────────────────────────────────────────────────

/// Increments the usage count of each resolved declaration.
pub fn apply_usages(ast: &mut Ast, references: &[Reference]) {
    for reference in references {
        match &mut ast.node_mut(reference.owner).kind {
            NodeKind::Function(function) => {
                if let Some(entry) = function.locals.get_mut(&reference.name) {
                    entry.uses += 1;
                } else if let Some(entry) = function.params.get_mut(&reference.name) {
                    entry.uses += 1;
                }
            }
            NodeKind::Item(item) => {
                if let Some(entry) = item.properties.get_mut(&reference.name) {
                    entry.uses += 1;
                }
            }
            _ => {}
        }
    }
}

// ── Unused-symbol removal ───────────────────────────────────────────────────

/// Detaches every unreferenced property and local variable declaration
/// from the tree. Parameters are left alone - removing one would change
/// the function's call signature.
pub fn remove_unused_symbols(ast: &mut Ast, root: NodeId) {
    let mut doomed = Vec::new();
    crate::ast_walker::walk(ast, root, &mut |id| match ast.node(id).kind {
        NodeKind::Item(_) => {
            for (_, declaration) in ast.unused_properties(id) {
                doomed.push(declaration);
            }
        }
        NodeKind::Function(_) => {
            for (_, declaration) in ast.unused_variables(id) {
                doomed.push(declaration);
            }
        }
        _ => {}
    });

    for declaration in doomed {
        if let Some(parent) = ast.node(declaration).parent {
            ast.detach(parent, declaration);
        }
    }
}
