// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Shared AST walker for analysis passes.
//!
//! Provides a pre-order depth-first walk over a node's member slots and,
//! for `Item`/`ComplexEntity`, its ordered contents. Members are visited
//! before contents, in declaration order, so diagnostics that follow the
//! walk come out in source order.
//!
//! Passes that need to prune subtrees (the rule engine) or thread scope
//! state through the traversal (reference resolution) keep their own
//! recursion; this walker covers the common visit-everything pattern.

use crate::ast::{Ast, MemberRef, NodeId};

/// Recursively walks the tree rooted at `id` in pre-order, calling `f`
/// on every node.
pub fn walk<F>(ast: &Ast, id: NodeId, f: &mut F)
where
    F: FnMut(NodeId),
{
    f(id);
    for (_, member) in ast.node(id).members() {
        if let MemberRef::Node(child) = member {
            walk(ast, child, f);
        }
    }
    for &child in ast.contents(id) {
        walk(ast, child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse;

    #[test]
    fn walk_visits_every_node_once() {
        let parsed = parse("Item { width: 1 + 2 }").expect("parse");
        let mut visited = Vec::new();
        walk(&parsed.ast, parsed.root, &mut |id| visited.push(id));

        let mut deduped = visited.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), visited.len(), "a node was visited twice");
    }

    #[test]
    fn walk_is_pre_order() {
        let parsed = parse("Item { }").expect("parse");
        let mut classes = Vec::new();
        walk(&parsed.ast, parsed.root, &mut |id| {
            classes.push(parsed.ast.node(id).class_name());
        });
        // Root sequence first, then the item, then its name identifier.
        assert_eq!(classes, vec!["ComplexEntity", "Item", "Identifier"]);
    }
}
