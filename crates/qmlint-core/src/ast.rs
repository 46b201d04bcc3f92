// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree definitions.
//!
//! Every node carries a [`Position`] (the start of its first token), an
//! optional parent back-link and an `is_parenthesized` flag that the
//! emitter preserves. Nodes live in a per-file arena ([`Ast`]); parent
//! links are arena indices, so the tree needs no reference counting and
//! dies with its file.
//!
//! # The members surface
//!
//! The rule engine never matches on Rust types. Each node exposes:
//!
//! - a *class tag* ([`Node::class_name`], e.g. `"PropertyAssignment"`),
//!   compared exactly against the grammar's `Class` attribute - there is
//!   no inheritance;
//! - a [`Node::members`] view of named child slots. Member names are the
//!   canonical slot names, lowercased; a leaf exposes its literal payload
//!   as the pseudo-member `value`.
//!
//! Members are introspection, not storage: the view is rebuilt on each
//! call from the node's own fields.

use std::collections::BTreeMap;

use ecow::EcoString;

use crate::source_analysis::Position;

/// Index of a node in its file's [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal value carried by a leaf node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(EcoString),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl Value {
    /// Returns the runtime type tag used by the grammar's `Type`
    /// predicate.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Integer(_) => "Integer",
            Self::Real(_) => "Real",
            Self::Bool(_) => "Bool",
        }
    }

    /// Returns the value as display text, without quoting.
    ///
    /// Whole reals keep a trailing `.0` so they stay reals through an
    /// emit/reparse cycle.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) if r.fract() == 0.0 && r.is_finite() => format!("{r:.1}"),
            Self::Real(r) => r.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// One entry of the [`Node::members`] view.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRef {
    /// The member is a child node.
    Node(NodeId),
    /// The member is a plain attribute with no node of its own; the
    /// engine reads it as a string.
    Attribute(Value),
}

/// A declared symbol: the declaring node and its usage count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    /// The declaring node (a `PropertyDeclaration`, a
    /// `VariableDeclaration`, or a parameter `Identifier`).
    pub node: NodeId,
    /// How many identifier uses resolved to this declaration.
    pub uses: u32,
}

impl SymbolEntry {
    /// Creates an entry with a zero usage count.
    #[must_use]
    pub const fn new(node: NodeId) -> Self {
        Self { node, uses: 0 }
    }
}

/// What a [`ComplexEntity`] represents in source, which the emitter
/// needs to reproduce the right delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexKind {
    /// A bare ordered sequence (parameter lists, argument lists,
    /// the file's top level, variable declaration groups).
    Sequence,
    /// A `{ … }` statement block.
    Block,
    /// A `[ … ]` array literal.
    Array,
    /// A `case X:` / `default:` clause; `name` holds the case
    /// expression, absent for `default`.
    Case,
}

/// An ordered sequence of child entities with an optional name.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexEntity {
    pub name: Option<NodeId>,
    pub contents: Vec<NodeId>,
    pub kind: ComplexKind,
}

/// An `import` statement: `import QtQuick 2.5 as QQ`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Module identifier or path string literal.
    pub name: NodeId,
    pub version: Option<NodeId>,
    pub alias: Option<NodeId>,
}

/// A declarative object: `Rectangle { … }`, `Behavior on x { … }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// The type name identifier.
    pub name: NodeId,
    /// Target of the `on` form. Emitted, but not a rule-visible member.
    pub on_target: Option<NodeId>,
    pub contents: Vec<NodeId>,
    /// Declared property names, with usage counts filled in by symbol
    /// resolution. Ordered by name so diagnostics are deterministic.
    pub properties: BTreeMap<EcoString, SymbolEntry>,
}

/// A property declaration (`property int count: 0`) or, with no type,
/// a property assignment (`width: 100`).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    /// Absent on assignments.
    pub type_name: Option<NodeId>,
    pub name: NodeId,
    pub content: Option<NodeId>,
    pub is_default: bool,
    pub is_readonly: bool,
}

/// A signal declaration: `signal clicked(int x, int y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDeclaration {
    pub name: NodeId,
    /// A `ComplexEntity` of typed parameters, when present.
    pub parameters: Option<NodeId>,
}

/// A single `var` declarator: `var x = 5`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: NodeId,
    pub content: Option<NodeId>,
}

/// A function declaration or function expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Absent on anonymous function expressions.
    pub name: Option<NodeId>,
    /// A `ComplexEntity` of parameter identifiers.
    pub parameters: NodeId,
    /// The statement block.
    pub content: NodeId,
    /// Local `var` declarations, by name, with usage counts.
    pub locals: BTreeMap<EcoString, SymbolEntry>,
    /// Parameters, by name, with usage counts.
    pub params: BTreeMap<EcoString, SymbolEntry>,
}

/// A call: `Math.max(a, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The callee (usually an `Identifier`, possibly dotted).
    pub name: NodeId,
    /// A `ComplexEntity` of argument expressions.
    pub parameters: NodeId,
}

/// An index or member access on a computed base: `list[i]`, `f().x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub array: NodeId,
    pub index: NodeId,
    /// True when this was written `base.member`; the index is then a
    /// string leaf and the emitter restores the dot form.
    pub is_dot: bool,
}

/// An `if` statement, or a ternary when the node kind is `Conditional`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: NodeId,
    pub then_branch: NodeId,
    pub else_branch: Option<NodeId>,
}

/// A classic `for` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub initialization: Option<NodeId>,
    pub condition: Option<NodeId>,
    pub incrementation: Option<NodeId>,
    pub content: Option<NodeId>,
}

/// A `for (x in e)` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ForIn {
    pub variable: NodeId,
    pub expression: NodeId,
    pub content: Option<NodeId>,
}

/// A `while` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: NodeId,
    pub content: Option<NodeId>,
}

/// A `switch` statement; `cases` is a `ComplexEntity` of case clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub expression: NodeId,
    pub cases: NodeId,
}

/// A `return` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub expression: Option<NodeId>,
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    LogicAnd,
    LogicOr,
    Equals,
    StrictEquals,
    NotEquals,
    StrictNotEquals,
    Lower,
    LowerEquals,
    Greater,
    GreaterEquals,
    Shl,
    Shr,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinaryOperator {
    /// Returns the source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::LogicAnd => "&&",
            Self::LogicOr => "||",
            Self::Equals => "==",
            Self::StrictEquals => "===",
            Self::NotEquals => "!=",
            Self::StrictNotEquals => "!==",
            Self::Lower => "<",
            Self::LowerEquals => "<=",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::ModAssign => "%=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::XorAssign => "^=",
            Self::ShrAssign => ">>=",
            Self::ShlAssign => "<<=",
        }
    }
}

/// A binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub left: NodeId,
    pub right: NodeId,
    pub operator: BinaryOperator,
}

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    DoubleNot,
    Complement,
    Increment,
    Decrement,
    Minus,
    Plus,
    Typeof,
    New,
}

impl UnaryOperator {
    /// Returns the source spelling. Word operators need a following
    /// space, which the emitter adds.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::DoubleNot => "!!",
            Self::Complement => "~",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Minus => "-",
            Self::Plus => "+",
            Self::Typeof => "typeof",
            Self::New => "new",
        }
    }
}

/// A unary operation; `is_postfix` distinguishes `i++` from `++i`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperation {
    pub operand: NodeId,
    pub operator: UnaryOperator,
    pub is_postfix: bool,
}

/// A `pragma` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Pragma {
    pub name: NodeId,
}

/// The node variant, holding variant-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A leaf literal.
    Entity(Value),
    /// A name; dotted chains (`anchors.fill`) collapse into one
    /// identifier whose text contains the dots.
    Identifier(EcoString),
    ComplexEntity(ComplexEntity),
    Import(Import),
    Item(Item),
    PropertyDeclaration(PropertyDeclaration),
    PropertyAssignment(PropertyDeclaration),
    SignalDeclaration(SignalDeclaration),
    VariableDeclaration(VariableDeclaration),
    Function(Function),
    FunctionCall(FunctionCall),
    ArrayAccess(ArrayAccess),
    If(If),
    Conditional(If),
    For(For),
    ForIn(ForIn),
    While(While),
    Switch(Switch),
    Return(Return),
    Break,
    Continue,
    BinaryOperation(BinaryOperation),
    UnaryOperation(UnaryOperation),
    Pragma(Pragma),
}

/// A node: kind plus the fields shared by every variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
    pub parent: Option<NodeId>,
    pub is_parenthesized: bool,
}

impl Node {
    /// Returns the class tag compared against the grammar's `Class`
    /// attribute. Exact match only; no inheritance.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Entity(_) => "Entity",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::ComplexEntity(_) => "ComplexEntity",
            NodeKind::Import(_) => "Import",
            NodeKind::Item(_) => "Item",
            NodeKind::PropertyDeclaration(_) => "PropertyDeclaration",
            NodeKind::PropertyAssignment(_) => "PropertyAssignment",
            NodeKind::SignalDeclaration(_) => "SignalDeclaration",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::Function(_) => "Function",
            NodeKind::FunctionCall(_) => "FunctionCall",
            NodeKind::ArrayAccess(_) => "ArrayAccess",
            NodeKind::If(_) => "If",
            NodeKind::Conditional(_) => "Conditional",
            NodeKind::For(_) => "For",
            NodeKind::ForIn(_) => "ForIn",
            NodeKind::While(_) => "While",
            NodeKind::Switch(_) => "Switch",
            NodeKind::Return(_) => "Return",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::BinaryOperation(_) => "BinaryOperation",
            NodeKind::UnaryOperation(_) => "UnaryOperation",
            NodeKind::Pragma(_) => "Pragma",
        }
    }

    /// Returns the literal payload, if this node carries one.
    ///
    /// Identifiers expose their name as a string value, which is what
    /// the `Type` predicate sees.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Entity(v) => Some(v.clone()),
            NodeKind::Identifier(name) => Some(Value::String(name.clone())),
            _ => None,
        }
    }

    /// Returns the members view: (lowercased slot name, member) pairs in
    /// source order.
    #[must_use]
    pub fn members(&self) -> Vec<(&'static str, MemberRef)> {
        fn push(members: &mut Vec<(&'static str, MemberRef)>, name: &'static str, id: NodeId) {
            members.push((name, MemberRef::Node(id)));
        }

        let mut members = Vec::new();
        let node = &mut members;
        match &self.kind {
            NodeKind::Entity(v) => {
                node.push(("value", MemberRef::Attribute(v.clone())));
            }
            NodeKind::Identifier(name) => {
                node.push(("value", MemberRef::Attribute(Value::String(name.clone()))));
            }
            NodeKind::ComplexEntity(complex) => {
                if let Some(name) = complex.name {
                    push(node, "name", name);
                }
            }
            NodeKind::Import(import) => {
                push(node, "name", import.name);
                if let Some(version) = import.version {
                    push(node, "version", version);
                }
                if let Some(alias) = import.alias {
                    push(node, "as", alias);
                }
            }
            NodeKind::Item(item) => {
                push(node, "name", item.name);
            }
            NodeKind::PropertyDeclaration(prop) | NodeKind::PropertyAssignment(prop) => {
                if let Some(type_name) = prop.type_name {
                    push(node, "type", type_name);
                }
                push(node, "name", prop.name);
                if let Some(content) = prop.content {
                    push(node, "content", content);
                }
            }
            NodeKind::SignalDeclaration(signal) => {
                push(node, "name", signal.name);
                if let Some(parameters) = signal.parameters {
                    push(node, "parameters", parameters);
                }
            }
            NodeKind::VariableDeclaration(var) => {
                push(node, "name", var.name);
                if let Some(content) = var.content {
                    push(node, "content", content);
                }
            }
            NodeKind::Function(function) => {
                if let Some(name) = function.name {
                    push(node, "name", name);
                }
                push(node, "parameters", function.parameters);
                push(node, "content", function.content);
            }
            NodeKind::FunctionCall(call) => {
                push(node, "name", call.name);
                push(node, "parameters", call.parameters);
            }
            NodeKind::ArrayAccess(access) => {
                push(node, "array", access.array);
                push(node, "index", access.index);
            }
            NodeKind::If(cond) | NodeKind::Conditional(cond) => {
                push(node, "condition", cond.condition);
                push(node, "then", cond.then_branch);
                if let Some(else_branch) = cond.else_branch {
                    push(node, "else", else_branch);
                }
            }
            NodeKind::For(for_loop) => {
                if let Some(init) = for_loop.initialization {
                    push(node, "initialization", init);
                }
                if let Some(condition) = for_loop.condition {
                    push(node, "condition", condition);
                }
                if let Some(inc) = for_loop.incrementation {
                    push(node, "incrementation", inc);
                }
                if let Some(content) = for_loop.content {
                    push(node, "content", content);
                }
            }
            NodeKind::ForIn(for_in) => {
                push(node, "variable", for_in.variable);
                push(node, "expression", for_in.expression);
                if let Some(content) = for_in.content {
                    push(node, "content", content);
                }
            }
            NodeKind::While(while_loop) => {
                push(node, "condition", while_loop.condition);
                if let Some(content) = while_loop.content {
                    push(node, "content", content);
                }
            }
            NodeKind::Switch(switch) => {
                push(node, "expression", switch.expression);
                push(node, "cases", switch.cases);
            }
            NodeKind::Return(ret) => {
                if let Some(expression) = ret.expression {
                    push(node, "expression", expression);
                }
            }
            NodeKind::Break | NodeKind::Continue => {}
            NodeKind::BinaryOperation(op) => {
                push(node, "left", op.left);
                push(node, "right", op.right);
            }
            NodeKind::UnaryOperation(op) => {
                push(node, "operand", op.operand);
            }
            NodeKind::Pragma(pragma) => {
                push(node, "name", pragma.name);
            }
        }
        members
    }
}

/// The arena owning every node of one parsed file.
///
/// The root owns all descendant nodes exclusively; destroying the arena
/// destroys the subtree. Parent links are maintained on insertion
/// ([`Ast::adopt`]) and cleared on removal ([`Ast::detach`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node with no parent.
    pub fn alloc(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            position,
            parent: None,
            is_parenthesized: false,
        });
        id
    }

    /// Returns the node for `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Returns the node for `id`, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Returns the number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sets `child`'s parent link to `parent`.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Returns the ordered contents of an `Item` or `ComplexEntity`,
    /// or an empty slice for any other variant.
    #[must_use]
    pub fn contents(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Item(item) => &item.contents,
            NodeKind::ComplexEntity(complex) => &complex.contents,
            _ => &[],
        }
    }

    /// Removes `child` from `parent`'s contents and clears its parent
    /// link. Does nothing if `child` is not in `parent`'s contents.
    ///
    /// The arena slot stays allocated but unreachable; it dies with the
    /// file.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) {
        let removed = match &mut self.nodes[parent.index()].kind {
            NodeKind::Item(item) => {
                let before = item.contents.len();
                item.contents.retain(|&c| c != child);
                item.contents.len() != before
            }
            NodeKind::ComplexEntity(complex) => {
                let before = complex.contents.len();
                complex.contents.retain(|&c| c != child);
                complex.contents.len() != before
            }
            _ => false,
        };
        if removed {
            self.nodes[child.index()].parent = None;
        }
    }

    /// Returns the display text of a node (the `toString` contract the
    /// rule engine compares against).
    ///
    /// String leaves are quoted; the engine strips the surrounding
    /// quotes before comparing, so literal strings compare cleanly
    /// against grammar values.
    #[must_use]
    pub fn display_string(&self, id: NodeId) -> String {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Entity(Value::String(s)) => format!("\"{s}\""),
            NodeKind::Entity(v) => v.to_text(),
            NodeKind::Identifier(name) => name.to_string(),
            NodeKind::ComplexEntity(complex) => complex
                .contents
                .iter()
                .map(|&c| self.display_string(c))
                .collect::<Vec<_>>()
                .join(", "),
            NodeKind::Import(import) => self.display_string(import.name),
            NodeKind::Item(item) => self.display_string(item.name),
            NodeKind::PropertyDeclaration(prop) | NodeKind::PropertyAssignment(prop) => {
                self.display_string(prop.name)
            }
            NodeKind::SignalDeclaration(signal) => self.display_string(signal.name),
            NodeKind::VariableDeclaration(var) => self.display_string(var.name),
            NodeKind::Function(function) => function
                .name
                .map(|name| self.display_string(name))
                .unwrap_or_default(),
            NodeKind::FunctionCall(call) => self.display_string(call.name),
            _ => String::new(),
        }
    }

    /// Returns declared properties of an `Item` that were never
    /// referenced, ordered by name.
    #[must_use]
    pub fn unused_properties(&self, item: NodeId) -> Vec<(EcoString, NodeId)> {
        match &self.node(item).kind {
            NodeKind::Item(item) => unused_of(&item.properties),
            _ => Vec::new(),
        }
    }

    /// Returns local variables of a `Function` that were never
    /// referenced, ordered by name.
    #[must_use]
    pub fn unused_variables(&self, function: NodeId) -> Vec<(EcoString, NodeId)> {
        match &self.node(function).kind {
            NodeKind::Function(function) => unused_of(&function.locals),
            _ => Vec::new(),
        }
    }

    /// Returns parameters of a `Function` that were never referenced,
    /// ordered by name.
    #[must_use]
    pub fn unused_parameters(&self, function: NodeId) -> Vec<(EcoString, NodeId)> {
        match &self.node(function).kind {
            NodeKind::Function(function) => unused_of(&function.params),
            _ => Vec::new(),
        }
    }

    /// Checks that every child's parent link points at its owner.
    /// Used by tests to enforce the tree invariant.
    #[must_use]
    pub fn parent_links_consistent(&self, root: NodeId) -> bool {
        let mut ok = true;
        crate::ast_walker::walk(self, root, &mut |id| {
            let node = self.node(id);
            for (_, member) in node.members() {
                if let MemberRef::Node(child) = member {
                    ok &= self.node(child).parent == Some(id);
                }
            }
            for &child in self.contents(id) {
                ok &= self.node(child).parent == Some(id);
            }
        });
        ok
    }
}

fn unused_of(symbols: &BTreeMap<EcoString, SymbolEntry>) -> Vec<(EcoString, NodeId)> {
    symbols
        .iter()
        .filter(|(_, entry)| entry.uses == 0)
        .map(|(name, entry)| (name.clone(), entry.node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(ast: &mut Ast, value: Value) -> NodeId {
        ast.alloc(NodeKind::Entity(value), Position::default())
    }

    #[test]
    fn class_names_are_exact_tags() {
        let mut ast = Ast::new();
        let id = leaf(&mut ast, Value::Integer(1));
        assert_eq!(ast.node(id).class_name(), "Entity");

        let ident = ast.alloc(NodeKind::Identifier("x".into()), Position::default());
        assert_eq!(ast.node(ident).class_name(), "Identifier");
    }

    #[test]
    fn members_are_lowercased_slot_names() {
        let mut ast = Ast::new();
        let left = leaf(&mut ast, Value::Integer(1));
        let right = leaf(&mut ast, Value::Integer(2));
        let op = ast.alloc(
            NodeKind::BinaryOperation(BinaryOperation {
                left,
                right,
                operator: BinaryOperator::Add,
            }),
            Position::default(),
        );
        let members = ast.node(op).members();
        let names: Vec<_> = members.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["left", "right"]);
    }

    #[test]
    fn leaf_exposes_value_attribute() {
        let mut ast = Ast::new();
        let id = leaf(&mut ast, Value::Bool(true));
        let members = ast.node(id).members();
        assert_eq!(members.len(), 1);
        assert!(
            matches!(&members[0], ("value", MemberRef::Attribute(Value::Bool(true))))
        );
    }

    #[test]
    fn display_string_quotes_string_leaves() {
        let mut ast = Ast::new();
        let s = leaf(&mut ast, Value::String("transparent".into()));
        assert_eq!(ast.display_string(s), "\"transparent\"");
        let i = leaf(&mut ast, Value::Integer(42));
        assert_eq!(ast.display_string(i), "42");
    }

    #[test]
    fn value_type_tags() {
        assert_eq!(Value::String("x".into()).type_name(), "String");
        assert_eq!(Value::Integer(1).type_name(), "Integer");
        assert_eq!(Value::Real(1.5).type_name(), "Real");
        assert_eq!(Value::Bool(false).type_name(), "Bool");
    }

    #[test]
    fn identifier_value_is_its_name() {
        let mut ast = Ast::new();
        let id = ast.alloc(NodeKind::Identifier("width".into()), Position::default());
        assert_eq!(ast.node(id).value(), Some(Value::String("width".into())));
    }

    #[test]
    fn adopt_and_detach_maintain_parent_links() {
        let mut ast = Ast::new();
        let child = leaf(&mut ast, Value::Integer(1));
        let parent = ast.alloc(
            NodeKind::ComplexEntity(ComplexEntity {
                name: None,
                contents: vec![child],
                kind: ComplexKind::Sequence,
            }),
            Position::default(),
        );
        ast.adopt(parent, child);
        assert_eq!(ast.node(child).parent, Some(parent));
        assert_eq!(ast.contents(parent), &[child]);

        ast.detach(parent, child);
        assert_eq!(ast.node(child).parent, None);
        assert!(ast.contents(parent).is_empty());
    }

    #[test]
    fn detach_of_non_child_is_a_no_op() {
        let mut ast = Ast::new();
        let a = leaf(&mut ast, Value::Integer(1));
        let b = leaf(&mut ast, Value::Integer(2));
        let parent = ast.alloc(
            NodeKind::ComplexEntity(ComplexEntity {
                name: None,
                contents: vec![a],
                kind: ComplexKind::Sequence,
            }),
            Position::default(),
        );
        ast.adopt(parent, a);
        ast.detach(parent, b);
        assert_eq!(ast.contents(parent), &[a]);
    }

    #[test]
    fn unused_queries_are_name_ordered() {
        let mut ast = Ast::new();
        let name = ast.alloc(NodeKind::Identifier("Item".into()), Position::default());
        let decl_b = leaf(&mut ast, Value::Integer(0));
        let decl_a = leaf(&mut ast, Value::Integer(0));
        let mut properties = BTreeMap::new();
        properties.insert(EcoString::from("beta"), SymbolEntry::new(decl_b));
        properties.insert(EcoString::from("alpha"), SymbolEntry::new(decl_a));
        properties.insert(
            EcoString::from("used"),
            SymbolEntry {
                node: decl_a,
                uses: 2,
            },
        );
        let item = ast.alloc(
            NodeKind::Item(Item {
                name,
                on_target: None,
                contents: Vec::new(),
                properties,
            }),
            Position::default(),
        );
        let unused = ast.unused_properties(item);
        let names: Vec<_> = unused.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
}
