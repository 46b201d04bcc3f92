// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for declarative-UI source.
//!
//! The parser is driven by a single token of lookahead; the grammar
//! lives in the code, there is no generated parser. It builds nodes
//! directly into the file's [`Ast`] arena, wiring parent links as it
//! goes.
//!
//! # Error Handling
//!
//! The first unexpected token is terminal for the file: the parser
//! returns a [`SyntaxError`] carrying the current position and no AST is
//! produced. Other files in a batch are unaffected. This is a batch
//! analyzer, not an IDE - there is no recovery and no partial tree.
//!
//! # Statement Termination
//!
//! Semicolons are optional. An expression statement ends when the next
//! token cannot continue the expression; call, index and postfix
//! `++`/`--` operators additionally require the token to sit on the
//! same line as what it follows, so consecutive unterminated statements
//! do not glue together.

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::{lex_with_eof, Keyword, Operator, Position, Token, TokenKind};
use crate::ast::{
    ArrayAccess, Ast, BinaryOperation, BinaryOperator, ComplexEntity, ComplexKind, For, ForIn,
    Function, FunctionCall, If, Import, Item, NodeId, NodeKind, Pragma, PropertyDeclaration,
    Return, SignalDeclaration, Switch, UnaryOperation, UnaryOperator, Value, VariableDeclaration,
    While,
};

/// A syntax error, terminal for the file being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(qmlint::parse::syntax_error))]
pub struct SyntaxError {
    /// Position of the offending token.
    pub position: Position,
    /// Human-readable description.
    pub message: EcoString,
}

/// The result of successfully parsing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    /// Arena owning every node of the file.
    pub ast: Ast,
    /// The root entity: a `ComplexEntity` of top-level imports, pragmas,
    /// items and statements.
    pub root: NodeId,
    /// The `Import` nodes, in source order.
    pub imports: Vec<NodeId>,
}

/// Parses `source` into an AST.
///
/// # Errors
///
/// Returns a [`SyntaxError`] at the first unexpected token; no partial
/// tree is produced.
///
/// # Examples
///
/// ```
/// use qmlint_core::source_analysis::parse;
///
/// let parsed = parse("Item { width: 100 }").unwrap();
/// assert_eq!(parsed.ast.node(parsed.root).class_name(), "ComplexEntity");
/// ```
pub fn parse(source: &str) -> Result<ParsedSource, SyntaxError> {
    let mut parser = Parser::new(lex_with_eof(source));
    let (root, imports) = parser.parse_file()?;
    Ok(ParsedSource {
        ast: parser.ast,
        root,
        imports,
    })
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    ast: Ast,
}

type Parse<T> = Result<T, SyntaxError>;

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.last().is_some_and(|t| t.kind().is_eof()));
        Self {
            tokens,
            current: 0,
            ast: Ast::new(),
        }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    fn current_token(&self) -> &Token {
        self.tokens
            .get(self.current)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    fn position(&self) -> Position {
        self.current_token().position()
    }

    fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.current + 1)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
            .kind()
    }

    fn is_at_end(&self) -> bool {
        self.current_kind().is_eof()
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    /// True when the current token is on the same line as the previous
    /// one, i.e. it can continue a postfix chain.
    fn continues_line(&self) -> bool {
        self.current > 0
            && self.current < self.tokens.len()
            && self.tokens[self.current].position().line()
                == self.tokens[self.current - 1].position().line()
    }

    fn check_punct(&self, c: char) -> bool {
        matches!(self.current_kind(), TokenKind::Punct(p) if *p == c)
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.current_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn check_operator(&self, op: Operator) -> bool {
        matches!(self.current_kind(), TokenKind::Operator(o) if *o == op)
    }

    fn match_punct(&mut self, c: char) -> bool {
        if self.check_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<EcoString>) -> SyntaxError {
        SyntaxError {
            position: self.position(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        self.error(ecow::eco_format!(
            "expected {expected}, found '{}'",
            self.current_kind()
        ))
    }

    fn expect_punct(&mut self, c: char, expected: &str) -> Parse<Token> {
        if self.check_punct(c) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Parse<(EcoString, Position)> {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let position = self.position();
                self.advance();
                Ok((name, position))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn mk_identifier(&mut self, name: EcoString, position: Position) -> NodeId {
        self.ast.alloc(NodeKind::Identifier(name), position)
    }

    fn adopt_all(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.ast.adopt(parent, child);
        }
    }

    fn adopt_opt(&mut self, parent: NodeId, child: Option<NodeId>) {
        if let Some(child) = child {
            self.ast.adopt(parent, child);
        }
    }

    fn mk_sequence(&mut self, contents: Vec<NodeId>, kind: ComplexKind, position: Position) -> NodeId {
        let node = self.ast.alloc(
            NodeKind::ComplexEntity(ComplexEntity {
                name: None,
                contents: contents.clone(),
                kind,
            }),
            position,
        );
        self.adopt_all(node, &contents);
        node
    }

    // ========================================================================
    // File structure
    // ========================================================================

    /// `file := (importStmt | pragmaStmt)* (item | statement)*`
    fn parse_file(&mut self) -> Parse<(NodeId, Vec<NodeId>)> {
        let mut contents = Vec::new();
        let mut imports = Vec::new();

        loop {
            if self.check_keyword(Keyword::Import) {
                let import = self.parse_import()?;
                imports.push(import);
                contents.push(import);
            } else if self.check_keyword(Keyword::Pragma) {
                contents.push(self.parse_pragma()?);
            } else {
                break;
            }
        }

        while !self.is_at_end() {
            contents.push(self.parse_item_or_statement()?);
        }

        let root = self.mk_sequence(contents, ComplexKind::Sequence, Position::new(0, 0));
        Ok((root, imports))
    }

    /// `importStmt := 'import' (Identifier('.'Identifier)* | StringLiteral)
    ///                version? ('as' Identifier)?`
    fn parse_import(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // import

        let name = match self.current_kind().clone() {
            TokenKind::Identifier(_) => self.parse_dotted_identifier()?,
            TokenKind::StringLiteral(path) => {
                let pos = self.position();
                self.advance();
                self.ast.alloc(NodeKind::Entity(Value::String(path)), pos)
            }
            _ => return Err(self.unexpected("module name or path string after 'import'")),
        };

        let version = match self.current_kind().clone() {
            TokenKind::RealConst(v) => {
                let pos = self.position();
                self.advance();
                Some(self.ast.alloc(NodeKind::Entity(Value::Real(v)), pos))
            }
            TokenKind::IntConst(v) => {
                let pos = self.position();
                self.advance();
                Some(self.ast.alloc(NodeKind::Entity(Value::Integer(v)), pos))
            }
            _ => None,
        };

        let alias = if self.match_keyword(Keyword::As) {
            let (name, pos) = self.expect_identifier("alias name after 'as'")?;
            Some(self.mk_identifier(name, pos))
        } else {
            None
        };

        self.match_punct(';');

        let import = self.ast.alloc(
            NodeKind::Import(Import {
                name,
                version,
                alias,
            }),
            position,
        );
        self.ast.adopt(import, name);
        self.adopt_opt(import, version);
        self.adopt_opt(import, alias);
        Ok(import)
    }

    /// `pragmaStmt := 'pragma' Identifier`
    fn parse_pragma(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // pragma
        let (name, name_pos) = self.expect_identifier("pragma name")?;
        let name = self.mk_identifier(name, name_pos);
        self.match_punct(';');
        let pragma = self.ast.alloc(NodeKind::Pragma(Pragma { name }), position);
        self.ast.adopt(pragma, name);
        Ok(pragma)
    }

    fn at_item_start(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Identifier(_))
            && matches!(
                self.peek_kind(),
                TokenKind::Punct('{') | TokenKind::Keyword(Keyword::On)
            )
    }

    fn parse_item_or_statement(&mut self) -> Parse<NodeId> {
        if self.at_item_start() {
            self.parse_item()
        } else {
            self.parse_statement()
        }
    }

    /// `item := Identifier ('on' Identifier)? '{' itemBody '}'`
    fn parse_item(&mut self) -> Parse<NodeId> {
        let (type_name, position) = self.expect_identifier("item type name")?;
        let name = self.mk_identifier(type_name, position);

        let on_target = if self.match_keyword(Keyword::On) {
            let (target, pos) = self.expect_identifier("property name after 'on'")?;
            Some(self.mk_identifier(target, pos))
        } else {
            None
        };

        self.expect_punct('{', "'{' to open the object body")?;

        let mut contents = Vec::new();
        while !self.check_punct('}') {
            if self.is_at_end() {
                return Err(self.error("expected '}' to close the object body"));
            }
            contents.push(self.parse_item_member()?);
        }
        self.advance(); // }

        let item = self.ast.alloc(
            NodeKind::Item(Item {
                name,
                on_target,
                contents: contents.clone(),
                properties: std::collections::BTreeMap::new(),
            }),
            position,
        );
        self.ast.adopt(item, name);
        self.adopt_opt(item, on_target);
        self.adopt_all(item, &contents);
        Ok(item)
    }

    /// `itemBody := (propertyDecl | propertyAssign | signalDecl
    ///              | functionDecl | item)*`
    fn parse_item_member(&mut self) -> Parse<NodeId> {
        match self.current_kind() {
            TokenKind::Keyword(Keyword::Default | Keyword::Readonly | Keyword::Property) => {
                self.parse_property_declaration()
            }
            TokenKind::Keyword(Keyword::Signal) => self.parse_signal_declaration(),
            TokenKind::Keyword(Keyword::Function) => self.parse_function(),
            TokenKind::Identifier(_) => {
                if self.at_item_start() {
                    self.parse_item()
                } else {
                    self.parse_property_assignment()
                }
            }
            _ => Err(self.unexpected("property, signal, function or child item")),
        }
    }

    /// `propertyDecl := 'default'? 'readonly'? 'property' typeName
    ///                  Identifier ('=' expr | ':' expr | ε)`
    fn parse_property_declaration(&mut self) -> Parse<NodeId> {
        let position = self.position();
        let is_default = self.match_keyword(Keyword::Default);
        let is_readonly = self.match_keyword(Keyword::Readonly);
        if !self.match_keyword(Keyword::Property) {
            return Err(self.unexpected("'property'"));
        }

        let type_name = match self.current_kind().clone() {
            TokenKind::Identifier(name) => {
                let pos = self.position();
                self.advance();
                self.mk_identifier(name, pos)
            }
            TokenKind::Keyword(Keyword::Var) => {
                let pos = self.position();
                self.advance();
                self.mk_identifier("var".into(), pos)
            }
            TokenKind::Keyword(Keyword::Alias) => {
                let pos = self.position();
                self.advance();
                self.mk_identifier("alias".into(), pos)
            }
            _ => return Err(self.unexpected("property type")),
        };

        let (prop_name, name_pos) = self.expect_identifier("property name")?;
        let name = self.mk_identifier(prop_name, name_pos);

        let content = if self.match_punct(':') || self.match_assign() {
            Some(self.parse_property_content()?)
        } else {
            None
        };
        self.match_punct(';');

        let declaration = self.ast.alloc(
            NodeKind::PropertyDeclaration(PropertyDeclaration {
                type_name: Some(type_name),
                name,
                content,
                is_default,
                is_readonly,
            }),
            position,
        );
        self.ast.adopt(declaration, type_name);
        self.ast.adopt(declaration, name);
        self.adopt_opt(declaration, content);
        Ok(declaration)
    }

    fn match_assign(&mut self) -> bool {
        if self.check_operator(Operator::Assign) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `propertyAssign := Identifier('.'Identifier)* ':' expr`
    fn parse_property_assignment(&mut self) -> Parse<NodeId> {
        let position = self.position();
        let name = self.parse_dotted_identifier()?;
        self.expect_punct(':', "':' after property name")?;
        let content = self.parse_property_content()?;
        self.match_punct(';');

        let assignment = self.ast.alloc(
            NodeKind::PropertyAssignment(PropertyDeclaration {
                type_name: None,
                name,
                content: Some(content),
                is_default: false,
                is_readonly: false,
            }),
            position,
        );
        self.ast.adopt(assignment, name);
        self.ast.adopt(assignment, content);
        Ok(assignment)
    }

    /// The right-hand side of a `:` or `=` binding: a child item, a
    /// statement block, or an expression.
    fn parse_property_content(&mut self) -> Parse<NodeId> {
        if self.at_item_start() {
            self.parse_item()
        } else if self.check_punct('{') {
            self.parse_block()
        } else {
            self.parse_expression()
        }
    }

    /// `signalDecl := 'signal' Identifier ('(' typeName Identifier
    ///                (',' typeName Identifier)* ')')?`
    fn parse_signal_declaration(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // signal
        let (signal_name, name_pos) = self.expect_identifier("signal name")?;
        let name = self.mk_identifier(signal_name, name_pos);

        let parameters = if self.check_punct('(') {
            let paren_pos = self.position();
            self.advance();
            let mut params = Vec::new();
            while !self.check_punct(')') {
                let (type_name, type_pos) = self.expect_identifier("parameter type")?;
                let type_node = self.mk_identifier(type_name, type_pos);
                let (param_name, param_pos) = self.expect_identifier("parameter name")?;
                let name_node = self.mk_identifier(param_name, param_pos);
                let param = self.ast.alloc(
                    NodeKind::PropertyDeclaration(PropertyDeclaration {
                        type_name: Some(type_node),
                        name: name_node,
                        content: None,
                        is_default: false,
                        is_readonly: false,
                    }),
                    type_pos,
                );
                self.ast.adopt(param, type_node);
                self.ast.adopt(param, name_node);
                params.push(param);
                if !self.match_punct(',') {
                    break;
                }
            }
            self.expect_punct(')', "')' to close the signal parameter list")?;
            Some(self.mk_sequence(params, ComplexKind::Sequence, paren_pos))
        } else {
            None
        };
        self.match_punct(';');

        let signal = self.ast.alloc(
            NodeKind::SignalDeclaration(SignalDeclaration { name, parameters }),
            position,
        );
        self.ast.adopt(signal, name);
        self.adopt_opt(signal, parameters);
        Ok(signal)
    }

    /// `functionDecl := 'function' Identifier? '(' params? ')' block`
    ///
    /// The name is optional so that function expressions
    /// (`onClicked: function() { … }`) share this path.
    fn parse_function(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // function

        let name = match self.current_kind().clone() {
            TokenKind::Identifier(n) => {
                let pos = self.position();
                self.advance();
                Some(self.mk_identifier(n, pos))
            }
            _ => None,
        };

        let paren_pos = self.position();
        self.expect_punct('(', "'(' after function name")?;
        let mut params = Vec::new();
        while !self.check_punct(')') {
            let (param, pos) = self.expect_identifier("parameter name")?;
            params.push(self.mk_identifier(param, pos));
            if !self.match_punct(',') {
                break;
            }
        }
        self.expect_punct(')', "')' to close the parameter list")?;
        let parameters = self.mk_sequence(params, ComplexKind::Sequence, paren_pos);

        let content = self.parse_block()?;

        let function = self.ast.alloc(
            NodeKind::Function(Function {
                name,
                parameters,
                content,
                locals: std::collections::BTreeMap::new(),
                params: std::collections::BTreeMap::new(),
            }),
            position,
        );
        self.adopt_opt(function, name);
        self.ast.adopt(function, parameters);
        self.ast.adopt(function, content);
        Ok(function)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_block(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.expect_punct('{', "'{' to open a block")?;
        let mut statements = Vec::new();
        while !self.check_punct('}') {
            if self.is_at_end() {
                return Err(self.error("expected '}' to close the block"));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance(); // }
        Ok(self.mk_sequence(statements, ComplexKind::Block, position))
    }

    /// `statement := block | ifStmt | forStmt | whileStmt | switchStmt
    ///             | 'break' | 'continue' | 'return' expr? | varDecl
    ///             | exprStmt`
    fn parse_statement(&mut self) -> Parse<NodeId> {
        match self.current_kind() {
            TokenKind::Punct('{') => self.parse_block(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch(),
            TokenKind::Keyword(Keyword::Break) => {
                let position = self.position();
                self.advance();
                self.match_punct(';');
                Ok(self.ast.alloc(NodeKind::Break, position))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                let position = self.position();
                self.advance();
                self.match_punct(';');
                Ok(self.ast.alloc(NodeKind::Continue, position))
            }
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::Var) => self.parse_var_declaration(),
            _ => {
                let expression = self.parse_expression()?;
                self.match_punct(';');
                Ok(expression)
            }
        }
    }

    fn parse_if(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // if
        self.expect_punct('(', "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_punct(')', "')' after the if condition")?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };

        let node = self.ast.alloc(
            NodeKind::If(If {
                condition,
                then_branch,
                else_branch,
            }),
            position,
        );
        self.ast.adopt(node, condition);
        self.ast.adopt(node, then_branch);
        self.adopt_opt(node, else_branch);
        Ok(node)
    }

    fn parse_for(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // for
        self.expect_punct('(', "'(' after 'for'")?;

        // Disambiguate for-in from the classic three-clause form.
        let initialization = if self.check_punct(';') {
            None
        } else if self.check_keyword(Keyword::Var) {
            self.advance();
            let (var_name, var_pos) = self.expect_identifier("variable name after 'var'")?;
            let name = self.mk_identifier(var_name, var_pos);
            if self.match_keyword(Keyword::In) {
                let variable = self.mk_variable(name, None, var_pos);
                return self.parse_for_in_tail(position, variable);
            }
            let content = if self.match_assign() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            Some(self.mk_variable(name, content, var_pos))
        } else {
            let expression = self.parse_expression()?;
            if self.match_keyword(Keyword::In) {
                return self.parse_for_in_tail(position, expression);
            }
            Some(expression)
        };

        self.expect_punct(';', "';' after the for initialization")?;
        let condition = if self.check_punct(';') {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(';', "';' after the for condition")?;
        let incrementation = if self.check_punct(')') {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(')', "')' to close the for clauses")?;
        let content = self.parse_loop_body()?;

        let node = self.ast.alloc(
            NodeKind::For(For {
                initialization,
                condition,
                incrementation,
                content,
            }),
            position,
        );
        self.adopt_opt(node, initialization);
        self.adopt_opt(node, condition);
        self.adopt_opt(node, incrementation);
        self.adopt_opt(node, content);
        Ok(node)
    }

    fn parse_for_in_tail(&mut self, position: Position, variable: NodeId) -> Parse<NodeId> {
        let expression = self.parse_expression()?;
        self.expect_punct(')', "')' to close the for-in clause")?;
        let content = self.parse_loop_body()?;

        let node = self.ast.alloc(
            NodeKind::ForIn(ForIn {
                variable,
                expression,
                content,
            }),
            position,
        );
        self.ast.adopt(node, variable);
        self.ast.adopt(node, expression);
        self.adopt_opt(node, content);
        Ok(node)
    }

    fn parse_while(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // while
        self.expect_punct('(', "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_punct(')', "')' after the while condition")?;
        let content = self.parse_loop_body()?;

        let node = self
            .ast
            .alloc(NodeKind::While(While { condition, content }), position);
        self.ast.adopt(node, condition);
        self.adopt_opt(node, content);
        Ok(node)
    }

    /// A loop body, or `None` for the empty-statement form `for (…);`.
    fn parse_loop_body(&mut self) -> Parse<Option<NodeId>> {
        if self.match_punct(';') {
            Ok(None)
        } else {
            Ok(Some(self.parse_statement()?))
        }
    }

    fn parse_switch(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // switch
        self.expect_punct('(', "'(' after 'switch'")?;
        let expression = self.parse_expression()?;
        self.expect_punct(')', "')' after the switch expression")?;
        let brace_pos = self.position();
        self.expect_punct('{', "'{' to open the switch body")?;

        let mut clauses = Vec::new();
        while !self.check_punct('}') {
            let clause_pos = self.position();
            let name = if self.match_keyword(Keyword::Case) {
                let expr = self.parse_expression()?;
                Some(expr)
            } else if self.match_keyword(Keyword::Default) {
                None
            } else {
                return Err(self.unexpected("'case', 'default' or '}'"));
            };
            self.expect_punct(':', "':' after the case label")?;

            let mut statements = Vec::new();
            while !self.check_punct('}')
                && !self.check_keyword(Keyword::Case)
                && !self.check_keyword(Keyword::Default)
            {
                if self.is_at_end() {
                    return Err(self.error("expected '}' to close the switch body"));
                }
                statements.push(self.parse_statement()?);
            }

            let clause = self.ast.alloc(
                NodeKind::ComplexEntity(ComplexEntity {
                    name,
                    contents: statements.clone(),
                    kind: ComplexKind::Case,
                }),
                clause_pos,
            );
            self.adopt_opt(clause, name);
            self.adopt_all(clause, &statements);
            clauses.push(clause);
        }
        self.advance(); // }

        let cases = self.mk_sequence(clauses, ComplexKind::Sequence, brace_pos);
        let node = self
            .ast
            .alloc(NodeKind::Switch(Switch { expression, cases }), position);
        self.ast.adopt(node, expression);
        self.ast.adopt(node, cases);
        Ok(node)
    }

    fn parse_return(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // return
        let expression = if self.current_kind().starts_expression() && self.continues_line() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.match_punct(';');

        let node = self
            .ast
            .alloc(NodeKind::Return(Return { expression }), position);
        self.adopt_opt(node, expression);
        Ok(node)
    }

    /// `varDecl := 'var' declarator (',' declarator)*` where
    /// `declarator := Identifier ('=' expr)?`.
    fn parse_var_declaration(&mut self) -> Parse<NodeId> {
        let position = self.position();
        self.advance(); // var

        let mut declarations = Vec::new();
        loop {
            let (var_name, var_pos) = self.expect_identifier("variable name after 'var'")?;
            let name = self.mk_identifier(var_name, var_pos);
            let content = if self.match_assign() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            declarations.push(self.mk_variable(name, content, var_pos));
            if !self.match_punct(',') {
                break;
            }
        }
        self.match_punct(';');

        if declarations.len() == 1 {
            Ok(declarations[0])
        } else {
            Ok(self.mk_sequence(declarations, ComplexKind::Sequence, position))
        }
    }

    fn mk_variable(&mut self, name: NodeId, content: Option<NodeId>, position: Position) -> NodeId {
        let node = self.ast.alloc(
            NodeKind::VariableDeclaration(VariableDeclaration { name, content }),
            position,
        );
        self.ast.adopt(node, name);
        self.adopt_opt(node, content);
        node
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// `expr := conditional (assignOp expr)?` - assignment is
    /// right-associative.
    fn parse_expression(&mut self) -> Parse<NodeId> {
        let left = self.parse_conditional()?;
        if let TokenKind::Operator(op) = self.current_kind() {
            if let Some(operator) = assignment_operator(*op) {
                self.advance();
                let right = self.parse_expression()?;
                return Ok(self.mk_binary(left, right, operator));
            }
        }
        Ok(left)
    }

    fn parse_conditional(&mut self) -> Parse<NodeId> {
        let condition = self.parse_binary(0)?;
        if !self.match_punct('?') {
            return Ok(condition);
        }
        let then_branch = self.parse_expression()?;
        self.expect_punct(':', "':' in the conditional expression")?;
        let else_branch = self.parse_expression()?;

        let position = self.ast.node(condition).position;
        let node = self.ast.alloc(
            NodeKind::Conditional(If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            }),
            position,
        );
        self.ast.adopt(node, condition);
        self.ast.adopt(node, then_branch);
        self.ast.adopt(node, else_branch);
        Ok(node)
    }

    /// Precedence climbing over the binary operator table.
    fn parse_binary(&mut self, min_bp: u8) -> Parse<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let TokenKind::Operator(op) = self.current_kind() else {
                break;
            };
            let Some((bp, operator)) = binary_binding_power(*op) else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.advance();
            let right = self.parse_binary(bp + 1)?;
            left = self.mk_binary(left, right, operator);
        }
        Ok(left)
    }

    fn mk_binary(&mut self, left: NodeId, right: NodeId, operator: BinaryOperator) -> NodeId {
        let position = self.ast.node(left).position;
        let node = self.ast.alloc(
            NodeKind::BinaryOperation(BinaryOperation {
                left,
                right,
                operator,
            }),
            position,
        );
        self.ast.adopt(node, left);
        self.ast.adopt(node, right);
        node
    }

    fn parse_unary(&mut self) -> Parse<NodeId> {
        let operator = match self.current_kind() {
            TokenKind::Operator(Operator::Not) => Some(UnaryOperator::Not),
            TokenKind::Operator(Operator::DoubleNot) => Some(UnaryOperator::DoubleNot),
            TokenKind::Operator(Operator::Complement) => Some(UnaryOperator::Complement),
            TokenKind::Operator(Operator::Increment) => Some(UnaryOperator::Increment),
            TokenKind::Operator(Operator::Decrement) => Some(UnaryOperator::Decrement),
            TokenKind::Operator(Operator::Sub) => Some(UnaryOperator::Minus),
            TokenKind::Operator(Operator::Add) => Some(UnaryOperator::Plus),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOperator::Typeof),
            TokenKind::Keyword(Keyword::New) => Some(UnaryOperator::New),
            _ => None,
        };
        let Some(operator) = operator else {
            return self.parse_postfix();
        };

        let position = self.position();
        self.advance();
        let operand = self.parse_unary()?;
        let node = self.ast.alloc(
            NodeKind::UnaryOperation(UnaryOperation {
                operand,
                operator,
                is_postfix: false,
            }),
            position,
        );
        self.ast.adopt(node, operand);
        Ok(node)
    }

    /// Postfix chain: member access, calls, indexing, `++`/`--`.
    ///
    /// Calls, indexing and postfix increments must start on the same
    /// line as what they follow; member access may wrap.
    fn parse_postfix(&mut self) -> Parse<NodeId> {
        let mut expression = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::Punct('.') => {
                    self.advance();
                    let (member, member_pos) = self.expect_identifier("member name after '.'")?;
                    expression = self.append_member(expression, member, member_pos);
                }
                TokenKind::Punct('(') if self.continues_line() => {
                    let paren_pos = self.position();
                    self.advance();
                    let mut arguments = Vec::new();
                    while !self.check_punct(')') {
                        arguments.push(self.parse_expression()?);
                        if !self.match_punct(',') {
                            break;
                        }
                    }
                    self.expect_punct(')', "')' to close the argument list")?;
                    let parameters =
                        self.mk_sequence(arguments, ComplexKind::Sequence, paren_pos);
                    let position = self.ast.node(expression).position;
                    let call = self.ast.alloc(
                        NodeKind::FunctionCall(FunctionCall {
                            name: expression,
                            parameters,
                        }),
                        position,
                    );
                    self.ast.adopt(call, expression);
                    self.ast.adopt(call, parameters);
                    expression = call;
                }
                TokenKind::Punct('[') if self.continues_line() => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_punct(']', "']' to close the index")?;
                    expression = self.mk_array_access(expression, index, false);
                }
                TokenKind::Operator(Operator::Increment) if self.continues_line() => {
                    self.advance();
                    expression = self.mk_postfix(expression, UnaryOperator::Increment);
                }
                TokenKind::Operator(Operator::Decrement) if self.continues_line() => {
                    self.advance();
                    expression = self.mk_postfix(expression, UnaryOperator::Decrement);
                }
                _ => break,
            }
        }
        Ok(expression)
    }

    fn mk_postfix(&mut self, operand: NodeId, operator: UnaryOperator) -> NodeId {
        let position = self.ast.node(operand).position;
        let node = self.ast.alloc(
            NodeKind::UnaryOperation(UnaryOperation {
                operand,
                operator,
                is_postfix: true,
            }),
            position,
        );
        self.ast.adopt(node, operand);
        node
    }

    /// Attaches `.member` to a base: identifier chains collapse into a
    /// single dotted identifier, anything else becomes an `ArrayAccess`
    /// in dot form.
    fn append_member(&mut self, base: NodeId, member: EcoString, member_pos: Position) -> NodeId {
        if let NodeKind::Identifier(name) = &mut self.ast.node_mut(base).kind {
            name.push('.');
            name.push_str(&member);
            return base;
        }
        let index = self
            .ast
            .alloc(NodeKind::Entity(Value::String(member)), member_pos);
        self.mk_array_access(base, index, true)
    }

    fn mk_array_access(&mut self, array: NodeId, index: NodeId, is_dot: bool) -> NodeId {
        let position = self.ast.node(array).position;
        let node = self.ast.alloc(
            NodeKind::ArrayAccess(ArrayAccess {
                array,
                index,
                is_dot,
            }),
            position,
        );
        self.ast.adopt(node, array);
        self.ast.adopt(node, index);
        node
    }

    fn parse_primary(&mut self) -> Parse<NodeId> {
        let position = self.position();
        match self.current_kind().clone() {
            TokenKind::IntConst(v) => {
                self.advance();
                Ok(self.ast.alloc(NodeKind::Entity(Value::Integer(v)), position))
            }
            TokenKind::RealConst(v) => {
                self.advance();
                Ok(self.ast.alloc(NodeKind::Entity(Value::Real(v)), position))
            }
            TokenKind::BoolConst(v) => {
                self.advance();
                Ok(self.ast.alloc(NodeKind::Entity(Value::Bool(v)), position))
            }
            TokenKind::StringLiteral(v) => {
                self.advance();
                Ok(self.ast.alloc(NodeKind::Entity(Value::String(v)), position))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(self.mk_identifier(name, position))
            }
            TokenKind::Punct('(') => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect_punct(')', "')' to close the parenthesized expression")?;
                self.ast.node_mut(expression).is_parenthesized = true;
                Ok(expression)
            }
            TokenKind::Punct('[') => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check_punct(']') {
                    elements.push(self.parse_expression()?);
                    if !self.match_punct(',') {
                        break;
                    }
                }
                self.expect_punct(']', "']' to close the array literal")?;
                Ok(self.mk_sequence(elements, ComplexKind::Array, position))
            }
            TokenKind::Operator(Operator::Dimension) => {
                self.advance();
                Ok(self.mk_sequence(Vec::new(), ComplexKind::Array, position))
            }
            TokenKind::Keyword(Keyword::Function) => self.parse_function(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// A dotted identifier chain collapsed into one node:
    /// `anchors.fill` becomes `Identifier("anchors.fill")`.
    fn parse_dotted_identifier(&mut self) -> Parse<NodeId> {
        let (mut name, position) = self.expect_identifier("a name")?;
        while self.check_punct('.') && matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            self.advance(); // .
            let (segment, _) = self.expect_identifier("a name")?;
            name.push('.');
            name.push_str(&segment);
        }
        Ok(self.mk_identifier(name, position))
    }
}

/// Maps a compound or plain assignment token to its AST operator.
fn assignment_operator(op: Operator) -> Option<BinaryOperator> {
    Some(match op {
        Operator::Assign => BinaryOperator::Assign,
        Operator::AddAssign => BinaryOperator::AddAssign,
        Operator::SubAssign => BinaryOperator::SubAssign,
        Operator::MulAssign => BinaryOperator::MulAssign,
        Operator::DivAssign => BinaryOperator::DivAssign,
        Operator::ModAssign => BinaryOperator::ModAssign,
        Operator::AndAssign => BinaryOperator::AndAssign,
        Operator::OrAssign => BinaryOperator::OrAssign,
        Operator::XorAssign => BinaryOperator::XorAssign,
        Operator::ShlAssign => BinaryOperator::ShlAssign,
        Operator::ShrAssign => BinaryOperator::ShrAssign,
        _ => return None,
    })
}

/// Binding power and AST operator for a binary token, or `None` when
/// the token cannot continue a binary expression.
///
/// | Level | Operators |
/// |-------|-----------|
/// | 10    | `\|\|` |
/// | 20    | `&&` |
/// | 30    | `\|` |
/// | 40    | `^` |
/// | 50    | `&` |
/// | 60    | `==` `!=` `===` `!==` |
/// | 70    | `<` `<=` `>` `>=` |
/// | 80    | `<<` `>>` |
/// | 90    | `+` `-` |
/// | 100   | `*` `/` `%` |
fn binary_binding_power(op: Operator) -> Option<(u8, BinaryOperator)> {
    Some(match op {
        Operator::LogicOr => (10, BinaryOperator::LogicOr),
        Operator::LogicAnd => (20, BinaryOperator::LogicAnd),
        Operator::Or => (30, BinaryOperator::Or),
        Operator::Xor => (40, BinaryOperator::Xor),
        Operator::And => (50, BinaryOperator::And),
        Operator::Equals => (60, BinaryOperator::Equals),
        Operator::NotEquals => (60, BinaryOperator::NotEquals),
        Operator::StrictEquals => (60, BinaryOperator::StrictEquals),
        Operator::StrictNotEquals => (60, BinaryOperator::StrictNotEquals),
        Operator::Lower => (70, BinaryOperator::Lower),
        Operator::LowerEquals => (70, BinaryOperator::LowerEquals),
        Operator::Greater => (70, BinaryOperator::Greater),
        Operator::GreaterEquals => (70, BinaryOperator::GreaterEquals),
        Operator::Shl => (80, BinaryOperator::Shl),
        Operator::Shr => (80, BinaryOperator::Shr),
        Operator::Add => (90, BinaryOperator::Add),
        Operator::Sub => (90, BinaryOperator::Sub),
        Operator::Mul => (100, BinaryOperator::Mul),
        Operator::Div => (100, BinaryOperator::Div),
        Operator::Mod => (100, BinaryOperator::Mod),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MemberRef;

    fn parse_ok(source: &str) -> ParsedSource {
        parse(source).expect("expected a successful parse")
    }

    fn top_level(parsed: &ParsedSource) -> Vec<&'static str> {
        parsed
            .ast
            .contents(parsed.root)
            .iter()
            .map(|&id| parsed.ast.node(id).class_name())
            .collect()
    }

    fn member<'a>(parsed: &'a ParsedSource, id: NodeId, name: &str) -> NodeId {
        for (member_name, member) in parsed.ast.node(id).members() {
            if member_name == name {
                if let MemberRef::Node(child) = member {
                    return child;
                }
            }
        }
        panic!("missing member '{name}'");
    }

    #[test]
    fn parses_imports() {
        let parsed = parse_ok("import QtQuick 2.5 as QQ\nimport \"components\"\nItem { }");
        assert_eq!(parsed.imports.len(), 2);
        assert_eq!(top_level(&parsed), vec!["Import", "Import", "Item"]);

        let first = parsed.imports[0];
        assert_eq!(parsed.ast.display_string(member(&parsed, first, "name")), "QtQuick");
        assert_eq!(parsed.ast.display_string(member(&parsed, first, "version")), "2.5");
        assert_eq!(parsed.ast.display_string(member(&parsed, first, "as")), "QQ");

        let second = parsed.imports[1];
        assert_eq!(
            parsed.ast.display_string(member(&parsed, second, "name")),
            "\"components\""
        );
    }

    #[test]
    fn parses_pragma() {
        let parsed = parse_ok("pragma Singleton\nItem { }");
        assert_eq!(top_level(&parsed), vec!["Pragma", "Item"]);
    }

    #[test]
    fn parses_nested_items() {
        let parsed = parse_ok("Item { Rectangle { } Text { } }");
        let item = parsed.ast.contents(parsed.root)[0];
        let kinds: Vec<_> = parsed
            .ast
            .contents(item)
            .iter()
            .map(|&id| parsed.ast.node(id).class_name())
            .collect();
        assert_eq!(kinds, vec!["Item", "Item"]);
    }

    #[test]
    fn parses_behavior_on_form() {
        let parsed = parse_ok("Item { Behavior on opacity { } }");
        let item = parsed.ast.contents(parsed.root)[0];
        let behavior = parsed.ast.contents(item)[0];
        assert_eq!(parsed.ast.node(behavior).class_name(), "Item");
        assert_eq!(parsed.ast.display_string(behavior), "Behavior");
    }

    #[test]
    fn parses_property_declaration_flags() {
        let parsed = parse_ok("Item { default property alias content: inner.data }");
        let item = parsed.ast.contents(parsed.root)[0];
        let decl = parsed.ast.contents(item)[0];
        let NodeKind::PropertyDeclaration(prop) = &parsed.ast.node(decl).kind else {
            panic!("expected a property declaration");
        };
        assert!(prop.is_default);
        assert!(!prop.is_readonly);
        assert_eq!(
            parsed.ast.display_string(prop.type_name.expect("type")),
            "alias"
        );
    }

    #[test]
    fn property_declaration_position_is_its_first_token() {
        let parsed = parse_ok("Item { property int unused: 0 }");
        let item = parsed.ast.contents(parsed.root)[0];
        let decl = parsed.ast.contents(item)[0];
        assert_eq!(parsed.ast.node(decl).position, Position::new(0, 7));
    }

    #[test]
    fn parses_dotted_assignment_names() {
        let parsed = parse_ok("Item { anchors.fill: parent }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        assert_eq!(parsed.ast.node(assignment).class_name(), "PropertyAssignment");
        assert_eq!(parsed.ast.display_string(assignment), "anchors.fill");
    }

    #[test]
    fn assignment_distinguished_from_declaration() {
        let parsed = parse_ok("Item { width: 100\nproperty int count: 0 }");
        let item = parsed.ast.contents(parsed.root)[0];
        let kinds: Vec<_> = parsed
            .ast
            .contents(item)
            .iter()
            .map(|&id| parsed.ast.node(id).class_name())
            .collect();
        assert_eq!(kinds, vec!["PropertyAssignment", "PropertyDeclaration"]);
    }

    #[test]
    fn parses_signal_declarations() {
        let parsed = parse_ok("Item { signal clicked\nsignal moved(int x, int y) }");
        let item = parsed.ast.contents(parsed.root)[0];
        let contents = parsed.ast.contents(item);
        assert_eq!(parsed.ast.node(contents[0]).class_name(), "SignalDeclaration");
        let moved = contents[1];
        let params = member(&parsed, moved, "parameters");
        assert_eq!(parsed.ast.contents(params).len(), 2);
    }

    #[test]
    fn parses_functions_and_locals() {
        let parsed = parse_ok(
            "Item { function area(w, h) { var result = w * h; return result } }",
        );
        let item = parsed.ast.contents(parsed.root)[0];
        let function = parsed.ast.contents(item)[0];
        assert_eq!(parsed.ast.node(function).class_name(), "Function");
        let params = member(&parsed, function, "parameters");
        assert_eq!(parsed.ast.contents(params).len(), 2);
        let body = member(&parsed, function, "content");
        let kinds: Vec<_> = parsed
            .ast
            .contents(body)
            .iter()
            .map(|&id| parsed.ast.node(id).class_name())
            .collect();
        assert_eq!(kinds, vec!["VariableDeclaration", "Return"]);
    }

    #[test]
    fn parses_control_flow_statements() {
        let parsed = parse_ok(
            "Item { function f(x) {\n\
             if (x > 0) { x-- } else x++\n\
             for (var i = 0; i < 10; i++) { }\n\
             for (k in x) { }\n\
             while (x) { break }\n\
             switch (x) { case 1: return 1\n default: return 0 }\n\
             } }",
        );
        let item = parsed.ast.contents(parsed.root)[0];
        let function = parsed.ast.contents(item)[0];
        let body = member(&parsed, function, "content");
        let kinds: Vec<_> = parsed
            .ast
            .contents(body)
            .iter()
            .map(|&id| parsed.ast.node(id).class_name())
            .collect();
        assert_eq!(kinds, vec!["If", "For", "ForIn", "While", "Switch"]);
    }

    #[test]
    fn ternary_is_a_conditional_node() {
        let parsed = parse_ok("Item { width: enabled ? 100 : 0 }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let content = member(&parsed, assignment, "content");
        assert_eq!(parsed.ast.node(content).class_name(), "Conditional");
    }

    #[test]
    fn binary_precedence_mul_binds_tighter() {
        let parsed = parse_ok("Item { width: 1 + 2 * 3 }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let add = member(&parsed, assignment, "content");
        let NodeKind::BinaryOperation(op) = &parsed.ast.node(add).kind else {
            panic!("expected a binary operation");
        };
        assert_eq!(op.operator, BinaryOperator::Add);
        let NodeKind::BinaryOperation(right) = &parsed.ast.node(op.right).kind else {
            panic!("expected the multiplication on the right");
        };
        assert_eq!(right.operator, BinaryOperator::Mul);
    }

    #[test]
    fn parenthesized_flag_survives() {
        let parsed = parse_ok("Item { width: (1 + 2) * 3 }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let mul = member(&parsed, assignment, "content");
        let NodeKind::BinaryOperation(op) = &parsed.ast.node(mul).kind else {
            panic!("expected a binary operation");
        };
        assert_eq!(op.operator, BinaryOperator::Mul);
        assert!(parsed.ast.node(op.left).is_parenthesized);
    }

    #[test]
    fn parses_calls_indexing_and_member_chains() {
        let parsed = parse_ok("Item { width: Math.max(a, list[0]).toFixed(2) }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let outer = member(&parsed, assignment, "content");
        // Outer call on a dotted access of the inner call's result
        assert_eq!(parsed.ast.node(outer).class_name(), "FunctionCall");
        let callee = member(&parsed, outer, "name");
        assert_eq!(parsed.ast.node(callee).class_name(), "ArrayAccess");
    }

    #[test]
    fn function_content_binding_parses_as_block() {
        let parsed = parse_ok("Item { onClicked: { count++; refresh() } }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let content = member(&parsed, assignment, "content");
        assert_eq!(parsed.ast.node(content).class_name(), "ComplexEntity");
    }

    #[test]
    fn item_valued_binding_parses_as_item() {
        let parsed = parse_ok("Item { delegate: Rectangle { } }");
        let item = parsed.ast.contents(parsed.root)[0];
        let assignment = parsed.ast.contents(item)[0];
        let content = member(&parsed, assignment, "content");
        assert_eq!(parsed.ast.node(content).class_name(), "Item");
    }

    #[test]
    fn statements_split_across_lines_without_semicolons() {
        let parsed = parse_ok("Item { function f() { a = 1\nb = 2 } }");
        let item = parsed.ast.contents(parsed.root)[0];
        let function = parsed.ast.contents(item)[0];
        let body = member(&parsed, function, "content");
        assert_eq!(parsed.ast.contents(body).len(), 2);
    }

    #[test]
    fn parent_links_hold_for_every_slot() {
        let parsed = parse_ok(
            "import QtQuick 2.5\n\
             Item {\n\
                 property int count: 0\n\
                 signal done(int code)\n\
                 function f(x) { for (var i = 0; i < x; i++) { g(i) } }\n\
                 Rectangle { color: \"red\" }\n\
             }",
        );
        assert!(parsed.ast.parent_links_consistent(parsed.root));
    }

    #[test]
    fn first_error_aborts_with_position() {
        let err = parse("Item { property int : 0 }").unwrap_err();
        assert_eq!(err.position, Position::new(0, 20));
        assert!(err.message.contains("property name"), "{}", err.message);
    }

    #[test]
    fn unclosed_item_is_an_error() {
        assert!(parse("Item {").is_err());
    }

    #[test]
    fn stray_token_is_an_error() {
        assert!(parse("Item { @ }").is_err());
    }

    #[test]
    fn empty_source_parses_to_empty_root() {
        let parsed = parse_ok("");
        assert!(parsed.ast.contents(parsed.root).is_empty());
    }
}
