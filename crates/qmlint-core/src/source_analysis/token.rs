// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Token types for lexical analysis.
//!
//! A token is a tagged value plus the [`Position`] snapshot taken at the
//! start of the token. Keywords are recognized by the lexer from a fixed
//! table; `true` and `false` lex as [`TokenKind::BoolConst`], never as
//! identifiers.

use std::fmt;

use ecow::EcoString;

use super::Position;

/// Keywords of the dialect.
///
/// These are case-sensitive. Any other identifier-shaped text lexes as
/// [`TokenKind::Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Import,
    Property,
    Default,
    Readonly,
    Alias,
    Var,
    Function,
    If,
    Else,
    For,
    In,
    While,
    Switch,
    Case,
    Break,
    Continue,
    With,
    Return,
    Typeof,
    Pragma,
    On,
    As,
    Signal,
    New,
}

impl Keyword {
    /// Looks up the keyword for `text`, if any.
    #[must_use]
    pub fn from_str(text: &str) -> Option<Self> {
        Some(match text {
            "import" => Self::Import,
            "property" => Self::Property,
            "default" => Self::Default,
            "readonly" => Self::Readonly,
            "alias" => Self::Alias,
            "var" => Self::Var,
            "function" => Self::Function,
            "if" => Self::If,
            "else" => Self::Else,
            "for" => Self::For,
            "in" => Self::In,
            "while" => Self::While,
            "switch" => Self::Switch,
            "case" => Self::Case,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "with" => Self::With,
            "return" => Self::Return,
            "typeof" => Self::Typeof,
            "pragma" => Self::Pragma,
            "on" => Self::On,
            "as" => Self::As,
            "signal" => Self::Signal,
            "new" => Self::New,
            _ => return None,
        })
    }

    /// Returns the source spelling of the keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Property => "property",
            Self::Default => "default",
            Self::Readonly => "readonly",
            Self::Alias => "alias",
            Self::Var => "var",
            Self::Function => "function",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::While => "while",
            Self::Switch => "switch",
            Self::Case => "case",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::With => "with",
            Self::Return => "return",
            Self::Typeof => "typeof",
            Self::Pragma => "pragma",
            Self::On => "on",
            Self::As => "as",
            Self::Signal => "signal",
            Self::New => "new",
        }
    }
}

/// Operator tokens, produced by 1-3 character maximal munch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
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
    Lower,
    LowerEquals,
    Greater,
    GreaterEquals,
    Equals,
    StrictEquals,
    NotEquals,
    StrictNotEquals,
    LogicAnd,
    LogicOr,
    Not,
    DoubleNot,
    Increment,
    Decrement,
    Complement,
    /// `[]` with nothing but whitespace between the brackets.
    Dimension,
}

impl Operator {
    /// Returns the source spelling of the operator.
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
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::Lower => "<",
            Self::LowerEquals => "<=",
            Self::Greater => ">",
            Self::GreaterEquals => ">=",
            Self::Equals => "==",
            Self::StrictEquals => "===",
            Self::NotEquals => "!=",
            Self::StrictNotEquals => "!==",
            Self::LogicAnd => "&&",
            Self::LogicOr => "||",
            Self::Not => "!",
            Self::DoubleNot => "!!",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::Complement => "~",
            Self::Dimension => "[]",
        }
    }
}

/// The kind of token, not including source location.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier: `root`, `myColor`, `$internal`.
    Identifier(EcoString),

    /// A string literal, single- or double-quoted, with escapes applied.
    StringLiteral(EcoString),

    /// A boolean constant: `true` / `false`.
    BoolConst(bool),

    /// An integer constant, decimal or hexadecimal.
    IntConst(i64),

    /// A floating-point constant: `2.5`, `.5`.
    RealConst(f64),

    /// A single punctuation character that is not an operator: `{`, `:`, `.`.
    /// Unrecognized bytes also surface here, which lets the parser report
    /// them with a position instead of the lexer failing.
    Punct(char),

    /// An operator from the fixed table.
    Operator(Operator),

    /// A keyword from the fixed table.
    Keyword(Keyword),

    /// End of file.
    EndOfFile,
}

impl TokenKind {
    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EndOfFile)
    }

    /// Returns the string content if this token carries one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Identifier(s) | Self::StringLiteral(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if this token can start an expression.
    ///
    /// Used by the parser to decide whether a `return` has an operand and
    /// whether a newline ends the current statement.
    #[must_use]
    pub fn starts_expression(&self) -> bool {
        match self {
            Self::Identifier(_)
            | Self::StringLiteral(_)
            | Self::BoolConst(_)
            | Self::IntConst(_)
            | Self::RealConst(_) => true,
            Self::Punct(c) => matches!(c, '(' | '['),
            Self::Operator(op) => matches!(
                op,
                Operator::Not
                    | Operator::DoubleNot
                    | Operator::Complement
                    | Operator::Sub
                    | Operator::Add
                    | Operator::Increment
                    | Operator::Decrement
                    | Operator::Dimension
            ),
            Self::Keyword(kw) => matches!(kw, Keyword::Typeof | Keyword::New | Keyword::Function),
            Self::EndOfFile => false,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "{s}"),
            Self::StringLiteral(s) => write!(f, "\"{s}\""),
            Self::BoolConst(b) => write!(f, "{b}"),
            Self::IntConst(i) => write!(f, "{i}"),
            Self::RealConst(r) => write!(f, "{r}"),
            Self::Punct(c) => write!(f, "{c}"),
            Self::Operator(op) => write!(f, "{}", op.as_str()),
            Self::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Self::EndOfFile => write!(f, "<eof>"),
        }
    }
}

/// A token with the position snapshot taken at its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    position: Position,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the position of the first character of this token.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_round_trip() {
        for kw in [
            Keyword::Import,
            Keyword::Property,
            Keyword::Default,
            Keyword::Readonly,
            Keyword::Alias,
            Keyword::Var,
            Keyword::Function,
            Keyword::If,
            Keyword::Else,
            Keyword::For,
            Keyword::In,
            Keyword::While,
            Keyword::Switch,
            Keyword::Case,
            Keyword::Break,
            Keyword::Continue,
            Keyword::With,
            Keyword::Return,
            Keyword::Typeof,
            Keyword::Pragma,
            Keyword::On,
            Keyword::As,
            Keyword::Signal,
            Keyword::New,
        ] {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
        assert_eq!(Keyword::from_str("Import"), None, "keywords are case-sensitive");
        assert_eq!(Keyword::from_str("item"), None);
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::Identifier("root".into()).to_string(), "root");
        assert_eq!(TokenKind::StringLiteral("hi".into()).to_string(), "\"hi\"");
        assert_eq!(TokenKind::IntConst(42).to_string(), "42");
        assert_eq!(TokenKind::BoolConst(true).to_string(), "true");
        assert_eq!(TokenKind::Operator(Operator::ShlAssign).to_string(), "<<=");
        assert_eq!(TokenKind::Keyword(Keyword::Signal).to_string(), "signal");
        assert_eq!(TokenKind::Punct('{').to_string(), "{");
        assert_eq!(TokenKind::EndOfFile.to_string(), "<eof>");
    }

    #[test]
    fn starts_expression_predicate() {
        assert!(TokenKind::Identifier("x".into()).starts_expression());
        assert!(TokenKind::IntConst(1).starts_expression());
        assert!(TokenKind::Punct('(').starts_expression());
        assert!(TokenKind::Operator(Operator::Sub).starts_expression());
        assert!(TokenKind::Keyword(Keyword::Typeof).starts_expression());
        assert!(!TokenKind::Punct('}').starts_expression());
        assert!(!TokenKind::Keyword(Keyword::Else).starts_expression());
        assert!(!TokenKind::Operator(Operator::Mul).starts_expression());
        assert!(!TokenKind::EndOfFile.starts_expression());
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(TokenKind::Identifier("width".into()), Position::new(2, 4));
        assert!(matches!(token.kind(), TokenKind::Identifier(s) if s == "width"));
        assert_eq!(token.position(), Position::new(2, 4));
    }
}
