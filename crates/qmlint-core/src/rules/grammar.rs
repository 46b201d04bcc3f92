// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Rule grammar loading.
//!
//! The grammar document is consumed as a plain XML tree: tag names,
//! attribute maps, child vectors. Unknown attributes and unknown child
//! elements are ignored; malformed predicate attributes (a non-integer
//! `Count`, an invalid `RegExp`, an `Operation` or `Path` value outside
//! the supported set) are load errors, so a broken grammar fails fast
//! instead of silently never firing.
//!
//! # Macros
//!
//! `<Macro Name="N" Value="V"/>` entries are collected first; every
//! string attribute is then expanded by replacing `$N$` with `V`,
//! provided `V` is non-empty. Expansion happens once at load - macros
//! do not refer to other macros.

use ecow::EcoString;
use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

/// A loaded, validated, macro-expanded rule grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub checks: Vec<Check>,
}

/// A set of rules applying to one AST class.
#[derive(Debug, Clone)]
pub struct Check {
    /// Class tag the rules apply to, e.g. `PropertyAssignment`.
    pub class: EcoString,
    pub rules: Vec<Rule>,
}

/// Whether a rule emits on `true` (`Reject`) or on `false` (`Accept`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Accept,
    Reject,
}

/// One `Accept` or `Reject` rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    /// Member to inspect, lowercased. Unused by `NestedCount`.
    pub member: EcoString,
    /// Diagnostic text emitted when the rule fires.
    pub text: EcoString,
    pub predicate: Predicate,
    pub conditions: Vec<Condition>,
}

/// The predicate of a rule. Exactly one fires per rule; when several
/// attributes are present the first in this declaration order wins.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Fire when nodes of the check's class nest deeper than this in
    /// the subtree.
    NestedCount(i64),
    /// Fire when the member's text is one of these values.
    List(Vec<EcoString>),
    /// Fire when the member node's class tag equals this.
    Class(EcoString),
    /// Fire when the member's text, resolved against the file's
    /// directory, exists as a file or directory.
    PathExists,
    /// Fire when the member's text matches (anchored, full-string).
    RegExp(Regex),
    /// Fire when the member is a sequence with more contents than this.
    Count(i64),
    /// Fire when the member's value type tag equals this.
    Type(EcoString),
    /// Fire when the member's text equals this (the default predicate).
    Value(EcoString),
}

/// How a condition compares its subject against `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Equals,
    Contains,
}

/// A guard on a rule; the rule runs only if all its conditions pass.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Member to inspect, lowercased. The pseudo-member `filename`
    /// compares against the file path instead.
    pub member: EcoString,
    /// Comparison value; `None` when absent or empty.
    pub value: Option<EcoString>,
    /// The `Empty` attribute, lowercased; `None` when absent or empty.
    pub empty: Option<EcoString>,
    /// Flips the outcome.
    pub negate: bool,
    pub operation: Operation,
}

/// A grammar that failed to load.
#[derive(Debug, Error, Diagnostic)]
pub enum GrammarError {
    #[error("cannot read grammar file: {0}")]
    #[diagnostic(code(qmlint::rules::io))]
    Io(#[from] std::io::Error),

    #[error("grammar is not well-formed XML: {0}")]
    #[diagnostic(code(qmlint::rules::xml))]
    Xml(#[from] roxmltree::Error),

    #[error("invalid {attribute} value '{value}': expected an integer")]
    #[diagnostic(code(qmlint::rules::invalid_count))]
    InvalidCount { attribute: &'static str, value: String },

    #[error("invalid RegExp '{pattern}': {source}")]
    #[diagnostic(code(qmlint::rules::invalid_regexp))]
    InvalidRegExp {
        pattern: String,
        source: regex::Error,
    },

    #[error("unknown Operation '{0}': only 'Contains' is supported")]
    #[diagnostic(code(qmlint::rules::unknown_operation))]
    UnknownOperation(String),

    #[error("unknown Path '{0}': only 'Exists' is supported")]
    #[diagnostic(code(qmlint::rules::unknown_path))]
    UnknownPath(String),
}

impl Grammar {
    /// Loads a grammar from an XML file.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] when the file is unreadable, not
    /// well-formed XML, or fails predicate validation.
    pub fn load_file(path: &camino::Utf8Path) -> Result<Self, GrammarError> {
        let text = std::fs::read_to_string(path)?;
        Self::load_str(&text)
    }

    /// Loads a grammar from XML text.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] on malformed XML or invalid predicate
    /// attributes.
    pub fn load_str(xml: &str) -> Result<Self, GrammarError> {
        let document = roxmltree::Document::parse(xml)?;
        let root = document.root_element();

        let macros: Vec<(String, String)> = root
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "Macro")
            .map(|node| {
                (
                    node.attribute("Name").unwrap_or_default().to_string(),
                    node.attribute("Value").unwrap_or_default().to_string(),
                )
            })
            .collect();

        let expand = |text: &str| -> String {
            let mut result = text.to_string();
            for (name, value) in &macros {
                if !value.is_empty() {
                    result = result.replace(&format!("${name}$"), value);
                }
            }
            result
        };

        let mut checks = Vec::new();
        for check_node in root
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "Check")
        {
            let class = expand(check_node.attribute("Class").unwrap_or_default());
            let mut rules = Vec::new();
            for rule_node in check_node.children().filter(|n| n.is_element()) {
                let kind = match rule_node.tag_name().name() {
                    "Accept" => RuleKind::Accept,
                    "Reject" => RuleKind::Reject,
                    _ => continue,
                };
                rules.push(load_rule(&rule_node, kind, &expand)?);
            }
            checks.push(Check {
                class: class.into(),
                rules,
            });
        }

        tracing::debug!(checks = checks.len(), "grammar loaded");
        Ok(Self { checks })
    }
}

fn load_rule(
    node: &roxmltree::Node<'_, '_>,
    kind: RuleKind,
    expand: &impl Fn(&str) -> String,
) -> Result<Rule, GrammarError> {
    let attr = |name: &str| -> Option<String> {
        node.attribute(name).map(|value| expand(value))
    };

    let predicate = if let Some(value) = attr("NestedCount") {
        Predicate::NestedCount(parse_int("NestedCount", &value)?)
    } else if let Some(value) = attr("List") {
        Predicate::List(value.split(',').map(EcoString::from).collect())
    } else if let Some(value) = attr("Class") {
        Predicate::Class(value.into())
    } else if let Some(value) = attr("Path") {
        if value != "Exists" {
            return Err(GrammarError::UnknownPath(value));
        }
        Predicate::PathExists
    } else if let Some(pattern) = attr("RegExp") {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| GrammarError::InvalidRegExp {
            pattern,
            source,
        })?;
        Predicate::RegExp(regex)
    } else if let Some(value) = attr("Count") {
        Predicate::Count(parse_int("Count", &value)?)
    } else if let Some(value) = attr("Type") {
        Predicate::Type(value.into())
    } else {
        Predicate::Value(attr("Value").unwrap_or_default().into())
    };

    let mut conditions = Vec::new();
    for condition_node in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Condition")
    {
        conditions.push(load_condition(&condition_node, expand)?);
    }

    Ok(Rule {
        kind,
        member: attr("Member").unwrap_or_default().to_lowercase().into(),
        text: attr("Text").unwrap_or_default().into(),
        predicate,
        conditions,
    })
}

fn load_condition(
    node: &roxmltree::Node<'_, '_>,
    expand: &impl Fn(&str) -> String,
) -> Result<Condition, GrammarError> {
    let attr = |name: &str| -> Option<String> {
        node.attribute(name).map(|value| expand(value))
    };

    let operation = match attr("Operation").unwrap_or_default().as_str() {
        "" => Operation::Equals,
        "Contains" => Operation::Contains,
        other => return Err(GrammarError::UnknownOperation(other.to_string())),
    };

    let non_empty = |value: Option<String>| -> Option<EcoString> {
        value.filter(|v| !v.is_empty()).map(EcoString::from)
    };

    Ok(Condition {
        member: attr("Member").unwrap_or_default().to_lowercase().into(),
        value: non_empty(attr("Value")),
        empty: non_empty(attr("Empty").map(|v| v.to_lowercase())),
        negate: attr("Negate").unwrap_or_default().to_lowercase() == "true",
        operation,
    })
}

fn parse_int(attribute: &'static str, value: &str) -> Result<i64, GrammarError> {
    value.trim().parse().map_err(|_| GrammarError::InvalidCount {
        attribute,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_checks_and_rules() {
        let grammar = Grammar::load_str(
            r#"<Root>
                <Check Class="PropertyAssignment">
                    <Reject Member="content" Class="Entity" Text="no hardcoded colors">
                        <Condition Member="name" Value="color"/>
                        <Condition Member="content" Value="transparent" Negate="true"/>
                    </Reject>
                </Check>
            </Root>"#,
        )
        .expect("grammar should load");

        assert_eq!(grammar.checks.len(), 1);
        let check = &grammar.checks[0];
        assert_eq!(check.class, "PropertyAssignment");
        assert_eq!(check.rules.len(), 1);
        let rule = &check.rules[0];
        assert_eq!(rule.kind, RuleKind::Reject);
        assert_eq!(rule.member, "content");
        assert!(matches!(&rule.predicate, Predicate::Class(c) if c == "Entity"));
        assert_eq!(rule.conditions.len(), 2);
        assert!(rule.conditions[1].negate);
    }

    #[test]
    fn macros_expand_in_attributes() {
        let grammar = Grammar::load_str(
            r#"<Root>
                <Macro Name="CamelCasingRegExp" Value="([a-z])([a-zA-Z0-9]*)"/>
                <Check Class="Item">
                    <Accept Member="name" RegExp="$CamelCasingRegExp$" Text="bad"/>
                </Check>
            </Root>"#,
        )
        .expect("grammar should load");

        let rule = &grammar.checks[0].rules[0];
        let Predicate::RegExp(regex) = &rule.predicate else {
            panic!("expected a RegExp predicate");
        };
        assert!(regex.is_match("goodName"));
        assert!(!regex.is_match("BadName"));
    }

    #[test]
    fn empty_macro_values_do_not_expand() {
        let grammar = Grammar::load_str(
            r#"<Root>
                <Macro Name="Empty" Value=""/>
                <Check Class="Item">
                    <Reject Member="name" Value="$Empty$" Text="t"/>
                </Check>
            </Root>"#,
        )
        .expect("grammar should load");

        let rule = &grammar.checks[0].rules[0];
        assert!(matches!(&rule.predicate, Predicate::Value(v) if v == "$Empty$"));
    }

    #[test]
    fn regexp_is_anchored() {
        let grammar = Grammar::load_str(
            r#"<Root><Check Class="Item">
                <Accept Member="name" RegExp="[a-z]+" Text="t"/>
            </Check></Root>"#,
        )
        .expect("grammar should load");
        let Predicate::RegExp(regex) = &grammar.checks[0].rules[0].predicate else {
            panic!("expected a RegExp predicate");
        };
        assert!(regex.is_match("abc"));
        assert!(!regex.is_match("abc1"), "must match the entire string");
    }

    #[test]
    fn member_attribute_is_lowercased() {
        let grammar = Grammar::load_str(
            r#"<Root><Check Class="BinaryOperation">
                <Reject Member="Left" Value="x" Text="t"/>
            </Check></Root>"#,
        )
        .expect("grammar should load");
        assert_eq!(grammar.checks[0].rules[0].member, "left");
    }

    #[test]
    fn predicate_precedence_is_first_present() {
        // NestedCount beats Value even when both are present.
        let grammar = Grammar::load_str(
            r#"<Root><Check Class="If">
                <Reject NestedCount="2" Value="x" Text="t"/>
            </Check></Root>"#,
        )
        .expect("grammar should load");
        assert!(matches!(
            grammar.checks[0].rules[0].predicate,
            Predicate::NestedCount(2)
        ));
    }

    #[test]
    fn unknown_operation_is_a_load_error() {
        let error = Grammar::load_str(
            r#"<Root><Check Class="Item">
                <Reject Member="name" Value="x" Text="t">
                    <Condition Member="filename" Value="y" Operation="StartsWith"/>
                </Reject>
            </Check></Root>"#,
        )
        .unwrap_err();
        assert!(matches!(error, GrammarError::UnknownOperation(op) if op == "StartsWith"));
    }

    #[test]
    fn invalid_count_is_a_load_error() {
        let error = Grammar::load_str(
            r#"<Root><Check Class="If">
                <Reject NestedCount="lots" Text="t"/>
            </Check></Root>"#,
        )
        .unwrap_err();
        assert!(matches!(error, GrammarError::InvalidCount { .. }));
    }

    #[test]
    fn invalid_regexp_is_a_load_error() {
        let error = Grammar::load_str(
            r#"<Root><Check Class="Item">
                <Accept Member="name" RegExp="(" Text="t"/>
            </Check></Root>"#,
        )
        .unwrap_err();
        assert!(matches!(error, GrammarError::InvalidRegExp { .. }));
    }

    #[test]
    fn unknown_path_is_a_load_error() {
        let error = Grammar::load_str(
            r#"<Root><Check Class="Import">
                <Reject Member="name" Path="IsReadable" Text="t"/>
            </Check></Root>"#,
        )
        .unwrap_err();
        assert!(matches!(error, GrammarError::UnknownPath(_)));
    }

    #[test]
    fn unknown_elements_and_attributes_are_ignored() {
        let grammar = Grammar::load_str(
            r#"<Root>
                <Comment>free text</Comment>
                <Check Class="Item" Future="yes">
                    <Reject Member="name" Value="x" Text="t" Extra="ignored"/>
                    <Note/>
                </Check>
            </Root>"#,
        )
        .expect("grammar should load");
        assert_eq!(grammar.checks[0].rules.len(), 1);
    }

    #[test]
    fn malformed_xml_is_a_load_error() {
        assert!(matches!(
            Grammar::load_str("<Root><Check></Root>"),
            Err(GrammarError::Xml(_))
        ));
    }
}
