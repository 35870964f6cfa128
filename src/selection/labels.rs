// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Label selector parsing and matching
//!
//! Implements the kubectl label selector syntax against a heartbeat's
//! [`LabelSet`](super::projector::LabelSet):
//!
//! | term                  | matches when                        |
//! |-----------------------|-------------------------------------|
//! | `key`                 | label present                       |
//! | `!key`                | label absent                        |
//! | `key=v`, `key==v`     | label present and equal to `v`      |
//! | `key!=v`              | label absent or not equal to `v`    |
//! | `key in (v1, v2)`     | label present and one of the values |
//! | `key notin (v1, v2)`  | label absent or none of the values  |
//!
//! Terms are separated by commas and must all match.
//!
//! The accepted grammar is a superset of kubectl's:
//! - keys and values are not checked against Kubernetes name rules, so
//!   field labels like `ownerTeam/name` and free-form tag values work
//! - `in` and `notin` are keywords only in operator position, so they can
//!   be used as keys and values (`in=notin` selects label `in`)

use std::fmt;

use super::{Predicate, SelectionError, View};

/// Label requirement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOperator {
    Exists,
    DoesNotExist,
    Equals,
    NotEquals,
    In,
    NotIn,
}

/// A single selector term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: LabelOperator,
    /// One value for `=`/`!=`, the whole set for `in`/`notin`, none otherwise
    pub values: Vec<String>,
}

impl Requirement {
    fn new(key: impl Into<String>, operator: LabelOperator, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            values,
        }
    }

    pub fn matches(&self, view: &dyn View) -> bool {
        let value = view.get(&self.key);
        match self.operator {
            LabelOperator::Exists => value.is_some(),
            LabelOperator::DoesNotExist => value.is_none(),
            LabelOperator::Equals | LabelOperator::In => {
                value.is_some_and(|v| self.values.iter().any(|want| want == v))
            }
            LabelOperator::NotEquals | LabelOperator::NotIn => {
                value.is_none_or(|v| self.values.iter().all(|want| want != v))
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            LabelOperator::Exists => write!(f, "{}", self.key),
            LabelOperator::DoesNotExist => write!(f, "!{}", self.key),
            LabelOperator::Equals => write!(f, "{}={}", self.key, self.values.join("")),
            LabelOperator::NotEquals => write!(f, "{}!={}", self.key, self.values.join("")),
            LabelOperator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            LabelOperator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
        }
    }
}

/// Parsed label selector; matches when every requirement matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Selector accepting every label set
    pub fn everything() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl Predicate for LabelSelector {
    fn matches(&self, view: &dyn View) -> bool {
        self.requirements.iter().all(|r| r.matches(view))
    }

    fn is_everything(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        f.write_str(&terms.join(","))
    }
}

/// Parse a label selector; empty or blank text selects everything
pub fn parse(selector: &str) -> Result<LabelSelector, SelectionError> {
    if selector.trim().is_empty() {
        return Ok(LabelSelector::everything());
    }
    let mut parser = Parser {
        selector,
        tokens: tokenize(selector),
        pos: 0,
    };
    parser.parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    Not,
    Equals,
    DoubleEquals,
    NotEquals,
    OpenParen,
    CloseParen,
    Comma,
    GreaterThan,
    LessThan,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "'{}'", s),
            Token::Not => f.write_str("'!'"),
            Token::Equals => f.write_str("'='"),
            Token::DoubleEquals => f.write_str("'=='"),
            Token::NotEquals => f.write_str("'!='"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::LessThan => f.write_str("'<'"),
            Token::End => f.write_str("end of string"),
        }
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '!' | '=' | '(' | ')' | ',' | '<' | '>')
}

/// Split selector text into tokens; always ends with [`Token::End`]
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '!' if chars.peek() == Some(&'=') => {
                chars.next();
                Token::NotEquals
            }
            '!' => Token::Not,
            '=' if chars.peek() == Some(&'=') => {
                chars.next();
                Token::DoubleEquals
            }
            '=' => Token::Equals,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            '>' => Token::GreaterThan,
            '<' => Token::LessThan,
            c => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || is_special(next) {
                        break;
                    }
                    ident.push(next);
                    chars.next();
                }
                Token::Identifier(ident)
            }
        };
        tokens.push(token);
    }

    tokens.push(Token::End);
    tokens
}

struct Parser<'a> {
    selector: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        static END: Token = Token::End;
        self.tokens.get(self.pos).unwrap_or(&END)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, reason: String) -> SelectionError {
        SelectionError::label(self.selector, reason)
    }

    fn parse(&mut self) -> Result<LabelSelector, SelectionError> {
        let mut requirements = Vec::new();
        loop {
            requirements.push(self.parse_requirement()?);
            match self.next() {
                Token::End => break,
                Token::Comma => {
                    if *self.peek() == Token::End {
                        return Err(self.error("expected a requirement after ','".to_string()));
                    }
                }
                other => {
                    return Err(self.error(format!(
                        "found {}, expected: ',' or end of string",
                        other
                    )));
                }
            }
        }
        Ok(LabelSelector { requirements })
    }

    fn parse_requirement(&mut self) -> Result<Requirement, SelectionError> {
        let key = match self.next() {
            Token::Not => {
                let key = self.parse_key()?;
                return Ok(Requirement::new(key, LabelOperator::DoesNotExist, vec![]));
            }
            Token::Identifier(key) => key,
            other => {
                return Err(self.error(format!("found {}, expected: identifier or '!'", other)));
            }
        };

        let operator = match self.peek() {
            Token::Comma | Token::End => {
                return Ok(Requirement::new(key, LabelOperator::Exists, vec![]));
            }
            Token::Equals | Token::DoubleEquals => LabelOperator::Equals,
            Token::NotEquals => LabelOperator::NotEquals,
            Token::Identifier(op) if op == "in" => LabelOperator::In,
            Token::Identifier(op) if op == "notin" => LabelOperator::NotIn,
            Token::GreaterThan | Token::LessThan => {
                return Err(self.error(format!(
                    "operator {} is not supported for key '{}'",
                    self.peek(),
                    key
                )));
            }
            other => {
                return Err(self.error(format!(
                    "found {}, expected: '=', '==', '!=', 'in', 'notin'",
                    other
                )));
            }
        };
        self.next();

        let values = match operator {
            LabelOperator::In | LabelOperator::NotIn => self.parse_set()?,
            _ => vec![self.parse_exact_value()?],
        };
        Ok(Requirement::new(key, operator, values))
    }

    fn parse_key(&mut self) -> Result<String, SelectionError> {
        match self.next() {
            Token::Identifier(key) => Ok(key),
            other => Err(self.error(format!("found {}, expected: identifier after '!'", other))),
        }
    }

    /// Value after `=`, `==` or `!=`; may be empty (`key=`)
    fn parse_exact_value(&mut self) -> Result<String, SelectionError> {
        let value = match self.peek() {
            Token::Comma | Token::End => return Ok(String::new()),
            Token::Identifier(value) => value.clone(),
            other => return Err(self.error(format!("found {}, expected: value", other))),
        };
        self.next();
        Ok(value)
    }

    /// `( v1, v2, ... )`; empty slots stand for the empty value
    fn parse_set(&mut self) -> Result<Vec<String>, SelectionError> {
        match self.next() {
            Token::OpenParen => {}
            other => return Err(self.error(format!("found {}, expected: '('", other))),
        }

        let mut values = Vec::new();
        loop {
            let value = match self.peek() {
                Token::Identifier(value) => {
                    let value = value.clone();
                    self.next();
                    value
                }
                _ => String::new(),
            };
            values.push(value);

            match self.next() {
                Token::Comma => continue,
                Token::CloseParen => break,
                Token::End => {
                    return Err(self.error("unterminated set, expected: ')'".to_string()));
                }
                other => {
                    return Err(self.error(format!("found {}, expected: ',' or ')'", other)));
                }
            }
        }
        Ok(values)
    }
}
