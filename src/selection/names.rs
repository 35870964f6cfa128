// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Name expression matching
//!
//! Name expressions are regular expressions joined into a single anchored
//! alternation, so `foo` and `bar-.*` become `^(foo|bar-.*)$` and must match
//! the entire heartbeat name.

use regex::Regex;

use super::SelectionError;

#[derive(Debug, Clone)]
pub struct NameMatcher {
    regex: Regex,
}

impl NameMatcher {
    /// Compile name expressions into one matcher
    ///
    /// An empty list yields a matcher that only accepts the empty name; callers
    /// skip name filtering entirely when no expressions are given.
    pub fn new(expressions: &[String]) -> Result<Self, SelectionError> {
        let pattern = format!("^({})$", expressions.join("|"));
        let regex = Regex::new(&pattern)?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(exprs: &[&str]) -> NameMatcher {
        let exprs: Vec<String> = exprs.iter().map(|s| s.to_string()).collect();
        NameMatcher::new(&exprs).unwrap()
    }

    #[test]
    fn test_anchored_alternation() {
        let m = matcher(&["foo", "bar-.*"]);
        assert_eq!(m.as_str(), "^(foo|bar-.*)$");
        assert!(m.is_match("foo"));
        assert!(m.is_match("bar-x"));
        assert!(!m.is_match("foox"));
        assert!(!m.is_match("xbar-x"));
        assert!(!m.is_match("bar"));
    }

    #[test]
    fn test_character_classes() {
        let m = matcher(&[".*-oof[12]"]);
        assert!(m.is_match("foo-oof1"));
        assert!(m.is_match("bar-oof2"));
        assert!(!m.is_match("foo-oof3"));
    }

    #[test]
    fn test_match_everything() {
        let m = matcher(&[".*"]);
        assert!(m.is_match(""));
        assert!(m.is_match("anything at all"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = NameMatcher::new(&["foo".to_string(), "bar[".to_string()]).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidPattern(_)));
        assert!(err.to_string().starts_with("invalid name expression"));
    }

    #[test]
    fn test_unbalanced_group() {
        assert!(NameMatcher::new(&["a)".to_string()]).is_err());
    }
}
