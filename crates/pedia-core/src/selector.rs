//! Label and field selector grammar.
//!
//! A selector is a conjunction of requirements separated by commas:
//!
//! ```text
//! app=web,tier!=cache,env in (prod,staging),zone notin (a),canary,!legacy
//! ```
//!
//! Commas inside parentheses belong to a value set. Requirements are kept
//! sorted by key, and each value set is kept sorted and deduplicated, so the
//! rendered string is canonical.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Keys are an optional DNS-style prefix plus a name segment, e.g.
/// `app.kubernetes.io/name` or `status.phase`.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?/)?[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$")
        .expect("key pattern compiles")
});

/// Errors produced while parsing selectors or the search keys they carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty requirement in selector {0:?}")]
    EmptyRequirement(String),

    #[error("invalid key {0:?}")]
    InvalidKey(String),

    #[error("invalid operator in requirement {0:?}")]
    InvalidOperator(String),

    #[error("unbalanced parentheses in selector {0:?}")]
    UnbalancedParentheses(String),

    #[error("operator {operator} on key {key:?} takes {expected} value(s), got {got}")]
    ValueCount {
        key: String,
        operator: Operator,
        expected: &'static str,
        got: usize,
    },

    #[error("unknown search key {0:?}")]
    UnknownSearchKey(String),

    #[error("search key {key:?} expects an integer, got {value:?}")]
    InvalidInteger { key: String, value: String },

    #[error("unsupported order-by column {0:?}")]
    UnsupportedOrderBy(String),
}

/// Requirement operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::In => "in",
            Operator::NotIn => "notin",
            Operator::Exists => "exists",
            Operator::DoesNotExist => "!",
        };
        f.write_str(s)
    }
}

/// A single `key <op> values` requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    /// Build a validated requirement.
    pub fn new<I, S>(key: &str, operator: Operator, values: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !KEY_PATTERN.is_match(key) {
            return Err(SelectorError::InvalidKey(key.to_string()));
        }
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let (ok, expected) = match operator {
            Operator::Equals | Operator::NotEquals => (values.len() == 1, "exactly one"),
            Operator::In | Operator::NotIn => (!values.is_empty(), "at least one"),
            Operator::Exists | Operator::DoesNotExist => (values.is_empty(), "no"),
        };
        if !ok {
            return Err(SelectorError::ValueCount {
                key: key.to_string(),
                operator,
                expected,
                got: values.len(),
            });
        }
        Ok(Self::unchecked(key, operator, values))
    }

    /// Build a requirement from trusted parts (well-known keys).
    pub(crate) fn unchecked(key: &str, operator: Operator, values: BTreeSet<String>) -> Self {
        Self {
            key: key.to_string(),
            operator,
            values,
        }
    }

    pub fn equals(key: &str, value: &str) -> Result<Self, SelectorError> {
        Self::new(key, Operator::Equals, [value])
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// The value of a single-valued requirement.
    pub fn single_value(&self) -> Option<&str> {
        match self.values.len() {
            1 => self.values.iter().next().map(String::as_str),
            _ => None,
        }
    }

    /// Evaluate against the value found under this requirement's key.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self.operator {
            Operator::Equals | Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotEquals | Operator::NotIn => {
                value.is_none_or(|v| !self.values.contains(v))
            }
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, joined()),
            Operator::NotEquals => write!(f, "{}!={}", self.key, joined()),
            Operator::In if self.values.len() == 1 => write!(f, "{}={}", self.key, joined()),
            Operator::In => write!(f, "{} in ({})", self.key, joined()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, joined()),
            Operator::Exists => f.write_str(&self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// A conjunction of requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a selector string. An empty (or all-whitespace) string selects
    /// everything.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut selector = Selector::new();
        if input.trim().is_empty() {
            return Ok(selector);
        }
        for term in split_terms(input)? {
            let term = term.trim();
            if term.is_empty() {
                return Err(SelectorError::EmptyRequirement(input.to_string()));
            }
            selector.requirements.push(parse_requirement(term)?);
        }
        selector.requirements.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(selector)
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Add a requirement. A requirement already present under the same key
    /// is replaced; when the new one is an `In`, the old values are merged
    /// into it.
    pub fn add(&mut self, mut requirement: Requirement) {
        if let Some(pos) = self.requirements.iter().position(|r| r.key == requirement.key) {
            let existing = self.requirements.remove(pos);
            if requirement.operator == Operator::In {
                requirement.values.extend(existing.values);
            }
        }
        self.requirements.push(requirement);
        self.requirements.sort_by(|a, b| a.key.cmp(&b.key));
    }

    /// True when every requirement matches the values returned by `lookup`.
    pub fn matches<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        self.requirements.iter().all(|r| r.matches(lookup(&r.key)))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{requirement}")?;
        }
        Ok(())
    }
}

impl FromIterator<Requirement> for Selector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut selector = Selector::new();
        for requirement in iter {
            selector.add(requirement);
        }
        selector
    }
}

/// Split on commas that are not inside a parenthesised value set.
fn split_terms(input: &str) -> Result<Vec<&str>, SelectorError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SelectorError::UnbalancedParentheses(input.to_string()))?;
            }
            ',' if depth == 0 => {
                terms.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SelectorError::UnbalancedParentheses(input.to_string()));
    }
    terms.push(&input[start..]);
    Ok(terms)
}

fn parse_requirement(term: &str) -> Result<Requirement, SelectorError> {
    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::<String>::new());
    }
    if let Some((key, value)) = term.split_once("!=") {
        return Requirement::new(key.trim(), Operator::NotEquals, [value.trim()]);
    }
    if let Some((key, value)) = term.split_once("==") {
        return Requirement::new(key.trim(), Operator::Equals, [value.trim()]);
    }
    if let Some((key, value)) = term.split_once('=') {
        return Requirement::new(key.trim(), Operator::Equals, [value.trim()]);
    }
    if let Some((head, tail)) = term.split_once('(') {
        let inner = tail
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| SelectorError::UnbalancedParentheses(term.to_string()))?;
        let mut words = head.split_whitespace();
        let (Some(key), Some(op), None) = (words.next(), words.next(), words.next()) else {
            return Err(SelectorError::InvalidOperator(term.to_string()));
        };
        let operator = match op {
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            _ => return Err(SelectorError::InvalidOperator(term.to_string())),
        };
        let values: Vec<&str> = inner.split(',').map(str::trim).collect();
        if values.iter().any(|v| v.is_empty()) {
            return Err(SelectorError::EmptyRequirement(term.to_string()));
        }
        return Requirement::new(key, operator, values);
    }
    if term.split_whitespace().count() > 1 {
        return Err(SelectorError::InvalidOperator(term.to_string()));
    }
    Requirement::new(term, Operator::Exists, Vec::<String>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_all_operator_forms() {
        let s = Selector::parse("app=web, tier!=cache,env in (prod, staging),zone notin (a),canary,!legacy,x==y")
            .unwrap();
        let ops: Vec<(&str, Operator)> = s
            .requirements()
            .iter()
            .map(|r| (r.key(), r.operator()))
            .collect();
        assert_eq!(
            ops,
            vec![
                ("app", Operator::Equals),
                ("canary", Operator::Exists),
                ("env", Operator::In),
                ("legacy", Operator::DoesNotExist),
                ("tier", Operator::NotEquals),
                ("x", Operator::Equals),
                ("zone", Operator::NotIn),
            ]
        );
        let env = &s.requirements()[2];
        assert_eq!(
            env.values().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["prod", "staging"]
        );
    }

    #[test]
    fn empty_selector_selects_everything() {
        let s = Selector::parse("  ").unwrap();
        assert!(s.is_empty());
        assert!(s.matches(|_| None));
        assert_eq!(s.to_string(), "");
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        assert!(matches!(
            Selector::parse("a=b,,c=d"),
            Err(SelectorError::EmptyRequirement(_))
        ));
        assert!(matches!(
            Selector::parse("env in (a,b"),
            Err(SelectorError::UnbalancedParentheses(_))
        ));
        assert!(matches!(
            Selector::parse("env within (a)"),
            Err(SelectorError::InvalidOperator(_))
        ));
        assert!(matches!(
            Selector::parse("bad key=x"),
            Err(SelectorError::InvalidKey(_))
        ));
        assert!(matches!(
            Selector::parse("env in ()"),
            Err(SelectorError::EmptyRequirement(_))
        ));
    }

    #[test]
    fn prefixed_keys_are_valid() {
        let s = Selector::parse("search.clusterpedia.io/clusters in (c1,c2),status.phase=Running")
            .unwrap();
        assert_eq!(s.requirements().len(), 2);
    }

    #[test]
    fn matching_is_a_conjunction() {
        let s = Selector::parse("app=web,env in (prod,staging),!legacy").unwrap();
        let l = labels(&[("app", "web"), ("env", "prod")]);
        assert!(s.matches(|k| l.get(k).map(String::as_str)));

        let wrong_env = labels(&[("app", "web"), ("env", "dev")]);
        assert!(!s.matches(|k| wrong_env.get(k).map(String::as_str)));

        let legacy = labels(&[("app", "web"), ("env", "prod"), ("legacy", "1")]);
        assert!(!s.matches(|k| legacy.get(k).map(String::as_str)));
    }

    #[test]
    fn negative_operators_match_missing_keys() {
        let s = Selector::parse("tier!=cache,zone notin (a)").unwrap();
        assert!(s.matches(|_| None));
        let l = labels(&[("tier", "cache")]);
        assert!(!s.matches(|k| l.get(k).map(String::as_str)));
    }

    #[test]
    fn add_merges_in_values_and_replaces_equals() {
        let mut s = Selector::new();
        s.add(Requirement::new("k", Operator::In, ["b"]).unwrap());
        s.add(Requirement::new("k", Operator::In, ["a", "c"]).unwrap());
        s.add(Requirement::equals("limit", "4").unwrap());
        s.add(Requirement::equals("limit", "8").unwrap());
        assert_eq!(s.to_string(), "k in (a,b,c),limit=8");
    }

    #[test]
    fn value_count_is_validated() {
        let err = Requirement::new("k", Operator::Equals, ["a", "b"]).unwrap_err();
        assert!(matches!(err, SelectorError::ValueCount { got: 2, .. }));
        assert!(Requirement::new("k", Operator::Exists, ["a"]).is_err());
        assert!(Requirement::new("k", Operator::In, Vec::<String>::new()).is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let input = "a!=b,c in (x,y),d notin (z),e,!f";
        let s = Selector::parse(input).unwrap();
        assert_eq!(s.to_string(), input);
        assert_eq!(Selector::parse(&s.to_string()).unwrap(), s);
    }
}
