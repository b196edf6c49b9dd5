//! Label selectors, parsed from their query string form and matched against object labels
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};
use thiserror::Error;

type Map = BTreeMap<String, String>;

/// Failed to parse a label selector string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unable to parse requirement {requirement:?}: {reason}")]
pub struct ParseSelectorError {
    /// The offending requirement
    pub requirement: String,
    /// What was wrong with it
    pub reason: String,
}

/// A single requirement of a selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    /// The label is set to one of the values
    In(String, BTreeSet<String>),
    /// The label is unset or set to none of the values
    NotIn(String, BTreeSet<String>),
    /// The label is set to the value
    Equal(String, String),
    /// The label is unset or set to another value
    NotEqual(String, String),
    /// The label is set
    Exists(String),
    /// The label is unset
    DoesNotExist(String),
    /// A requirement with an unknown operator, matches nothing
    Invalid,
}

/// A conjunction of label requirements
///
/// Parses the selector syntax used by the `labelSelector` query parameter:
///
/// ```
/// use gentype_core::Selector;
/// let selector: Selector = "app=web,tier in (frontend, edge),!canary".parse().unwrap();
/// let labels = [("app".to_string(), "web".to_string()), ("tier".to_string(), "edge".to_string())];
/// assert!(selector.matches(&labels.into()));
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector(Vec<Expression>);

impl Selector {
    /// Whether this selector matches every set of labels
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether all requirements hold for the given labels
    pub fn matches(&self, labels: &Map) -> bool {
        self.0.iter().all(|expr| expr.matches(labels))
    }

    /// The requirements of this selector
    pub fn expressions(&self) -> &[Expression] {
        &self.0
    }
}

impl Expression {
    fn matches(&self, labels: &Map) -> bool {
        match self {
            Expression::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Expression::NotIn(key, values) => labels.get(key).is_none_or(|v| !values.contains(v)),
            Expression::Exists(key) => labels.contains_key(key),
            Expression::DoesNotExist(key) => !labels.contains_key(key),
            Expression::Equal(key, value) => labels.get(key) == Some(value),
            Expression::NotEqual(key, value) => labels.get(key) != Some(value),
            Expression::Invalid => false,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| values.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            Expression::In(key, values) => write!(f, "{key} in ({})", join(values)),
            Expression::NotIn(key, values) => write!(f, "{key} notin ({})", join(values)),
            Expression::Equal(key, value) => write!(f, "{key}={value}"),
            Expression::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Expression::Exists(key) => write!(f, "{key}"),
            Expression::DoesNotExist(key) => write!(f, "!{key}"),
            Expression::Invalid => Ok(()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exprs = self
            .0
            .iter()
            .filter(|e| **e != Expression::Invalid)
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        f.write_str(&exprs.join(","))
    }
}

/// Split on commas that are not inside a value set
fn split_requirements(s: &str) -> Result<Vec<&str>, ParseSelectorError> {
    let mut parts = Vec::new();
    let (mut depth, mut start) = (0usize, 0usize);
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| ParseSelectorError {
                    requirement: s.into(),
                    reason: "unbalanced ')'".into(),
                })?
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseSelectorError {
            requirement: s.into(),
            reason: "unbalanced '('".into(),
        });
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn parse_key(key: &str, requirement: &str) -> Result<String, ParseSelectorError> {
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) || key.contains(['=', '!', '(', ')']) {
        return Err(ParseSelectorError {
            requirement: requirement.into(),
            reason: format!("invalid label key {key:?}"),
        });
    }
    Ok(key.to_string())
}

fn parse_requirement(req: &str) -> Result<Expression, ParseSelectorError> {
    let fail = |reason: &str| ParseSelectorError {
        requirement: req.into(),
        reason: reason.into(),
    };

    if let Some(open) = req.find('(') {
        let inner = req[open + 1..]
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| fail("expected ')' after values"))?;
        let mut head = req[..open].split_whitespace();
        let (key, op) = match (head.next(), head.next(), head.next()) {
            (Some(key), Some(op), None) => (parse_key(key, req)?, op),
            _ => return Err(fail("expected '<key> in (<values>)' or '<key> notin (<values>)'")),
        };
        let values = inner
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>();
        if values.is_empty() {
            return Err(fail("for 'in', 'notin' operators, values set can't be empty"));
        }
        return match op {
            "in" => Ok(Expression::In(key, values)),
            "notin" => Ok(Expression::NotIn(key, values)),
            _ => Err(fail("unknown set operator")),
        };
    }

    if let Some(key) = req.strip_prefix('!') {
        return Ok(Expression::DoesNotExist(parse_key(key, req)?));
    }
    if let Some((key, value)) = req.split_once("!=") {
        return Ok(Expression::NotEqual(parse_key(key, req)?, value.trim().into()));
    }
    if let Some((key, value)) = req.split_once("==").or_else(|| req.split_once('=')) {
        return Ok(Expression::Equal(parse_key(key, req)?, value.trim().into()));
    }
    Ok(Expression::Exists(parse_key(req, req)?))
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        split_requirements(s)?
            .into_iter()
            .map(|req| parse_requirement(req.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| Expression::Equal(k, v)).collect())
    }
}

impl FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

impl FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Expression> for Selector {
    fn from(value: Expression) -> Self {
        Self(vec![value])
    }
}

impl From<LabelSelector> for Selector {
    fn from(value: LabelSelector) -> Self {
        let mut selector: Selector = value.match_labels.unwrap_or_default().into_iter().collect();
        selector
            .0
            .extend(value.match_expressions.into_iter().flatten().map(Expression::from));
        selector
    }
}

impl From<LabelSelectorRequirement> for Expression {
    fn from(requirement: LabelSelectorRequirement) -> Self {
        let key = requirement.key;
        let values = requirement.values.map(|values| values.into_iter().collect());
        match (requirement.operator.as_str(), values) {
            ("In", Some(values)) => Expression::In(key, values),
            ("NotIn", Some(values)) => Expression::NotIn(key, values),
            ("Exists", _) => Expression::Exists(key),
            ("DoesNotExist", _) => Expression::DoesNotExist(key),
            _ => Expression::Invalid,
        }
    }
}
